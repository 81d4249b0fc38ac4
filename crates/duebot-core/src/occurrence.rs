//! Projects stored anchors onto their next concrete occurrence.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

use duebot_types::{DeadlineRecord, Recurrence};

/// Resolve an anchor to its effective instant relative to `now`.
///
/// Non-recurring anchors pass through unchanged. Weekly anchors resolve to
/// the soonest instant on the anchor's weekday carrying the anchor's
/// hour/minute (seconds zeroed); when that weekday is today and the
/// time-of-day has already passed, the occurrence rolls to next week.
/// A weekly anchor therefore never resolves to a past instant.
pub fn resolve_anchor(
    anchor: NaiveDateTime,
    recurring: Option<Recurrence>,
    now: NaiveDateTime,
) -> NaiveDateTime {
    match recurring {
        None => anchor,
        Some(Recurrence::Weekly) => next_weekly_occurrence(anchor, now),
    }
}

/// Effective (start, due) pair for a record at `now`.
///
/// Start and due resolve independently: a Monday start and a Friday due
/// each project onto their own nearest weekday, which may land in
/// different calendar weeks.
pub fn effective_dates(record: &DeadlineRecord, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (
        resolve_anchor(record.start, record.recurring, now),
        resolve_anchor(record.due, record.recurring, now),
    )
}

fn next_weekly_occurrence(anchor: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    let mut days_ahead = i64::from(anchor.weekday().num_days_from_monday())
        - i64::from(now.weekday().num_days_from_monday());
    if days_ahead < 0 {
        days_ahead += 7;
    } else if days_ahead == 0 {
        let today_at_anchor = now.date().and_time(anchor_time(anchor));
        if today_at_anchor <= now {
            days_ahead = 7;
        }
    }
    (now.date() + Duration::days(days_ahead)).and_time(anchor_time(anchor))
}

fn anchor_time(anchor: NaiveDateTime) -> NaiveTime {
    NaiveTime::from_hms_opt(anchor.hour(), anchor.minute(), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // 2026-03-02 is a Monday; 2026-03-06 is a Friday.
    const WEEKLY: Option<Recurrence> = Some(Recurrence::Weekly);

    #[test]
    fn test_non_recurring_is_identity() {
        let anchor = dt(2025, 9, 5, 17, 0);
        let now = dt(2026, 3, 2, 9, 0);
        assert_eq!(resolve_anchor(anchor, None, now), anchor);
    }

    #[test]
    fn test_weekly_resolves_forward_within_week() {
        // Friday anchor, evaluated Monday morning: this Friday.
        let anchor = dt(2025, 9, 5, 17, 0); // a Friday
        let now = dt(2026, 3, 2, 9, 0); // Monday
        let resolved = resolve_anchor(anchor, WEEKLY, now);
        assert_eq!(resolved, dt(2026, 3, 6, 17, 0));
        assert_eq!(resolved.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_weekly_wraps_to_next_week() {
        // Friday anchor, evaluated Saturday: next Friday.
        let anchor = dt(2025, 9, 5, 17, 0);
        let now = dt(2026, 3, 7, 9, 0); // Saturday
        assert_eq!(resolve_anchor(anchor, WEEKLY, now), dt(2026, 3, 13, 17, 0));
    }

    #[test]
    fn test_same_weekday_time_still_ahead() {
        // Friday anchor at 17:00, evaluated Friday 16:59: today.
        let anchor = dt(2025, 9, 5, 17, 0);
        let now = dt(2026, 3, 6, 16, 59);
        assert_eq!(resolve_anchor(anchor, WEEKLY, now), dt(2026, 3, 6, 17, 0));
    }

    #[test]
    fn test_same_weekday_time_already_passed() {
        // Friday anchor at 17:00, evaluated Friday 17:01: next Friday.
        let anchor = dt(2025, 9, 5, 17, 0);
        let now = dt(2026, 3, 6, 17, 1);
        assert_eq!(resolve_anchor(anchor, WEEKLY, now), dt(2026, 3, 13, 17, 0));
    }

    #[test]
    fn test_same_weekday_exact_instant_rolls_forward() {
        // The anchor time placed on today is not strictly ahead of now,
        // so it counts as elapsed.
        let anchor = dt(2025, 9, 5, 17, 0);
        let now = dt(2026, 3, 6, 17, 0);
        assert_eq!(resolve_anchor(anchor, WEEKLY, now), dt(2026, 3, 13, 17, 0));
    }

    #[test]
    fn test_weekly_never_in_the_past() {
        let anchor = dt(2025, 9, 5, 17, 0);
        for day in 1..=28 {
            for hour in [0, 9, 17, 23] {
                let now = dt(2026, 3, day, hour, 30);
                let resolved = resolve_anchor(anchor, WEEKLY, now);
                assert!(resolved >= now, "resolved {resolved} before now {now}");
                assert_eq!(resolved.weekday(), anchor.weekday());
                assert_eq!(resolved.hour(), 17);
                assert_eq!(resolved.minute(), 0);
                assert_eq!(resolved.second(), 0);
            }
        }
    }

    #[test]
    fn test_resolution_is_idempotent_at_fixed_now() {
        let anchor = dt(2025, 9, 3, 8, 45);
        let now = dt(2026, 3, 5, 12, 0);
        let a = resolve_anchor(anchor, WEEKLY, now);
        let b = resolve_anchor(anchor, WEEKLY, now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_anchor_seconds_are_zeroed() {
        let anchor = NaiveDate::from_ymd_opt(2025, 9, 5)
            .unwrap()
            .and_hms_opt(17, 0, 42)
            .unwrap();
        let now = dt(2026, 3, 2, 9, 0);
        assert_eq!(resolve_anchor(anchor, WEEKLY, now), dt(2026, 3, 6, 17, 0));
    }

    #[test]
    fn test_start_and_due_resolve_independently() {
        // Start on Monday, due on Friday. Evaluated on a Wednesday the
        // start has passed for this week and jumps ahead of the due.
        let record = DeadlineRecord {
            id: 1,
            name: "Weekly quiz".into(),
            class_name: "Algorithms".into(),
            start: dt(2025, 9, 1, 9, 0), // a Monday
            due: dt(2025, 9, 5, 17, 0),  // a Friday
            link: None,
            recurring: WEEKLY,
        };
        let now = dt(2026, 3, 4, 12, 0); // Wednesday
        let (start, due) = effective_dates(&record, now);
        assert_eq!(start, dt(2026, 3, 9, 9, 0)); // next Monday
        assert_eq!(due, dt(2026, 3, 6, 17, 0)); // this Friday
        assert!(start > due);
    }
}
