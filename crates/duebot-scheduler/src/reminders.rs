//! Hourly reminder evaluation.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use duebot_core::occurrence::effective_dates;
use duebot_storage::DeadlineStore;
use duebot_types::DeadlineRecord;

use crate::Broadcaster;

/// Which reminder a deadline is due for at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    /// Effective due lies in [23h, 24h).
    DayBefore,
    /// Effective due lies in [1h, 2h).
    HourBefore,
}

/// Classify the time remaining until `due`.
///
/// The windows are disjoint and one hour wide, so with hourly sampling
/// each deadline fires each reminder exactly once. Minute-granularity
/// integer arithmetic keeps the boundaries exact.
pub fn reminder_window(due: NaiveDateTime, now: NaiveDateTime) -> Option<ReminderWindow> {
    let minutes = (due - now).num_minutes();
    if (23 * 60..24 * 60).contains(&minutes) {
        Some(ReminderWindow::DayBefore)
    } else if (60..2 * 60).contains(&minutes) {
        Some(ReminderWindow::HourBefore)
    } else {
        None
    }
}

/// Reminders due across a record set at a single `now` snapshot.
pub fn collect_reminders(
    records: &[DeadlineRecord],
    now: NaiveDateTime,
) -> Vec<(DeadlineRecord, ReminderWindow, NaiveDateTime)> {
    records
        .iter()
        .filter_map(|record| {
            let (_, due) = effective_dates(record, now);
            reminder_window(due, now).map(|window| (record.clone(), window, due))
        })
        .collect()
}

/// Reminder text for one deadline.
pub fn reminder_text(record: &DeadlineRecord, window: ReminderWindow, due: NaiveDateTime) -> String {
    let lead = match window {
        ReminderWindow::DayBefore => "24 hours",
        ReminderWindow::HourBefore => "1 hour",
    };
    let mut msg = format!(
        "⏰ {} — {} is due in {lead}\n🔴 {}",
        record.class_name,
        record.name,
        due.format("%b %d, %I:%M %p")
    );
    if let Some(link) = &record.link {
        msg.push_str(&format!("\n🔗 {link}"));
    }
    msg
}

/// Seconds until the next top-of-hour tick, with a little slack so the
/// tick lands just past the hour.
pub fn seconds_until_next_hour(now: NaiveDateTime) -> u64 {
    let elapsed = u64::from(now.minute()) * 60 + u64::from(now.second());
    3600 - elapsed + 5
}

/// Run the hourly reminder loop until cancelled.
///
/// Each tick captures `now` once, pulls candidates through the store's
/// coarse pre-filter, resolves them, and broadcasts whatever falls into a
/// reminder window.
pub async fn run_reminder_loop(
    store: Arc<DeadlineStore>,
    broadcaster: Arc<dyn Broadcaster>,
    cancel: CancellationToken,
) {
    info!("Reminder loop started");
    loop {
        let now = Local::now().naive_local();
        // Two days comfortably covers the 24h window; recurring rows
        // bypass the cutoff inside the store.
        match store.list_due_within(now + Duration::days(2)).await {
            Ok(records) => {
                let due = collect_reminders(&records, now);
                debug!(candidates = records.len(), firing = due.len(), "Reminder tick");
                for (record, window, due_at) in due {
                    let text = reminder_text(&record, window, due_at);
                    if let Err(e) = broadcaster.broadcast(text).await {
                        warn!(deadline_id = record.id, "Failed to deliver reminder: {e}");
                    }
                }
            }
            Err(e) => warn!("Reminder tick query failed: {e}"),
        }

        let sleep = std::time::Duration::from_secs(seconds_until_next_hour(
            Local::now().naive_local(),
        ));
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(sleep) => {}
        }
    }
    info!("Reminder loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use duebot_types::Recurrence;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn record(id: i64, due: NaiveDateTime, recurring: Option<Recurrence>) -> DeadlineRecord {
        DeadlineRecord {
            id,
            name: format!("Deadline {id}"),
            class_name: "Algorithms".into(),
            start: due - Duration::hours(4),
            due,
            link: None,
            recurring,
        }
    }

    #[test]
    fn test_window_classification() {
        let now = dt(2026, 3, 2, 10, 0);
        // 23.5 hours out: 24h reminder
        assert_eq!(
            reminder_window(dt(2026, 3, 3, 9, 30), now),
            Some(ReminderWindow::DayBefore)
        );
        // 1.5 hours out: 1h reminder
        assert_eq!(
            reminder_window(dt(2026, 3, 2, 11, 30), now),
            Some(ReminderWindow::HourBefore)
        );
        // 2.5 hours out: neither
        assert_eq!(reminder_window(dt(2026, 3, 2, 12, 30), now), None);
        // Already past: neither
        assert_eq!(reminder_window(dt(2026, 3, 2, 9, 0), now), None);
    }

    #[test]
    fn test_window_boundaries_fire_exactly_once() {
        // A due at exactly 24h is outside the window this tick and
        // inside it on the next hourly tick; never both.
        let due = dt(2026, 3, 3, 10, 0);
        assert_eq!(reminder_window(due, dt(2026, 3, 2, 10, 0)), None);
        assert_eq!(
            reminder_window(due, dt(2026, 3, 2, 11, 0)),
            Some(ReminderWindow::DayBefore)
        );
        assert_eq!(reminder_window(due, dt(2026, 3, 2, 12, 0)), None);

        // Same at the 1h edge: due at exactly 2h waits one tick.
        assert_eq!(reminder_window(due, dt(2026, 3, 3, 8, 0)), None);
        assert_eq!(
            reminder_window(due, dt(2026, 3, 3, 9, 0)),
            Some(ReminderWindow::HourBefore)
        );
        assert_eq!(reminder_window(due, dt(2026, 3, 3, 10, 0)), None);
    }

    #[test]
    fn test_windows_are_mutually_exclusive() {
        let now = dt(2026, 3, 2, 0, 0);
        let mut day_before = 0;
        let mut hour_before = 0;
        // Sweep a due instant across 26 hours in 15-minute steps
        for quarter in 0..(26 * 4) {
            let due = now + Duration::minutes(quarter * 15);
            match reminder_window(due, now) {
                Some(ReminderWindow::DayBefore) => day_before += 1,
                Some(ReminderWindow::HourBefore) => hour_before += 1,
                None => {}
            }
        }
        assert_eq!(day_before, 4); // one hour of quarter steps
        assert_eq!(hour_before, 4);
    }

    #[test]
    fn test_collect_reminders_resolves_recurring() {
        // Weekly anchor long past; its next occurrence is Friday 17:00.
        // Thursday 17:30 is 23.5 hours before that.
        let records = vec![record(1, dt(2025, 9, 5, 17, 0), Some(Recurrence::Weekly))];
        let now = dt(2026, 3, 5, 17, 30);
        let due = collect_reminders(&records, now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, ReminderWindow::DayBefore);
        assert_eq!(due[0].2, dt(2026, 3, 6, 17, 0));
    }

    #[test]
    fn test_reminder_text() {
        let mut r = record(1, dt(2026, 3, 6, 17, 0), None);
        r.name = "Problem set 4".into();
        r.link = Some("https://example.edu/ps4".into());
        let text = reminder_text(&r, ReminderWindow::DayBefore, r.due);
        assert_eq!(
            text,
            "⏰ Algorithms — Problem set 4 is due in 24 hours\n🔴 Mar 06, 05:00 PM\n🔗 https://example.edu/ps4"
        );
    }

    #[test]
    fn test_seconds_until_next_hour() {
        assert_eq!(seconds_until_next_hour(dt(2026, 3, 2, 10, 0)), 3605);
        let late = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 59, 30)
            .unwrap();
        assert_eq!(seconds_until_next_hour(late), 35);
    }
}
