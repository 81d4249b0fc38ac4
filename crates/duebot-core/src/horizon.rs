//! Forward-looking horizon checks shared by queries and the reminder
//! scheduler.

use chrono::{Duration, NaiveDateTime};

use duebot_types::DeadlineRecord;

use crate::occurrence::effective_dates;

/// True iff `effective_due` falls within `days` days of `now`.
pub fn within_horizon(effective_due: NaiveDateTime, now: NaiveDateTime, days: i64) -> bool {
    effective_due <= now + Duration::days(days)
}

/// True iff `effective_due` is within 24 hours of `now` AND lands on
/// today's calendar date.
///
/// Both halves are required: an item 20 hours away that crosses midnight
/// is out, while an item due at 01:00 today is in.
pub fn due_today(effective_due: NaiveDateTime, now: NaiveDateTime) -> bool {
    within_horizon(effective_due, now, 1) && effective_due.date() == now.date()
}

/// Records whose effective due is inside a `days`-day horizon.
pub fn filter_within(
    records: &[DeadlineRecord],
    now: NaiveDateTime,
    days: i64,
) -> Vec<DeadlineRecord> {
    records
        .iter()
        .filter(|r| within_horizon(effective_dates(r, now).1, now, days))
        .cloned()
        .collect()
}

/// Records due on today's calendar date.
pub fn filter_today(records: &[DeadlineRecord], now: NaiveDateTime) -> Vec<DeadlineRecord> {
    records
        .iter()
        .filter(|r| due_today(effective_dates(r, now).1, now))
        .cloned()
        .collect()
}

/// The `n` nearest strictly-future deadlines, paired with their effective
/// due and sorted ascending by it. No horizon cutoff is applied.
pub fn upcoming(
    records: &[DeadlineRecord],
    now: NaiveDateTime,
    n: usize,
) -> Vec<(DeadlineRecord, NaiveDateTime)> {
    let mut next: Vec<(DeadlineRecord, NaiveDateTime)> = records
        .iter()
        .map(|r| (r.clone(), effective_dates(r, now).1))
        .filter(|(_, due)| *due > now)
        .collect();
    next.sort_by_key(|(_, due)| *due);
    next.truncate(n);
    next
}
