//! Weekly summary broadcast.

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime, Weekday};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use duebot_core::command::weekly_summary;
use duebot_storage::DeadlineStore;

use crate::Broadcaster;

/// The next `weekday` at `hour`:00 strictly after `now`.
pub fn next_summary_instant(now: NaiveDateTime, weekday: Weekday, hour: u32) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let mut days_ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(now.weekday().num_days_from_monday()))
    .rem_euclid(7);
    if days_ahead == 0 && now.date().and_time(time) <= now {
        days_ahead = 7;
    }
    (now.date() + Duration::days(days_ahead)).and_time(time)
}

/// Run the weekly summary loop until cancelled.
///
/// Sleeps to the configured weekly instant, then broadcasts the same
/// 7-day-horizon listing the `/week` command uses, unconditionally (with
/// a "no deadlines" variant when the filtered set is empty).
pub async fn run_summary_loop(
    store: Arc<DeadlineStore>,
    broadcaster: Arc<dyn Broadcaster>,
    weekday: Weekday,
    hour: u32,
    cancel: CancellationToken,
) {
    info!(?weekday, hour, "Summary loop started");
    loop {
        let now = Local::now().naive_local();
        let next = next_summary_instant(now, weekday, hour);
        let wait = (next - now).num_seconds().max(0) as u64 + 1;
        debug!(next = %next, "Sleeping until next weekly summary");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(std::time::Duration::from_secs(wait)) => {}
        }

        let now = Local::now().naive_local();
        match store.list_due_within(now + Duration::days(7)).await {
            Ok(records) => {
                if let Err(e) = broadcaster.broadcast(weekly_summary(&records, now)).await {
                    warn!("Failed to deliver weekly summary: {e}");
                }
            }
            Err(e) => warn!("Weekly summary query failed: {e}"),
        }
    }
    info!("Summary loop stopped");
}
