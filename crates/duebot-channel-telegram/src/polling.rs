//! Telegram long-polling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::TelegramApi;
use crate::handler::DeadlineBot;
use crate::types::GetUpdatesParams;

/// Run the long-polling loop, dispatching each text message to the bot.
///
/// Exits when `cancel` is cancelled. Transient API errors back off
/// exponentially (1s doubling to 30s).
pub async fn run_polling_loop(api: &TelegramApi, bot: Arc<DeadlineBot>, cancel: CancellationToken) {
    let mut offset: Option<i64> = None;
    let mut backoff = Duration::from_secs(1);
    let max_backoff = Duration::from_secs(30);

    info!("Telegram polling loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let params = GetUpdatesParams {
            offset,
            timeout: Some(30),
            allowed_updates: Some(vec!["message".into()]),
        };

        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.get_updates(&params) => result,
        };

        match updates {
            Ok(updates) => {
                backoff = Duration::from_secs(1);

                for update in updates {
                    offset = Some(update.update_id + 1);

                    let Some(msg) = update.message else {
                        continue;
                    };
                    if let Err(e) = bot.handle_message(&msg).await {
                        warn!(update_id = update.update_id, "Failed to handle update: {e}");
                    }
                }
            }
            Err(e) => {
                warn!(backoff_secs = backoff.as_secs(), "getUpdates error: {e}");

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {},
                }

                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }

    info!("Telegram polling loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use duebot_storage::DeadlineStore;

    #[tokio::test]
    async fn test_polling_loop_cancellation() {
        // Verify that the polling loop exits promptly when cancelled.
        // The fake token means any request would fail, but the cancel
        // should win before a request is attempted.
        let api = TelegramApi::new("fake_token");
        let store = Arc::new(DeadlineStore::open_in_memory().unwrap());
        let bot = Arc::new(DeadlineBot::new(api.clone(), store, 1, 1));
        let cancel = CancellationToken::new();

        cancel.cancel();

        tokio::time::timeout(
            Duration::from_secs(2),
            run_polling_loop(&api, bot, cancel),
        )
        .await
        .expect("polling loop should exit promptly on cancel");
    }
}
