//! The `duebot run` command: wires config, store, channel, and scheduler
//! together and runs until ctrl-c.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use duebot_channel_telegram::{DeadlineBot, TelegramApi, TelegramBroadcaster, polling};
use duebot_scheduler::{Broadcaster, reminders, summary};
use duebot_storage::DeadlineStore;

pub async fn run_bot(config_path: Option<String>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => duebot_config::load_config_from(Path::new(path))?,
        None => duebot_config::load_config()?,
    };
    let token = config.resolved_bot_token()?;

    let store = Arc::new(DeadlineStore::open(&duebot_config::db_path()?)?);
    let api = TelegramApi::new(&token);

    let me = api.get_me().await?;
    info!(
        bot_username = me.username.as_deref().unwrap_or("unknown"),
        "Telegram bot authenticated"
    );

    let bot = Arc::new(DeadlineBot::new(
        api.clone(),
        store.clone(),
        config.telegram.admin_id,
        config.telegram.broadcast_chat_id,
    ));
    if let Err(e) = bot.register_commands().await {
        warn!("Failed to register command menu: {e}");
    }

    let broadcaster: Arc<dyn Broadcaster> = Arc::new(TelegramBroadcaster::new(
        api.clone(),
        config.telegram.broadcast_chat_id,
    ));

    let cancel = CancellationToken::new();

    let reminder_handle = tokio::spawn(reminders::run_reminder_loop(
        store.clone(),
        broadcaster.clone(),
        cancel.child_token(),
    ));
    let summary_handle = tokio::spawn(summary::run_summary_loop(
        store.clone(),
        broadcaster.clone(),
        config.reminders.weekday(),
        config.reminders.summary_hour,
        cancel.child_token(),
    ));
    let poll_cancel = cancel.child_token();
    let poll_handle = tokio::spawn(async move {
        polling::run_polling_loop(&api, bot, poll_cancel).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    cancel.cancel();
    let _ = tokio::join!(poll_handle, reminder_handle, summary_handle);

    Ok(())
}
