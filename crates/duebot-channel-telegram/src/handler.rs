//! Inbound command handling and outbound broadcast delivery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use tracing::debug;

use duebot_core::command::{self, Command, Horizon};
use duebot_scheduler::Broadcaster;
use duebot_storage::DeadlineStore;
use duebot_types::DeadlineRecord;

use crate::api::TelegramApi;
use crate::types::{BotCommand, SendMessageParams, SetMyCommandsParams, TgMessage};

/// The deadline bot: routes chat commands through the core and the store.
pub struct DeadlineBot {
    api: TelegramApi,
    store: Arc<DeadlineStore>,
    admin_id: i64,
    broadcast_chat_id: i64,
}

impl DeadlineBot {
    pub fn new(
        api: TelegramApi,
        store: Arc<DeadlineStore>,
        admin_id: i64,
        broadcast_chat_id: i64,
    ) -> Self {
        Self {
            api,
            store,
            admin_id,
            broadcast_chat_id,
        }
    }

    /// Register the command menu with Telegram.
    pub async fn register_commands(&self) -> anyhow::Result<()> {
        let commands = [
            ("start", "Greeting"),
            ("help", "Show available commands"),
            ("add", "Add a deadline (admin)"),
            ("list", "List deadlines by class"),
            ("delete", "Delete a deadline by id (admin)"),
            ("today", "Deadlines due today"),
            ("week", "Deadlines due within a week"),
            ("month", "Deadlines due within a month"),
            ("soon", "Deadlines due within a week"),
            ("upcoming", "The next three deadlines"),
        ]
        .into_iter()
        .map(|(command, description)| BotCommand {
            command: command.into(),
            description: description.into(),
        })
        .collect();
        self.api
            .set_my_commands(&SetMyCommandsParams { commands })
            .await
    }

    /// Handle one inbound message, replying in the same chat.
    ///
    /// `now` is sampled once here and threaded through every resolver and
    /// filter call, so one reply sees one consistent snapshot.
    pub async fn handle_message(&self, msg: &TgMessage) -> anyhow::Result<()> {
        let Some(text) = msg.text.as_deref() else {
            return Ok(());
        };
        let Some(cmd) = Command::parse(text) else {
            return Ok(());
        };
        let sender_id = msg.from.as_ref().map(|u| u.id).unwrap_or(msg.chat.id);
        debug!(chat_id = msg.chat.id, sender_id, ?cmd, "Handling command");

        if cmd.is_privileged() && sender_id != self.admin_id {
            return self.reply(msg.chat.id, command::DENIED.into()).await;
        }

        let now = Local::now().naive_local();
        let reply = match &cmd {
            Command::Add(args) => match command::parse_add(args, now) {
                Ok(deadline) => {
                    self.store.add(&deadline).await?;
                    command::add_ack(&deadline)
                }
                Err(e) => e.to_string(),
            },
            Command::Delete(args) => match command::parse_delete(args) {
                Ok(id) => {
                    // Deleting a missing id is a silent no-op
                    self.store.delete(id).await?;
                    command::DELETED_TEXT.to_string()
                }
                Err(e) => e.to_string(),
            },
            Command::TestNotify => {
                let records = self.fetch(&cmd, now).await?;
                let summary = command::weekly_summary(&records, now);
                self.reply(self.broadcast_chat_id, summary).await?;
                "Test notification sent ✓".to_string()
            }
            _ => {
                let records = self.fetch(&cmd, now).await?;
                command::query_reply(&cmd, &records, now).unwrap_or_default()
            }
        };
        self.reply(msg.chat.id, reply).await
    }

    /// Fetch the record set a command operates on. Horizon commands go
    /// through the store's coarse pre-filter (a superset; the core
    /// re-filters after resolution), everything else reads all rows.
    async fn fetch(&self, cmd: &Command, now: NaiveDateTime) -> anyhow::Result<Vec<DeadlineRecord>> {
        let records = match cmd {
            Command::Today => {
                self.store
                    .list_due_within(now + Duration::days(Horizon::Today.days()))
                    .await?
            }
            Command::Week | Command::Soon | Command::TestNotify => {
                self.store
                    .list_due_within(now + Duration::days(Horizon::Week.days()))
                    .await?
            }
            Command::Month => {
                self.store
                    .list_due_within(now + Duration::days(Horizon::Month.days()))
                    .await?
            }
            _ => self.store.list_all().await?,
        };
        Ok(records)
    }

    async fn reply(&self, chat_id: i64, text: String) -> anyhow::Result<()> {
        self.api
            .send_message(&SendMessageParams { chat_id, text })
            .await?;
        Ok(())
    }
}

/// Sends scheduler notifications to the configured broadcast chat.
pub struct TelegramBroadcaster {
    api: TelegramApi,
    chat_id: i64,
}

impl TelegramBroadcaster {
    pub fn new(api: TelegramApi, chat_id: i64) -> Self {
        Self { api, chat_id }
    }
}

#[async_trait]
impl Broadcaster for TelegramBroadcaster {
    async fn broadcast(&self, text: String) -> anyhow::Result<()> {
        self.api
            .send_message(&SendMessageParams {
                chat_id: self.chat_id,
                text,
            })
            .await?;
        Ok(())
    }
}
