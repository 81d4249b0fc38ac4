//! Telegram Bot channel for duebot.
//!
//! Uses the Telegram Bot API with long-polling (no webhook required).
//! The polling loop converts updates into deadline commands handled by
//! [`handler::DeadlineBot`]; the scheduler broadcasts through
//! [`handler::TelegramBroadcaster`].

pub mod api;
pub mod handler;
pub mod polling;
pub mod types;

pub use api::TelegramApi;
pub use handler::{DeadlineBot, TelegramBroadcaster};
