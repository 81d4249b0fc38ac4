//! duebot-scheduler: background reminder and summary loops.
//!
//! Both loops run on the cooperative tokio scheduler next to the command
//! polling loop. Delivery is fire-and-forget per cycle: a failed send is
//! logged and not retried; the next cycle re-evaluates from scratch.

pub mod reminders;
pub mod summary;

use async_trait::async_trait;

/// Outbound delivery seam for scheduled notifications.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Deliver one message to the broadcast channel.
    async fn broadcast(&self, text: String) -> anyhow::Result<()>;
}
