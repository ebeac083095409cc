use async_trait::async_trait;
use thiserror::Error;

use crate::domain::item::Item;

pub mod command;
pub mod discord;

pub use command::CommandNotifier;
pub use discord::DiscordNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier misconfigured: {0}")]
    Configuration(String),
    #[error("failed to build notifier: {0}")]
    Build(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Per-batch delivery counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers matched items to a channel.
///
/// Implementations send one message per item. A failed item is logged and
/// counted without stopping the rest of the batch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, items: &[Item], target: &str) -> NotifyResult<NotifyOutcome>;
}

/// Human-readable notification line for an item.
pub fn format_message(item: &Item) -> String {
    if item.link.is_empty() {
        format!("Matched content: {}", item.title)
    } else {
        format!("Matched content: {} - {}", item.title, item.link)
    }
}
