//! Message store trait — durable source of messages awaiting delivery.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MessageStatus, PendingMessage};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Claim up to `limit` waiting messages.
    ///
    /// Selection and the flip to [`MessageStatus::Pending`] must be atomic:
    /// a concurrent claimer never receives the same message. Returns an empty
    /// list when nothing is waiting.
    async fn claim_pending(&self, limit: usize) -> Result<Vec<PendingMessage>>;

    /// Set the status of one message.
    async fn set_status(&self, id: &str, status: MessageStatus) -> Result<()>;
}
