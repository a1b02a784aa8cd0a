//! Transport trait — delivers one message to its recipient.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DeliveryRecord, PendingMessage};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` and return the recipient's acknowledgement.
    async fn deliver(&self, message: &PendingMessage) -> Result<DeliveryRecord>;

    /// Transport name, used in logs.
    fn name(&self) -> &str;
}
