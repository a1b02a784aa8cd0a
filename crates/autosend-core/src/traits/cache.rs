//! Delivery cache traits — write side used by the pipeline, read side used by the gateway.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DeliveryRecord;

#[async_trait]
pub trait DeliveryCache: Send + Sync {
    /// Persist a delivery record, overwriting any record with the same delivery ID.
    async fn record(&self, record: &DeliveryRecord) -> Result<()>;
}

#[async_trait]
pub trait SentMessages: Send + Sync {
    /// List every cached delivery record. Order is unspecified.
    async fn list(&self) -> Result<Vec<DeliveryRecord>>;
}
