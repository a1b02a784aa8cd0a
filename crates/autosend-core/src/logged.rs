//! Logging decorators — wrap any collaborator, log the outcome, pass the result through.
//!
//! ```text
//! LoggedStore<PostgresMessageStore>  ─┐
//! LoggedTransport<WebhookTransport>  ─┼─> DispatchPipeline
//! LoggedCache<RedisDeliveryCache>    ─┘
//! ```
//!
//! Decorators never alter a value or an error; they only observe.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::{DeliveryCache, MessageStore, SentMessages, Transport};
use crate::types::{DeliveryRecord, MessageStatus, PendingMessage};

/// Logs every [`MessageStore`] call.
pub struct LoggedStore<S> {
    inner: S,
}

impl<S: MessageStore> LoggedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: MessageStore> MessageStore for LoggedStore<S> {
    async fn claim_pending(&self, limit: usize) -> Result<Vec<PendingMessage>> {
        match self.inner.claim_pending(limit).await {
            Ok(messages) if messages.is_empty() => {
                tracing::debug!(limit, "claim_pending: nothing pending");
                Ok(messages)
            }
            Ok(messages) => {
                tracing::debug!(limit, count = messages.len(), "claim_pending: claimed messages");
                Ok(messages)
            }
            Err(e) => {
                tracing::error!(limit, error = %e, "claim_pending failed");
                Err(e)
            }
        }
    }

    async fn set_status(&self, id: &str, status: MessageStatus) -> Result<()> {
        match self.inner.set_status(id, status).await {
            Ok(()) => {
                tracing::debug!(message_id = %id, status = %status, "set_status: updated");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    message_id = %id,
                    status = %status,
                    error = %e,
                    "set_status failed"
                );
                Err(e)
            }
        }
    }
}

/// Logs every [`Transport`] delivery.
pub struct LoggedTransport<T> {
    inner: T,
}

impl<T: Transport> LoggedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggedTransport<T> {
    async fn deliver(&self, message: &PendingMessage) -> Result<DeliveryRecord> {
        match self.inner.deliver(message).await {
            Ok(record) => {
                tracing::info!(
                    transport = self.inner.name(),
                    message_id = %message.id,
                    delivery_id = %record.delivery_id,
                    "📨 Message delivered"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::error!(
                    transport = self.inner.name(),
                    message_id = %message.id,
                    error = %e,
                    "delivery failed"
                );
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Logs every cache write and listing.
pub struct LoggedCache<C> {
    inner: C,
}

impl<C> LoggedCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: DeliveryCache> DeliveryCache for LoggedCache<C> {
    async fn record(&self, record: &DeliveryRecord) -> Result<()> {
        match self.inner.record(record).await {
            Ok(()) => {
                tracing::debug!(delivery_id = %record.delivery_id, "cache record: stored");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    delivery_id = %record.delivery_id,
                    error = %e,
                    "cache record failed"
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<C: SentMessages> SentMessages for LoggedCache<C> {
    async fn list(&self) -> Result<Vec<DeliveryRecord>> {
        match self.inner.list().await {
            Ok(records) if records.is_empty() => {
                tracing::debug!("cache list: no delivered messages");
                Ok(records)
            }
            Ok(records) => {
                tracing::debug!(count = records.len(), "cache list: loaded");
                Ok(records)
            }
            Err(e) => {
                tracing::error!(error = %e, "cache list failed");
                Err(e)
            }
        }
    }
}
