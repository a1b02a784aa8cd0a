//! Dispatch pipeline — one cycle: claim → deliver → record → mark sent.
//!
//! Messages are processed one at a time, in the order the store returned
//! them. The first failure aborts the cycle: messages before it are already
//! `sent`, the failing one and everything after it stay `pending`.

use std::sync::Arc;

use autosend_core::{AutosendError, DeliveryCache, MessageStatus, MessageStore, Transport};
use thiserror::Error;

/// A failed dispatch cycle, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("claim_pending failed: {source}")]
    Claim {
        #[source]
        source: AutosendError,
    },

    #[error("deliver failed for message {message_id}: {source}")]
    Deliver {
        message_id: String,
        #[source]
        source: AutosendError,
    },

    #[error("cache record failed for message {message_id} (delivery {delivery_id}): {source}")]
    Record {
        message_id: String,
        delivery_id: String,
        #[source]
        source: AutosendError,
    },

    #[error("mark sent failed for message {message_id}: {source}")]
    MarkSent {
        message_id: String,
        #[source]
        source: AutosendError,
    },
}

impl DispatchError {
    /// Name of the collaborator operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            DispatchError::Claim { .. } => "claim_pending",
            DispatchError::Deliver { .. } => "deliver",
            DispatchError::Record { .. } => "record",
            DispatchError::MarkSent { .. } => "set_status",
        }
    }

    /// The message being processed when the cycle failed (none for a claim failure).
    pub fn message_id(&self) -> Option<&str> {
        match self {
            DispatchError::Claim { .. } => None,
            DispatchError::Deliver { message_id, .. }
            | DispatchError::Record { message_id, .. }
            | DispatchError::MarkSent { message_id, .. } => Some(message_id),
        }
    }
}

/// Runs dispatch cycles against the three collaborators.
pub struct DispatchPipeline {
    store: Arc<dyn MessageStore>,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn DeliveryCache>,
    batch_limit: usize,
}

impl DispatchPipeline {
    pub fn new(
        store: Arc<dyn MessageStore>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn DeliveryCache>,
        batch_limit: usize,
    ) -> Self {
        Self {
            store,
            transport,
            cache,
            batch_limit,
        }
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Execute exactly one cycle.
    pub async fn run_cycle(&self) -> Result<(), DispatchError> {
        let messages = self
            .store
            .claim_pending(self.batch_limit)
            .await
            .map_err(|source| DispatchError::Claim { source })?;

        if messages.is_empty() {
            tracing::debug!("Dispatch cycle: nothing pending");
            return Ok(());
        }

        let claimed = messages.len();
        for message in messages {
            let record = self
                .transport
                .deliver(&message)
                .await
                .map_err(|source| DispatchError::Deliver {
                    message_id: message.id.clone(),
                    source,
                })?;

            self.cache
                .record(&record)
                .await
                .map_err(|source| DispatchError::Record {
                    message_id: message.id.clone(),
                    delivery_id: record.delivery_id.clone(),
                    source,
                })?;

            self.store
                .set_status(&message.id, MessageStatus::Sent)
                .await
                .map_err(|source| DispatchError::MarkSent {
                    message_id: message.id.clone(),
                    source,
                })?;
        }

        tracing::info!(
            "✅ Dispatch cycle complete: {claimed} message(s) sent via {}",
            self.transport.name()
        );
        Ok(())
    }
}
