//! Collaborator stand-ins for gateway tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use autosend_core::{
    AutosendError, DeliveryCache, DeliveryRecord, MessageStatus, MessageStore, PendingMessage,
    SentMessages, Transport,
};
use autosend_scheduler::{DispatchPipeline, Scheduler, SchedulerHandle};

pub struct EmptyStore;

#[async_trait]
impl MessageStore for EmptyStore {
    async fn claim_pending(&self, _limit: usize) -> autosend_core::Result<Vec<PendingMessage>> {
        Ok(Vec::new())
    }
    async fn set_status(&self, _id: &str, _status: MessageStatus) -> autosend_core::Result<()> {
        Ok(())
    }
}

pub struct NoTransport;

#[async_trait]
impl Transport for NoTransport {
    async fn deliver(&self, message: &PendingMessage) -> autosend_core::Result<DeliveryRecord> {
        Err(AutosendError::Transport(format!("unexpected delivery of {}", message.id)))
    }
    fn name(&self) -> &str {
        "none"
    }
}

pub struct FixedSent(pub Result<Vec<DeliveryRecord>, String>);

#[async_trait]
impl DeliveryCache for FixedSent {
    async fn record(&self, _record: &DeliveryRecord) -> autosend_core::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SentMessages for FixedSent {
    async fn list(&self) -> autosend_core::Result<Vec<DeliveryRecord>> {
        self.0.clone().map_err(AutosendError::Cache)
    }
}

pub fn scheduler() -> (Scheduler, SchedulerHandle) {
    let pipeline = DispatchPipeline::new(
        Arc::new(EmptyStore),
        Arc::new(NoTransport),
        Arc::new(FixedSent(Ok(Vec::new()))),
        2,
    );
    Scheduler::new(pipeline, Duration::from_secs(120))
}
