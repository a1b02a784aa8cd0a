//! # Autosend Scheduler
//!
//! Periodically claims messages awaiting delivery and dispatches them.
//!
//! ## Architecture
//! ```text
//! Scheduler (tokio interval, one control loop)
//!   ├── tick          → DispatchPipeline::run_cycle
//!   │                     ├── MessageStore::claim_pending(N)   waiting → pending
//!   │                     └── for each message, in order:
//!   │                           Transport::deliver
//!   │                           DeliveryCache::record
//!   │                           MessageStore::set_status(sent)
//!   ├── handle.stop() → disarm timer
//!   ├── handle.start()→ rearm timer (full interval from now)
//!   └── shutdown      → return Ok(cause)
//! ```
//!
//! A failed cycle is fatal: `Scheduler::run` returns the error and no
//! further ticks are processed.

pub mod dispatch;
pub mod engine;

#[cfg(test)]
mod testing;

pub use dispatch::{DispatchError, DispatchPipeline};
pub use engine::{Scheduler, SchedulerError, SchedulerHandle, SchedulerState};
