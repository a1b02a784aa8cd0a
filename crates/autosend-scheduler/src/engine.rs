//! Scheduler engine — the control loop that drives the dispatch pipeline.
//!
//! One loop owns the interval timer and serializes three event sources:
//! timer ticks, start/stop requests from [`SchedulerHandle`], and the process
//! shutdown signal. A cycle runs inside the loop, so nothing else is
//! observed until it finishes.
//!
//! ```text
//!   RUNNING ──stop──> PAUSED          RUNNING ──tick──> run_cycle ──ok──> RUNNING
//!   PAUSED  ──start─> RUNNING (rearm)          └──err──> run() returns Err
//!   RUNNING ──start─> RUNNING (rearm)  any ──shutdown──> run() returns Ok(cause)
//!   PAUSED  ──stop──> PAUSED
//! ```

use std::time::Duration;

use autosend_core::shutdown::ShutdownSignal;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::dispatch::{DispatchError, DispatchPipeline};

/// Scheduler failures.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A dispatch cycle failed; the scheduler has terminated.
    #[error("dispatch cycle failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The control loop is gone, so a start/stop request had no receiver.
    #[error("scheduler control loop is not running")]
    ControlLoopClosed,
}

/// Timer state of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Timer armed; ticks run dispatch cycles.
    Running,
    /// Timer disarmed; no cycles run.
    Paused,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Start,
    Stop,
}

struct ControlRequest {
    command: Control,
    accepted: oneshot::Sender<()>,
}

/// Cloneable handle used by HTTP handlers to pause and resume dispatch.
#[derive(Clone)]
pub struct SchedulerHandle {
    control_tx: mpsc::Sender<ControlRequest>,
}

impl SchedulerHandle {
    /// Resume dispatch: rearm the timer with a full fresh interval.
    ///
    /// Resolves once the control loop has taken the request. While a cycle
    /// is in flight this waits for it to finish.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        self.send(Control::Start).await
    }

    /// Pause dispatch: disarm the timer. Already-claimed messages are unaffected.
    ///
    /// Same hand-off semantics as [`SchedulerHandle::start`].
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.send(Control::Stop).await
    }

    async fn send(&self, command: Control) -> Result<(), SchedulerError> {
        let (accepted, taken) = oneshot::channel();
        self.control_tx
            .send(ControlRequest { command, accepted })
            .await
            .map_err(|_| SchedulerError::ControlLoopClosed)?;
        taken.await.map_err(|_| SchedulerError::ControlLoopClosed)
    }
}

/// The dispatch scheduler. Construct once, hand the [`SchedulerHandle`] to
/// callers, and drive [`Scheduler::run`] on its own task.
pub struct Scheduler {
    pipeline: DispatchPipeline,
    interval: Duration,
    control_rx: mpsc::Receiver<ControlRequest>,
}

impl Scheduler {
    pub fn new(pipeline: DispatchPipeline, interval: Duration) -> (Self, SchedulerHandle) {
        // Capacity 1 plus the `accepted` reply makes each request a rendezvous.
        let (control_tx, control_rx) = mpsc::channel(1);
        let scheduler = Self {
            pipeline,
            interval,
            control_rx,
        };
        (scheduler, SchedulerHandle { control_tx })
    }

    /// Run the control loop until shutdown or the first failed cycle.
    ///
    /// Returns `Ok(cause)` when `shutdown` fires and `Err` with the dispatch
    /// failure otherwise. Shutdown is only observed between events: a cycle
    /// already running completes (or fails) first.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<String, SchedulerError> {
        tracing::info!(
            "⏰ Scheduler started (dispatch every {}s, batch limit {})",
            self.interval.as_secs(),
            self.pipeline.batch_limit()
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut state = SchedulerState::Running;

        loop {
            tokio::select! {
                biased;

                cause = shutdown.wait() => {
                    tracing::info!("⏹️ Scheduler shutting down: {cause}");
                    return Ok(cause);
                }

                Some(request) = self.control_rx.recv() => {
                    state = self.apply(request.command, state, &mut ticker);
                    // The requester may have given up waiting; nothing to undo.
                    let _ = request.accepted.send(());
                }

                _ = ticker.tick(), if state == SchedulerState::Running => {
                    if let Err(e) = self.pipeline.run_cycle().await {
                        tracing::error!(
                            operation = e.operation(),
                            message_id = e.message_id().unwrap_or("-"),
                            "❌ Dispatch cycle failed, stopping scheduler: {e}"
                        );
                        return Err(e.into());
                    }
                }
            }
        }
    }

    fn apply(
        &self,
        command: Control,
        state: SchedulerState,
        ticker: &mut tokio::time::Interval,
    ) -> SchedulerState {
        match (command, state) {
            (Control::Stop, SchedulerState::Running) => {
                tracing::info!("⏸️ Scheduler paused");
                SchedulerState::Paused
            }
            (Control::Stop, SchedulerState::Paused) => {
                tracing::debug!("Scheduler already paused");
                SchedulerState::Paused
            }
            (Control::Start, previous) => {
                ticker.reset();
                tracing::info!(
                    "▶️ Scheduler resumed (was {previous}), next dispatch in {}s",
                    self.interval.as_secs()
                );
                SchedulerState::Running
            }
        }
    }
}
