//! Process shutdown signal — a cancellation that carries its cause.
//!
//! One [`Shutdown`] is created in `main`; every long-running task receives a
//! [`ShutdownSignal`] from it. The first `trigger` wins; later causes are ignored.

use tokio::sync::watch;

/// Trigger side of the shutdown signal.
pub struct Shutdown {
    tx: watch::Sender<Option<String>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Create a receiver for this signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Only the first cause is kept.
    pub fn trigger(&self, cause: impl Into<String>) {
        let cause = cause.into();
        let fired = self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(cause.clone());
                true
            } else {
                false
            }
        });
        if fired {
            tracing::info!("🛑 Shutdown triggered: {cause}");
        }
    }

}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the shutdown signal.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<String>>,
}

impl ShutdownSignal {
    /// Wait until the signal fires and return its cause.
    ///
    /// If the [`Shutdown`] is dropped without firing, this never resolves.
    pub async fn wait(&mut self) -> String {
        // The watch guard must be released before pending forever.
        let cause = match self.rx.wait_for(Option::is_some).await {
            Ok(cause) => Some(cause.as_deref().unwrap_or_default().to_string()),
            Err(_) => None,
        };
        match cause {
            Some(cause) => cause,
            None => std::future::pending().await,
        }
    }
}
