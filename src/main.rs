//! # Autosend — periodic message dispatcher
//!
//! Claims waiting messages from PostgreSQL, delivers them over a webhook,
//! records each delivery in Redis and marks the message sent. Dispatch can
//! be paused and resumed over HTTP.
//!
//! Usage:
//!   autosend                              # ~/.autosend/config.toml + env
//!   autosend --config ./autosend.toml     # Explicit config file
//!   autosend --port 9090 --interval-secs 30 --batch-limit 10

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autosend_channels::WebhookTransport;
use autosend_core::config::AutosendConfig;
use autosend_core::logged::{LoggedCache, LoggedStore, LoggedTransport};
use autosend_core::shutdown::Shutdown;
use autosend_db::{PostgresMessageStore, RedisDeliveryCache};
use autosend_gateway::AppState;
use autosend_scheduler::{DispatchPipeline, Scheduler};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "autosend",
    version,
    about = "📨 Autosend — periodic message dispatcher"
)]
struct Cli {
    /// Config file (default: ~/.autosend/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway port
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between dispatch cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Maximum messages claimed per cycle
    #[arg(long)]
    batch_limit: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<AutosendConfig> {
        let mut config = match &self.config {
            Some(path) => AutosendConfig::load_from(path)?,
            None => AutosendConfig::load()?,
        };
        config.apply_env();
        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if let Some(secs) = self.interval_secs {
            config.scheduler.interval_secs = secs;
        }
        if let Some(limit) = self.batch_limit {
            config.scheduler.batch_limit = limit;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "autosend=debug,autosend_core=debug,autosend_scheduler=debug,autosend_db=debug,autosend_channels=debug,autosend_gateway=debug,tower_http=debug"
    } else {
        "autosend=info,autosend_core=info,autosend_scheduler=info,autosend_db=info,autosend_channels=info,autosend_gateway=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = cli.load_config().context("invalid configuration")?;

    let store = PostgresMessageStore::connect(&config.database)
        .await
        .context("message store unavailable")?;
    store.ping().await.context("message store unavailable")?;
    store.migrate().await.context("message store migration failed")?;
    tracing::info!("💾 Connected to PostgreSQL");

    let cache = RedisDeliveryCache::connect(&config.cache)
        .await
        .context("delivery cache unavailable")?;
    cache.ping().await.context("delivery cache unavailable")?;
    tracing::info!("🗄️ Connected to Redis (prefix '{}')", config.cache.key_prefix);

    let transport = WebhookTransport::new(&config.webhook).context("webhook transport")?;
    tracing::info!("📤 Delivering via webhook {}", transport.url());

    let cache = Arc::new(LoggedCache::new(cache));
    let pipeline = DispatchPipeline::new(
        Arc::new(LoggedStore::new(store)),
        Arc::new(LoggedTransport::new(transport)),
        cache.clone(),
        config.scheduler.batch_limit,
    );
    let (scheduler, handle) = Scheduler::new(pipeline, config.scheduler.interval());

    let shutdown = Arc::new(Shutdown::new());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    let gateway_task = {
        let gateway_config = config.gateway.clone();
        let state = AppState {
            scheduler: handle,
            sent: cache,
        };
        let signal = shutdown.subscribe();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let served = autosend_gateway::serve(&gateway_config, state, signal).await;
            if let Err(e) = &served {
                tracing::error!("❌ Gateway server failed: {e}");
                shutdown.trigger(format!("gateway failed: {e}"));
            }
            served
        })
    };

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger("shutdown signal received");
        });
    }

    let outcome = scheduler_task.await.context("scheduler task panicked")?;
    match outcome {
        Ok(cause) => {
            gateway_task
                .await
                .context("gateway task panicked")?
                .context("gateway server failed")?;
            tracing::info!("👋 Autosend stopped cleanly: {cause}");
            Ok(())
        }
        Err(e) => {
            shutdown.trigger(format!("scheduler failed: {e}"));
            gateway_task.await.ok();
            Err(anyhow::Error::new(e).context("dispatch scheduler terminated"))
        }
    }
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("⚠️ Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
