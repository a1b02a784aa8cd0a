//! # Autosend Core
//!
//! Shared building blocks for the Autosend dispatcher:
//! - Data model: [`PendingMessage`], [`MessageStatus`], [`DeliveryRecord`]
//! - Collaborator traits: [`MessageStore`], [`Transport`], [`DeliveryCache`], [`SentMessages`]
//! - Logging decorators that wrap any collaborator ([`logged`])
//! - Configuration ([`config::AutosendConfig`]) and the process [`shutdown`] signal

pub mod config;
pub mod error;
pub mod logged;
pub mod shutdown;
pub mod traits;
pub mod types;

pub use error::{AutosendError, Result};
pub use traits::{DeliveryCache, MessageStore, SentMessages, Transport};
pub use types::{DeliveryRecord, MessageStatus, PendingMessage};
