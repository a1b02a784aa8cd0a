//! Data model — messages awaiting delivery and the records of delivered ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AutosendError;

/// Sending status of a stored message.
///
/// `Waiting` → `Pending` happens inside the store's claim; `Pending` → `Sent`
/// after a successful delivery has been cached. There is no failed state:
/// a message whose cycle aborted stays `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Waiting,
    Pending,
    Sent,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Waiting => "waiting",
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = AutosendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(MessageStatus::Waiting),
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            other => Err(AutosendError::Store(format!("unknown sending status '{other}'"))),
        }
    }
}

/// A message claimed from the store, ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Store-assigned message ID.
    pub id: String,
    /// Recipient address (phone number for the webhook transport).
    pub recipient: String,
    /// Message body.
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Acknowledgement returned by a transport for one delivered message.
///
/// Keyed by `delivery_id`: writing the same record twice overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Acknowledgement text returned by the recipient.
    pub message: String,
    /// Delivery ID assigned by the recipient.
    #[serde(rename = "message_id")]
    pub delivery_id: String,
    pub sent_at: DateTime<Utc>,
}
