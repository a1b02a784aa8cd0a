//! # Autosend Channels
//! Delivery transports implementing [`autosend_core::Transport`].

pub mod webhook;

pub use webhook::WebhookTransport;
