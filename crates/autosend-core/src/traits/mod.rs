//! Collaborator traits consumed by the dispatch pipeline.
//!
//! Implementations live in `autosend-db` (store, cache) and
//! `autosend-channels` (transport); logging decorators in [`crate::logged`].

pub mod cache;
pub mod store;
pub mod transport;

pub use cache::{DeliveryCache, SentMessages};
pub use store::MessageStore;
pub use transport::Transport;
