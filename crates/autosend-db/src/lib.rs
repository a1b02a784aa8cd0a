//! # Autosend DB
//! Backing services for the dispatch pipeline.
//!
//! - [`PostgresMessageStore`]: the `messages` table, claimed with row locks
//! - [`RedisDeliveryCache`]: one hash per successful delivery

pub mod postgres;
pub mod redis_cache;

pub use postgres::PostgresMessageStore;
pub use redis_cache::RedisDeliveryCache;
