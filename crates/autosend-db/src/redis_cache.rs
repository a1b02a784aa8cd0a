//! Redis delivery cache.
//!
//! Each successful delivery is stored as a hash at `{prefix}{delivery_id}`
//! with the fields `message`, `message_id` and `sent_at` (RFC 3339).
//! `message_id` holds the delivery ID acknowledged by the transport.

use std::collections::HashMap;

use async_trait::async_trait;
use autosend_core::config::CacheConfig;
use autosend_core::error::{AutosendError, Result};
use autosend_core::{DeliveryCache, DeliveryRecord, SentMessages};
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// SCAN page size hint.
const SCAN_COUNT: usize = 100;

/// Delivery cache over a reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisDeliveryCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisDeliveryCache {
    /// Connect to Redis. Supports `redis://` and `rediss://` URLs.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| AutosendError::Cache(format!("Invalid Redis URL: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AutosendError::Cache(format!("Failed to connect to Redis: {e}")))?;
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AutosendError::Cache(format!("Redis ping failed: {e}")))?;
        Ok(())
    }

    fn key(&self, delivery_id: &str) -> String {
        record_key(&self.key_prefix, delivery_id)
    }

    /// Collect every key under the prefix with a SCAN cursor loop.
    async fn scan_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| AutosendError::Cache(format!("SCAN {pattern} failed: {e}")))?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

fn record_key(prefix: &str, delivery_id: &str) -> String {
    format!("{prefix}{delivery_id}")
}

fn record_fields(record: &DeliveryRecord) -> [(&'static str, String); 3] {
    [
        ("message", record.message.clone()),
        ("message_id", record.delivery_id.clone()),
        ("sent_at", record.sent_at.to_rfc3339()),
    ]
}

/// Rebuild a record from a `HGETALL` reply.
fn decode_record(key: &str, fields: &HashMap<String, String>) -> Result<DeliveryRecord> {
    let field = |name: &str| {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| AutosendError::Cache(format!("Cached record {key} is missing '{name}'")))
    };
    let sent_at = field("sent_at")?;
    let sent_at = DateTime::parse_from_rfc3339(&sent_at)
        .map_err(|e| AutosendError::Cache(format!("Cached record {key} has invalid sent_at: {e}")))?
        .with_timezone(&Utc);
    Ok(DeliveryRecord {
        message: field("message")?,
        delivery_id: field("message_id")?,
        sent_at,
    })
}

#[async_trait]
impl DeliveryCache for RedisDeliveryCache {
    async fn record(&self, record: &DeliveryRecord) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = self.key(&record.delivery_id);
        let _: () = conn
            .hset_multiple(&key, &record_fields(record))
            .await
            .map_err(|e| AutosendError::Cache(format!("HSET {key} failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl SentMessages for RedisDeliveryCache {
    async fn list(&self) -> Result<Vec<DeliveryRecord>> {
        let mut conn = self.conn.clone();
        let mut records = Vec::new();
        for key in self.scan_keys().await? {
            let fields: HashMap<String, String> = conn
                .hgetall(&key)
                .await
                .map_err(|e| AutosendError::Cache(format!("HGETALL {key} failed: {e}")))?;
            // Expired or deleted between SCAN and HGETALL.
            if fields.is_empty() {
                continue;
            }
            records.push(decode_record(&key, &fields)?);
        }
        records.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeliveryRecord {
        DeliveryRecord {
            message: "Accepted".into(),
            delivery_id: "67f2f8a8-ea58-4ed0-a6f9-ff217df4d849".into(),
            sent_at: DateTime::parse_from_rfc3339("2026-03-01T10:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_record_key_uses_prefix() {
        assert_eq!(record_key("sent_message_", "abc"), "sent_message_abc");
    }

    #[test]
    fn test_fields_decode_back() {
        let record = sample();
        let fields: HashMap<String, String> = record_fields(&record)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let decoded = decode_record("sent_message_x", &fields).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_missing_field_is_cache_error() {
        let mut fields = HashMap::new();
        fields.insert("message".to_string(), "Accepted".to_string());
        fields.insert("sent_at".to_string(), "2026-03-01T10:15:00Z".to_string());
        let err = decode_record("sent_message_x", &fields).unwrap_err();
        assert!(matches!(err, AutosendError::Cache(_)));
        assert!(err.to_string().contains("message_id"));
    }

    #[test]
    fn test_hash_uses_message_id_field() {
        let fields = record_fields(&sample());
        let names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["message", "message_id", "sent_at"]);
        assert_eq!(fields[1].1, "67f2f8a8-ea58-4ed0-a6f9-ff217df4d849");
    }

    #[test]
    fn test_decodes_hash_keyed_by_message_id() {
        let fields: HashMap<String, String> = [
            ("message", "Accepted"),
            ("message_id", "b7e1c2d4"),
            ("sent_at", "2026-03-01T13:15:00+03:00"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let record = decode_record("sent_message_b7e1c2d4", &fields).unwrap();
        assert_eq!(record.delivery_id, "b7e1c2d4");
        assert_eq!(record.sent_at.to_rfc3339(), "2026-03-01T10:15:00+00:00");
    }

    #[test]
    fn test_bad_timestamp_is_cache_error() {
        let mut fields = HashMap::new();
        fields.insert("message".to_string(), "Accepted".to_string());
        fields.insert("message_id".to_string(), "d1".to_string());
        fields.insert("sent_at".to_string(), "yesterday".to_string());
        let err = decode_record("sent_message_d1", &fields).unwrap_err();
        assert!(err.to_string().contains("invalid sent_at"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_record_then_list_live() {
        let url = std::env::var("REDIS_ADDR").expect("REDIS_ADDR must be set");
        let config = CacheConfig {
            url,
            key_prefix: format!("autosend_test_{}_", Utc::now().timestamp_millis()),
        };
        let cache = RedisDeliveryCache::connect(&config).await.unwrap();
        cache.ping().await.unwrap();

        let record = sample();
        cache.record(&record).await.unwrap();
        // Re-recording the same delivery overwrites, not duplicates.
        cache.record(&record).await.unwrap();

        let listed = cache.list().await.unwrap();
        assert_eq!(listed, vec![record]);
    }
}
