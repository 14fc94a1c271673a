use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// One entry from a `list` call. `value` is only materialized when the caller
/// asked for values; key-only listings avoid pulling large payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Option<String>,
}

/// Flat string-to-string namespace shared by the pipeline, the repository and
/// the study-plan cache.
///
/// No transactions and no cross-call atomicity: callers must not assume that
/// a `list` followed by a `get` observes a consistent snapshot. The only
/// atomic primitive is `set_if_absent` (a single create-if-absent command).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Stores `value` only if `key` is currently absent.
    /// Returns true when this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool>;

    /// Lists keys matching a glob-style pattern (`*` wildcard). With
    /// `with_values` the matching values are fetched as well; a key deleted
    /// between enumeration and fetch yields `value: None`.
    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvEntry>>;

    /// Deletes every key in the namespace.
    async fn flush(&self) -> Result<()>;
}

/// Redis-backed implementation over a multiplexed connection manager.
#[derive(Clone)]
pub struct RedisKv {
    con: ConnectionManager,
}

impl RedisKv {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid Redis URL")?;
        let con = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { con })
    }
}

#[async_trait]
impl KeyValueStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.con.clone();
        let value: Option<String> = con.get(key).await.context("Redis GET failed")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.con.clone();
        let _: () = con.set(key, value).await.context("Redis SET failed")?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut con = self.con.clone();
        let created: bool = con
            .set_nx(key, value)
            .await
            .context("Redis SETNX failed")?;
        Ok(created)
    }

    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvEntry>> {
        let mut con = self.con.clone();
        let keys: Vec<String> = con.keys(pattern).await.context("Redis KEYS failed")?;

        if !with_values {
            return Ok(keys
                .into_iter()
                .map(|key| KvEntry { key, value: None })
                .collect());
        }

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<String>> =
            con.mget(&keys).await.context("Redis MGET failed")?;

        Ok(keys
            .into_iter()
            .zip(values)
            .map(|(key, value)| KvEntry { key, value })
            .collect())
    }

    async fn flush(&self) -> Result<()> {
        let mut con = self.con.clone();
        redis::cmd("FLUSHDB")
            .query_async::<_, ()>(&mut con)
            .await
            .context("Redis FLUSHDB failed")?;
        Ok(())
    }
}
