//! Compatibility score caches keyed by unordered user pair.
//!
//! Entries never expire: a score reflects the two profiles as they were when
//! it was first computed.

use crate::domain::PairKey;
use crate::error::{AppError, Result};
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[async_trait::async_trait]
pub trait ScoreCache: Send + Sync {
    async fn get(&self, key: PairKey) -> Result<Option<u8>>;

    async fn put(&self, key: PairKey, score: u8) -> Result<()>;
}

/// Process-wide map; concurrent writers for the same key are last-writer-wins.
#[derive(Default)]
pub struct InMemoryScoreCache {
    entries: DashMap<PairKey, u8>,
}

impl InMemoryScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl ScoreCache for InMemoryScoreCache {
    async fn get(&self, key: PairKey) -> Result<Option<u8>> {
        Ok(self.entries.get(&key).map(|entry| *entry))
    }

    async fn put(&self, key: PairKey, score: u8) -> Result<()> {
        self.entries.insert(key, score);
        Ok(())
    }
}

/// Redis-backed cache shared by every service instance
#[derive(Clone)]
pub struct RedisScoreCache {
    conn: ConnectionManager,
}

impl RedisScoreCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn redis_key(key: PairKey) -> String {
        format!("compat:{}", key)
    }
}

#[async_trait::async_trait]
impl ScoreCache for RedisScoreCache {
    async fn get(&self, key: PairKey) -> Result<Option<u8>> {
        let mut conn = self.conn.clone();
        let value: Option<i64> = conn.get(Self::redis_key(key)).await?;

        value
            .map(|v| {
                u8::try_from(v)
                    .ok()
                    .filter(|s| *s <= 100)
                    .ok_or_else(|| AppError::Internal(format!("cached score out of range: {}", v)))
            })
            .transpose()
    }

    async fn put(&self, key: PairKey, score: u8) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::redis_key(key), i64::from(score))
            .await?;
        Ok(())
    }
}
