//! Redis Stores
//!
//! Settings live in one hash per community (`{prefix}:{community}`),
//! each field holding a JSON-encoded value, so `HSET` gives partial-update
//! merge semantics for free. Sessions are plain keys with an `EX` expiry,
//! consumed with `GETDEL`.

use std::collections::HashMap;

use async_trait::async_trait;
use fred::prelude::*;
use tracing::debug;

use super::StoreError;
use crate::policy::{CommunityId, ConfigStore, RawPolicyRecord};
use crate::session::{ActionContext, SessionStore};

/// Redis-backed configuration and session store.
#[derive(Clone)]
pub struct RedisStore {
    redis: Client,
    settings_prefix: String,
    session_ttl_secs: i64,
}

impl RedisStore {
    pub fn new(redis: Client, settings_prefix: impl Into<String>, session_ttl_secs: i64) -> Self {
        Self {
            redis,
            settings_prefix: settings_prefix.into(),
            session_ttl_secs,
        }
    }

    fn settings_key(&self, community: &CommunityId) -> String {
        format!("{}:{community}", self.settings_prefix)
    }
}

#[async_trait]
impl ConfigStore for RedisStore {
    async fn get(&self, community: &CommunityId) -> Result<Option<RawPolicyRecord>, StoreError> {
        let data: HashMap<String, String> = self.redis.hgetall(self.settings_key(community)).await?;
        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    async fn set(&self, community: &CommunityId, record: RawPolicyRecord) -> Result<(), StoreError> {
        if record.is_empty() {
            return Ok(());
        }
        let key = self.settings_key(community);
        let _: () = self.redis.hset(&key, record).await?;
        debug!(key = %key, "Settings hash written");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn create(&self, key: &str, context: &ActionContext) -> Result<(), StoreError> {
        let payload = serde_json::to_string(context)?;
        let _: () = self
            .redis
            .set(
                key,
                payload,
                Some(Expiration::EX(self.session_ttl_secs)),
                None,
                false,
            )
            .await?;
        Ok(())
    }

    async fn consume(&self, key: &str) -> Result<Option<ActionContext>, StoreError> {
        let payload: Option<String> = self.redis.getdel(key).await?;
        payload
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }
}
