//! In-memory stores for local runs and tests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::StoreError;
use crate::policy::{CommunityId, ConfigStore, RawPolicyRecord};
use crate::session::{ActionContext, SessionStore};

/// Default session lifetime.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(600);

/// Process-local configuration and session store.
pub struct MemoryStore {
    policies: DashMap<CommunityId, RawPolicyRecord>,
    sessions: DashMap<String, (ActionContext, Instant)>,
    session_ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_session_ttl(DEFAULT_SESSION_TTL)
    }

    pub fn with_session_ttl(session_ttl: Duration) -> Self {
        Self {
            policies: DashMap::new(),
            sessions: DashMap::new(),
            session_ttl,
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, community: &CommunityId) -> Result<Option<RawPolicyRecord>, StoreError> {
        Ok(self.policies.get(community).map(|entry| entry.clone()))
    }

    async fn set(&self, community: &CommunityId, record: RawPolicyRecord) -> Result<(), StoreError> {
        self.policies
            .entry(community.clone())
            .or_default()
            .extend(record);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, key: &str, context: &ActionContext) -> Result<(), StoreError> {
        let now = Instant::now();
        self.sessions.retain(|_, (_, expires_at)| *expires_at > now);

        let expires_at = now + self.session_ttl;
        self.sessions
            .insert(key.to_string(), (context.clone(), expires_at));
        Ok(())
    }

    async fn consume(&self, key: &str) -> Result<Option<ActionContext>, StoreError> {
        Ok(self
            .sessions
            .remove(key)
            .filter(|(_, (_, expires_at))| *expires_at > Instant::now())
            .map(|(_, (context, _))| context))
    }
}
