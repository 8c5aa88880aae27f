//! Policy persistence through the configuration store.
//!
//! The store holds one flat record per community: field key to a
//! JSON-encoded value. Loading is lenient field by field; saving merges
//! only the fields present in a [`PolicyPatch`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::diff::{diff, ChangeDescription};
use super::normalize::normalize_entries;
use super::types::{CommunityId, CommunityPolicy, PolicyField, PolicyValue, RawPolicyRecord};
use crate::db::StoreError;

/// Configuration store collaborator.
///
/// `set` must merge the given fields into the existing record, leaving
/// fields absent from `record` untouched.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, community: &CommunityId) -> Result<Option<RawPolicyRecord>, StoreError>;

    async fn set(&self, community: &CommunityId, record: RawPolicyRecord) -> Result<(), StoreError>;
}

/// A partial policy update. Only the fields set here are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyPatch {
    entries: BTreeMap<PolicyField, PolicyValue>,
}

impl PolicyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: PolicyField, value: PolicyValue) -> Self {
        self.entries.insert(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PolicyField, &PolicyValue)> {
        self.entries.iter().map(|(field, value)| (*field, value))
    }

    fn to_record(&self) -> Result<RawPolicyRecord, serde_json::Error> {
        self.iter()
            .map(|(field, value)| {
                encode_value(value).map(|encoded| (field.key().to_string(), encoded))
            })
            .collect()
    }
}

fn encode_value(value: &PolicyValue) -> Result<String, serde_json::Error> {
    match value {
        PolicyValue::Flag(flag) => serde_json::to_string(flag),
        PolicyValue::Communities(list) => serde_json::to_string(list),
        PolicyValue::Text(text) => serde_json::to_string(text),
        PolicyValue::Timestamp(Some(at)) => serde_json::to_string(at),
        PolicyValue::Timestamp(None) => serde_json::to_string(""),
    }
}

fn decode_value(field: PolicyField, raw: &str) -> Result<PolicyValue, serde_json::Error> {
    Ok(match field {
        PolicyField::BanAllowListEnabled | PolicyField::NoteAllowListEnabled => {
            PolicyValue::Flag(serde_json::from_str(raw)?)
        }
        PolicyField::BanAllowList
        | PolicyField::BanDenyList
        | PolicyField::NoteAllowList
        | PolicyField::NoteDenyList
        | PolicyField::OtherSubreddits => {
            let entries: Vec<String> = serde_json::from_str(raw)?;
            PolicyValue::Communities(normalize_entries(entries))
        }
        PolicyField::DefaultUserMessage => PolicyValue::Text(serde_json::from_str(raw)?),
        PolicyField::LastUpdated => {
            let text: String = serde_json::from_str(raw)?;
            if text.is_empty() {
                PolicyValue::Timestamp(None)
            } else {
                let at: DateTime<Utc> = serde_json::from_value(serde_json::Value::String(text))?;
                PolicyValue::Timestamp(Some(at))
            }
        }
    })
}

/// Build a policy from a stored record.
///
/// Unknown keys and undecodable values are logged and skipped, leaving
/// the affected field at its zero value.
pub fn policy_from_record(community: &CommunityId, record: &RawPolicyRecord) -> CommunityPolicy {
    let mut policy = CommunityPolicy::default();

    for (key, raw) in record {
        let Some(field) = PolicyField::from_key(key) else {
            error!(community = %community, key = %key, "Invalid key in stored settings");
            continue;
        };

        match decode_value(field, raw) {
            Ok(value) => policy.apply(field, value),
            Err(e) => {
                warn!(
                    community = %community,
                    key = %key,
                    error = %e,
                    "Failed to parse stored setting, using default"
                );
            }
        }
    }

    policy
}

/// Loads and saves community policies.
#[derive(Clone)]
pub struct PolicyService {
    store: Arc<dyn ConfigStore>,
}

impl PolicyService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Load a community's policy. A missing record is the all-zero policy.
    #[tracing::instrument(skip(self), fields(community = %community))]
    pub async fn load(&self, community: &CommunityId) -> Result<CommunityPolicy, StoreError> {
        info!("Loading settings");
        match self.store.get(community).await? {
            Some(record) => Ok(policy_from_record(community, &record)),
            None => Ok(CommunityPolicy::default()),
        }
    }

    /// Write the fields in `patch`, stamping `lastUpdated`.
    #[tracing::instrument(skip(self, patch), fields(community = %community))]
    pub async fn save(&self, community: &CommunityId, patch: &PolicyPatch) -> Result<(), StoreError> {
        let stamped = patch
            .clone()
            .with(PolicyField::LastUpdated, PolicyValue::Timestamp(Some(Utc::now())));
        let record = stamped.to_record()?;
        let fields: Vec<&str> = patch.iter().map(|(field, _)| field.key()).collect();

        self.store.set(community, record).await?;
        info!(fields = ?fields, "Settings updated");
        Ok(())
    }

    /// Save `patch` and describe what changed relative to the stored policy.
    pub async fn update(
        &self,
        community: &CommunityId,
        patch: &PolicyPatch,
    ) -> Result<Vec<ChangeDescription>, StoreError> {
        let current = self.load(community).await?;
        let changes = patch
            .iter()
            .filter(|(field, _)| *field != PolicyField::LastUpdated)
            .filter_map(|(field, value)| diff(field, &current.value(field), value))
            .collect();

        self.save(community, patch).await?;
        Ok(changes)
    }
}
