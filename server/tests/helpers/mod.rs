//! Reusable test helpers for engine and HTTP integration tests.
//!
//! Provides an in-memory [`FakeBackend`] that records every platform call,
//! a [`CountingStore`] that counts policy loads, a [`Harness`] driving the
//! fan-out engine directly, and [`TestApp`] for sending requests through
//! the full axum router with `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use bh_server::api::{create_router, AppState, MODERATOR_HEADER};
use bh_server::backend::{
    ActionBackend, BackendError, BanParams, CommunityRef, ModNoteParams,
};
use bh_server::config::Config;
use bh_server::db::{MemoryStore, StoreError};
use bh_server::fanout::{ActionForm, ActionRequest, FanOutCoordinator, FanOutError, FanOutReport};
use bh_server::notice::{notice_channel, Notice, NoticeSink};
use bh_server::permissions::{ModPermissions, PermissionEvaluator};
use bh_server::policy::{CommunityId, ConfigStore, PolicyPatch, PolicyService, RawPolicyRecord};
use bh_server::tokens::ContentItem;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Moderator acting in the tests.
pub const MODERATOR: &str = "alice";
/// App account name, matching `Config::default_for_test`.
pub const APP: &str = "banhammer-app";
/// Origin community display name.
pub const ORIGIN: &str = "Origin";
/// Author of the target content.
pub const TARGET: &str = "spammer";
/// Fullname of the target post.
pub const POST_ID: &str = "t3_post1";

pub fn community(name: &str) -> CommunityId {
    CommunityId::parse(name).expect("valid community name")
}

pub fn community_ref(display_name: &str) -> CommunityRef {
    let name = community(display_name);
    CommunityRef {
        id: format!("t5_{name}"),
        name,
        display_name: display_name.to_string(),
    }
}

/// The post every test acts on.
pub fn target_post() -> ContentItem {
    ContentItem::Post {
        id: POST_ID.into(),
        author_name: TARGET.into(),
        subreddit_name: ORIGIN.into(),
    }
}

// ============================================================================
// Fake backend
// ============================================================================

/// Platform call recorded by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ModPermissions { user: String, community: CommunityId },
    Resolve(CommunityId),
    FetchContent(String),
    Ban(BanParams),
    Note(ModNoteParams),
}

/// In-memory platform with configurable moderators and failures.
#[derive(Default)]
pub struct FakeBackend {
    moderators: HashMap<(String, CommunityId), ModPermissions>,
    communities: HashMap<CommunityId, CommunityRef>,
    content: HashMap<String, ContentItem>,
    failing_bans: HashSet<CommunityId>,
    panicking_bans: HashSet<CommunityId>,
    failing_lookups: HashSet<CommunityId>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    /// Origin community where both the moderator and the app hold `all`.
    pub fn new() -> Self {
        Self::default()
            .with_community(ORIGIN)
            .with_moderator(MODERATOR, ORIGIN, ModPermissions::ALL)
            .with_moderator(APP, ORIGIN, ModPermissions::ALL)
            .with_content(target_post())
    }

    /// Add communities where both the moderator and the app hold `all`.
    pub fn with_destinations(mut self, names: &[&str]) -> Self {
        for name in names {
            self = self
                .with_community(name)
                .with_moderator(MODERATOR, name, ModPermissions::ALL)
                .with_moderator(APP, name, ModPermissions::ALL);
        }
        self
    }

    pub fn with_community(mut self, display_name: &str) -> Self {
        let community = community_ref(display_name);
        self.communities.insert(community.name.clone(), community);
        self
    }

    pub fn with_moderator(mut self, user: &str, community_name: &str, perms: ModPermissions) -> Self {
        self.moderators
            .insert((user.to_lowercase(), community(community_name)), perms);
        self
    }

    pub fn without_moderator(mut self, user: &str, community_name: &str) -> Self {
        self.moderators
            .remove(&(user.to_lowercase(), community(community_name)));
        self
    }

    pub fn with_content(mut self, item: ContentItem) -> Self {
        self.content.insert(item.id().to_string(), item);
        self
    }

    /// Bans in `community_name` return an error.
    pub fn failing_bans_in(mut self, community_name: &str) -> Self {
        self.failing_bans.insert(community(community_name));
        self
    }

    /// Bans in `community_name` panic.
    pub fn panicking_bans_in(mut self, community_name: &str) -> Self {
        self.panicking_bans.insert(community(community_name));
        self
    }

    /// Moderator lookups in `community_name` return an error.
    pub fn failing_lookups_in(mut self, community_name: &str) -> Self {
        self.failing_lookups.insert(community(community_name));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bans(&self) -> Vec<BanParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Ban(ban) => Some(ban),
                _ => None,
            })
            .collect()
    }

    pub fn notes(&self) -> Vec<ModNoteParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Note(note) => Some(note),
                _ => None,
            })
            .collect()
    }

    pub fn resolved(&self) -> Vec<CommunityId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Resolve(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Communities where `user` was looked up.
    pub fn lookups_for(&self, user: &str) -> Vec<CommunityId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ModPermissions { user: u, community } if u == user => Some(community),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ActionBackend for FakeBackend {
    async fn mod_permissions(
        &self,
        username: &str,
        community: &CommunityId,
    ) -> Result<ModPermissions, BackendError> {
        self.record(Call::ModPermissions {
            user: username.to_string(),
            community: community.clone(),
        });
        if self.failing_lookups.contains(community) {
            return Err(BackendError::Api("moderator lookup unavailable".into()));
        }
        Ok(self
            .moderators
            .get(&(username.to_lowercase(), community.clone()))
            .copied()
            .unwrap_or_default())
    }

    async fn resolve_community(
        &self,
        name: &CommunityId,
    ) -> Result<Option<CommunityRef>, BackendError> {
        self.record(Call::Resolve(name.clone()));
        Ok(self.communities.get(name).cloned())
    }

    async fn fetch_content(&self, id: &str) -> Result<Option<ContentItem>, BackendError> {
        self.record(Call::FetchContent(id.to_string()));
        Ok(self.content.get(id).cloned())
    }

    async fn ban_user(&self, ban: &BanParams) -> Result<(), BackendError> {
        self.record(Call::Ban(ban.clone()));
        if self.panicking_bans.contains(&ban.community.name) {
            panic!("ban handler crashed in r/{}", ban.community.name);
        }
        if self.failing_bans.contains(&ban.community.name) {
            return Err(BackendError::Status {
                status: 500,
                body: "internal error".into(),
            });
        }
        Ok(())
    }

    async fn add_mod_note(&self, note: &ModNoteParams) -> Result<(), BackendError> {
        self.record(Call::Note(note.clone()));
        Ok(())
    }
}

// ============================================================================
// Config store
// ============================================================================

/// [`MemoryStore`] wrapper that counts policy loads per community.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    gets: Mutex<Vec<CommunityId>>,
    failing: HashSet<CommunityId>,
    total: AtomicUsize,
}

impl CountingStore {
    /// Loads of `community_name` fail.
    pub fn failing_for(mut self, community_name: &str) -> Self {
        self.failing.insert(community(community_name));
        self
    }

    pub fn loads(&self) -> Vec<CommunityId> {
        self.gets.lock().unwrap().clone()
    }

    pub fn total_loads(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn get(&self, community: &CommunityId) -> Result<Option<RawPolicyRecord>, StoreError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.gets.lock().unwrap().push(community.clone());
        if self.failing.contains(community) {
            let err = serde_json::from_str::<()>("not json").unwrap_err();
            return Err(StoreError::Serialization(err));
        }
        self.inner.get(community).await
    }

    async fn set(&self, community: &CommunityId, record: RawPolicyRecord) -> Result<(), StoreError> {
        self.inner.set(community, record).await
    }
}

// ============================================================================
// Engine harness
// ============================================================================

/// Fan-out engine wired to fakes.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub store: Arc<CountingStore>,
    pub policies: PolicyService,
    pub evaluator: PermissionEvaluator,
    pub coordinator: FanOutCoordinator,
}

impl Harness {
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_store(backend, CountingStore::default())
    }

    pub fn with_store(backend: FakeBackend, store: CountingStore) -> Self {
        let backend = Arc::new(backend);
        let store = Arc::new(store);
        let policies = PolicyService::new(store.clone());
        let evaluator = PermissionEvaluator::new(backend.clone(), policies.clone(), APP);
        let coordinator = FanOutCoordinator::new(backend.clone(), evaluator.clone());
        Self {
            backend,
            store,
            policies,
            evaluator,
            coordinator,
        }
    }

    /// Store settings for a community.
    pub async fn set_policy(&self, community_name: &str, patch: PolicyPatch) {
        self.policies
            .save(&community(community_name), &patch)
            .await
            .expect("save policy");
    }

    /// Run the form as [`MODERATOR`] against [`target_post`] in [`ORIGIN`].
    pub async fn run(&self, form: ActionForm) -> (Result<FanOutReport, FanOutError>, Vec<Notice>) {
        let request = ActionRequest::from_form(form, MODERATOR, community_ref(ORIGIN), target_post())
            .expect("valid form");
        let (sink, mut receiver) = notice_channel();
        let sink: Arc<dyn NoticeSink> = Arc::new(sink);
        let result = self.coordinator.execute(request, sink).await;
        (result, receiver.drain())
    }
}

pub fn ban_form(destinations: &str) -> ActionForm {
    ActionForm {
        ban_user: true,
        reason: "spamming".into(),
        user_message: "Banned from r/{{subreddit}} for your {{kind}}".into(),
        ban_subreddits: destinations.into(),
        ..ActionForm::default()
    }
}

pub fn note_form(destinations: &str) -> ActionForm {
    ActionForm {
        add_note: true,
        note: "{{author}} spammed in r/{{originSubreddit}}".into(),
        note_subreddits: destinations.into(),
        ..ActionForm::default()
    }
}

pub fn messages(notices: &[Notice]) -> Vec<&str> {
    notices.iter().map(|n| n.message.as_str()).collect()
}

// ============================================================================
// HTTP test app
// ============================================================================

/// Full router over fakes.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryStore>,
    pub config: Arc<Config>,
}

impl TestApp {
    pub fn new(backend: FakeBackend) -> Self {
        let config = Config::default_for_test();
        let backend = Arc::new(backend);
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            config.clone(),
            PolicyService::new(store.clone()),
            store.clone(),
            backend.clone(),
        );
        Self {
            router: create_router(state),
            backend,
            store,
            config: Arc::new(config),
        }
    }

    /// Request builder acting as [`MODERATOR`].
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(MODERATOR_HEADER, MODERATOR)
    }

    /// JSON request acting as [`MODERATOR`].
    pub fn json(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Self::request(method, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap()
    }

    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }
}

/// Read a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
