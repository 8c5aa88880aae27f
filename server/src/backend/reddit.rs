//! Reddit Action Backend
//!
//! `ActionBackend` over the Reddit OAuth API using the app account's
//! bearer token.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{ActionBackend, BackendError, BanParams, CommunityRef, ModNoteParams};
use crate::config::Config;
use crate::permissions::ModPermissions;
use crate::policy::CommunityId;
use crate::tokens::ContentItem;

/// Reddit API client.
#[derive(Clone)]
pub struct RedditBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    children: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ModeratorEntry {
    name: String,
    #[serde(default)]
    mod_permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubredditAbout {
    name: String,
    display_name: String,
}

impl RedditBackend {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.reddit_access_token))
            .context("REDDIT_ACCESS_TOKEN is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .user_agent(config.reddit_user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.reddit_api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a JSON document. 403 and 404 are reported as `None`.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<Value>, BackendError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;

        if matches!(
            response.status(),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            debug!(path = %path, status = %response.status(), "Resource not accessible");
            return Ok(None);
        }

        let body = ensure_success(response).await?.json::<Value>().await?;
        Ok(Some(body))
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        let response = self.client.post(self.url(path)).form(form).send().await?;
        let body = ensure_success(response).await?.json::<Value>().await?;
        Ok(body)
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status { status, body })
}

fn decode<T: for<'de> Deserialize<'de>>(body: Value) -> Result<T, BackendError> {
    serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Extract `username`'s permissions from a moderator listing.
fn parse_moderator_permissions(body: Value, username: &str) -> Result<ModPermissions, BackendError> {
    let listing: Thing<Listing<ModeratorEntry>> = decode(body)?;
    Ok(listing
        .data
        .children
        .into_iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(username))
        .map(|entry| ModPermissions::from_names(entry.mod_permissions))
        .unwrap_or_default())
}

/// Parse a subreddit `about` document.
fn parse_community(body: Value) -> Result<Option<CommunityRef>, BackendError> {
    // Unknown names may come back as a search listing instead of a t5.
    if body["kind"] == "Listing" {
        return Ok(None);
    }
    let about: Thing<SubredditAbout> = decode(body)?;
    if about.kind != "t5" {
        return Err(BackendError::Decode(format!(
            "expected a t5 thing, got {}",
            about.kind
        )));
    }

    let name = CommunityId::parse(&about.data.display_name)
        .ok_or_else(|| BackendError::Decode("empty subreddit display_name".into()))?;
    Ok(Some(CommunityRef {
        id: about.data.name,
        name,
        display_name: about.data.display_name,
    }))
}

/// Parse an `/api/info` listing holding a single comment or post.
fn parse_content(body: Value) -> Result<Option<ContentItem>, BackendError> {
    let listing: Thing<Listing<Thing<Value>>> = decode(body)?;
    let Some(thing) = listing.data.children.into_iter().next() else {
        return Ok(None);
    };

    let field = |name: &str| -> Result<String, BackendError> {
        thing.data[name]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Decode(format!("missing field {name}")))
    };

    let item = match thing.kind.as_str() {
        "t1" => ContentItem::Comment {
            id: field("name")?,
            author_name: field("author")?,
            subreddit_name: field("subreddit")?,
            parent_id: field("parent_id")?,
            post_id: field("link_id")?,
        },
        "t3" => ContentItem::Post {
            id: field("name")?,
            author_name: field("author")?,
            subreddit_name: field("subreddit")?,
        },
        _ => return Ok(None),
    };
    Ok(Some(item))
}

/// Fail when an `api_type=json` response carries errors.
fn check_api_errors(body: &Value) -> Result<(), BackendError> {
    match body["json"]["errors"].as_array() {
        Some(errors) if !errors.is_empty() => {
            let messages: Vec<String> = errors.iter().map(Value::to_string).collect();
            Err(BackendError::Api(messages.join("; ")))
        }
        _ => Ok(()),
    }
}

fn ban_form(ban: &BanParams) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("api_type", "json".to_string()),
        ("type", "banned".to_string()),
        ("name", ban.username.clone()),
        ("ban_reason", ban.reason.clone()),
        ("ban_message", ban.message.clone()),
        ("note", ban.note.clone()),
    ];
    if let Some(days) = ban.duration_days {
        form.push(("duration", days.to_string()));
    }
    if let Some(context) = &ban.context {
        form.push(("ban_context", context.clone()));
    }
    form
}

fn note_form(note: &ModNoteParams) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("subreddit", note.community.display_name.clone()),
        ("user", note.username.clone()),
        ("note", note.note.clone()),
        ("label", note.label.as_str().to_string()),
    ];
    if let Some(content_id) = &note.content_id {
        form.push(("reddit_id", content_id.clone()));
    }
    form
}

#[async_trait]
impl ActionBackend for RedditBackend {
    #[tracing::instrument(skip(self), fields(community = %community))]
    async fn mod_permissions(
        &self,
        username: &str,
        community: &CommunityId,
    ) -> Result<ModPermissions, BackendError> {
        let path = format!("/r/{community}/about/moderators");
        match self.get_json(&path, &[("user", username)]).await? {
            Some(body) => parse_moderator_permissions(body, username),
            None => Ok(ModPermissions::empty()),
        }
    }

    #[tracing::instrument(skip(self), fields(community = %name))]
    async fn resolve_community(
        &self,
        name: &CommunityId,
    ) -> Result<Option<CommunityRef>, BackendError> {
        match self.get_json(&format!("/r/{name}/about"), &[]).await? {
            Some(body) => parse_community(body),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_content(&self, id: &str) -> Result<Option<ContentItem>, BackendError> {
        match self.get_json("/api/info", &[("id", id)]).await? {
            Some(body) => parse_content(body),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, ban), fields(community = %ban.community.name, user = %ban.username))]
    async fn ban_user(&self, ban: &BanParams) -> Result<(), BackendError> {
        let path = format!("/r/{}/api/friend", ban.community.display_name);
        let body = self.post_form(&path, &ban_form(ban)).await?;
        check_api_errors(&body)?;
        info!("Ban applied");
        Ok(())
    }

    #[tracing::instrument(skip(self, note), fields(community = %note.community.name, user = %note.username))]
    async fn add_mod_note(&self, note: &ModNoteParams) -> Result<(), BackendError> {
        let body = self.post_form("/api/mod/notes", &note_form(note)).await?;
        check_api_errors(&body)?;
        info!("Mod note added");
        Ok(())
    }
}
