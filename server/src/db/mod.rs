//! Storage Layer
//!
//! Redis connection plus the configuration and session store
//! implementations (Redis-backed and in-memory).

mod memory;
mod redis_store;

use anyhow::Result;
use thiserror::Error;
use tracing::info;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Errors from the configuration and session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// Stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Create Redis client.
pub async fn create_redis_client(redis_url: &str) -> Result<fred::clients::Client> {
    use fred::prelude::*;

    let config = Config::from_url(redis_url)?;
    let client = Client::new(config, None, None, None);
    client.connect();
    client.wait_for_connect().await?;

    info!("Connected to Redis");
    Ok(client)
}
