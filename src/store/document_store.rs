use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

/// Read tuning passed to the store. The engine self-heals its own documents
/// and must see its own latest writes, so every engine read bypasses caching.
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    pub cache_ttl_ms: u64,
    pub dedupe: bool,
}

impl ReadOptions {
    pub fn bypass_cache() -> Self {
        ReadOptions {
            cache_ttl_ms: 0,
            dedupe: false,
        }
    }
}

/// The remote authoritative JSON document store. One document per resource;
/// no partial updates at this boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str, opts: ReadOptions) -> AppResult<Option<Value>>;
    async fn put(&self, path: &str, body: Value) -> AppResult<()>;
}

pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_token: SecretString,
}

impl HttpDocumentStore {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: config.store_base_url.trim_end_matches('/').to_string(),
            api_token: config.store_api_token.clone(),
        })
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .get(self.resource_url("health"))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get(&self, path: &str, opts: ReadOptions) -> AppResult<Option<Value>> {
        let response = self
            .client
            .get(self.resource_url(path))
            .query(&[
                ("cacheTtlMs", opts.cache_ttl_ms.to_string()),
                ("dedupe", opts.dedupe.to_string()),
            ])
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.error_for_status()?.json::<Value>().await?;
        if body.is_null() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    async fn put(&self, path: &str, body: Value) -> AppResult<()> {
        let response = self
            .client
            .put(self.resource_url(path))
            .bearer_auth(self.api_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        response.error_for_status().map_err(AppError::from)?;
        Ok(())
    }
}
