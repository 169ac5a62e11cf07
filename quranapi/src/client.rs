//! HTTP client for the Quran content API
//!
//! The API is a static, read-only JSON service with three endpoints:
//!
//! | resource          | path                 |
//! |-------------------|----------------------|
//! | chapter index     | `/surah.json`        |
//! | chapter metadata  | `/{chapter}.json`    |
//! | single verse      | `/{chapter}/{verse}.json` |
//!
//! # Example
//!
//! ```no_run
//! use quranapi::QuranClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QuranClient::new().await?;
//!
//!     let chapters = client.fetch_chapter_list().await?;
//!     println!("{} chapters", chapters.len());
//!
//!     let verse = client.fetch_verse(1, 1).await?;
//!     println!("{}", verse.arabic_text);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::models::{ChapterMetadata, ChapterSummary, Verse};
use crate::resource::Resource;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://quranapi.pages.dev/api";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "QuranReader/0.1.0 (quranapi)";

/// Anything able to produce the raw JSON of a [`Resource`]
///
/// [`QuranClient`] is the production source. The cache only depends on this
/// trait, so it can be driven by any origin.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the JSON payload of `resource`
    ///
    /// Fails with a network error (see [`Error::is_network`]) on transport
    /// failure, non-success status or unparsable body. Never retries.
    async fn fetch(&self, resource: &Resource) -> Result<Value>;
}

/// Quran content HTTP client
///
/// The client is stateless and does not cache responses. Caching is the job
/// of [`ContentCache`](crate::ContentCache).
#[derive(Debug, Clone)]
pub struct QuranClient {
    pub(crate) client: Client,
    base_url: String,
    timeout: Duration,
}

impl QuranClient {
    /// Create a new client with default settings
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client with a custom reqwest::Client
    ///
    /// Useful for sharing HTTP connection pools or custom proxy settings
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Full URL of a resource
    pub fn url_for(&self, resource: &Resource) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            resource.path()
        ))?)
    }

    /// GET a resource and parse its body as JSON
    pub async fn fetch_json(&self, resource: &Resource) -> Result<Value> {
        let url = self.url_for(resource)?;

        tracing::debug!("Fetching {}: {}", resource, url);

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} returned status {}", url, status);
            return Err(Error::status(url.as_str(), status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    // ========================================================================
    // Typed fetches
    // ========================================================================

    /// Fetch the chapter index
    pub async fn fetch_chapter_list(&self) -> Result<Vec<ChapterSummary>> {
        let value = self.fetch_json(&Resource::ChapterList).await?;
        Ok(ChapterSummary::list_from_value(value)?)
    }

    /// Fetch the metadata of one chapter
    pub async fn fetch_chapter_metadata(&self, chapter: u32) -> Result<ChapterMetadata> {
        let value = self
            .fetch_json(&Resource::chapter_metadata(chapter))
            .await?;
        Ok(ChapterMetadata::from_value(chapter, value)?)
    }

    /// Fetch a single verse
    pub async fn fetch_verse(&self, chapter: u32, verse: u32) -> Result<Verse> {
        let value = self.fetch_json(&Resource::verse(chapter, verse)).await?;
        Ok(Verse::from_value(chapter, verse, value)?)
    }
}

#[async_trait]
impl ContentSource for QuranClient {
    async fn fetch(&self, resource: &Resource) -> Result<Value> {
        self.fetch_json(resource).await
    }
}

/// Builder for configuring a QuranClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Build the client
    pub async fn build(self) -> Result<QuranClient> {
        // Reject a malformed base URL now rather than on the first request
        Url::parse(&self.base_url)?;

        let client = if let Some(client) = self.client {
            client
        } else {
            let mut builder = Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout);

            if let Some(proxy_url) = &self.proxy {
                let proxy = reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::other(format!("Invalid proxy: {}", e)))?;
                builder = builder.proxy(proxy);
            }

            builder.build()?
        };

        Ok(QuranClient {
            client,
            base_url: self.base_url,
            timeout: self.timeout,
        })
    }
}
