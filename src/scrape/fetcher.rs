//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with a desktop-browser header profile
//! - Rotating egress profiles (direct, then configured proxies) per attempt
//! - Error classification (timeout, connection, status, other transport)

use crate::config::Config;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, DNT, REFERER, UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, Proxy};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching the stock page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// True when the response pattern suggests anti-bot blocking
    pub fn is_likely_bot_block(&self) -> bool {
        matches!(self, FetchError::Status { status, .. } if *status == 403 || *status == 429)
    }
}

/// Trait for page fetch backends
///
/// `attempt` is the zero-based attempt index within one extraction cycle;
/// backends carrying several egress profiles use it to rotate profiles
/// between retries.
pub trait PageFetcher: Send + Sync {
    /// Fetches the stock page and returns its raw markup
    fn fetch_page(&self, attempt: u32) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP fetcher with one client per egress profile
///
/// Profile 0 is direct egress; each configured proxy adds one more profile.
/// A retry after a blocked direct fetch therefore goes out through the
/// first proxy instead of hammering the same route again.
pub struct HttpFetcher {
    url: String,
    clients: Vec<Client>,
}

impl HttpFetcher {
    /// Builds a fetcher from the scraper and transport configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The loaded service configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Clients built for every egress profile
    /// * `Err(reqwest::Error)` - A client or proxy could not be constructed
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut clients = vec![build_client(config, None)?];

        for proxy_url in &config.transport.proxies {
            let proxy = Proxy::all(proxy_url)?;
            clients.push(build_client(config, Some(proxy))?);
        }

        tracing::debug!(
            "Prepared {} egress profiles for {}",
            clients.len(),
            config.scraper.target_url
        );

        Ok(Self {
            url: config.scraper.target_url.clone(),
            clients,
        })
    }

    /// Number of egress profiles (direct plus configured proxies)
    pub fn profile_count(&self) -> usize {
        self.clients.len()
    }

    fn profile_index(&self, attempt: u32) -> usize {
        attempt as usize % self.clients.len()
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, attempt: u32) -> Result<String, FetchError> {
        let client = &self.clients[self.profile_index(attempt)];

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| classify_error(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_error(&self.url, e))
    }
}

/// Builds one HTTP client for a single egress profile
fn build_client(config: &Config, proxy: Option<Proxy>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.transport.user_agent.clone())
        .default_headers(browser_headers(&config.scraper.target_url))
        .timeout(Duration::from_secs(config.scraper.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }

    builder.build()
}

/// Builds the fixed desktop-browser header set sent with every request
fn browser_headers(target_url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    // Referer carries the target's own origin, like a same-site navigation
    if let Ok(url) = Url::parse(target_url) {
        let referer = format!("{}/", url.origin().ascii_serialization());
        if let Ok(value) = HeaderValue::from_str(&referer) {
            headers.insert(REFERER, value);
        }
    }

    headers
}

/// Classifies a reqwest error into the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
