//! HTTP request layer
//!
//! This module handles all HTTP requests made on behalf of a tracker, including:
//! - Building HTTP clients with the configured user agent, proxies and cookie jar
//! - GET requests for listing pages and downloads
//! - Form POSTs for the login exchange
//! - A single automatic retry when a request times out
//! - Checking that redirects did not leave the tracker's origin
//! - Error classification

use crate::config::Config;
use crate::session::SessionJar;
use crate::url::belongs_to_origin;
use crate::ScoutError;
use encoding_rs::WINDOWS_1251;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - User agent, timeout and proxy settings
/// * `headers` - Extra headers sent with every request (e.g. `Referer`)
/// * `jar` - Cookie store shared with the session manager, if any
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScoutError::ProxyMisconfigured)` - Proxy enabled without usable URLs
/// * `Err(ScoutError::Http)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use tracker_scout::config::Config;
/// use tracker_scout::scrape::build_http_client;
///
/// let client = build_http_client(&Config::default(), &[], None).unwrap();
/// ```
pub fn build_http_client(
    config: &Config,
    headers: &[(&'static str, String)],
    jar: Option<Arc<SessionJar>>,
) -> Result<Client, ScoutError> {
    let mut default_headers = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|e| {
            ScoutError::Config(crate::ConfigError::Validation(format!(
                "Invalid {} header: {}",
                name, e
            )))
        })?;
        default_headers.insert(HeaderName::from_static(*name), value);
    }

    let mut builder = Client::builder()
        .user_agent(config.ua.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(default_headers)
        .gzip(true)
        .brotli(true);

    if config.proxy {
        if !config.proxies.any() {
            return Err(ScoutError::ProxyMisconfigured(
                "Proxy enabled, but not set!".to_string(),
            ));
        }
        if !config.proxies.http.is_empty() {
            builder = builder.proxy(proxy_for(Proxy::http(&config.proxies.http))?);
        }
        if !config.proxies.https.is_empty() {
            builder = builder.proxy(proxy_for(Proxy::https(&config.proxies.https))?);
        }
        tracing::debug!("Proxy is set!");
    }

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }

    Ok(builder.build()?)
}

fn proxy_for(proxy: reqwest::Result<Proxy>) -> Result<Proxy, ScoutError> {
    proxy.map_err(|e| ScoutError::ProxyMisconfigured(format!("Proxy is bad, try another! ({})", e)))
}

/// Decodes a page from the trackers' legacy Windows-1251 charset
pub fn decode_page(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Performs requests restricted to a tracker's origins
///
/// Cloning is cheap; clones share the underlying connection pool and
/// cookie jar.
#[derive(Debug, Clone)]
pub struct Requester {
    client: Client,
    origins: Arc<Vec<String>>,
    via_proxy: bool,
}

impl Requester {
    /// Creates a requester from a client and the allowed origin prefixes
    pub fn new(client: Client, origins: Vec<String>, via_proxy: bool) -> Self {
        Self {
            client,
            origins: Arc::new(origins),
            via_proxy,
        }
    }

    /// Fetches a URL and returns the raw body
    ///
    /// # Retry Logic
    ///
    /// | Condition                  | Action                         |
    /// |----------------------------|--------------------------------|
    /// | Timeout                    | Retry once, then `Timeout`     |
    /// | Non-2xx status             | Immediate → `Status`           |
    /// | Final URL outside origins  | Immediate → `Blocked`          |
    /// | Connect error via proxy    | Immediate → `ProxyMisconfigured` |
    /// | Other transport error      | Immediate → `Unreachable`      |
    pub async fn get(&self, url: &str) -> Result<Vec<u8>, ScoutError> {
        self.send(url, None).await
    }

    /// Posts a pre-encoded form body
    pub async fn post_form(&self, url: &str, body: &str) -> Result<Vec<u8>, ScoutError> {
        self.send(url, Some(body)).await
    }

    /// Fetches a URL and decodes it as a Windows-1251 page
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScoutError> {
        tracing::debug!("Requesting {}", url);
        let bytes = self.get(url).await?;
        Ok(decode_page(&bytes))
    }

    async fn send(&self, url: &str, body: Option<&str>) -> Result<Vec<u8>, ScoutError> {
        match self.send_once(url, body).await {
            Err(ScoutError::Timeout { .. }) => {
                tracing::debug!("Repeating request to {} after timeout", url);
                self.send_once(url, body).await
            }
            result => result,
        }
    }

    async fn send_once(&self, url: &str, body: Option<&str>) -> Result<Vec<u8>, ScoutError> {
        let request = match body {
            Some(body) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string()),
            None => self.client.get(url),
        };

        let response = request.send().await.map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Request to {} failed with status {}", url, status);
            return Err(ScoutError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A redirect away from the tracker means a block page or a hijacking proxy
        let final_url = response.url().to_string();
        if !belongs_to_origin(&final_url, &self.origins) {
            tracing::error!("{} was redirected to {}", url, final_url);
            return Err(ScoutError::Blocked {
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(url, e))?;
        Ok(bytes.to_vec())
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> ScoutError {
        tracing::error!("Request to {} failed: {}", url, error);
        if error.is_timeout() {
            ScoutError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() && self.via_proxy {
            ScoutError::ProxyMisconfigured(format!("Proxy is bad, try another! ({})", error))
        } else {
            ScoutError::Unreachable {
                url: url.to_string(),
            }
        }
    }
}
