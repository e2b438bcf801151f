//! Tracker-Scout: a search aggregator for HTML-only torrent trackers
//!
//! This crate submits a query to a tracker, reads the total result count from
//! the first page, fetches the remaining pages concurrently and extracts
//! records from the raw markup with positional delimiter splitting.

pub mod config;
pub mod extract;
pub mod output;
pub mod scrape;
pub mod session;
pub mod state;
pub mod taxonomy;
pub mod trackers;
pub mod url;

use thiserror::Error;

/// Main error type for Tracker-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} is not responding! Maybe it is blocked.")]
    Unreachable { url: String },

    #[error("Request to {url} failed with status: {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is blocked. Try another proxy.")]
    Blocked { url: String },

    #[error("Proxy is misconfigured: {0}")]
    ProxyMisconfigured(String),

    #[error("We are not authorized, please check your credentials!")]
    AuthenticationFailed,

    #[error("Unexpected page content")]
    UnexpectedContent { url: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Cache document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`ScoutError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request timed out (already retried once)
    NetworkTimeout,
    /// Any other transport or status failure
    NetworkOther,
    /// Final URL left the tracker's origin, a proxy is suspected
    OriginRedirectBlocked,
    ProxyMisconfigured,
    /// Fatal for the run
    AuthenticationFailed,
    /// The site markup did not match any known marker
    UnexpectedContent,
    /// Local failures (config, IO, cache documents)
    Local,
}

impl ScoutError {
    /// Returns the error class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::NetworkTimeout,
            Self::Unreachable { .. } | Self::Status { .. } | Self::Http(_) => {
                ErrorKind::NetworkOther
            }
            Self::Blocked { .. } => ErrorKind::OriginRedirectBlocked,
            Self::ProxyMisconfigured(_) => ErrorKind::ProxyMisconfigured,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::UnexpectedContent { .. } => ErrorKind::UnexpectedContent,
            Self::Config(_) | Self::UrlParse(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Local,
        }
    }

    /// Returns true if the run cannot continue once this error is seen
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AuthenticationFailed | ErrorKind::ProxyMisconfigured
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Tracker-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use output::{Record, RecordSink};
pub use state::RunContext;
pub use trackers::{Engine, SearchCategory};
