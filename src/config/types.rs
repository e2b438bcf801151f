use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default user agent, the tracker sites serve their legacy markup to it
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux i686; rv:38.0) Gecko/20100101 Firefox/38.0";

/// Main configuration structure for Tracker-Scout
///
/// Every key is optional in the document; missing or mistyped keys fall back
/// to the values of [`Config::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Tracker account name (authenticated trackers only)
    pub username: String,

    /// Tracker account password
    pub password: String,

    /// Prefix record names with the upload date
    pub torrent_date: bool,

    /// Route requests through `proxies`
    pub proxy: bool,

    pub proxies: ProxyConfig,

    /// User-Agent header sent with every request
    pub ua: String,

    /// Drop records whose name lacks any token of a multi-word phrase
    pub phrase_filter: bool,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Cookie jar location; empty means next to the config file
    pub cookie_file: String,

    /// Category cache location; empty means next to the config file
    pub cache_file: String,
}

/// Proxy URLs per scheme
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub http: String,
    pub https: String,
}

impl ProxyConfig {
    /// Returns true if at least one proxy URL is set
    pub fn any(&self) -> bool {
        !self.http.is_empty() || !self.https.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: "USERNAME".to_string(),
            password: "PASSWORD".to_string(),
            torrent_date: true,
            proxy: false,
            proxies: ProxyConfig::default(),
            ua: DEFAULT_USER_AGENT.to_string(),
            phrase_filter: false,
            timeout_secs: 5,
            cookie_file: String::new(),
            cache_file: String::new(),
        }
    }
}

/// On-disk locations of the per-engine state files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub cookie_file: PathBuf,
    pub cache_file: PathBuf,
}

impl Config {
    /// Resolves the cookie and cache file locations for an engine
    ///
    /// Empty settings resolve to `<dir>/<engine>.cookie` and
    /// `<dir>/<engine>.categories.json`.
    pub fn state_paths(&self, dir: &Path, engine: &str) -> StatePaths {
        let pick = |configured: &str, default_name: String| {
            if configured.is_empty() {
                dir.join(default_name)
            } else {
                PathBuf::from(configured)
            }
        };

        StatePaths {
            cookie_file: pick(&self.cookie_file, format!("{}.cookie", engine)),
            cache_file: pick(&self.cache_file, format!("{}.categories.json", engine)),
        }
    }
}
