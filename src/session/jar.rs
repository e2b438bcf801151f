//! Persistent cookie jar
//!
//! Cookies live in a [`cookie_store::CookieStore`] shared between the HTTP
//! client (as its cookie provider) and the session manager. Between runs the
//! jar is saved to disk in the Netscape cookie file format.

use chrono::Utc;
use cookie_store::{CookieDomain, CookieExpiration, CookieStore, RawCookie};
use reqwest::header::HeaderValue;
use reqwest_cookie_store::CookieStoreMutex;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{MutexGuard, PoisonError};
use url::Url;

const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One line of a Netscape cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetscapeLine {
    domain: String,
    include_subdomains: bool,
    path: String,
    secure: bool,
    http_only: bool,
    /// Unix timestamp; 0 marks a session cookie
    expires: i64,
    name: String,
    value: String,
}

impl NetscapeLine {
    fn parse(line: &str) -> Option<Self> {
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != 7 {
            return None;
        }

        Some(Self {
            domain: parts[0].trim_start_matches('.').to_ascii_lowercase(),
            include_subdomains: parts[1].eq_ignore_ascii_case("TRUE"),
            path: parts[2].to_string(),
            secure: parts[3].eq_ignore_ascii_case("TRUE"),
            http_only,
            expires: parts[4].parse().ok()?,
            name: parts[5].to_string(),
            value: parts[6].to_string(),
        })
    }

    fn from_stored(cookie: &cookie_store::Cookie<'static>) -> Option<Self> {
        let (domain, include_subdomains) = match &cookie.domain {
            CookieDomain::HostOnly(host) => (host.clone(), false),
            CookieDomain::Suffix(suffix) => (suffix.clone(), true),
            CookieDomain::NotPresent | CookieDomain::Empty => return None,
        };
        let path: &str = cookie.path.as_ref();
        let expires = match &cookie.expires {
            CookieExpiration::AtUtc(at) => at.unix_timestamp(),
            CookieExpiration::SessionEnd => 0,
        };

        Some(Self {
            domain,
            include_subdomains,
            path: path.to_string(),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
            expires,
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
        })
    }

    fn to_line(&self) -> String {
        let domain = if self.include_subdomains {
            format!(".{}", self.domain)
        } else {
            self.domain.clone()
        };
        format!(
            "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
            if self.http_only { HTTP_ONLY_PREFIX } else { "" },
            domain,
            flag(self.include_subdomains),
            self.path,
            flag(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }

    /// The cookie as a `Set-Cookie` value plus the URL it would have come from
    fn to_set_cookie(&self, now: i64) -> Option<(String, Url)> {
        let scheme = if self.secure { "https" } else { "http" };
        let url = Url::parse(&format!("{}://{}{}", scheme, self.domain, self.path)).ok()?;

        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            header.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.expires != 0 {
            header.push_str(&format!("; Max-Age={}", self.expires - now));
        }
        Some((header, url))
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Returns true if a `Set-Cookie` header scopes itself to a bare top-level domain
///
/// No public suffix list is bundled, so single-label domains like `org` are
/// the ones refused here.
fn targets_bare_suffix(header: &HeaderValue) -> bool {
    let Some(cookie) = header.to_str().ok().and_then(|h| RawCookie::parse(h).ok()) else {
        return false;
    };
    cookie
        .domain()
        .map(|domain| domain.trim_matches('.'))
        .is_some_and(|domain| !domain.is_empty() && !domain.contains('.'))
}

/// Thread-safe cookie jar with Netscape file persistence
#[derive(Debug, Default)]
pub struct SessionJar {
    store: CookieStoreMutex,
}

impl SessionJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, CookieStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a session cookie as if `url` had set it
    pub fn set(&self, url: &Url, name: &str, value: &str) {
        if let Err(e) = self.store().parse(&format!("{}={}", name, value), url) {
            tracing::warn!("Cookie {} for {} not stored: {}", name, url, e);
        }
    }

    /// Returns true if an unexpired cookie with this name is stored
    pub fn contains(&self, name: &str) -> bool {
        self.store().iter_unexpired().any(|cookie| cookie.name() == name)
    }

    pub fn clear(&self) {
        *self.store() = CookieStore::default();
    }

    pub fn len(&self) -> usize {
        self.store().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the jar's contents with the cookies stored in `path`
    ///
    /// Expired cookies and lines the store refuses are skipped.
    ///
    /// # Returns
    ///
    /// The number of cookies loaded
    pub fn load(&self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let now = Utc::now().timestamp();

        let mut store = CookieStore::default();
        let mut count = 0;
        for line in content.lines().filter_map(NetscapeLine::parse) {
            if line.expires != 0 && line.expires <= now {
                continue;
            }
            let Some((header, url)) = line.to_set_cookie(now) else {
                continue;
            };
            match store.parse(&header, &url) {
                Ok(_) => count += 1,
                Err(e) => tracing::debug!("Skipping stored cookie {}: {}", line.name, e),
            }
        }

        *self.store() = store;
        tracing::debug!("Loaded {} cookies from {}", count, path.display());
        Ok(count)
    }

    /// Writes every unexpired cookie to `path`, session cookies included
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut content = format!("{}\n", NETSCAPE_HEADER);
        for line in self.store().iter_unexpired().filter_map(NetscapeLine::from_stored) {
            content.push_str(&line.to_line());
            content.push('\n');
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)
    }
}

impl reqwest::cookie::CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let accepted: Vec<&HeaderValue> = cookie_headers
            .filter(|header| {
                let refused = targets_bare_suffix(header);
                if refused {
                    tracing::warn!("Refusing cookie scoped to a top-level domain from {}", url);
                }
                !refused
            })
            .collect();
        reqwest::cookie::CookieStore::set_cookies(&self.store, &mut accepted.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        reqwest::cookie::CookieStore::cookies(&self.store, url)
    }
}
