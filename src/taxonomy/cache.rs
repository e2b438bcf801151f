//! Resolved category cache
//!
//! This module persists resolved category codes as a small JSON document,
//! which is trusted for four hours after it was written.

use crate::trackers::SearchCategory;
use crate::ScoutError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// How long a cache document stays fresh
pub const CACHE_TTL_HOURS: i64 = 4;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    last_update: String,
    #[serde(flatten)]
    codes: BTreeMap<String, String>,
}

/// Resolved codes together with their resolution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyCache {
    /// The resolved code list of each category
    pub codes: BTreeMap<SearchCategory, String>,

    /// When the codes were resolved
    pub last_update: DateTime<Utc>,
}

impl TaxonomyCache {
    /// Creates a cache entry stamped with the current time
    pub fn new(codes: BTreeMap<SearchCategory, String>) -> Self {
        Self {
            codes,
            last_update: Utc::now(),
        }
    }

    /// Returns the age of the cached codes
    pub fn age(&self) -> Duration {
        Utc::now() - self.last_update
    }

    /// Checks if the cache should be rebuilt
    ///
    /// # Returns
    ///
    /// * `false` - If the cache was written less than four hours ago
    /// * `true` - If it is older, or stamped in the future
    pub fn is_stale(&self) -> bool {
        let age = self.age();
        age <= Duration::zero() || age >= Duration::hours(CACHE_TTL_HOURS)
    }

    /// Serializes the cache document
    pub fn to_json(&self) -> Result<String, ScoutError> {
        let document = CacheDocument {
            last_update: self.last_update.format(TIMESTAMP_FORMAT).to_string(),
            codes: self
                .codes
                .iter()
                .map(|(category, codes)| (category.as_str().to_string(), codes.clone()))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses a cache document
    ///
    /// Keys that are not search categories are ignored. A timestamp that does
    /// not parse makes the document unusable.
    pub fn from_json(json: &str) -> Result<Option<Self>, ScoutError> {
        let document: CacheDocument = serde_json::from_str(json)?;
        let Ok(last_update) = NaiveDateTime::parse_from_str(&document.last_update, TIMESTAMP_FORMAT)
        else {
            tracing::warn!("Bad cache timestamp: {}", document.last_update);
            return Ok(None);
        };

        let codes = document
            .codes
            .into_iter()
            .filter_map(|(key, codes)| key.parse::<SearchCategory>().ok().map(|c| (c, codes)))
            .collect();

        Ok(Some(Self {
            codes,
            last_update: last_update.and_utc(),
        }))
    }

    /// Loads the cache file, `Ok(None)` if it does not exist or is unusable
    pub fn load(path: &Path) -> Result<Option<Self>, ScoutError> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the cache file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ScoutError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
