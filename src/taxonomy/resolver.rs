use crate::scrape::{fetch_checked, Requester};
use crate::session::SessionManager;
use crate::taxonomy::cache::TaxonomyCache;
use crate::taxonomy::rules::TaxonomyRules;
use crate::taxonomy::tree::CategoryTree;
use crate::trackers::{SearchCategory, Tracker};
use crate::ScoutError;
use std::collections::BTreeMap;
use std::path::Path;

/// Where a tracker's category picker lives and how to read it
#[derive(Debug, Clone)]
pub struct TaxonomySource {
    /// A search page that renders the full category picker
    pub url: String,
    pub rules: TaxonomyRules,
}

/// Resolves category codes, preferring a fresh cache over the network
pub struct CategoryResolver<'a> {
    source: &'a TaxonomySource,
    cache_path: &'a Path,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(source: &'a TaxonomySource, cache_path: &'a Path) -> Self {
        Self { source, cache_path }
    }

    /// Returns the resolved codes for every category the rules cover
    ///
    /// The picker page goes through the same session check as a search page,
    /// so a lost session is recovered once before the tree is read. A page
    /// without a picker is not cached.
    ///
    /// # Arguments
    ///
    /// * `tracker` - Judges whether the picker page shows an active session
    /// * `requester` - Used only when the cache is missing or stale
    /// * `session` - Logs in again if the picker page shows the login form
    ///
    /// # Returns
    ///
    /// * `Ok(codes)` - Codes keyed by category; categories that resolved to nothing are absent
    /// * `Err(ScoutError)` - The picker page could not be fetched or the session was lost for good
    pub async fn resolve<T: Tracker>(
        &self,
        tracker: &T,
        requester: &Requester,
        session: Option<&mut SessionManager>,
    ) -> Result<BTreeMap<SearchCategory, String>, ScoutError> {
        match TaxonomyCache::load(self.cache_path) {
            Ok(Some(cache)) if !cache.is_stale() => {
                tracing::debug!("Categories loaded from {}", self.cache_path.display());
                return Ok(cache.codes);
            }
            Ok(Some(cache)) => {
                tracing::info!(
                    "Category cache is {} minutes old, refreshing",
                    cache.age().num_minutes()
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Ignoring unreadable category cache: {}", e);
            }
        }

        let page = fetch_checked(tracker, requester, session, &self.source.url).await?;
        let Some(codes) = self.read_picker(&page) else {
            tracing::warn!("No category picker found at {}", self.source.url);
            return Ok(BTreeMap::new());
        };

        if let Err(e) = TaxonomyCache::new(codes.clone()).save(self.cache_path) {
            tracing::warn!(
                "Failed to save category cache to {}: {}",
                self.cache_path.display(),
                e
            );
        }
        Ok(codes)
    }

    /// Resolves the codes from a picker page, or `None` if it has no picker
    fn read_picker(&self, page: &str) -> Option<BTreeMap<SearchCategory, String>> {
        let tree = CategoryTree::parse(page);
        if tree.is_empty() {
            return None;
        }
        tracing::trace!("Category tree:\n{}", tree.outline());
        Some(self.source.rules.resolve(&tree))
    }
}
