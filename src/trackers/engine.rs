//! Engine - the host-facing entry point for one tracker
//!
//! An engine owns the request layer, the optional session and the category
//! codes of a tracker. Every operation takes the caller's [`RunContext`];
//! failures are stored there and surfaced as a single error record instead
//! of being returned.

use crate::config::{Config, StatePaths};
use crate::extract::Normalizer;
use crate::output::RecordSink;
use crate::scrape::{build_http_client, run_search, Requester, SearchSummary};
use crate::session::{Credentials, SessionJar, SessionManager};
use crate::state::RunContext;
use crate::taxonomy::CategoryResolver;
use crate::trackers::{Query, SearchCategory, Tracker};
use crate::ScoutError;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// A torrent file saved by [`Engine::download`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub url: String,
}

impl fmt::Display for DownloadedFile {
    /// `<path> <url>`, the line the host reads back
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path.display(), self.url)
    }
}

/// Runs searches and downloads against one tracker
pub struct Engine<T: Tracker> {
    tracker: Arc<T>,
    requester: Requester,
    session: Option<SessionManager>,
    codes: HashMap<SearchCategory, String>,
    normalizer: Normalizer,
    paths: StatePaths,
    prepared: bool,
}

impl<T: Tracker> Engine<T> {
    /// Creates an engine for `tracker`
    ///
    /// # Arguments
    ///
    /// * `tracker` - The site to talk to
    /// * `config` - Credentials, display options and request settings
    /// * `paths` - Where the cookie and category cache files live
    ///
    /// # Returns
    ///
    /// * `Ok(Engine)` - Ready to use; nothing has been requested yet
    /// * `Err(ScoutError)` - The HTTP client could not be built (bad proxy settings)
    pub fn new(tracker: T, config: &Config, paths: StatePaths) -> Result<Self, ScoutError> {
        let login = tracker.login_spec();
        let jar = login.as_ref().map(|_| Arc::new(SessionJar::new()));

        let client = build_http_client(config, &tracker.default_headers(), jar.clone())?;
        let requester = Requester::new(client, tracker.origins(), config.proxy);

        let session = match (login, jar) {
            (Some(spec), Some(jar)) => Some(SessionManager::new(
                jar,
                paths.cookie_file.clone(),
                Credentials {
                    username: config.username.clone(),
                    password: config.password.clone(),
                },
                spec,
            )),
            _ => None,
        };

        let codes = SearchCategory::ALL
            .iter()
            .map(|&category| (category, tracker.category_code(category)))
            .collect();

        Ok(Self {
            tracker: Arc::new(tracker),
            requester,
            session,
            codes,
            normalizer: Normalizer {
                torrent_date: config.torrent_date,
                phrase_filter: config.phrase_filter,
            },
            paths,
            prepared: false,
        })
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn session(&self) -> Option<&SessionManager> {
        self.session.as_ref()
    }

    /// Category code list a search in `category` will use
    pub fn category_code(&self, category: SearchCategory) -> String {
        self.codes
            .get(&category)
            .cloned()
            .unwrap_or_else(|| self.tracker.category_code(category))
    }

    /// Logs in and resolves category codes, once per engine
    ///
    /// Called implicitly by [`Engine::search`]; calling it up front lets the
    /// host report startup failures before it has a phrase.
    pub async fn prepare(&mut self, ctx: &mut RunContext) {
        if self.prepared || ctx.has_failed() {
            return;
        }

        self.ensure_session(ctx).await;
        if ctx.has_failed() {
            return;
        }

        if let Some(source) = self.tracker.taxonomy() {
            let resolver = CategoryResolver::new(&source, &self.paths.cache_file);
            match resolver
                .resolve(self.tracker.as_ref(), &self.requester, self.session.as_mut())
                .await
            {
                Ok(resolved) => self.codes.extend(resolved),
                Err(e) => {
                    tracing::error!("Categories failed to load");
                    ctx.fail(e);
                    return;
                }
            }
        }

        self.prepared = true;
    }

    async fn ensure_session(&mut self, ctx: &mut RunContext) {
        if let Some(session) = self.session.as_mut() {
            ctx.absorb(session.ensure(&self.requester).await);
        }
    }

    /// Searches for `phrase` in `category` and streams the records into `sink`
    ///
    /// A failure at any step produces exactly one error record in `sink`.
    ///
    /// # Returns
    ///
    /// The search summary, or `None` if the search failed
    pub async fn search(
        &mut self,
        ctx: &mut RunContext,
        phrase: &str,
        category: SearchCategory,
        sink: &mut dyn RecordSink,
    ) -> Option<SearchSummary> {
        self.prepare(ctx).await;

        if !ctx.has_failed() {
            let query = Query {
                phrase: phrase.to_string(),
                category,
                category_code: self.category_code(category),
            };
            let result = run_search(
                &self.tracker,
                &self.requester,
                self.session.as_mut(),
                &query,
                &self.normalizer,
                sink,
            )
            .await;

            if let Some(summary) = ctx.absorb(result) {
                return Some(summary);
            }
        }

        ctx.report(self.tracker.engine_url(), phrase, sink);
        None
    }

    /// Downloads a torrent file into a temporary `.torrent` file
    ///
    /// The file is kept on disk for the host to pick up. On failure the
    /// error record is written to `sink`.
    pub async fn download(
        &mut self,
        ctx: &mut RunContext,
        url: &str,
        sink: &mut dyn RecordSink,
    ) -> Option<DownloadedFile> {
        if !ctx.has_failed() {
            self.ensure_session(ctx).await;
        }

        if !ctx.has_failed() {
            let result = self.fetch_to_file(url).await;
            if let Some(file) = ctx.absorb(result) {
                return Some(file);
            }
        }

        ctx.report(self.tracker.engine_url(), url, sink);
        None
    }

    async fn fetch_to_file(&self, url: &str) -> Result<DownloadedFile, ScoutError> {
        let bytes = self.requester.get(url).await?;

        let mut file = tempfile::Builder::new()
            .prefix("tracker-scout-")
            .suffix(".torrent")
            .tempfile()?;
        file.write_all(&bytes)?;

        let (_, path) = file.keep().map_err(|e| ScoutError::Io(e.error))?;
        tracing::info!("Saved {} bytes from {} to {}", bytes.len(), url, path.display());

        Ok(DownloadedFile {
            path,
            url: url.to_string(),
        })
    }
}
