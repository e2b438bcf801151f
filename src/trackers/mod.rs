//! Tracker definitions
//!
//! A [`Tracker`] describes one site: how search URLs are built, how its
//! pages signal session state and result counts, and how records are
//! extracted from its markup. [`Engine`] runs searches and downloads for
//! any tracker.

mod engine;
mod megapeer;
mod rutracker;

pub use engine::{DownloadedFile, Engine};
pub use megapeer::Megapeer;
pub use rutracker::Rutracker;

use crate::extract::Normalizer;
use crate::output::Record;
use crate::session::LoginSpec;
use crate::taxonomy::TaxonomySource;
use std::fmt;
use std::str::FromStr;

/// Host-facing search categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchCategory {
    All,
    Movies,
    Tv,
    Music,
    Games,
    Anime,
    Software,
    Pictures,
    Books,
}

impl SearchCategory {
    pub const ALL: [SearchCategory; 9] = [
        Self::All,
        Self::Movies,
        Self::Tv,
        Self::Music,
        Self::Games,
        Self::Anime,
        Self::Software,
        Self::Pictures,
        Self::Books,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movies => "movies",
            Self::Tv => "tv",
            Self::Music => "music",
            Self::Games => "games",
            Self::Anime => "anime",
            Self::Software => "software",
            Self::Pictures => "pictures",
            Self::Books => "books",
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// A search as submitted to a tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub phrase: String,
    pub category: SearchCategory,
    /// Tracker-specific code list for `category`
    pub category_code: String,
}

/// Session marker found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The page was rendered for a logged-in user (or no login is needed)
    Active,
    /// The page shows the login form instead of results
    LoggedOut,
    /// Neither marker is present
    Unrecognized,
}

/// Total result count read from the first results page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalResults {
    Count(u32),
    /// The page explicitly says nothing was found
    NoResults,
    Unrecognized,
}

/// Site-specific behaviour of a tracker
pub trait Tracker: Send + Sync + 'static {
    /// Short engine name used for state files and logs
    fn name(&self) -> &'static str;

    /// Base URL records and error records refer to
    fn engine_url(&self) -> &str;

    /// URL prefixes a response may come from; anything else counts as blocked
    fn origins(&self) -> Vec<String>;

    /// Headers sent with every request
    fn default_headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Static category code used when no dynamic code is resolved
    fn category_code(&self, category: SearchCategory) -> String;

    /// URL of the zero-based result page `page`
    fn page_url(&self, query: &Query, page: u32) -> String;

    fn session_status(&self, _page: &str) -> SessionStatus {
        SessionStatus::Active
    }

    fn total_results(&self, page: &str) -> TotalResults;

    /// Extracts the records of one result page, filters applied
    fn extract_records(&self, page: &str, query: &Query, normalizer: &Normalizer) -> Vec<Record>;

    /// Login exchange, for trackers that need an account
    fn login_spec(&self) -> Option<LoginSpec> {
        None
    }

    /// Category picker, for trackers with dynamically resolved codes
    fn taxonomy(&self) -> Option<TaxonomySource> {
        None
    }
}
