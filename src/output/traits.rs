//! Output sink traits and the record type
//!
//! This module defines the canonical record emitted for every matching
//! listing entry and the trait interface for sinks that consume them.

use crate::ScoutError;
use thiserror::Error;

/// Errors that can occur while emitting records
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One search result, immutable once emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Base URL of the tracker that produced the record
    pub engine_url: String,

    /// Display name, optionally date-prefixed
    pub name: String,

    /// Direct download link
    pub link: String,

    /// Topic page on the tracker, when known
    pub desc_link: Option<String>,

    /// Size as printed by the tracker; converted to bytes by the sink
    pub size: String,

    /// Seeders, `None` when the listing does not show them
    pub seeds: Option<u32>,

    /// Leechers, `None` when the listing does not show them
    pub leech: Option<u32>,
}

impl Record {
    /// Builds the synthetic record used to surface a run's error
    ///
    /// # Arguments
    ///
    /// * `engine_url` - Base URL of the tracker
    /// * `what` - The phrase or URL the failed operation was about, percent-decoded for display
    /// * `error` - The error to report
    pub fn error(engine_url: &str, what: &str, error: &ScoutError) -> Self {
        let what = urlencoding::decode(what)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| what.to_string());
        Self {
            engine_url: engine_url.to_string(),
            name: format!("[{}][Error]: {}", what, error),
            link: format!("{}error", engine_url),
            desc_link: None,
            size: "1 TB".to_string(),
            seeds: Some(100),
            leech: Some(100),
        }
    }
}

/// Trait for record sinks
///
/// A sink receives records from a single task; the search coordinator
/// funnels records from concurrent page fetches through a channel first.
pub trait RecordSink {
    /// Emits one record
    fn emit(&mut self, record: &Record) -> OutputResult<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        (**self).emit(record)
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<Record>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for CollectingSink {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
