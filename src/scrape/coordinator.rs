//! Search coordinator - first page, pagination and fan-out
//!
//! A search runs in three steps:
//! - First page: fetch page 0, check the session marker and read the total count
//! - Emit the records of page 0
//! - Fetch the remaining pages concurrently and emit their records as they arrive
//!
//! A lost session is recovered once per search by logging in again and
//! re-fetching the first page.

use crate::extract::Normalizer;
use crate::output::{Record, RecordSink};
use crate::scrape::pool::{fetch_pages, PageJob, PageWork};
use crate::scrape::Requester;
use crate::session::SessionManager;
use crate::trackers::{Query, SessionStatus, TotalResults, Tracker};
use crate::ScoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Number of records a tracker shows per page
pub const PAGE_SIZE: u32 = 50;

/// Statistics about a completed search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Total results announced by the first page
    pub total: u32,
    /// Pages requested, the first one included
    pub pages: u32,
    /// Records handed to the sink
    pub emitted: usize,
    /// Fan-out pages that failed and were skipped
    pub failed_pages: usize,
    pub elapsed: Duration,
}

/// Returns the number of pages needed for `total` results
pub fn page_count(total: u32) -> u32 {
    total.div_ceil(PAGE_SIZE)
}

/// Runs a complete search and streams the records into `sink`
///
/// # Arguments
///
/// * `tracker` - The tracker being searched
/// * `requester` - Request layer bound to the tracker's origins
/// * `session` - Session manager, for trackers that require a login
/// * `query` - Phrase and resolved category code
/// * `normalizer` - Display options applied to every record
/// * `sink` - Receives every matching record
///
/// # Returns
///
/// * `Ok(SearchSummary)` - The search finished; individual fan-out pages may have failed
/// * `Err(ScoutError)` - The first page failed, the page was unrecognized or the session could not be recovered
pub async fn run_search<T: Tracker>(
    tracker: &Arc<T>,
    requester: &Requester,
    session: Option<&mut SessionManager>,
    query: &Query,
    normalizer: &Normalizer,
    sink: &mut dyn RecordSink,
) -> Result<SearchSummary, ScoutError> {
    let start = Instant::now();
    let first_url = tracker.page_url(query, 0);
    let page = fetch_checked(tracker.as_ref(), requester, session, &first_url).await?;

    let total = match tracker.total_results(&page) {
        TotalResults::Count(total) if total > 0 => total,
        TotalResults::Count(_) | TotalResults::NoResults => {
            tracing::info!("Nothing found for '{}'", query.phrase);
            return Ok(SearchSummary {
                pages: 1,
                elapsed: start.elapsed(),
                ..SearchSummary::default()
            });
        }
        TotalResults::Unrecognized => {
            return Err(ScoutError::UnexpectedContent { url: first_url });
        }
    };

    tracing::info!("Found {} results for '{}'", total, query.phrase);

    let mut summary = SearchSummary {
        total,
        pages: 1,
        ..SearchSummary::default()
    };
    summary.emitted += emit_all(sink, tracker.extract_records(&page, query, normalizer));

    let pages = page_count(total);
    if pages > 1 {
        let jobs: Vec<PageJob> = (1..pages)
            .map(|page| PageJob {
                page,
                url: tracker.page_url(query, page),
            })
            .collect();
        summary.pages += jobs.len() as u32;

        let work = Arc::new(PageWork {
            tracker: Arc::clone(tracker),
            requester: requester.clone(),
            query: query.clone(),
            normalizer: *normalizer,
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let drain = async {
            let mut emitted = 0;
            while let Some(record) = rx.recv().await {
                emitted += emit_all(&mut *sink, [record]);
            }
            emitted
        };
        let (report, emitted) = tokio::join!(fetch_pages(work, jobs, tx), drain);

        summary.emitted += emitted;
        summary.failed_pages = report.failed;
    }

    summary.elapsed = start.elapsed();
    tracing::info!(
        "Search for '{}' done: {} records from {} pages in {:.2}s",
        query.phrase,
        summary.emitted,
        summary.pages,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

/// Fetches a page that must show a session marker, recovering a lost session once
///
/// Trackers without a session are never logged out, so for them a
/// `LoggedOut` page is an authentication failure.
pub(crate) async fn fetch_checked<T: Tracker>(
    tracker: &T,
    requester: &Requester,
    session: Option<&mut SessionManager>,
    url: &str,
) -> Result<String, ScoutError> {
    let page = requester.fetch_page(url).await?;
    match tracker.session_status(&page) {
        SessionStatus::Active => return Ok(page),
        SessionStatus::Unrecognized => {
            return Err(ScoutError::UnexpectedContent {
                url: url.to_string(),
            })
        }
        SessionStatus::LoggedOut => {}
    }

    let Some(session) = session else {
        return Err(ScoutError::AuthenticationFailed);
    };

    tracing::debug!("Looks like we lost the session, logging in again");
    session.relogin(requester).await?;

    let page = requester.fetch_page(url).await?;
    match tracker.session_status(&page) {
        SessionStatus::Active => Ok(page),
        SessionStatus::LoggedOut => Err(ScoutError::AuthenticationFailed),
        SessionStatus::Unrecognized => Err(ScoutError::UnexpectedContent {
            url: url.to_string(),
        }),
    }
}

fn emit_all(sink: &mut dyn RecordSink, records: impl IntoIterator<Item = Record>) -> usize {
    let mut emitted = 0;
    for record in records {
        match sink.emit(&record) {
            Ok(()) => emitted += 1,
            Err(e) => tracing::error!("Failed to emit record {}: {}", record.link, e),
        }
    }
    emitted
}
