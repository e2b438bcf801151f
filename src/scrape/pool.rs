//! Concurrent page fetching
//!
//! Remaining result pages are queued on a channel and drained by a set of
//! workers sharing the receiver. Each worker fetches a page, extracts its
//! records and forwards them to the coordinator over an unbounded channel.
//! A failed page is logged and counted; it never aborts the other pages.

use crate::extract::Normalizer;
use crate::output::Record;
use crate::scrape::Requester;
use crate::trackers::{Query, Tracker};
use crate::ScoutError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// One page queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob {
    /// Zero-based page index
    pub page: u32,
    pub url: String,
}

/// Everything a worker needs to turn a page URL into records
pub struct PageWork<T: Tracker> {
    pub tracker: Arc<T>,
    pub requester: Requester,
    pub query: Query,
    pub normalizer: Normalizer,
}

impl<T: Tracker> PageWork<T> {
    async fn process(&self, job: &PageJob) -> Result<Vec<Record>, ScoutError> {
        let page = self.requester.fetch_page(&job.url).await?;
        Ok(self
            .tracker
            .extract_records(&page, &self.query, &self.normalizer))
    }
}

/// Counters reported once every worker has finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub completed: usize,
    pub failed: usize,
}

/// Fetches the given pages concurrently and forwards their records
///
/// One worker is started per job so every page request is in flight at
/// once. Returns after all workers have finished; `records` is closed when
/// the last worker drops its sender.
pub async fn fetch_pages<T: Tracker>(
    work: Arc<PageWork<T>>,
    jobs: Vec<PageJob>,
    records: mpsc::UnboundedSender<Record>,
) -> PoolReport {
    let mut report = PoolReport::default();
    if jobs.is_empty() {
        return report;
    }

    let worker_count = jobs.len();
    let (sender, receiver) = mpsc::channel::<PageJob>(worker_count);
    let mut join_set = spawn_workers(work, receiver, records, worker_count);

    for job in jobs {
        if sender.send(job).await.is_err() {
            tracing::error!("Page workers stopped before all pages were queued");
            break;
        }
    }
    drop(sender);

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(stats) => {
                report.completed += stats.completed;
                report.failed += stats.failed;
            }
            Err(e) => {
                tracing::error!("Page worker panicked: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

fn spawn_workers<T: Tracker>(
    work: Arc<PageWork<T>>,
    receiver: mpsc::Receiver<PageJob>,
    records: mpsc::UnboundedSender<Record>,
    worker_count: usize,
) -> JoinSet<PoolReport> {
    let shared_receiver = Arc::new(Mutex::new(receiver));

    let mut join_set = JoinSet::new();
    for worker_idx in 0..worker_count {
        let rx = Arc::clone(&shared_receiver);
        let work = Arc::clone(&work);
        let records = records.clone();

        join_set.spawn(async move {
            let mut stats = PoolReport::default();
            loop {
                let next = {
                    let mut guard = rx.lock().await;
                    guard.recv().await
                };

                let Some(job) = next else {
                    tracing::trace!("Page worker {} done", worker_idx);
                    break stats;
                };

                match work.process(&job).await {
                    Ok(found) => {
                        tracing::debug!("Page {} gave {} records", job.page, found.len());
                        stats.completed += 1;
                        for record in found {
                            // The receiver only goes away if the caller gave up
                            if records.send(record).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Page {} failed: {}", job.page, e);
                        stats.failed += 1;
                    }
                }
            }
        });
    }

    join_set
}
