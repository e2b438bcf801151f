//! Scrape module - requests and search orchestration
//!
//! This module contains:
//! - The origin-checked request layer shared by every tracker
//! - The search coordinator (first page, pagination, fan-out)
//! - The worker pool fetching the remaining pages

mod coordinator;
mod fetcher;
mod pool;

pub use coordinator::{page_count, run_search, SearchSummary, PAGE_SIZE};
pub(crate) use coordinator::fetch_checked;
pub use fetcher::{build_http_client, decode_page, Requester};
pub use pool::{fetch_pages, PageJob, PageWork, PoolReport};
