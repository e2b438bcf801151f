//! Output module for emitting search results
//!
//! This module handles:
//! - The canonical `Record` produced for every listing entry
//! - The `RecordSink` trait consumed by the search coordinator
//! - Pipe-delimited printing with size conversion to bytes

mod printer;
mod traits;

pub use printer::{any_size_to_bytes, format_record, PipePrinter};
pub use traits::{CollectingSink, OutputError, OutputResult, Record, RecordSink};
