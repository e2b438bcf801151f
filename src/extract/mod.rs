//! Structural extraction of tracker listings
//!
//! This module contains:
//! - The delimiter-pair field extractor used on every listing fragment
//! - Normalization of raw fields into display values

mod fields;
mod normalize;

pub use fields::{
    extract_between, extract_complete, extract_fields, split_fragments, Delimiters,
    ExtractionSchema,
};
pub use normalize::{
    clean_title, date_prefix, matches_phrase, month_number, normalize_date, parse_peer_count,
    parse_total, timestamp_prefix, Normalizer,
};
