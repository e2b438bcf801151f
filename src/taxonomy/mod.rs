//! Category taxonomy module
//!
//! Trackers with a deep forum hierarchy get their search category codes
//! from the live category picker instead of a static table. This module
//! provides:
//! - Parsing of the picker into an arena-backed tree
//! - Include/exclude rules mapping search categories onto the tree
//! - A JSON cache of the resolved codes with a four hour lifetime

mod cache;
mod resolver;
mod rules;
mod tree;

pub use cache::{TaxonomyCache, CACHE_TTL_HOURS};
pub use resolver::{CategoryResolver, TaxonomySource};
pub use rules::{CategoryRules, GroupRule, TaxonomyRules};
pub use tree::{CategoryNode, CategoryTree, NodeId};
