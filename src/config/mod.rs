//! Configuration module for Tracker-Scout
//!
//! This module handles loading, repairing, and validating the TOML
//! configuration file. Keys are camelCase and each one is checked against the
//! type of its default value.
//!
//! # Example
//!
//! ```no_run
//! use tracker_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rutracker.toml")).unwrap();
//! println!("Logging in as {}", config.username);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ProxyConfig, StatePaths, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_config, save_config};
pub use validation::validate;
