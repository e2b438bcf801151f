//! Session module for trackers that require a login
//!
//! This module provides:
//! - A cookie jar that doubles as the HTTP client's cookie store
//! - Netscape cookie file persistence between runs
//! - The login state machine (anonymous, authenticated, rejected)

mod jar;
mod manager;

pub use jar::SessionJar;
pub use manager::{Credentials, LoginSpec, SessionManager, SessionState};
