//! State module for tracking the outcome of a run
//!
//! Every engine operation receives the caller's `RunContext`, which carries
//! the run's pending error instead of propagating it to the host.

mod run_context;

pub use run_context::RunContext;
