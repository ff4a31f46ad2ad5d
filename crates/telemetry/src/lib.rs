// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
//! # Name Auction Telemetry
//!
//! Structured logging initialization and an abstract metrics sink
//! (`NameMetricsSink`) that decouples `na-names`/`na-mempool` instrumentation
//! from any particular metrics backend. There is no HTTP exposition server
//! here: this engine has no RPC surface of its own (spec.md ssec1 scopes
//! JSON-RPC servers out entirely), so the only consumer of these metrics is
//! whatever process embeds this crate.

/// The initialization routine for global structured logging.
pub mod init;
/// The concrete `prometheus`-backed implementation of [`sinks::NameMetricsSink`].
pub mod prometheus_sink;
/// The abstract `NameMetricsSink` trait and the global sink accessor.
pub mod sinks;

pub use sinks::{metrics, NameMetricsSink};
