// Path: crates/api/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Name Auction API
//!
//! The trait seams the rest of the engine is built against: the
//! authenticated tree the name database commits into, the key-value chain
//! store the auction records and undo log live in, and the DNSSEC proof
//! verifier the claim path delegates to. `na-state` provides the reference
//! in-memory implementations used by tests; a production node supplies its
//! own.

/// The authenticated radix tree seam (spec.md ssec1, ssec4.5).
pub mod tree;
/// The key-value chain store seam (spec.md ssec4.5's `a`/`u`/`t` keyspaces).
pub mod store;
/// The DNSSEC proof verifier seam the claim path delegates to (spec.md ssec4.8).
pub mod dnssec;
/// The main-chain header lookup seam the renewal-commitment check delegates
/// to (spec.md ssec4.5 "Renewal verification").
pub mod headers;

/// A curated set of the most commonly used traits.
pub mod prelude {
    pub use crate::dnssec::DnssecVerifier;
    pub use crate::headers::HeaderIndex;
    pub use crate::store::ChainStore;
    pub use crate::tree::AuthenticatedTree;
}
