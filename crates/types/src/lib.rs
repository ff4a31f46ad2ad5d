// Path: crates/types/src/lib.rs
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
//! # Name Auction Types
//!
//! Foundational data structures and error types shared by every crate in
//! the name auction consensus engine: the `NameHash`/`Outpoint` primitives,
//! the network-parameter surface (spec.md ssec6), the canonical binary codec,
//! and the per-domain `thiserror` error enums.

/// Canonical encode/decode helpers and the hand-rolled consensus wire format.
pub mod codec;
/// Error taxa for every component family (covenant, database, claim, mempool).
pub mod error;
/// `NameHash`, `Outpoint`, and name validation primitives.
pub mod name;
/// The external network-parameter surface (spec.md ssec6).
pub mod params;

/// A curated set of the most commonly used types.
pub mod prelude {
    pub use crate::codec::{from_bytes_canonical, to_bytes_canonical};
    pub use crate::error::{ClaimError, CovenantError, DbError, ErrorCode};
    pub use crate::name::{NameHash, Outpoint, MAX_NAME_SIZE};
    pub use crate::params::NetworkParams;
}
