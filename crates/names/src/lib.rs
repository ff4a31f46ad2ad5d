// Path: crates/names/src/lib.rs
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
//! # Name Auction State Machine
//!
//! The consensus-critical core: the per-name auction record and its phase
//! derivation (spec.md ssec3, ssec4.3), the reversible delta/transaction
//! builder that is the only way a record is ever mutated (spec.md ssec4.4),
//! the covenant sanity/contextual rules (spec.md ssec4.2), the reserved-name
//! table (spec.md ssec4.1), the rollout/availability predicates (spec.md
//! ssec4.2), the per-block coin-view (spec.md ssec4.6), and the name
//! database that ties all of the above to an [`na_api::tree::AuthenticatedTree`]
//! and [`na_api::store::ChainStore`] (spec.md ssec4.5).

/// The auction record, its phase derivation, and its wire encoding.
pub mod auction;
/// The per-name coin-view accumulator and REVEAL-phase winner election.
pub mod coinview;
/// The covenant type tag and the sanity/contextual check passes.
pub mod covenant;
/// Reversible field-level deltas and the `AuctionTxn` mutation builder.
pub mod delta;
/// The name database: `connectBlock`/`saveView`/`revert`/`proveName`.
pub mod db;
/// The immutable reserved-name table.
pub mod reserved;
/// Rollout scheduling, reserved-table gating, and name availability.
pub mod rules;

/// A curated set of the types most callers need.
pub mod prelude {
    pub use crate::auction::{Auction, Phase};
    pub use crate::coinview::{CoinEntry, CoinView};
    pub use crate::covenant::{context, sanity, CovenantKind, CovenantOutput, Transaction, TxInput, TxOutput};
    pub use crate::db::{apply_transaction, connect_block, prove_name, revert, save_view, ConnectError};
    pub use crate::delta::{AuctionDelta, AuctionTxn};
    pub use crate::reserved::ReservedTable;
    pub use crate::rules::Rules;
}
