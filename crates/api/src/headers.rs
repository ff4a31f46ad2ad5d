// Path: crates/api/src/headers.rs
//! Defines the `HeaderIndex` trait: the main-chain header lookup the
//! renewal-commitment freshness check needs (spec.md ssec4.5 "Renewal
//! verification"). Block storage and chain header indexing are out of
//! scope for this engine (spec.md ssec1) — referenced only by this
//! interface, exactly as the authenticated tree and DNSSEC verifier are.

/// Resolves a committed block hash to its main-chain height, if the hash
/// is actually on the main chain. A RENEW/UPDATE covenant's 32-byte
/// commitment is meaningless without this: the name database never stores
/// block headers itself.
pub trait HeaderIndex {
    /// Returns the height of the main-chain header with this hash, or
    /// `None` if the hash is unknown or has been reorganized off the main
    /// chain.
    fn height_of(&self, hash: &[u8; 32]) -> Option<u32>;
}

/// A `HeaderIndex` that knows nothing. Useful for tests and for contexts
/// that never exercise RENEW/renewal-proof UPDATE paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyHeaderIndex;

impl HeaderIndex for EmptyHeaderIndex {
    fn height_of(&self, _hash: &[u8; 32]) -> Option<u32> {
        None
    }
}
