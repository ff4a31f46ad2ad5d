// Path: crates/names/src/rules.rs
//! Name-rule predicates that need more than a name's raw bytes: rollout
//! scheduling, reserved-table gating, and availability (spec.md ssec4.2).
//! Character-set validation and hashing (`verifyName`/`hashName`) live in
//! `na_types::name` since they need nothing but the name itself; this
//! module re-exports them alongside the rules that need the reserved
//! table and network parameters.

use na_types::name::{hash_name, verify_name, NameHash};
use na_types::params::NetworkParams;

use crate::reserved::ReservedTable;

/// Bundles the reserved-name table with the active network parameters,
/// the minimal state `rollout`/`isReserved`/`isAvailable` need (spec.md ssec4.2).
#[derive(Debug, Clone, Copy)]
pub struct Rules<'a> {
    reserved: &'a ReservedTable,
    params: &'a NetworkParams,
}

impl<'a> Rules<'a> {
    /// Borrows the reserved table and network parameters for the
    /// lifetime of the rule evaluations that follow.
    pub fn new(reserved: &'a ReservedTable, params: &'a NetworkParams) -> Self {
        Self { reserved, params }
    }

    /// Re-exports [`na_types::name::verify_name`] for call-site convenience.
    pub fn verify_name(&self, name: &[u8]) -> bool {
        verify_name(name)
    }

    /// Re-exports [`na_types::name::hash_name`] for call-site convenience.
    pub fn hash_name(&self, name: &[u8]) -> NameHash {
        hash_name(name)
    }

    /// `blind(value, nonce)`: BLAKE2b-256 of `LE64(value) ++ nonce` (spec.md ssec4.2).
    pub fn blind(&self, value: u64, nonce: &[u8; 32]) -> [u8; 32] {
        na_crypto::blind(value, nonce)
    }

    /// Computes `(startHeight, weekIndex)` for `nameHash`: `week = nameHash
    /// mod 52` and `startHeight = auctionStart + week * rolloutInterval`
    /// (spec.md ssec4.2). When `params.no_rollout`, every name is
    /// immediately at week 0 of `auctionStart`.
    pub fn rollout(&self, name_hash: &NameHash) -> (u32, u32) {
        if self.params.no_rollout {
            return (self.params.auction_start, 0);
        }
        let week = name_hash.mod_u32(52);
        let start = self.params.auction_start + week * self.params.rollout_interval;
        (start, week)
    }

    /// `true` if `nameHash` is in the reserved table and the claim period
    /// has not yet closed at `height` (spec.md ssec4.2). Always `false`
    /// when `params.no_reserved`.
    pub fn is_reserved(&self, name_hash: &NameHash, height: u32) -> bool {
        if self.params.no_reserved {
            return false;
        }
        height < self.params.claim_period && self.reserved.has(name_hash)
    }

    /// `verifyName(name) AND NOT isReserved(hash) AND rollout week reached`
    /// (spec.md ssec4.2 `isAvailable`).
    pub fn is_available(&self, name: &[u8], height: u32) -> bool {
        if !verify_name(name) {
            return false;
        }
        let name_hash = hash_name(name);
        if self.is_reserved(&name_hash, height) {
            return false;
        }
        let (start, _week) = self.rollout(&name_hash);
        height >= start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_available_requires_verify_name() {
        let reserved = ReservedTable::genesis(0, 0, 0);
        let params = NetworkParams::simnet();
        let rules = Rules::new(&reserved, &params);
        assert!(!rules.is_available(b"UPPER", 0));
    }

    #[test]
    fn is_available_false_for_reserved_names() {
        let reserved = ReservedTable::genesis(1000, 500, 200);
        let mut params = NetworkParams::example();
        params.no_reserved = false;
        let rules = Rules::new(&reserved, &params);
        assert!(!rules.is_available(b"cloudflare", 0));
    }

    #[test]
    fn is_available_false_before_rollout_week_reached() {
        let reserved = ReservedTable::genesis(0, 0, 0);
        let mut params = NetworkParams::example();
        params.no_reserved = true;
        params.no_rollout = false;
        let rules = Rules::new(&reserved, &params);

        // Find a name whose rollout week is > 0, then confirm it is
        // unavailable before its start height and available at/after it.
        let mut name = b"zzzzzzzzz".to_vec();
        let (start, week) = loop {
            let hash = hash_name(&name);
            let (start, week) = rules.rollout(&hash);
            if week > 0 {
                break (start, week);
            }
            name.push(b'0');
        };
        assert!(week > 0);
        assert!(!rules.is_available(&name, start - 1));
        assert!(rules.is_available(&name, start));
    }

    #[test]
    fn no_rollout_bypasses_week_gating() {
        let reserved = ReservedTable::genesis(0, 0, 0);
        let mut params = NetworkParams::example();
        params.no_reserved = true;
        params.no_rollout = true;
        let rules = Rules::new(&reserved, &params);
        assert!(rules.is_available(b"anything-goes", 0));
    }
}
