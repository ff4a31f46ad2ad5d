// Path: crates/names/src/coinview.rs
//! The per-block coin-view (spec.md ssec4.6): a mutable `nameHash ->
//! Auction` mapping, populated lazily from the backing [`ChainStore`] and
//! discarded wholesale if the surrounding block is rejected. Each touched
//! entry also carries the in-block REVEAL bookkeeping `na-names`'
//! `connectBlock` needs to elect a vickrey winner across possibly many
//! REVEAL transactions for the same name within one block.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use na_api::store::ChainStore;
use na_types::error::DbError;
use na_types::name::{NameHash, Outpoint};

use crate::auction::Auction;
use crate::db::{auction_key, load_auction};
use crate::delta::AuctionTxn;

/// One name's mutation scope for the duration of a single block, plus the
/// REVEAL-phase bookkeeping needed to elect a second-price winner when a
/// block contains more than one reveal for the same name.
#[derive(Debug)]
pub struct CoinEntry {
    txn: AuctionTxn,
    /// `true` if a non-null record existed for this name before this block.
    pub existed_before: bool,
    reveal_best: Option<(u64, Outpoint)>,
    reveal_second: Option<u64>,
}

impl CoinEntry {
    fn new(record: Auction, existed_before: bool) -> Self {
        Self { txn: AuctionTxn::new(record), existed_before, reveal_best: None, reveal_second: None }
    }

    /// The mutation builder for this name's record.
    pub fn txn(&mut self) -> &mut AuctionTxn {
        &mut self.txn
    }

    /// The current working state of this name's record.
    pub fn record(&self) -> &Auction {
        self.txn.record()
    }

    /// The delta accumulated so far this block.
    pub fn delta(&self) -> &crate::delta::AuctionDelta {
        self.txn.delta()
    }

    /// Consumes the entry, returning its final record, its delta, and
    /// whether a non-null record existed for this name before this block
    /// (so `saveView` can tell a fresh insert from an update).
    pub fn into_parts(self) -> (Auction, crate::delta::AuctionDelta, bool) {
        let (record, delta) = self.txn.commit();
        (record, delta, self.existed_before)
    }

    /// Folds one REVEAL's value/outpoint into this block's running vickrey
    /// computation and applies the result onto the record (spec.md ssec4.5:
    /// "elect winner = first-seen maximum-value reveal in block order; on
    /// tie, earlier outpoint wins"). When no second bid has been seen, the
    /// sole bidder's own value becomes the price owed, matching the
    /// worked scenarios' accounting for an uncontested auction.
    pub fn record_reveal(&mut self, value: u64, outpoint: Outpoint) {
        match self.reveal_best {
            None => {
                self.reveal_best = Some((value, outpoint));
            }
            Some((best_value, _)) => {
                if value > best_value {
                    self.reveal_second = Some(best_value);
                    self.reveal_best = Some((value, outpoint));
                } else if self.reveal_second.map(|s| value > s).unwrap_or(true) {
                    self.reveal_second = Some(value);
                }
            }
        }
        if let Some((best_value, best_outpoint)) = self.reveal_best {
            let owed = self.reveal_second.unwrap_or(best_value);
            self.txn.set_owner(Some(best_outpoint));
            self.txn.set_highest(Some(best_value));
            self.txn.set_value(Some(owed));
        }
    }
}

/// The per-block accumulator of modified name states (spec.md ssec4.6).
pub struct CoinView<'a, S: ChainStore> {
    store: &'a S,
    entries: BTreeMap<NameHash, CoinEntry>,
}

impl<'a, S: ChainStore> CoinView<'a, S> {
    /// Opens an empty coin-view backed by `store` for lazy loads.
    pub fn new(store: &'a S) -> Self {
        Self { store, entries: BTreeMap::new() }
    }

    /// Returns the entry for `hash`, loading it from the backing store (or
    /// initializing the null record) on first touch within this block.
    pub fn get_or_create(&mut self, hash: NameHash) -> Result<&mut CoinEntry, DbError> {
        match self.entries.entry(hash) {
            Entry::Occupied(o) => Ok(o.into_mut()),
            Entry::Vacant(v) => {
                let existing = load_auction(self.store, &hash)?;
                let existed_before = existing.is_some();
                let record = existing.unwrap_or_else(Auction::null);
                Ok(v.insert(CoinEntry::new(record, existed_before)))
            }
        }
    }

    /// Returns the current working record for `hash`, if it has been
    /// touched this block, without loading it from the store. Used by
    /// `verifyCovenants`'s `auctions` lookup, which must only ever see
    /// state already materialized in this view.
    pub fn peek(&self, hash: &NameHash) -> Option<&Auction> {
        self.entries.get(hash).map(|e| e.record())
    }

    /// Iterates every name touched this block, in hash order, for
    /// `saveView` to drive.
    pub fn touched(&self) -> impl Iterator<Item = (&NameHash, &CoinEntry)> {
        self.entries.iter()
    }

    /// Consumes the view, returning its entries for `saveView`.
    pub fn into_touched(self) -> BTreeMap<NameHash, CoinEntry> {
        self.entries
    }

    /// Drops `hash`'s entry entirely, so the next [`Self::get_or_create`]
    /// reloads it fresh from the backing store. Used by the mempool
    /// shadow-state when a name's reference count reaches zero: once no
    /// tracked transaction still names it, any simulated mutation this view
    /// accumulated for it is no longer relevant (spec.md ssec4.7 "erase the
    /// snapshot when the refcount reaches zero").
    pub fn forget(&mut self, hash: &NameHash) {
        self.entries.remove(hash);
    }

    /// The storage key this name's record lives (or would live) at.
    pub fn key_for(hash: &NameHash) -> Vec<u8> {
        auction_key(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na_state::MemStore;

    #[test]
    fn reveals_elect_first_seen_max_with_second_price() {
        let store = MemStore::new();
        let mut view = CoinView::new(&store);
        let hash = NameHash::from_bytes([1u8; 32]);
        let entry = view.get_or_create(hash).unwrap();

        let o1 = Outpoint::new([1u8; 32], 0);
        let o2 = Outpoint::new([2u8; 32], 0);
        entry.record_reveal(1000, o1);
        entry.record_reveal(500, o2);

        assert_eq!(entry.record().owner, Some(o1));
        assert_eq!(entry.record().highest, Some(1000));
        assert_eq!(entry.record().value, Some(500));
    }

    #[test]
    fn tie_at_top_pays_the_tied_value() {
        let store = MemStore::new();
        let mut view = CoinView::new(&store);
        let hash = NameHash::from_bytes([2u8; 32]);
        let entry = view.get_or_create(hash).unwrap();

        let o1 = Outpoint::new([1u8; 32], 0);
        let o2 = Outpoint::new([2u8; 32], 0);
        entry.record_reveal(1000, o1);
        entry.record_reveal(1000, o2);

        // earlier outpoint keeps the win; tie sets the price to the tied value
        assert_eq!(entry.record().owner, Some(o1));
        assert_eq!(entry.record().value, Some(1000));
    }

    #[test]
    fn uncontested_reveal_pays_its_own_value() {
        let store = MemStore::new();
        let mut view = CoinView::new(&store);
        let hash = NameHash::from_bytes([3u8; 32]);
        let entry = view.get_or_create(hash).unwrap();

        let o1 = Outpoint::new([1u8; 32], 0);
        entry.record_reveal(750, o1);

        assert_eq!(entry.record().owner, Some(o1));
        assert_eq!(entry.record().value, Some(750));
    }
}
