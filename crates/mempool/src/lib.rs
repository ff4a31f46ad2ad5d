// Path: crates/mempool/src/lib.rs
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
//! # Mempool Auction Shadow-State
//!
//! Tracks unconfirmed, name-touching transactions against a simulated
//! [`na_names::coinview::CoinView`] so that a phase transition at the next
//! block height can be anticipated and the transactions it would strand
//! evicted before they are ever considered for inclusion (spec.md ssec4.7).
//!
//! This crate holds no chain-write authority: `track`/`untrack`/`invalidate`
//! only ever update this process's own bookkeeping, never the real chain
//! state, matching spec.md ssec5's "the mempool shadow-state... never
//! mutates the chain state."

use std::collections::{BTreeMap, BTreeSet};

use na_api::dnssec::DnssecVerifier;
use na_api::headers::HeaderIndex;
use na_api::store::ChainStore;
use na_names::coinview::CoinView;
use na_names::covenant::{CovenantKind, CovenantOutput, Transaction};
use na_names::db::{self, ConnectError};
use na_names::rules::Rules;
use na_types::name::{NameHash, Outpoint};
use na_types::params::NetworkParams;
use thiserror::Error;

/// A transaction's 32-byte hash, used as the mempool's own identifier.
pub type TxId = [u8; 32];

/// Errors the mempool shadow-state can report (spec.md ssec7: mempool
/// eviction itself is explicitly non-error, but *admission* — simulating a
/// transaction's covenant effects before tracking it — can fail exactly as
/// `connectBlock` can).
#[derive(Debug, Error)]
pub enum MempoolError {
    /// The transaction failed sanity or contextual covenant verification
    /// against the shadow view and was refused admission.
    #[error(transparent)]
    Rejected(#[from] ConnectError),
}

/// The four phase-sensitive categories a name-touching output is bucketed
/// into (spec.md ssec4.7). `Update` is the catch-all for every covenant
/// that mutates an already-registered name (`REGISTER` lands a name that
/// was previously a `CLAIM`/`REVEAL`, and so is also bucketed here once the
/// auction itself has closed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    /// `OPEN`/`CLAIM`: establishes or re-establishes an auction.
    Open,
    /// `BID`: a blinded bid.
    Bid,
    /// `REVEAL`: a bid reveal.
    Reveal,
    /// `REGISTER`/`UPDATE`/`RENEW`/`TRANSFER`/`FINALIZE`/`REVOKE`/`REDEEM`:
    /// anything touching an already-established record.
    Update,
}

fn categorize(kind: CovenantKind) -> Option<Category> {
    match kind {
        CovenantKind::Open | CovenantKind::Claim => Some(Category::Open),
        CovenantKind::Bid => Some(Category::Bid),
        CovenantKind::Reveal => Some(Category::Reveal),
        CovenantKind::Register
        | CovenantKind::Update
        | CovenantKind::Renew
        | CovenantKind::Transfer
        | CovenantKind::Finalize
        | CovenantKind::Revoke
        | CovenantKind::Redeem => Some(Category::Update),
        CovenantKind::None => None,
    }
}

/// Per-category transaction counts, for observability (SPEC_FULL.md
/// ssec4.7 supplement, mirroring the teacher's metrics-sink pattern).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MempoolStats {
    /// Watched names with at least one pending OPEN/CLAIM.
    pub opens: usize,
    /// Watched names with at least one pending BID.
    pub bids: usize,
    /// Watched names with at least one pending REVEAL.
    pub reveals: usize,
    /// Watched names with at least one pending UPDATE-class transaction.
    pub updates: usize,
    /// Distinct names currently referenced by any tracked transaction.
    pub watched_names: usize,
    /// Claim transactions awaiting the `claimPeriod` admission window.
    pub pending_claims: usize,
}

/// The mempool's per-name auction shadow-state.
///
/// Generic over the same [`ChainStore`] `na-names` commits against: the
/// shadow view loads on-chain records lazily exactly as
/// [`na_names::db::connect_block`]'s coin-view does, but the mutations it
/// accumulates are simulations of *unconfirmed* transactions, never
/// flushed via `saveView`.
pub struct MempoolShadow<'a, S: ChainStore> {
    view: CoinView<'a, S>,
    /// The pre-mempool (on-chain) snapshot of every watched name, captured
    /// the first time it is ever referenced by a tracked transaction.
    snapshots: BTreeMap<NameHash, na_names::auction::Auction>,
    opens: BTreeMap<NameHash, BTreeSet<TxId>>,
    bids: BTreeMap<NameHash, BTreeSet<TxId>>,
    reveals: BTreeMap<NameHash, BTreeSet<TxId>>,
    updates: BTreeMap<NameHash, BTreeSet<TxId>>,
    refcount: BTreeMap<NameHash, u32>,
    /// `txid -> commitHeight` for pending CLAIM transactions, which have
    /// their own admission window independent of per-name phase (spec.md
    /// ssec4.7 "Claims... have their own admission path").
    claims: BTreeMap<TxId, u32>,
    /// When set, also evicts `updates` once a weak claim's lockup window
    /// has elapsed (spec.md ssec4.7 "weak-lockup expiry → updates
    /// (hardened mode)"), not only on ordinary auction-record expiry.
    hardened: bool,
}

impl<'a, S: ChainStore> MempoolShadow<'a, S> {
    /// Opens an empty shadow-state backed by `store` for lazy snapshot loads.
    pub fn new(store: &'a S, hardened: bool) -> Self {
        Self {
            view: CoinView::new(store),
            snapshots: BTreeMap::new(),
            opens: BTreeMap::new(),
            bids: BTreeMap::new(),
            reveals: BTreeMap::new(),
            updates: BTreeMap::new(),
            refcount: BTreeMap::new(),
            claims: BTreeMap::new(),
            hardened,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut BTreeMap<NameHash, BTreeSet<TxId>> {
        match category {
            Category::Open => &mut self.opens,
            Category::Bid => &mut self.bids,
            Category::Reveal => &mut self.reveals,
            Category::Update => &mut self.updates,
        }
    }

    /// Simulates `tx`'s covenant effects against the shadow view and, on
    /// success, indexes it by `(nameHash, category)` and increments every
    /// referenced name's reference count (spec.md ssec4.7 `track`).
    ///
    /// `height` is the height `tx` would be validated at if mined next
    /// (the current chain tip's height, matching `connectBlock`'s own
    /// convention), and `lookup` resolves a spent outpoint's covenant
    /// annotation and locked coin value exactly as it does for
    /// `connectBlock`.
    #[allow(clippy::too_many_arguments)]
    pub fn track(
        &mut self,
        tx: &Transaction,
        height: u32,
        params: &NetworkParams,
        rules: &Rules<'_>,
        verifier: &dyn DnssecVerifier,
        headers: &dyn HeaderIndex,
        lookup: impl FnMut(&Outpoint) -> Option<(CovenantOutput, u64)>,
    ) -> Result<(), MempoolError> {
        for output in &tx.outputs {
            let hash = output.covenant.name_hash;
            if output.covenant.kind == CovenantKind::None {
                continue;
            }
            if let std::collections::btree_map::Entry::Vacant(v) = self.snapshots.entry(hash) {
                let entry = self.view.get_or_create(hash).map_err(|e| MempoolError::Rejected(e.into()))?;
                v.insert(entry.record().clone());
            }
        }

        db::apply_transaction(&mut self.view, tx, height, params, rules, verifier, headers, lookup)?;

        for output in &tx.outputs {
            let kind = output.covenant.kind;
            if kind == CovenantKind::None {
                continue;
            }
            let hash = output.covenant.name_hash;
            if let Some(category) = categorize(kind) {
                self.bucket_mut(category).entry(hash).or_default().insert(tx.hash);
            }
            *self.refcount.entry(hash).or_insert(0) += 1;

            if kind == CovenantKind::Claim {
                if let Some(proof) = &output.covenant.dnssec_proof {
                    if let Ok(decoded) = verifier.verify(&output.covenant.name, proof) {
                        self.claims.insert(tx.hash, decoded.commit_height);
                    }
                }
            }
        }

        na_telemetry::metrics().set_mempool_watched_names(self.refcount.len() as u64);
        Ok(())
    }

    /// Decrements every name `tx` references; once a name's count reaches
    /// zero its snapshot, bucket memberships, and shadow-view entry are all
    /// dropped (spec.md ssec4.7 `untrack`).
    pub fn untrack(&mut self, tx: &Transaction) {
        for output in &tx.outputs {
            if output.covenant.kind == CovenantKind::None {
                continue;
            }
            let hash = output.covenant.name_hash;
            if let Some(category) = categorize(output.covenant.kind) {
                if let Some(set) = self.bucket_mut(category).get_mut(&hash) {
                    set.remove(&tx.hash);
                    if set.is_empty() {
                        self.bucket_mut(category).remove(&hash);
                    }
                }
            }
            if let Some(count) = self.refcount.get_mut(&hash) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.refcount.remove(&hash);
                    self.snapshots.remove(&hash);
                    self.view.forget(&hash);
                }
            }
        }
        self.claims.remove(&tx.hash);
        na_telemetry::metrics().set_mempool_watched_names(self.refcount.len() as u64);
    }

    /// Simulates the transition to `height + 1` against each watched
    /// name's pre-mempool on-chain snapshot and returns every transaction
    /// that would no longer be admissible (spec.md ssec4.7 `invalidate`).
    /// Eviction itself is not an error (spec.md ssec7): the caller is
    /// expected to simply drop the returned transactions from its pool.
    pub fn invalidate(&self, height: u32, params: &NetworkParams) -> BTreeSet<TxId> {
        let mut evicted = BTreeSet::new();
        let next = height + 1;

        let mut names: BTreeSet<NameHash> = BTreeSet::new();
        names.extend(self.opens.keys().copied());
        names.extend(self.bids.keys().copied());
        names.extend(self.reveals.keys().copied());
        names.extend(self.updates.keys().copied());

        for hash in names {
            let snapshot = match self.snapshots.get(&hash) {
                Some(s) => s,
                None => continue,
            };
            let phase = snapshot.state(next, params);

            // Each category's window is a single phase; once the record
            // has moved on to any other phase, pending transactions of
            // that category can never be mined and are evicted outright.
            if phase != na_names::auction::Phase::Opening {
                if let Some(set) = self.opens.get(&hash) {
                    evicted.extend(set.iter().copied());
                }
            }
            if phase != na_names::auction::Phase::Bidding {
                if let Some(set) = self.bids.get(&hash) {
                    evicted.extend(set.iter().copied());
                }
            }
            if phase != na_names::auction::Phase::Reveal {
                if let Some(set) = self.reveals.get(&hash) {
                    evicted.extend(set.iter().copied());
                }
            }

            let expired = snapshot.is_expired(next, params);
            let weak_lockup_elapsed = self.hardened && snapshot.weak && !snapshot.is_weak(next, params);
            if expired || weak_lockup_elapsed {
                if let Some(set) = self.updates.get(&hash) {
                    evicted.extend(set.iter().copied());
                }
            }
        }

        if next >= params.claim_period {
            evicted.extend(self.claims.keys().copied());
        }

        if !evicted.is_empty() {
            na_telemetry::metrics().inc_mempool_evicted("phase-transition");
        }
        evicted
    }

    /// Per-category watched-name counts, for observability.
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            opens: self.opens.len(),
            bids: self.bids.len(),
            reveals: self.reveals.len(),
            updates: self.updates.len(),
            watched_names: self.refcount.len(),
            pending_claims: self.claims.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na_names::covenant::{CovenantOutput, TxOutput};
    use na_names::reserved::ReservedTable;
    use na_state::MemStore;
    use na_types::name::hash_name;

    struct AllowAllVerifier;
    impl DnssecVerifier for AllowAllVerifier {
        fn verify(&self, name: &[u8], _proof: &[u8]) -> Result<na_api::dnssec::ProofData, na_api::dnssec::DnssecError> {
            Ok(na_api::dnssec::ProofData {
                name: name.to_vec(),
                weak: false,
                commit_height: 0,
                commit_hash: [0u8; 32],
            })
        }
    }

    fn open_tx(name: &[u8], txid: [u8; 8]) -> Transaction {
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&txid);
        Transaction {
            hash,
            inputs: vec![],
            outputs: vec![TxOutput {
                value: 0,
                address: vec![1, 2, 3],
                covenant: CovenantOutput {
                    kind: CovenantKind::Open,
                    name: name.to_vec(),
                    name_hash: hash_name(name),
                    ..CovenantOutput::none()
                },
            }],
            is_coinbase: false,
            airdrop_witnesses: vec![],
        }
    }

    #[test]
    fn track_then_untrack_drops_snapshot_and_bucket() {
        let store = MemStore::new();
        let reserved = ReservedTable::genesis(0, 0, 0);
        let mut params = NetworkParams::example();
        params.no_reserved = true;
        params.no_rollout = true;
        let rules = Rules::new(&reserved, &params);
        let verifier = AllowAllVerifier;

        let mut shadow = MempoolShadow::new(&store, false);
        let tx = open_tx(b"alpha", [1; 8]);

        shadow.track(&tx, 20, &params, &rules, &verifier, &na_api::headers::EmptyHeaderIndex, |_| None).unwrap();
        assert_eq!(shadow.stats().watched_names, 1);
        assert_eq!(shadow.stats().opens, 1);

        shadow.untrack(&tx);
        assert_eq!(shadow.stats().watched_names, 0);
        assert_eq!(shadow.stats().opens, 0);
    }

    #[test]
    fn invalidate_evicts_opens_once_bidding_begins() {
        let store = MemStore::new();
        let reserved = ReservedTable::genesis(0, 0, 0);
        let mut params = NetworkParams::example();
        params.no_reserved = true;
        params.no_rollout = true;
        let rules = Rules::new(&reserved, &params);
        let verifier = AllowAllVerifier;

        let mut shadow = MempoolShadow::new(&store, false);
        let tx = open_tx(b"beta", [2; 8]);
        shadow.track(&tx, 20, &params, &rules, &verifier, &na_api::headers::EmptyHeaderIndex, |_| None).unwrap();

        // open_period = 6, so height 24 is still OPENING (state at 25); at
        // height 25 the next block (26) is BIDDING.
        let evicted = shadow.invalidate(24, &params);
        assert!(evicted.is_empty());

        let evicted = shadow.invalidate(25, &params);
        assert!(evicted.contains(&tx.hash));
    }

    #[test]
    fn invalidate_disjoint_from_unrelated_watched_name() {
        let store = MemStore::new();
        let reserved = ReservedTable::genesis(0, 0, 0);
        let mut params = NetworkParams::example();
        params.no_reserved = true;
        params.no_rollout = true;
        let rules = Rules::new(&reserved, &params);
        let verifier = AllowAllVerifier;

        let mut shadow = MempoolShadow::new(&store, false);
        let stale_tx = open_tx(b"gamma", [3; 8]);
        let fresh_tx = open_tx(b"delta", [4; 8]);
        shadow.track(&stale_tx, 0, &params, &rules, &verifier, &na_api::headers::EmptyHeaderIndex, |_| None).unwrap();
        shadow.track(&fresh_tx, 10_000, &params, &rules, &verifier, &na_api::headers::EmptyHeaderIndex, |_| None).unwrap();

        // `stale_tx`'s OPEN cycle closed long ago; `fresh_tx`'s is still
        // within its own OPENING window at the same absolute height.
        let evicted = shadow.invalidate(10_000, &params);
        assert!(evicted.contains(&stale_tx.hash));
        assert!(!evicted.contains(&fresh_tx.hash));
    }

    #[test]
    fn claims_are_evicted_once_claim_period_closes() {
        let store = MemStore::new();
        let reserved = ReservedTable::genesis(0, 0, 0);
        let params = NetworkParams::example();
        let rules = Rules::new(&reserved, &params);
        let verifier = AllowAllVerifier;

        let mut shadow = MempoolShadow::new(&store, false);
        let mut tx = open_tx(b"epsilon", [5; 8]);
        tx.outputs[0].covenant.kind = CovenantKind::Claim;
        tx.outputs[0].covenant.dnssec_proof = Some(vec![0u8; 4]);

        shadow.track(&tx, 0, &params, &rules, &verifier, &na_api::headers::EmptyHeaderIndex, |_| None).unwrap();
        assert_eq!(shadow.stats().pending_claims, 1);

        let evicted = shadow.invalidate(params.claim_period, &params);
        assert!(evicted.contains(&tx.hash));
    }
}
