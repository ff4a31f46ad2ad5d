// Path: crates/names/src/db.rs
//! The name database: `connectBlock`/`saveView`/`revert`/`proveName`
//! (spec.md ssec4.5). Generic over the two external collaborators spec.md
//! ssec1 treats as assumed primitives: the authenticated tree and the
//! key-value chain store, matching the teacher's generic
//! `StateManager`/`NodeStore` split (SPEC_FULL.md ssec4.5).

use std::collections::BTreeMap;
use std::time::Instant;

use na_api::dnssec::DnssecVerifier;
use na_api::headers::HeaderIndex;
use na_api::store::{ChainStore, WriteBatch};
use na_api::tree::{AuthenticatedTree, TreeBatch, TreeProof};
use na_types::codec::{Reader, Writer};
use na_types::error::{CovenantError, DbError, ErrorCode};
use na_types::name::{hash_name, NameHash, Outpoint};
use na_types::params::NetworkParams;
use thiserror::Error;

use crate::auction::{Auction, Phase};
use crate::coinview::{CoinEntry, CoinView};
use crate::covenant::{sanity, CovenantKind, CovenantOutput, Transaction};
use crate::delta::AuctionDelta;
use crate::rules::Rules;

/// Key prefix byte for auction records (`a‖nameHash`, spec.md ssec4.5).
const AUCTION_PREFIX: u8 = b'a';
/// Key prefix byte for per-block undo blobs (`u‖height`, spec.md ssec4.5).
const UNDO_PREFIX: u8 = b'u';

/// The storage key an auction record lives at.
pub fn auction_key(hash: &NameHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(33);
    key.push(AUCTION_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

/// The storage key a block's undo blob lives at.
pub fn undo_key(height: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(5);
    key.push(UNDO_PREFIX);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Loads and parses the auction record for `hash`, if any is stored.
pub fn load_auction<S: ChainStore>(store: &S, hash: &NameHash) -> Result<Option<Auction>, DbError> {
    let raw = store.get(&auction_key(hash)).map_err(|e| DbError::Backend(e.to_string()))?;
    match raw {
        Some(bytes) => Ok(Some(Auction::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Errors `connectBlock` can return (spec.md ssec7): sanity failures are a
/// bare rejection, contextual failures carry the specific reason, and
/// database-invariant failures are fatal.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// A transaction failed `hasSaneCovenants`.
    #[error("transaction {0} failed the covenant sanity check")]
    Sanity(String),
    /// A transaction failed contextual covenant verification.
    #[error(transparent)]
    Covenant(#[from] CovenantError),
    /// A database-invariant failure occurred while applying the block.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Applies one block's transactions to `view` (spec.md ssec4.5
/// `connectBlock`): runs sanity and contextual checks for every
/// transaction, then derives the name hash for each name-touching output
/// and mutates (or initializes) its [`crate::coinview::CoinEntry`]
/// accordingly. `lookup` resolves a spent outpoint's covenant annotation and
/// locked coin value (the out-of-scope UTXO set, spec.md ssec1); the caller
/// is responsible for ensuring it reflects exactly the inputs spendable at
/// `height`.
///
/// Returns the total value conjured by coinbase airdrop/claim witnesses.
#[allow(clippy::too_many_arguments)]
pub fn connect_block<S: ChainStore>(
    view: &mut CoinView<'_, S>,
    txs: &[Transaction],
    height: u32,
    params: &NetworkParams,
    rules: &Rules<'_>,
    verifier: &dyn DnssecVerifier,
    headers: &dyn HeaderIndex,
    mut lookup: impl FnMut(&Outpoint) -> Option<(CovenantOutput, u64)>,
) -> Result<i64, ConnectError> {
    let start = Instant::now();
    let mut conjured: i64 = 0;

    for tx in txs {
        conjured += apply_transaction(view, tx, height, params, rules, verifier, headers, &mut lookup)?;
    }

    tracing::debug!(height, duration_ms = start.elapsed().as_secs_f64() * 1000.0, "connectBlock applied");
    na_telemetry::metrics().observe_connect_block_duration(start.elapsed().as_secs_f64());
    Ok(conjured)
}

/// Runs sanity and contextual verification for a single transaction and
/// applies its name-touching outputs to `view`, returning the value it
/// conjured (coinbases only). Factored out of [`connect_block`] so
/// `na-mempool`'s shadow-state can drive the identical per-transaction
/// state machine against its own simulated view without re-deriving the
/// covenant rules (spec.md ssec4.7 "shadow coin-view").
#[allow(clippy::too_many_arguments)]
pub fn apply_transaction<S: ChainStore>(
    view: &mut CoinView<'_, S>,
    tx: &Transaction,
    height: u32,
    params: &NetworkParams,
    rules: &Rules<'_>,
    verifier: &dyn DnssecVerifier,
    headers: &dyn HeaderIndex,
    mut lookup: impl FnMut(&Outpoint) -> Option<(CovenantOutput, u64)>,
) -> Result<i64, ConnectError> {
    if !sanity::check(tx, verifier) {
        return Err(ConnectError::Sanity(hex::encode(tx.hash)));
    }

    // `verifyCovenants`'s `auctions` lookup must see any record this
    // transaction references, whether or not an earlier transaction already
    // touched it, so every name hash this tx's outputs name is materialized
    // into the view before the check runs.
    for output in &tx.outputs {
        if output.covenant.kind != CovenantKind::None {
            view.get_or_create(output.covenant.name_hash)?;
        }
    }

    let conjured = crate::covenant::context::verify(tx, height, params, rules, headers, &mut lookup, |h| {
        view.peek(h).cloned()
    })
    .map_err(|e| {
        na_telemetry::metrics().inc_covenant_rejected(e.code());
        e
    })?;

    // Coinbases may carry `CLAIM` covenants (sanity::check restricts them to
    // `NONE`/`CLAIM`), so name-touching outputs are applied regardless of
    // `is_coinbase`.
    for (idx, output) in tx.outputs.iter().enumerate() {
        if output.covenant.kind == CovenantKind::None {
            continue;
        }
        let outpoint = Outpoint::new(tx.hash, idx as u32);
        apply_output(view, &output.covenant, output.value, outpoint, height, params, rules, verifier)?;
    }

    Ok(conjured)
}

#[allow(clippy::too_many_arguments)]
fn apply_output<S: ChainStore>(
    view: &mut CoinView<'_, S>,
    covenant: &CovenantOutput,
    output_value: u64,
    outpoint: Outpoint,
    height: u32,
    params: &NetworkParams,
    rules: &Rules<'_>,
    verifier: &dyn DnssecVerifier,
) -> Result<(), ConnectError> {
    debug_assert_eq!(hash_name(&covenant.name), covenant.name_hash);

    match covenant.kind {
        CovenantKind::Open => {
            if !rules.is_available(&covenant.name, height) {
                return Err(CovenantError::NotAvailable("name is reserved or not yet rolled out").into());
            }
            let entry = view.get_or_create(covenant.name_hash)?;
            let current = entry.record().clone();
            open_if_fresh(entry.txn(), current, covenant.name.clone(), height, params);
        }
        CovenantKind::Bid => {
            let entry = view.get_or_create(covenant.name_hash)?;
            let current = entry.record().clone();
            if current.is_null() || current.is_expired(height, params) {
                if !rules.is_available(&covenant.name, height) {
                    return Err(CovenantError::NotAvailable("name is reserved or not yet rolled out").into());
                }
                open_if_fresh(entry.txn(), current, covenant.name.clone(), height, params);
            }
        }
        CovenantKind::Claim => {
            let proof_bytes = covenant
                .dnssec_proof
                .as_ref()
                .ok_or_else(|| CovenantError::BadClaimProof("missing proof".into()))?;
            let proof = verifier
                .verify(&covenant.name, proof_bytes)
                .map_err(|e| CovenantError::BadClaimProof(e.to_string()))?;
            let entry = view.get_or_create(covenant.name_hash)?;
            let current = entry.record().clone();
            if current.is_null() || current.is_expired(height, params) {
                open_if_fresh(entry.txn(), current, covenant.name.clone(), height, params);
                entry.txn().set_claimed(true);
                entry.txn().set_weak(proof.weak);
                // A CLAIM has no competing bids, so it stands as its own
                // uncontested winner: `owner`/`value` are set exactly as a
                // sole REVEAL would set them, so the REGISTER that follows
                // (spec.md ssec4.2's `CLAIM -> REGISTER` transition) has a
                // winner and an owed price to check against.
                entry.txn().set_owner(Some(outpoint));
                entry.txn().set_value(Some(0));
            }
        }
        CovenantKind::Reveal => {
            let entry = view.get_or_create(covenant.name_hash)?;
            if entry.record().state(height, params) == Phase::Reveal {
                entry.record_reveal(output_value, outpoint);
            }
        }
        CovenantKind::Register => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_owner(Some(outpoint));
            entry.txn().set_data(covenant.data.clone());
            entry.txn().set_renewal(height);
            na_telemetry::metrics().inc_auctions_registered();
        }
        CovenantKind::Update => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_owner(Some(outpoint));
            entry.txn().set_data(covenant.data.clone());
            if covenant.commit_hash.is_some() {
                entry.txn().set_renewal(height);
            }
        }
        CovenantKind::Renew => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_owner(Some(outpoint));
            entry.txn().set_renewal(height);
        }
        CovenantKind::Transfer => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_owner(Some(outpoint));
            entry.txn().set_transfer(Some(height));
        }
        CovenantKind::Finalize => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_owner(Some(outpoint));
            entry.txn().set_renewal(height);
            entry.txn().set_transfer(None);
        }
        CovenantKind::Revoke => {
            let entry = view.get_or_create(covenant.name_hash)?;
            entry.txn().set_revoked(Some(height));
            na_telemetry::metrics().inc_auctions_revoked();
        }
        CovenantKind::Redeem | CovenantKind::None => {}
    }
    Ok(())
}

/// Resets a null-or-expired record for a fresh auction cycle (spec.md
/// ssec4.5's shared OPEN/BID/CLAIM branch), and reports an expiry metric
/// when the prior cycle is the one being reclaimed.
fn open_if_fresh(
    txn: &mut crate::delta::AuctionTxn,
    current: Auction,
    name: Vec<u8>,
    height: u32,
    params: &NetworkParams,
) {
    if current.is_null() || current.is_expired(height, params) {
        if !current.is_null() {
            na_telemetry::metrics().inc_auctions_expired();
        }
        txn.reset_for_open(name, height);
        na_telemetry::metrics().inc_auctions_opened();
    }
}

/// Flushes a connected block's accumulated, already-consumed [`CoinView`]
/// entries to `store` and `tree` (spec.md ssec4.5 `saveView`): updated
/// records are written under `a‖hash`, the aggregated reverse-undo blob is
/// written under `u‖height`, and the authenticated tree is mutated and
/// committed. All three commit atomically from the caller's perspective
/// (one `write_batch` call, one `commit` call, issued back to back with no
/// suspension between them).
///
/// Takes `touched` — the output of [`CoinView::into_touched`] — rather than
/// the view itself: `CoinView<'a, S>` borrows the same store this function
/// writes back into, so the caller must let that borrow end (by consuming
/// the view) before taking the `&mut S` this function needs; `CoinEntry`
/// itself carries no such borrow.
pub fn save_view<T: AuthenticatedTree, S: ChainStore>(
    tree: &mut T,
    store: &mut S,
    touched: BTreeMap<NameHash, CoinEntry>,
    height: u32,
) -> Result<[u8; 32], DbError> {
    let mut batch = WriteBatch::new();
    let mut tree_batch = TreeBatch::new();
    let mut groups: Vec<(NameHash, AuctionDelta)> = Vec::new();

    for (hash, entry) in touched {
        let (record, delta, _existed_before) = entry.into_parts();
        if delta.is_empty() {
            continue;
        }
        let key = auction_key(&hash);
        let tree_key = hash.as_bytes().to_vec();
        if record.is_null() {
            batch.delete(key);
            tree_batch.remove(tree_key);
        } else {
            let bytes = record.to_bytes();
            batch.put(key, bytes.clone());
            tree_batch.insert(tree_key, bytes);
        }
        groups.push((hash, delta));
    }

    let mut undo = Writer::new();
    undo.u32_be(groups.len() as u32);
    for (hash, delta) in &groups {
        undo.raw(hash.as_bytes());
        // `encode_ops` is itself self-delimiting (a leading op count), so
        // wrap it with a length prefix here purely to let `revert` slice
        // each name's op blob off the shared reader without decoding it.
        undo.var_bytes(&delta.encode_ops());
    }
    batch.put(undo_key(height), undo.into_bytes());

    store.write_batch(batch).map_err(|e| DbError::Backend(e.to_string()))?;
    let root = tree.commit(tree_batch).map_err(|e| DbError::Backend(e.to_string()))?;
    tracing::info!(height, names_touched = groups.len(), root = %hex::encode(root), "block connected");
    Ok(root)
}

/// Reverts the block at `height` (spec.md ssec4.5 `revert`): reads the
/// undo blob, restores each touched name's pre-block record (put or
/// delete), and inverts the authenticated tree's inserts/removes.
pub fn revert<T: AuthenticatedTree, S: ChainStore>(
    tree: &mut T,
    store: &mut S,
    height: u32,
) -> Result<[u8; 32], DbError> {
    let raw = store
        .get(&undo_key(height))
        .map_err(|e| DbError::Backend(e.to_string()))?
        .ok_or(DbError::MissingUndo(height))?;

    let err = |msg: &str| DbError::CorruptRecord("<undo-blob>".into(), msg.into());
    let mut r = Reader::new(&raw);
    let count = r.u32_be().map_err(|_| err("truncated undo count"))?;

    let mut batch = WriteBatch::new();
    let mut tree_batch = TreeBatch::new();

    for _ in 0..count {
        let hash = NameHash::from_bytes(r.array32().map_err(|_| err("truncated name hash"))?);
        let op_bytes = r.var_bytes().map_err(|_| err("truncated op blob"))?;
        let ops = AuctionDelta::decode_ops(op_bytes)?;

        let key = auction_key(&hash);
        let current = load_auction(store, &hash)?.unwrap_or_else(Auction::null);
        let mut restored = current;
        ops.apply_state(&mut restored);

        let tree_key = hash.as_bytes().to_vec();
        if restored.is_null() {
            batch.delete(key);
            tree_batch.remove(tree_key);
        } else {
            let bytes = restored.to_bytes();
            batch.put(key, bytes.clone());
            tree_batch.insert(tree_key, bytes);
        }
    }

    batch.delete(undo_key(height));
    store.write_batch(batch).map_err(|e| DbError::Backend(e.to_string()))?;
    let root = tree.commit(tree_batch).map_err(|e| DbError::Backend(e.to_string()))?;
    tracing::info!(height, root = %hex::encode(root), "block disconnected");
    Ok(root)
}

/// Produces an inclusion proof for `name` against the tree snapshot at
/// `root` (spec.md ssec4.5 `proveName`), suitable for light-client
/// verification.
pub fn prove_name<T: AuthenticatedTree>(tree: &T, root: [u8; 32], name: &[u8]) -> Result<(NameHash, TreeProof), DbError> {
    let hash = hash_name(name);
    let snapshot = tree.snapshot(root).map_err(|e| DbError::Backend(e.to_string()))?;
    let proof = snapshot.prove(hash.as_bytes()).map_err(|e| DbError::Backend(e.to_string()))?;
    Ok((hash, proof))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_key_and_undo_key_have_distinct_prefixes() {
        let hash = NameHash::from_bytes([7u8; 32]);
        let ak = auction_key(&hash);
        let uk = undo_key(5);
        assert_eq!(ak[0], b'a');
        assert_eq!(uk[0], b'u');
        assert_ne!(ak[0], uk[0]);
    }

    #[test]
    fn load_auction_returns_none_for_absent_key() {
        let store = na_state::MemStore::new();
        let hash = NameHash::from_bytes([1u8; 32]);
        assert!(load_auction(&store, &hash).unwrap().is_none());
    }
}
