//! End-to-end coverage of `connect_block` / `save_view` / `revert` wired
//! together against the in-memory tree and store, one scenario per test
//! function (mirrors the worked scenarios in spec.md ssec8). No shared
//! harness: each test builds its own small fixtures, the same way the
//! covenant module's own unit tests do.

use std::collections::HashMap;

use na_api::dnssec::{DnssecError, DnssecVerifier, ProofData};
use na_api::headers::EmptyHeaderIndex;
use na_api::store::ChainStore;
use na_api::tree::AuthenticatedTree;
use na_names::db::{connect_block, load_auction, revert, save_view};
use na_names::prelude::*;
use na_state::{MemStore, MemTree};
use na_types::name::{hash_name, Outpoint};
use na_types::params::NetworkParams;

struct AllowAllVerifier;

impl DnssecVerifier for AllowAllVerifier {
    fn verify(&self, name: &[u8], _proof: &[u8]) -> Result<ProofData, DnssecError> {
        Ok(ProofData { name: name.to_vec(), weak: false, commit_height: 0, commit_hash: [0u8; 32] })
    }
}

/// Same window lengths as spec.md ssec8's worked scenarios, with rollout
/// and reservation gating disabled so plain test names are immediately
/// biddable regardless of their hash.
fn params() -> NetworkParams {
    NetworkParams { no_rollout: true, no_reserved: true, ..NetworkParams::example() }
}

fn open_covenant(name: &[u8]) -> CovenantOutput {
    CovenantOutput { kind: CovenantKind::Open, name: name.to_vec(), name_hash: hash_name(name), ..CovenantOutput::none() }
}

fn bid_covenant(name: &[u8], blind: [u8; 32]) -> CovenantOutput {
    CovenantOutput {
        kind: CovenantKind::Bid,
        name: name.to_vec(),
        name_hash: hash_name(name),
        blind_or_nonce: Some(blind),
        ..CovenantOutput::none()
    }
}

fn reveal_covenant(name: &[u8], nonce: [u8; 32], link: u32) -> CovenantOutput {
    CovenantOutput {
        kind: CovenantKind::Reveal,
        name: name.to_vec(),
        name_hash: hash_name(name),
        blind_or_nonce: Some(nonce),
        link: Some(link),
        ..CovenantOutput::none()
    }
}

fn register_covenant(name: &[u8], data: Vec<u8>, link: u32) -> CovenantOutput {
    CovenantOutput {
        kind: CovenantKind::Register,
        name: name.to_vec(),
        name_hash: hash_name(name),
        data: Some(data),
        link: Some(link),
        ..CovenantOutput::none()
    }
}

fn claim_covenant(name: &[u8]) -> CovenantOutput {
    CovenantOutput {
        kind: CovenantKind::Claim,
        name: name.to_vec(),
        name_hash: hash_name(name),
        dnssec_proof: Some(vec![1, 2, 3]),
        ..CovenantOutput::none()
    }
}

fn tx(hash: u8, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Transaction {
    Transaction { hash: [hash; 32], inputs, outputs, is_coinbase: false, airdrop_witnesses: vec![] }
}

/// A `prevout -> covenant` side table standing in for the out-of-scope
/// UTXO set (spec.md ssec1): every name-touching output created in this
/// test gets recorded here so a later transaction's `lookup` closure can
/// resolve what it spends.
#[derive(Default)]
struct Utxos(HashMap<Outpoint, (CovenantOutput, u64)>);

impl Utxos {
    fn record(&mut self, outpoint: Outpoint, covenant: CovenantOutput, value: u64) {
        self.0.insert(outpoint, (covenant, value));
    }

    /// Records the covenant and value of a transaction's single output at
    /// `outpoint`, matching the convention every test in this file uses
    /// (one name-touching output per transaction).
    fn record_output(&mut self, outpoint: Outpoint, output: &TxOutput) {
        self.record(outpoint, output.covenant.clone(), output.value);
    }

    fn lookup(&self) -> impl FnMut(&Outpoint) -> Option<(CovenantOutput, u64)> + '_ {
        move |o: &Outpoint| self.0.get(o).cloned()
    }
}

#[test]
fn second_price_register_happy_path() {
    let p = params();
    let reserved = ReservedTable::genesis(0, 0, 0);
    let rules = Rules::new(&reserved, &p);
    let verifier = AllowAllVerifier;
    let headers = EmptyHeaderIndex;
    let name = b"alpha";
    let name_hash = hash_name(name);

    let mut store = MemStore::new();
    let mut tree = MemTree::new();
    let mut utxos = Utxos::default();

    // Height 20: OPEN "alpha".
    let open_tx = tx(1, vec![], vec![TxOutput { value: 0, address: vec![], covenant: open_covenant(name) }]);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[open_tx], 20, &p, &rules, &verifier, &headers, |_| None).expect("open connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 20).expect("open saves");
    }

    // Height 26 (start of BIDDING): two blinded bids, 1000 and 500.
    let nonce1 = [7u8; 32];
    let nonce2 = [8u8; 32];
    let blind1 = rules.blind(1000, &nonce1);
    let blind2 = rules.blind(500, &nonce2);
    let bid_tx1 = tx(2, vec![], vec![TxOutput { value: 1000, address: vec![], covenant: bid_covenant(name, blind1) }]);
    let bid_tx2 = tx(3, vec![], vec![TxOutput { value: 500, address: vec![], covenant: bid_covenant(name, blind2) }]);
    let bid_outpoint1 = Outpoint::new(bid_tx1.hash, 0);
    let bid_outpoint2 = Outpoint::new(bid_tx2.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[bid_tx1.clone(), bid_tx2.clone()], 26, &p, &rules, &verifier, &headers, |_| None)
            .expect("bids connect");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 26).expect("bids save");
    }
    utxos.record_output(bid_outpoint1, &bid_tx1.outputs[0]);
    utxos.record_output(bid_outpoint2, &bid_tx2.outputs[0]);

    // Height 31 (start of REVEAL): both bids revealed in bid order, so the
    // 1000 bid is first-seen-max and the 500 bid sets the second price.
    let reveal_tx1 = tx(4, vec![TxInput { prevout: bid_outpoint1 }], vec![TxOutput {
        value: 1000,
        address: vec![],
        covenant: reveal_covenant(name, nonce1, 0),
    }]);
    let reveal_tx2 = tx(5, vec![TxInput { prevout: bid_outpoint2 }], vec![TxOutput {
        value: 500,
        address: vec![],
        covenant: reveal_covenant(name, nonce2, 0),
    }]);
    let reveal_outpoint1 = Outpoint::new(reveal_tx1.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(
            &mut view,
            &[reveal_tx1.clone(), reveal_tx2.clone()],
            31,
            &p,
            &rules,
            &verifier,
            &headers,
            utxos.lookup(),
        )
        .expect("reveals connect");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 31).expect("reveals save");
    }
    utxos.record_output(reveal_outpoint1, &reveal_tx1.outputs[0]);

    let mid = load_auction(&store, &name_hash).unwrap().expect("record exists");
    assert_eq!(mid.owner, Some(reveal_outpoint1));
    assert_eq!(mid.highest, Some(1000));
    assert_eq!(mid.value, Some(500));

    // Height 41 (CLOSED): REGISTER paying the second price.
    let register_tx = tx(6, vec![TxInput { prevout: reveal_outpoint1 }], vec![TxOutput {
        value: 500,
        address: vec![],
        covenant: register_covenant(name, b"A 127.0.0.1".to_vec(), 0),
    }]);
    let register_outpoint = Outpoint::new(register_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[register_tx], 41, &p, &rules, &verifier, &headers, utxos.lookup())
            .expect("register connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 41).expect("register saves");
    }

    let final_record = load_auction(&store, &name_hash).unwrap().expect("record exists");
    assert_eq!(final_record.owner, Some(register_outpoint));
    assert_eq!(final_record.value, Some(500));
    assert_eq!(final_record.highest, Some(1000));
    assert_eq!(final_record.data, Some(b"A 127.0.0.1".to_vec()));
    assert_eq!(final_record.renewal, 41);
}

struct FixedHeaderIndex(u32);

impl na_api::headers::HeaderIndex for FixedHeaderIndex {
    fn height_of(&self, _hash: &[u8; 32]) -> Option<u32> {
        Some(self.0)
    }
}

#[test]
fn premature_renewal_commitment_is_rejected() {
    let p = params();
    let reserved = ReservedTable::genesis(0, 0, 0);
    let rules = Rules::new(&reserved, &p);
    let verifier = AllowAllVerifier;
    let headers = EmptyHeaderIndex;
    let name = b"renewme";
    let name_hash = hash_name(name);

    let mut store = MemStore::new();
    let mut tree = MemTree::new();
    let mut utxos = Utxos::default();

    // A CLAIM on a never-before-touched name stands as its own uncontested
    // winner, so it can register immediately (spec.md ssec4.2's
    // `CLAIM -> REGISTER` transition).
    let claim_tx = {
        let mut t = tx(1, vec![], vec![TxOutput { value: 0, address: vec![], covenant: claim_covenant(name) }]);
        t.is_coinbase = true;
        t
    };
    let claim_outpoint = Outpoint::new(claim_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[claim_tx.clone()], 0, &p, &rules, &verifier, &headers, |_| None)
            .expect("claim connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 0).expect("claim saves");
    }
    utxos.record_output(claim_outpoint, &claim_tx.outputs[0]);

    let register_tx = tx(2, vec![TxInput { prevout: claim_outpoint }], vec![TxOutput {
        value: 0,
        address: vec![],
        covenant: register_covenant(name, b"A 127.0.0.1".to_vec(), 0),
    }]);
    let register_outpoint = Outpoint::new(register_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[register_tx.clone()], 2, &p, &rules, &verifier, &headers, utxos.lookup())
            .expect("register connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 2).expect("register saves");
    }
    utxos.record_output(register_outpoint, &register_tx.outputs[0]);

    // At height 241 the chain itself has not produced `renewal_maturity`
    // (400) blocks yet, so any commitment is rejected as premature
    // regardless of which block hash it names (spec.md ssec8 scenario 2).
    let renew_cov = CovenantOutput {
        kind: CovenantKind::Renew,
        name: name.to_vec(),
        name_hash,
        link: Some(0),
        commit_hash: Some([9u8; 32]),
        ..CovenantOutput::none()
    };
    let renew_tx = tx(3, vec![TxInput { prevout: register_outpoint }], vec![TxOutput {
        value: 0,
        address: vec![],
        covenant: renew_cov,
    }]);

    let known_but_recent = FixedHeaderIndex(0);
    let mut view = CoinView::new(&store);
    let result = connect_block(&mut view, &[renew_tx], 241, &p, &rules, &verifier, &known_but_recent, utxos.lookup());
    assert!(matches!(
        result,
        Err(na_names::db::ConnectError::Covenant(na_types::error::CovenantError::BadRenewalPremature { .. }))
    ));
}

#[test]
fn reorg_revert_restores_pre_block_state() {
    let p = params();
    let reserved = ReservedTable::genesis(0, 0, 0);
    let rules = Rules::new(&reserved, &p);
    let verifier = AllowAllVerifier;
    let headers = EmptyHeaderIndex;

    let mut store = MemStore::new();
    let mut tree = MemTree::new();
    let root0 = tree.root();

    // Block at height 5: OPEN "beta".
    let open_tx = tx(1, vec![], vec![TxOutput { value: 0, address: vec![], covenant: open_covenant(b"beta") }]);
    let root1 = {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[open_tx], 5, &p, &rules, &verifier, &headers, |_| None).expect("open connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 5).expect("open saves")
    };
    assert_ne!(root1, root0);

    // Block at height 11: CLAIM "gamma", an unrelated name.
    let claim_tx = {
        let mut t = tx(2, vec![], vec![TxOutput { value: 0, address: vec![], covenant: claim_covenant(b"gamma") }]);
        t.is_coinbase = true;
        t
    };
    let root2 = {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[claim_tx], 11, &p, &rules, &verifier, &headers, |_| None).expect("claim connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 11).expect("claim saves")
    };
    assert_ne!(root2, root1);

    // Disconnect both blocks in reverse order, as a reorg would.
    let root_after_first_revert = revert(&mut tree, &mut store, 11).expect("reverts claim block");
    assert_eq!(root_after_first_revert, root1);
    let root_after_second_revert = revert(&mut tree, &mut store, 5).expect("reverts open block");
    assert_eq!(root_after_second_revert, root0);

    assert!(load_auction(&store, &hash_name(b"beta")).unwrap().is_none());
    assert!(load_auction(&store, &hash_name(b"gamma")).unwrap().is_none());
    assert!(store.get(&na_names::db::undo_key(5)).unwrap().is_none());
    assert!(store.get(&na_names::db::undo_key(11)).unwrap().is_none());
}

#[test]
fn finalize_requires_transfer_lockup_to_mature_end_to_end() {
    let p = params();
    let reserved = ReservedTable::genesis(0, 0, 0);
    let rules = Rules::new(&reserved, &p);
    let verifier = AllowAllVerifier;
    let headers = EmptyHeaderIndex;
    let name = b"movable";
    let name_hash = hash_name(name);

    let mut store = MemStore::new();
    let mut tree = MemTree::new();
    let mut utxos = Utxos::default();

    let claim_tx = {
        let mut t = tx(1, vec![], vec![TxOutput { value: 0, address: vec![], covenant: claim_covenant(name) }]);
        t.is_coinbase = true;
        t
    };
    let claim_outpoint = Outpoint::new(claim_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[claim_tx.clone()], 0, &p, &rules, &verifier, &headers, |_| None)
            .expect("claim connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 0).expect("claim saves");
    }
    utxos.record_output(claim_outpoint, &claim_tx.outputs[0]);

    // CLAIM must register before it can transition anywhere else (spec.md
    // ssec4.2's transition table only allows CLAIM/REVEAL to go to
    // REGISTER or REDEEM).
    let register_tx = tx(2, vec![TxInput { prevout: claim_outpoint }], vec![TxOutput {
        value: 0,
        address: vec![],
        covenant: register_covenant(name, b"A 127.0.0.1".to_vec(), 0),
    }]);
    let register_outpoint = Outpoint::new(register_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[register_tx.clone()], 1, &p, &rules, &verifier, &headers, utxos.lookup())
            .expect("register connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 1).expect("register saves");
    }
    utxos.record_output(register_outpoint, &register_tx.outputs[0]);

    let transfer_cov = CovenantOutput {
        kind: CovenantKind::Transfer,
        name: name.to_vec(),
        name_hash,
        link: Some(0),
        address: Some(b"new-owner-address".to_vec()),
        ..CovenantOutput::none()
    };
    let transfer_tx = tx(3, vec![TxInput { prevout: register_outpoint }], vec![TxOutput {
        value: 0,
        address: vec![],
        covenant: transfer_cov,
    }]);
    let transfer_outpoint = Outpoint::new(transfer_tx.hash, 0);
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[transfer_tx.clone()], 10, &p, &rules, &verifier, &headers, utxos.lookup())
            .expect("transfer connects");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 10).expect("transfer saves");
    }
    utxos.record_output(transfer_outpoint, &transfer_tx.outputs[0]);

    let final_cov = CovenantOutput {
        kind: CovenantKind::Finalize,
        name: name.to_vec(),
        name_hash,
        link: Some(0),
        // `sanity::check` requires TRANSFER/FINALIZE outputs to carry their
        // own committed address regardless of what the linked TxOutput's
        // address turns out to be.
        address: Some(b"new-owner-address".to_vec()),
        ..CovenantOutput::none()
    };
    let finalize_tx = tx(4, vec![TxInput { prevout: transfer_outpoint }], vec![TxOutput {
        value: 0,
        address: b"new-owner-address".to_vec(),
        covenant: final_cov,
    }]);

    // `transfer_lockup` is 10, so height 10 + 10 - 1 = 19 is still premature.
    {
        let mut view = CoinView::new(&store);
        let result =
            connect_block(&mut view, &[finalize_tx.clone()], 19, &p, &rules, &verifier, &headers, utxos.lookup());
        assert!(matches!(
            result,
            Err(na_names::db::ConnectError::Covenant(na_types::error::CovenantError::BadFinalizeMaturity { .. }))
        ));
    }

    // At height 20 the lockup has matured and the commitment matches.
    {
        let mut view = CoinView::new(&store);
        connect_block(&mut view, &[finalize_tx], 20, &p, &rules, &verifier, &headers, utxos.lookup())
            .expect("finalize connects once matured");
        let touched = view.into_touched();
        save_view(&mut tree, &mut store, touched, 20).expect("finalize saves");
    }

    let record = load_auction(&store, &name_hash).unwrap().expect("record exists");
    assert!(record.transfer.is_none());
    assert_eq!(record.renewal, 20);
}
