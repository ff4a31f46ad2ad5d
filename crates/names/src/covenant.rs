// Path: crates/names/src/covenant.rs
//! The covenant type tag, the minimal transaction model the sanity and
//! contextual checks are driven by, and the two check passes themselves
//! (spec.md ssec4.2).
//!
//! The full transaction/block wire format is owned by the out-of-scope
//! block-storage collaborator (spec.md ssec1); [`Transaction`] here is the
//! minimal structural stand-in this crate needs to drive `sanity::check`
//! and `context::verify` deterministically — an input's previous output,
//! and an output's value/address/covenant.

use na_api::dnssec::DnssecVerifier;
use na_api::headers::HeaderIndex;
use na_types::error::CovenantError;
use na_types::name::{NameHash, Outpoint, MAX_NAME_SIZE, MAX_RESOURCE_SIZE};

/// The twelve-member covenant superset (spec.md ssec9 Open Question 1):
/// `NONE` plus the eleven active covenant types. The historical
/// eight-type variant (without `RENEW`/`FINALIZE`/`CLAIM`/`OPEN`) is not
/// reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CovenantKind {
    /// No name-related constraint on this output.
    None,
    /// Establishes ownership of a name via an external DNSSEC proof.
    Claim,
    /// Opens an auction for a name.
    Open,
    /// Places a blinded bid.
    Bid,
    /// Reveals a bid's value and nonce.
    Reveal,
    /// Registers the winning bidder as owner.
    Register,
    /// Redeems a losing BID/CLAIM back to ordinary funds.
    Redeem,
    /// Renews a name's registration with a freshness commitment.
    Renew,
    /// Updates an owned name's resource data.
    Update,
    /// Begins a transfer of ownership to a new address.
    Transfer,
    /// Completes a previously requested transfer.
    Finalize,
    /// Permanently revokes (burns) a name.
    Revoke,
}

impl CovenantKind {
    /// A short, stable, uppercase name for logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Claim => "CLAIM",
            Self::Open => "OPEN",
            Self::Bid => "BID",
            Self::Reveal => "REVEAL",
            Self::Register => "REGISTER",
            Self::Redeem => "REDEEM",
            Self::Renew => "RENEW",
            Self::Update => "UPDATE",
            Self::Transfer => "TRANSFER",
            Self::Finalize => "FINALIZE",
            Self::Revoke => "REVOKE",
        }
    }
}

/// A name-touching output's covenant annotation.
#[derive(Debug, Clone)]
pub struct CovenantOutput {
    /// The covenant type.
    pub kind: CovenantKind,
    /// The name this covenant concerns.
    pub name: Vec<u8>,
    /// The name's SHA3-256 hash, as stored on the wire; checked against
    /// `hashName(name)` by `sanity::check`.
    pub name_hash: NameHash,
    /// `BID`'s blind commitment, or `REVEAL`'s nonce; empty otherwise.
    pub blind_or_nonce: Option<[u8; 32]>,
    /// `REGISTER`/`UPDATE`'s resource-record bundle.
    pub data: Option<Vec<u8>>,
    /// `RENEW`/`UPDATE`/`TRANSFER`/`FINALIZE`'s committed block hash, used
    /// for the renewal freshness check.
    pub commit_hash: Option<[u8; 32]>,
    /// `TRANSFER`/`FINALIZE`'s committed destination address.
    pub address: Option<Vec<u8>>,
    /// `CLAIM`'s embedded DNSSEC proof bytes.
    pub dnssec_proof: Option<Vec<u8>>,
    /// The index, within the same transaction, of the output a legacy
    /// sanity check treats as this covenant's predecessor (spec.md GLOSSARY "Link").
    pub link: Option<u32>,
}

impl CovenantOutput {
    /// A bare `NONE` covenant.
    pub fn none() -> Self {
        Self {
            kind: CovenantKind::None,
            name: Vec::new(),
            name_hash: NameHash::from_bytes([0u8; 32]),
            blind_or_nonce: None,
            data: None,
            commit_hash: None,
            address: None,
            dnssec_proof: None,
            link: None,
        }
    }
}

/// A transaction output: value, destination address, and covenant.
#[derive(Debug, Clone)]
pub struct TxOutput {
    /// The output's value in base units.
    pub value: u64,
    /// The output's destination address (raw bytes, length-prefixed on
    /// the wire, `<= 40` bytes per spec.md ssec6).
    pub address: Vec<u8>,
    /// The output's covenant annotation.
    pub covenant: CovenantOutput,
}

/// A transaction input: the outpoint it spends.
#[derive(Debug, Clone, Copy)]
pub struct TxInput {
    /// The previous output being spent.
    pub prevout: Outpoint,
}

/// The minimal transaction shape the covenant rules operate on.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// The transaction's own hash, used to derive new outpoints.
    pub hash: [u8; 32],
    /// The spent inputs.
    pub inputs: Vec<TxInput>,
    /// The produced outputs.
    pub outputs: Vec<TxOutput>,
    /// `true` for a coinbase transaction (no real inputs; conjures value).
    pub is_coinbase: bool,
    /// Airdrop-proof witnesses, one per extra coinbase input, each a raw
    /// value bound by `MAX_MONEY` (spec.md ssec4.2 coinbase conjuration).
    pub airdrop_witnesses: Vec<u64>,
}

/// Structural ("sanity") checks against the transaction alone (spec.md ssec4.2).
pub mod sanity {
    use super::*;

    /// `MAX_MONEY`, the ceiling on any single conjured or transferred value.
    pub const MAX_MONEY: u64 = 2_000_000_000 * 100_000_000;

    /// Enforces exact item shapes, length limits, name/hash agreement, and
    /// input-index existence for every name-touching output on `tx`.
    /// Coinbases may only carry `NONE` (optionally with airdrop witnesses)
    /// and `CLAIM` covenants.
    pub fn check(tx: &Transaction, verifier: &dyn DnssecVerifier) -> bool {
        for output in &tx.outputs {
            if !check_output(tx, output) {
                return false;
            }
            if tx.is_coinbase
                && !matches!(output.covenant.kind, CovenantKind::None | CovenantKind::Claim)
            {
                return false;
            }
            if output.covenant.kind == CovenantKind::Claim {
                let proof = match &output.covenant.dnssec_proof {
                    Some(p) => p,
                    None => return false,
                };
                let decoded = match verifier.verify(&output.covenant.name, proof) {
                    Ok(d) => d,
                    Err(_) => return false,
                };
                if decoded.name != output.covenant.name {
                    return false;
                }
            }
        }
        true
    }

    fn check_output(tx: &Transaction, output: &TxOutput) -> bool {
        if output.address.len() > 40 {
            return false;
        }
        let c = &output.covenant;
        if c.kind == CovenantKind::None {
            return true;
        }
        if c.name.len() > MAX_NAME_SIZE || c.name.is_empty() {
            return false;
        }
        if na_types::name::hash_name(&c.name) != c.name_hash {
            return false;
        }
        if let Some(d) = &c.data {
            if d.len() > MAX_RESOURCE_SIZE {
                return false;
            }
        }
        if let Some(link) = c.link {
            if tx.inputs.get(link as usize).is_none() {
                return false;
            }
        }
        match c.kind {
            CovenantKind::Open | CovenantKind::Redeem | CovenantKind::Revoke => true,
            CovenantKind::Bid | CovenantKind::Reveal => c.blind_or_nonce.is_some(),
            CovenantKind::Register | CovenantKind::Update => true,
            CovenantKind::Renew => c.commit_hash.is_some(),
            CovenantKind::Transfer | CovenantKind::Finalize => c.address.is_some(),
            CovenantKind::Claim => c.dnssec_proof.is_some(),
            CovenantKind::None => true,
        }
    }
}

/// Contextual checks requiring spent outputs and the current height
/// (spec.md ssec4.2 `verifyCovenants`).
pub mod context {
    use super::*;
    use crate::auction::Auction;
    use crate::rules::Rules;
    use na_types::params::NetworkParams;

    /// `verifyCovenants(tx, view, height, params) -> Result<conjured, CovenantError>`.
    ///
    /// `lookup` resolves a spent outpoint's full covenant annotation and its
    /// locked coin value (the "from" state of the transition table, `uc` in
    /// spec.md ssec4.2); `auctions` resolves the current in-view [`Auction`]
    /// record for a name hash, when one exists.
    pub fn verify<F, A>(
        tx: &Transaction,
        height: u32,
        params: &NetworkParams,
        rules: &Rules<'_>,
        headers: &dyn HeaderIndex,
        mut lookup: F,
        mut auctions: A,
    ) -> Result<i64, CovenantError>
    where
        F: FnMut(&Outpoint) -> Option<(CovenantOutput, u64)>,
        A: FnMut(&NameHash) -> Option<Auction>,
    {
        let mut conjured: i64 = 0;

        for (idx, input) in tx.inputs.iter().enumerate() {
            let (spent, coin_value) = match lookup(&input.prevout) {
                Some(c) => c,
                None => continue,
            };
            let linked = tx.outputs.iter().find(|o| o.covenant.link == Some(idx as u32));
            let to = linked.map(|o| o.covenant.kind).unwrap_or(CovenantKind::None);

            if !transition_allowed(spent.kind, to) {
                return Err(CovenantError::BadTransition { from: spent.kind.as_str(), to: to.as_str() });
            }

            if let Some(output) = linked {
                verify_transition_semantics(
                    &spent,
                    coin_value,
                    &input.prevout,
                    output,
                    height,
                    params,
                    rules,
                    headers,
                    &mut auctions,
                )?;
            }
        }

        if tx.is_coinbase {
            conjured += conjure_coinbase(tx)?;
        }

        Ok(conjured)
    }

    pub(crate) fn transition_allowed(from: CovenantKind, to: CovenantKind) -> bool {
        use CovenantKind::*;
        match from {
            None | Open | Redeem => matches!(to, None | Open | Bid),
            Bid => matches!(to, Reveal),
            Claim | Reveal => matches!(to, Register | Redeem),
            Register | Update | Renew | Finalize => {
                matches!(to, Update | Renew | Transfer | Revoke)
            }
            Transfer => matches!(to, Update | Renew | Revoke | Finalize),
            Revoke => false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn verify_transition_semantics<A>(
        spent: &CovenantOutput,
        coin_value: u64,
        prevout: &Outpoint,
        output: &TxOutput,
        height: u32,
        params: &NetworkParams,
        rules: &Rules<'_>,
        headers: &dyn HeaderIndex,
        auctions: &mut A,
    ) -> Result<(), CovenantError>
    where
        A: FnMut(&NameHash) -> Option<Auction>,
    {
        let name_hash = output.covenant.name_hash;

        match output.covenant.kind {
            CovenantKind::Reveal if spent.kind == CovenantKind::Bid => {
                let auction = auctions(&name_hash).ok_or(CovenantError::NotInRevealPhase)?;
                if auction.state(height, params) != crate::auction::Phase::Reveal {
                    return Err(CovenantError::NotInRevealPhase);
                }
                let nonce = output.covenant.blind_or_nonce.ok_or(CovenantError::BadRevealBlind)?;
                let blind = rules.blind(output.value, &nonce);
                let committed = spent.blind_or_nonce.ok_or(CovenantError::BadRevealBlind)?;
                if blind != committed {
                    return Err(CovenantError::BadRevealBlind);
                }
                if coin_value < output.value {
                    return Err(CovenantError::BadRevealValue);
                }
                Ok(())
            }
            CovenantKind::Register => {
                let auction = auctions(&name_hash).ok_or(CovenantError::BadRegisterWinner)?;
                if auction.owner != Some(*prevout) {
                    return Err(CovenantError::BadRegisterWinner);
                }
                let owed = auction.value.ok_or(CovenantError::BadRegisterWinner)?;
                if output.value != owed {
                    return Err(CovenantError::BadRevealValue);
                }
                Ok(())
            }
            CovenantKind::Renew => check_renewal_commitment(&output.covenant, height, params, headers),
            CovenantKind::Update => {
                if output.covenant.commit_hash.is_some() {
                    check_renewal_commitment(&output.covenant, height, params, headers)
                } else {
                    Ok(())
                }
            }
            CovenantKind::Finalize => {
                let auction = auctions(&name_hash).ok_or(CovenantError::BadFinalizeAddress)?;
                let transfer_height = auction.transfer.ok_or(CovenantError::BadFinalizeMaturity {
                    transfer_height: 0,
                    height,
                    lockup: params.transfer_lockup,
                })?;
                if height < transfer_height + params.transfer_lockup {
                    return Err(CovenantError::BadFinalizeMaturity {
                        transfer_height,
                        height,
                        lockup: params.transfer_lockup,
                    });
                }
                // The committed target address lives on the TRANSFER covenant
                // itself (the output `spent` here resolves to), not in the
                // auction record, so FINALIZE checks against `spent.address`
                // rather than any out-of-band field.
                if spent.address.as_deref() != Some(output.address.as_slice()) {
                    return Err(CovenantError::BadFinalizeAddress);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_renewal_commitment(
        covenant: &CovenantOutput,
        height: u32,
        params: &NetworkParams,
        headers: &dyn HeaderIndex,
    ) -> Result<(), CovenantError> {
        let hash = match covenant.commit_hash {
            Some(h) => h,
            None => return Ok(()),
        };
        let commit_height = headers.height_of(&hash).ok_or(CovenantError::BadRenewalUnknownBlock)?;
        // Below `renewalMaturity` no commitment can satisfy `h - renewalMaturity
        // >= h_commit` without underflowing, so every renewal this early is
        // rejected as premature outright (spec.md ssec8 scenario 2: height 241
        // with renewalMaturity=400 is rejected unconditionally).
        if height < params.renewal_maturity || commit_height > height.saturating_sub(params.renewal_maturity) {
            return Err(CovenantError::BadRenewalPremature {
                commit_height,
                height,
                renewal_maturity: params.renewal_maturity,
            });
        }
        if commit_height < height.saturating_sub(params.renewal_period) {
            return Err(CovenantError::BadRenewalStale { commit_height, height });
        }
        Ok(())
    }

    fn conjure_coinbase(tx: &Transaction) -> Result<i64, CovenantError> {
        let mut total: i64 = 0;
        for value in &tx.airdrop_witnesses {
            if *value > sanity::MAX_MONEY {
                return Err(CovenantError::MissingInput(0));
            }
            total += *value as i64;
        }
        Ok(total)
    }
}
