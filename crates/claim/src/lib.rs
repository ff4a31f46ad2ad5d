// Path: crates/claim/src/lib.rs
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
//! # Claim Data
//!
//! `createData`/`parseData` (spec.md ssec4.8): the base32 DNS-TXT wire
//! format a DNSSEC CLAIM proof carries, plus the alias-resolution and
//! reserved-name reward lookup a concrete [`na_api::dnssec::DnssecVerifier`]
//! implementation composes these with. This crate never walks a DNSSEC
//! delegation chain itself — `weak`/`rollover`/`inception`/`expiration` are
//! properties of that external chain and are supplied by the caller, not
//! computed here (spec.md ssec1 scopes DNSSEC chain validation out).

use base32::Alphabet;
use na_names::reserved::ReservedTable;
use na_types::codec::{Reader, Writer};
use na_types::error::ClaimError;
use na_types::params::NetworkParams;

/// `MAX_MONEY`, restated from `na_names::covenant::sanity::MAX_MONEY` so
/// this crate stays a leaf a DNSSEC-resolver implementation can depend on
/// without pulling in the full auction state machine.
pub const MAX_MONEY: u64 = 2_000_000_000 * 100_000_000;
/// `MAX_REWARD = 0.075 * MAX_MONEY` (spec.md ssec6), computed in integer
/// arithmetic to avoid floating point in a consensus-adjacent constant.
pub const MAX_REWARD: u64 = MAX_MONEY / 1000 * 75;

const ALPHABET: Alphabet = Alphabet::RFC4648 { padding: false };
/// Length, in bytes, of the truncated BLAKE2b-256 checksum appended to
/// every claim payload before base32 encoding.
const CHECKSUM_LEN: usize = 8;

/// The decoded contents of a claim-data TXT payload, before alias
/// resolution or reserved-table lookup (spec.md ssec4.8's `parseData`
/// inverse of `createData`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPayload {
    /// The claim format version (`<= 31`).
    pub version: u8,
    /// The committed hash (an address hash, `2..=40` bytes).
    pub hash: Vec<u8>,
    /// The fee the claimant is willing to pay, `<= MAX_REWARD`.
    pub fee: u64,
    /// `true` if this claim targets a post-fork name.
    pub forked: bool,
}

/// Encodes `payload` to spec.md ssec4.8's textual format: `prefix ‖
/// base32(version ‖ hashLen ‖ hash ‖ varint(fee) ‖ forkedFlag ‖ checksum)`.
pub fn create_data(payload: &ClaimPayload, params: &NetworkParams) -> Result<String, ClaimError> {
    if payload.version > 31 {
        return Err(ClaimError::BadVersion(payload.version));
    }
    if !(2..=40).contains(&payload.hash.len()) {
        return Err(ClaimError::BadHashLength(payload.hash.len()));
    }
    if payload.fee > MAX_REWARD {
        return Err(ClaimError::FeeTooHigh { fee: payload.fee, max_reward: MAX_REWARD });
    }
    if payload.forked && payload.fee != 0 {
        return Err(ClaimError::ForkedNonZeroFee);
    }

    let mut w = Writer::new();
    w.u8(payload.version);
    w.u8(payload.hash.len() as u8);
    w.raw(&payload.hash);
    w.varint(payload.fee);
    w.u8(if payload.forked { 1 } else { 0 });
    let body = w.into_bytes();

    let digest = na_crypto::blake2b_256(&body);
    let checksum: &[u8] = digest.get(..CHECKSUM_LEN).unwrap_or(digest.as_slice());

    let mut full = body;
    full.extend_from_slice(checksum);

    Ok(format!("{}{}", params.claim_prefix, base32::encode(ALPHABET, &full)))
}

/// Decodes and validates a claim-data TXT payload (spec.md ssec4.8
/// `parseData`'s structural half): checks the network prefix, the
/// checksum, version `<= 31`, hash length `2..=40`, `fee <= MAX_REWARD`,
/// and that a forked claim declares a zero fee.
pub fn parse_data(txt_record: &str, params: &NetworkParams) -> Result<ClaimPayload, ClaimError> {
    let encoded = txt_record
        .strip_prefix(params.claim_prefix)
        .ok_or(ClaimError::BadPrefix)?;
    let raw = base32::decode(ALPHABET, encoded)
        .ok_or_else(|| ClaimError::BadBase32("payload is not valid base32".into()))?;
    if raw.len() <= CHECKSUM_LEN {
        return Err(ClaimError::Malformed("payload shorter than the checksum trailer".into()));
    }
    let (body, checksum) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let digest = na_crypto::blake2b_256(body);
    let expected: &[u8] = digest.get(..CHECKSUM_LEN).unwrap_or(digest.as_slice());
    if checksum != expected {
        return Err(ClaimError::BadChecksum);
    }

    let mut r = Reader::new(body);

    let version = r.u8().map_err(|_| ClaimError::Malformed("truncated version".into()))?;
    if version > 31 {
        return Err(ClaimError::BadVersion(version));
    }
    let hash_len = r.u8().map_err(|_| ClaimError::Malformed("truncated hash length".into()))? as usize;
    if !(2..=40).contains(&hash_len) {
        return Err(ClaimError::BadHashLength(hash_len));
    }
    let hash = r.raw(hash_len).map_err(|_| ClaimError::Malformed("truncated hash".into()))?.to_vec();
    let fee = r.varint().map_err(|_| ClaimError::Malformed("truncated fee".into()))?;
    if fee > MAX_REWARD {
        return Err(ClaimError::FeeTooHigh { fee, max_reward: MAX_REWARD });
    }
    let forked = r.u8().map_err(|_| ClaimError::Malformed("truncated forked flag".into()))? != 0;
    if forked && fee != 0 {
        return Err(ClaimError::ForkedNonZeroFee);
    }
    if !r.is_empty() {
        return Err(ClaimError::Malformed("trailing bytes after forked flag".into()));
    }

    Ok(ClaimPayload { version, hash, fee, forked })
}

/// Maps a name to the authoritative target its claim must match (spec.md
/// ssec4.8's alias-mapped lookup). The default installation is the
/// identity map: most names have no alias and must match themselves
/// bit-for-bit.
pub trait AliasMap {
    /// Returns the authoritative target for `name`, or `None` if `name`
    /// has no alias entry (in which case the target must equal `name`
    /// itself).
    fn resolve(&self, name: &[u8]) -> Option<Vec<u8>>;
}

/// The identity [`AliasMap`]: every name is its own target.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityAliasMap;

impl AliasMap for IdentityAliasMap {
    fn resolve(&self, _name: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

/// Confirms `target` matches `name`'s authoritative target under
/// `alias_map` (spec.md ssec4.8: "the target equals the alias-mapped
/// name's authoritative target").
pub fn verify_target(name: &[u8], target: &[u8], alias_map: &dyn AliasMap) -> Result<(), ClaimError> {
    let expected = alias_map.resolve(name).unwrap_or_else(|| name.to_vec());
    if expected != target {
        return Err(ClaimError::TargetMismatch);
    }
    Ok(())
}

/// The full decoded claim (spec.md ssec4.8's `parseData` return value):
/// the TXT payload's fields, plus the name/target it was resolved
/// against and the DNSSEC-chain-derived properties a [`na_api::dnssec::DnssecVerifier`]
/// already established for this proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimData {
    /// The DNS name the claim establishes ownership of.
    pub name: Vec<u8>,
    /// The authoritative target the claim's hash was checked against.
    pub target: Vec<u8>,
    /// `true` if the DNSSEC chain relied on a non-rolled-over trust anchor.
    pub weak: bool,
    /// `true` if the claim targets a post-fork name.
    pub forked: bool,
    /// `true` if the trust anchor has rolled over since the proof's inception.
    pub rollover: bool,
    /// The height at which the DNSSEC chain's validity began.
    pub inception: u32,
    /// The height at which the DNSSEC chain's validity ends.
    pub expiration: u32,
    /// The fee the claimant is willing to pay.
    pub fee: u64,
    /// The reserved-table reward owed for this name, `0` if unreserved or
    /// embargoed ([`na_names::reserved::FLAG_ZERO`]).
    pub value: u64,
    /// The claim format version.
    pub version: u8,
    /// The committed hash.
    pub hash: Vec<u8>,
}

/// Parses and fully resolves a claim: decodes `txt_record`, checks
/// `target` against `name`'s alias-mapped authoritative target, and looks
/// up the reserved-table reward for `name` (spec.md ssec8 scenario 5: `kp`
/// is embargoed, so its derived reward is zero regardless of the claimed
/// fee).
#[allow(clippy::too_many_arguments)]
pub fn parse_claim(
    name: &[u8],
    txt_record: &str,
    target: &[u8],
    alias_map: &dyn AliasMap,
    reserved: &ReservedTable,
    weak: bool,
    rollover: bool,
    inception: u32,
    expiration: u32,
    params: &NetworkParams,
) -> Result<ClaimData, ClaimError> {
    let payload = parse_data(txt_record, params)?;
    verify_target(name, target, alias_map)?;
    let value = reserved.get_by_name(name).map(|e| e.value()).unwrap_or(0);

    Ok(ClaimData {
        name: name.to_vec(),
        target: target.to_vec(),
        weak,
        forked: payload.forked,
        rollover,
        inception,
        expiration,
        fee: payload.fee,
        value,
        version: payload.version,
        hash: payload.hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_parse_round_trips() {
        let params = NetworkParams::example();
        let payload = ClaimPayload { version: 0, hash: vec![1, 2, 3, 4, 5], fee: 1000, forked: false };
        let txt = create_data(&payload, &params).unwrap();
        assert!(txt.starts_with(params.claim_prefix));

        let back = parse_data(&txt, &params).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let params = NetworkParams::example();
        let other = NetworkParams::mainnet();
        let payload = ClaimPayload { version: 0, hash: vec![1, 2], fee: 0, forked: false };
        let txt = create_data(&payload, &other).unwrap();
        assert_eq!(parse_data(&txt, &params), Err(ClaimError::BadPrefix));
    }

    #[test]
    fn parse_rejects_corrupted_checksum() {
        let params = NetworkParams::example();
        let payload = ClaimPayload { version: 0, hash: vec![1, 2], fee: 0, forked: false };
        let mut txt = create_data(&payload, &params).unwrap();
        let last = txt.pop().unwrap();
        let replacement = if last == 'a' { 'b' } else { 'a' };
        txt.push(replacement);
        assert_eq!(parse_data(&txt, &params), Err(ClaimError::BadChecksum));
    }

    #[test]
    fn create_rejects_fee_above_max_reward() {
        let params = NetworkParams::example();
        let payload = ClaimPayload { version: 0, hash: vec![1, 2], fee: MAX_REWARD + 1, forked: false };
        assert!(matches!(create_data(&payload, &params), Err(ClaimError::FeeTooHigh { .. })));
    }

    #[test]
    fn create_rejects_forked_with_nonzero_fee() {
        let params = NetworkParams::example();
        let payload = ClaimPayload { version: 0, hash: vec![1, 2], fee: 1, forked: true };
        assert_eq!(create_data(&payload, &params), Err(ClaimError::ForkedNonZeroFee));
    }

    #[test]
    fn create_rejects_hash_length_out_of_range() {
        let params = NetworkParams::example();
        let too_short = ClaimPayload { version: 0, hash: vec![1], fee: 0, forked: false };
        assert!(matches!(create_data(&too_short, &params), Err(ClaimError::BadHashLength(1))));

        let too_long = ClaimPayload { version: 0, hash: vec![0u8; 41], fee: 0, forked: false };
        assert!(matches!(create_data(&too_long, &params), Err(ClaimError::BadHashLength(41))));
    }

    #[test]
    fn identity_alias_map_requires_exact_target_match() {
        assert!(verify_target(b"alpha", b"alpha", &IdentityAliasMap).is_ok());
        assert_eq!(verify_target(b"alpha", b"beta", &IdentityAliasMap), Err(ClaimError::TargetMismatch));
    }

    #[test]
    fn parse_claim_zeroes_reward_for_embargoed_reserved_entry() {
        let params = NetworkParams::example();
        let reserved = ReservedTable::genesis(1000, 500, 200);
        let payload = ClaimPayload { version: 0, hash: vec![9, 9, 9], fee: 0, forked: false };
        let txt = create_data(&payload, &params).unwrap();

        let claim = parse_claim(
            b"kp",
            &txt,
            b"kp",
            &IdentityAliasMap,
            &reserved,
            false,
            false,
            0,
            0,
            &params,
        )
        .unwrap();
        assert_eq!(claim.value, 0, "embargoed reserved entries must always yield a zero reward");
    }

    #[test]
    fn parse_claim_carries_nonzero_reward_for_top100_reserved_entry() {
        let params = NetworkParams::example();
        let reserved = ReservedTable::genesis(1000, 500, 200);
        let payload = ClaimPayload { version: 0, hash: vec![9, 9, 9], fee: 0, forked: false };
        let txt = create_data(&payload, &params).unwrap();

        let claim = parse_claim(
            b"cloudflare",
            &txt,
            b"cloudflare",
            &IdentityAliasMap,
            &reserved,
            false,
            false,
            0,
            0,
            &params,
        )
        .unwrap();
        assert_ne!(claim.value, 0);
    }
}
