// Path: crates/crypto/src/lib.rs
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
//! # Name Auction Crypto
//!
//! Thin wrappers around the three hash primitives the consensus engine
//! treats as pure functions: SHA3-256 (name hashing, claim checksums),
//! BLAKE2b-256 (bid blinding), and HMAC-SHA1 (legacy claim-proof MACs).
//! No cryptographic logic lives here beyond digest plumbing; the engine's
//! covenant and auction rules never touch an algorithm implementation
//! directly, only these functions.

use blake2::Blake2b;
use blake2::digest::consts::U32;
use hmac::Hmac;
use hmac::digest::Mac;
use sha1::Sha1;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// BLAKE2b specialized to a 256-bit digest, matching spec.md's BLAKE2b-256.
type Blake2b256 = Blake2b<U32>;

/// Errors that can occur while hashing or MAC-ing consensus data.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A MAC key was the wrong length for the underlying primitive.
    #[error("invalid MAC key length: {0}")]
    InvalidKeyLength(String),
}

/// SHA3-256 of an arbitrary byte string.
///
/// Used for `nameHash` (spec.md ssec3) and for the claim-data checksum
/// (spec.md ssec4.8).
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// BLAKE2b-256 of `LE64(value) ++ nonce`, the bid-blinding commitment
/// described in spec.md ssec4.2 (`blind(value, nonce)`).
///
/// `nonce` must be exactly 32 bytes; this mirrors the wire format, which
/// has no length prefix for the nonce.
pub fn blind(value: u64, nonce: &[u8; 32]) -> [u8; 32] {
    let mut preimage = [0u8; 40];
    preimage[..8].copy_from_slice(&value.to_le_bytes());
    preimage[8..].copy_from_slice(nonce);
    blake2b_256(&preimage)
}

/// BLAKE2b with a 256-bit (32-byte) digest over arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// HMAC-SHA1, retained for legacy DNSSEC claim-proof verification paths
/// that still carry HMAC-SHA1-signed TSIG-style material (spec.md ssec1).
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<[u8; 20], CryptoError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKeyLength(e.to_string()))?;
    mac.update(data);
    let out = mac.finalize().into_bytes();
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&out);
    Ok(digest)
}
