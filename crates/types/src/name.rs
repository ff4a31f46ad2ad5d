// Path: crates/types/src/name.rs
//! `NameHash` and `Outpoint`, the two identifiers the rest of the engine
//! keys everything by, plus the name character-set rules (spec.md ssec3, ssec4.2).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Maximum length, in bytes, of a name (spec.md ssec6).
pub const MAX_NAME_SIZE: usize = 63;
/// Maximum length, in bytes, of a resource-record data blob (spec.md ssec6).
pub const MAX_RESOURCE_SIZE: usize = 512;
/// Maximum size of a serialized covenant (spec.md ssec6).
pub const MAX_COVENANT_SIZE: usize = 579;

/// Labels permanently rejected regardless of rollout or reservation status
/// (spec.md ssec3: "a separate blacklist of five-to-eight ICANN/overlay-reserved
/// labels"). These mirror the handful of labels every name chain of this kind
/// blacklists at the protocol level (overlay/meta-TLDs that must never resolve
/// as ordinary auctioned names).
pub const BLACKLISTED_NAMES: &[&str] = &[
    "localhost",
    "onion",
    "local",
    "example",
    "invalid",
    "test",
    "bit",
];

/// A SHA3-256 digest of a name's raw ASCII bytes (spec.md ssec3).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct NameHash(pub [u8; 32]);

impl NameHash {
    /// Wraps a raw 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Reduces the hash modulo `n` using the multi-byte identity `256 mod n`,
    /// i.e. treating the hash as a big-endian integer, which is how
    /// spec.md ssec4.2's `rollout` derives `week = nameHash mod 52`.
    pub fn mod_u32(&self, n: u32) -> u32 {
        debug_assert!(n > 0);
        let mut acc: u64 = 0;
        let base = (256u64) % (n as u64);
        for byte in self.0.iter() {
            acc = (acc * base + (*byte as u64)) % (n as u64);
        }
        acc as u32
    }
}

impl std::fmt::Debug for NameHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NameHash({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for NameHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A `(txHash, vout)` pair identifying an unspent output (spec.md GLOSSARY).
///
/// Ordered lexicographically by `(hash, index)`, which is the tie-break rule
/// spec.md ssec5 mandates for simultaneous equal-value reveals.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Debug,
)]
pub struct Outpoint {
    /// The 32-byte hash of the transaction that created this output.
    pub hash: [u8; 32],
    /// The index of the output within that transaction.
    pub index: u32,
}

impl Outpoint {
    /// Constructs an outpoint from a transaction hash and output index.
    pub fn new(hash: [u8; 32], index: u32) -> Self {
        Self { hash, index }
    }
}

impl PartialOrd for Outpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Outpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash).then(self.index.cmp(&other.index))
    }
}

/// Returns `true` if `name` is 1..=63 octets, restricted to `0-9`, `a-z`,
/// `-`, `_`, where `-`/`_` may not appear at the start or end, and the name
/// is not in [`BLACKLISTED_NAMES`] (spec.md ssec3/4.2 `verifyName`).
pub fn verify_name(name: &[u8]) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_SIZE {
        return false;
    }
    for (i, &b) in name.iter().enumerate() {
        let is_digit = b.is_ascii_digit();
        let is_lower = b.is_ascii_lowercase();
        let is_hyphenish = b == b'-' || b == b'_';
        if !(is_digit || is_lower || is_hyphenish) {
            return false;
        }
        if is_hyphenish && (i == 0 || i == name.len() - 1) {
            return false;
        }
    }
    if let Ok(s) = std::str::from_utf8(name) {
        if BLACKLISTED_NAMES.contains(&s) {
            return false;
        }
    }
    true
}

/// Computes `nameHash` from raw ASCII bytes. Callers must have already
/// checked [`verify_name`]; this function does not re-validate.
pub fn hash_name(name: &[u8]) -> NameHash {
    NameHash::from_bytes(na_crypto::sha3_256(name))
}
