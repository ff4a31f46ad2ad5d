// Path: crates/api/src/dnssec.rs
//! Defines the `DnssecVerifier` trait: "DNSSEC chain validation for claim
//! proofs (assumed to expose verify/decode returning a canonical
//! `ProofData`)" (spec.md ssec1). The name auction engine never walks a
//! DNSSEC delegation chain itself; it delegates to whatever resolver a node
//! wires in and only consumes the canonical result.

use thiserror::Error;

/// Errors a DNSSEC verifier can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnssecError {
    /// The presented proof did not chain to a trusted anchor.
    #[error("proof does not chain to a trusted anchor")]
    UntrustedChain,
    /// The proof's signature(s) failed cryptographic verification.
    #[error("proof signature verification failed")]
    BadSignature,
    /// The proof's name does not match the name under verification.
    #[error("proof name does not match the claimed name")]
    NameMismatch,
    /// The proof was structurally malformed.
    #[error("proof is malformed: {0}")]
    Malformed(String),
}

/// The canonical result of verifying and decoding a DNSSEC proof for a
/// CLAIM covenant (spec.md ssec4.8, ssec1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofData {
    /// The DNS name the proof establishes ownership of.
    pub name: Vec<u8>,
    /// `true` if the proof relied on a trust anchor that has not yet
    /// rolled over, entering the record into `weakLockup` (spec.md GLOSSARY).
    pub weak: bool,
    /// The height of the block whose hash the proof commits to, used for
    /// the claim-period admission window (spec.md ssec4.7).
    pub commit_height: u32,
    /// The 32-byte hash of the committed block.
    pub commit_hash: [u8; 32],
}

/// Verifies and decodes a DNSSEC ownership proof for a CLAIM covenant.
pub trait DnssecVerifier {
    /// Verifies `proof` for `name`, returning the canonical decoded result.
    fn verify(&self, name: &[u8], proof: &[u8]) -> Result<ProofData, DnssecError>;
}
