// Path: crates/types/src/error.rs
//! Error taxa for the name auction consensus engine, one `thiserror` enum
//! per component family, each assigned a stable machine-readable code via
//! [`ErrorCode`]. Structural (sanity) failures are intentionally *not*
//! represented here: spec.md ssec7 requires `hasSaneCovenants` to report a
//! bare boolean, since sanity checks never need to explain themselves to a
//! caller that is simply going to reject the transaction.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Contextual covenant-verification failures (spec.md ssec4.2, ssec7).
///
/// Every reason named in spec.md's worked scenarios (ssec8) appears here as
/// its own variant so the rejection reason is recoverable by callers and by
/// logs, even though the net effect on the caller is always "reject this
/// transaction" exactly as the bare `-1` sentinel in spec.md specifies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CovenantError {
    /// The input's spent-output covenant type has no allowed transition to
    /// the linked output's covenant type (spec.md ssec4.2 transition table).
    #[error("no allowed covenant transition from {from} to {to}")]
    BadTransition {
        /// The covenant type being spent.
        from: &'static str,
        /// The covenant type of the linked output.
        to: &'static str,
    },
    /// A REVEAL's blinded value did not match the BID's stored blind.
    #[error("bad reveal: blind(value, nonce) does not match the BID commitment")]
    BadRevealBlind,
    /// A REVEAL's coin value was less than the value it claims to reveal.
    #[error("bad reveal: coin value is less than the claimed bid value")]
    BadRevealValue,
    /// A REGISTER did not spend the auction's recorded winning outpoint.
    #[error("bad register: prevout is not the auction winner")]
    BadRegisterWinner,
    /// A REGISTER, UPDATE, TRANSFER, FINALIZE etc. touched a name that did
    /// not match the covenant's embedded name/hash.
    #[error("name mismatch: covenant name does not match its stored hash")]
    NameMismatch,
    /// An UPDATE/REGISTER was attempted while the record did not own the
    /// referenced outpoint.
    #[error("bad update: prevout is not the name's current owner")]
    NotOwner,
    /// A renewal block-hash commitment referenced a height that is too
    /// recent relative to `renewalMaturity` (spec.md ssec4.5, ssec8 scenario 2).
    #[error("bad renewal: commitment height {commit_height} is not at least renewalMaturity={renewal_maturity} below {height}")]
    BadRenewalPremature {
        /// The block height of the referenced commitment.
        commit_height: u32,
        /// The block height of the transaction under verification.
        height: u32,
        /// The configured `renewalMaturity` parameter.
        renewal_maturity: u32,
    },
    /// A renewal block-hash commitment referenced a height older than
    /// `renewalPeriod` permits.
    #[error("bad renewal: commitment height {commit_height} is older than renewalPeriod allows (height {height})")]
    BadRenewalStale {
        /// The block height of the referenced commitment.
        commit_height: u32,
        /// The block height of the transaction under verification.
        height: u32,
    },
    /// A renewal block-hash commitment did not resolve to any known
    /// main-chain header (spec.md ssec4.5 "Renewal verification").
    #[error("bad renewal: commitment hash does not resolve to a known main-chain header")]
    BadRenewalUnknownBlock,
    /// A TRANSFER's FINALIZE was attempted before `transferLockup` elapsed.
    #[error("bad finalize: maturity not reached (transfer at {transfer_height}, now {height}, lockup {lockup})")]
    BadFinalizeMaturity {
        /// The height at which the TRANSFER covenant was recorded.
        transfer_height: u32,
        /// The current height.
        height: u32,
        /// The configured `transferLockup` parameter.
        lockup: u32,
    },
    /// A FINALIZE's output address did not match the address committed to
    /// by the prior TRANSFER.
    #[error("bad finalize: address does not match the committed TRANSFER target")]
    BadFinalizeAddress,
    /// An auction record was expired or revoked and cannot accept this
    /// covenant transition.
    #[error("name is expired or revoked and cannot be spent this way")]
    ExpiredOrRevoked,
    /// A REVEAL arrived outside the REVEAL phase window.
    #[error("reveal submitted outside the REVEAL phase")]
    NotInRevealPhase,
    /// A name is not yet available: it is reserved, not yet rolled out, or
    /// fails `verifyName`.
    #[error("name is not available for auction: {0}")]
    NotAvailable(&'static str),
    /// The referenced input index does not exist on the transaction.
    #[error("covenant requires input index {0}, which does not exist")]
    MissingInput(u32),
    /// A CLAIM's embedded DNSSEC proof failed to verify.
    #[error("claim proof verification failed: {0}")]
    BadClaimProof(String),
}

impl ErrorCode for CovenantError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadTransition { .. } => "COVENANT_BAD_TRANSITION",
            Self::BadRevealBlind => "COVENANT_BAD_REVEAL_BLIND",
            Self::BadRevealValue => "COVENANT_BAD_REVEAL_VALUE",
            Self::BadRegisterWinner => "COVENANT_BAD_REGISTER_WINNER",
            Self::NameMismatch => "COVENANT_NAME_MISMATCH",
            Self::NotOwner => "COVENANT_NOT_OWNER",
            Self::BadRenewalPremature { .. } => "COVENANT_BAD_RENEWAL_PREMATURE",
            Self::BadRenewalStale { .. } => "COVENANT_BAD_RENEWAL_STALE",
            Self::BadRenewalUnknownBlock => "COVENANT_BAD_RENEWAL_UNKNOWN_BLOCK",
            Self::BadFinalizeMaturity { .. } => "COVENANT_BAD_FINALIZE_MATURITY",
            Self::BadFinalizeAddress => "COVENANT_BAD_FINALIZE_ADDRESS",
            Self::ExpiredOrRevoked => "COVENANT_EXPIRED_OR_REVOKED",
            Self::NotInRevealPhase => "COVENANT_NOT_IN_REVEAL_PHASE",
            Self::NotAvailable(_) => "COVENANT_NAME_NOT_AVAILABLE",
            Self::MissingInput(_) => "COVENANT_MISSING_INPUT",
            Self::BadClaimProof(_) => "COVENANT_BAD_CLAIM_PROOF",
        }
    }
}

/// Database-invariant failures (spec.md ssec7): fatal, the chain tip must
/// not advance, and the caller should treat the situation as corruption.
#[derive(Debug, Error)]
pub enum DbError {
    /// The undo blob expected at `u‖height` was missing on disconnect.
    #[error("missing undo blob for height {0}")]
    MissingUndo(u32),
    /// A record's on-disk encoding could not be parsed.
    #[error("corrupt auction record for name hash {0}: {1}")]
    CorruptRecord(String, String),
    /// A record violated the reserved-name flags expected at claim time.
    #[error("record inconsistent with reserved-name table for name hash {0}")]
    ReservedInconsistent(String),
    /// The authenticated tree's root after applying a batch did not match
    /// the root recomputed independently, or a bookkeeping invariant in the
    /// underlying tree trait was violated.
    #[error("authenticated tree root mismatch: expected {expected}, got {got}")]
    RootMismatch {
        /// The root hash carried by the block header (or the pre-connect root on disconnect).
        expected: String,
        /// The root hash recomputed by the tree after the batch was applied.
        got: String,
    },
    /// The underlying key-value store returned an error.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for DbError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingUndo(_) => "DB_MISSING_UNDO",
            Self::CorruptRecord(_, _) => "DB_CORRUPT_RECORD",
            Self::ReservedInconsistent(_) => "DB_RESERVED_INCONSISTENT",
            Self::RootMismatch { .. } => "DB_ROOT_MISMATCH",
            Self::Backend(_) => "DB_BACKEND_ERROR",
        }
    }
}

/// Claim/proof parsing failures (spec.md ssec4.8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The TXT payload did not begin with the network's claim prefix.
    #[error("claim data does not start with the expected network prefix")]
    BadPrefix,
    /// The payload was not valid base32.
    #[error("claim data is not valid base32: {0}")]
    BadBase32(String),
    /// The embedded version byte exceeded the maximum of 31.
    #[error("claim data version {0} exceeds the maximum of 31")]
    BadVersion(u8),
    /// The embedded hash length was outside `2..=40`.
    #[error("claim data hash length {0} is outside the allowed range 2..=40")]
    BadHashLength(usize),
    /// The claimed fee exceeded `MAX_REWARD`.
    #[error("claim fee {fee} exceeds MAX_REWARD {max_reward}")]
    FeeTooHigh {
        /// The fee encoded in the claim.
        fee: u64,
        /// The configured maximum reward.
        max_reward: u64,
    },
    /// A forked claim declared a non-zero fee.
    #[error("forked claims must declare a zero fee")]
    ForkedNonZeroFee,
    /// The embedded checksum did not match the recomputed BLAKE2b-256 checksum.
    #[error("claim data checksum mismatch")]
    BadChecksum,
    /// The claim's target, after alias resolution, did not match the name's
    /// authoritative target.
    #[error("claim target does not match the name's authoritative target")]
    TargetMismatch,
    /// The payload was truncated or otherwise structurally malformed.
    #[error("claim data is malformed: {0}")]
    Malformed(String),
}

impl ErrorCode for ClaimError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadPrefix => "CLAIM_BAD_PREFIX",
            Self::BadBase32(_) => "CLAIM_BAD_BASE32",
            Self::BadVersion(_) => "CLAIM_BAD_VERSION",
            Self::BadHashLength(_) => "CLAIM_BAD_HASH_LENGTH",
            Self::FeeTooHigh { .. } => "CLAIM_FEE_TOO_HIGH",
            Self::ForkedNonZeroFee => "CLAIM_FORKED_NON_ZERO_FEE",
            Self::BadChecksum => "CLAIM_BAD_CHECKSUM",
            Self::TargetMismatch => "CLAIM_TARGET_MISMATCH",
            Self::Malformed(_) => "CLAIM_MALFORMED",
        }
    }
}
