// Path: crates/api/src/tree.rs
//! Defines the `AuthenticatedTree` trait: the binary authenticated radix
//! tree the name database commits into (spec.md ssec1's assumed primitive:
//! "insert(key,value), remove(key), root(), snapshot(root), prove(key),
//! commit(batch)").
//!
//! Every method here is synchronous. Spec.md ssec9's redesign note is
//! explicit that `connectBlock` must hold its invariants across a single
//! uninterrupted call, so a page fault against the backing store is this
//! trait's problem, not a suspension point the caller has to cooperate with.

use thiserror::Error;

/// Errors a tree implementation can report. These are always treated as
/// database-invariant (fatal) failures by callers in `na-names`.
#[derive(Debug, Error)]
pub enum TreeError {
    /// No page exists at the requested root; the snapshot is unknown to
    /// this tree instance.
    #[error("unknown root: {0}")]
    UnknownRoot(String),
    /// The key was absent when a proof or removal was requested.
    #[error("key not found")]
    NotFound,
    /// The underlying storage backend failed.
    #[error("tree backend error: {0}")]
    Backend(String),
}

/// One staged mutation in a [`TreeBatch`].
#[derive(Debug, Clone)]
pub enum TreeOp {
    /// Insert or overwrite `key` with `value`.
    Insert {
        /// The key to insert or overwrite.
        key: Vec<u8>,
        /// The value to associate with the key.
        value: Vec<u8>,
    },
    /// Remove `key`, a no-op if absent.
    Remove {
        /// The key to remove.
        key: Vec<u8>,
    },
}

/// An ordered batch of tree mutations, committed atomically (spec.md ssec4.5:
/// "all three (records, undo, trie) commit atomically").
#[derive(Debug, Clone, Default)]
pub struct TreeBatch {
    /// The staged operations, applied in order.
    pub ops: Vec<TreeOp>,
}

impl TreeBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Stages an insert.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(TreeOp::Insert { key, value });
        self
    }

    /// Stages a removal.
    pub fn remove(&mut self, key: Vec<u8>) -> &mut Self {
        self.ops.push(TreeOp::Remove { key });
        self
    }

    /// Returns the batch with every operation reversed in order and effect
    /// (insert undone by the prior value's insert-or-remove, remove undone
    /// by re-inserting `prior`), the mechanism `revert` (spec.md ssec4.5)
    /// uses to invert the tree side of a block's mutations.
    ///
    /// `prior` supplies the pre-mutation value for each key touched by an
    /// `Insert`, looked up by position; this mirrors the undo log already
    /// carrying the old field values, so the tree layer never needs to
    /// store its own shadow copy.
    pub fn inverted(&self, prior: &[Option<Vec<u8>>]) -> Self {
        let mut out = TreeBatch::new();
        for (op, before) in self.ops.iter().zip(prior.iter()).rev() {
            match (op, before) {
                (TreeOp::Insert { key, .. }, Some(old)) => {
                    out.insert(key.clone(), old.clone());
                }
                (TreeOp::Insert { key, .. }, None) => {
                    out.remove(key.clone());
                }
                (TreeOp::Remove { key }, Some(old)) => {
                    out.insert(key.clone(), old.clone());
                }
                (TreeOp::Remove { .. }, None) => {}
            }
        }
        out
    }
}

/// A Merkle inclusion (or non-inclusion) proof for a single key, opaque to
/// every caller except the verifier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeProof(pub Vec<u8>);

/// The authenticated radix tree the name database commits into.
///
/// Implementors own their own root-indexed snapshot history; `na-names`
/// never inspects tree internals, only this interface.
pub trait AuthenticatedTree {
    /// Looks up `key`, returning its value if present.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TreeError>;

    /// Returns the current root commitment.
    fn root(&self) -> [u8; 32];

    /// Returns a read-only view pinned to a historical `root`, for proof
    /// generation against a committed block header (spec.md ssec4.5 `proveName`).
    fn snapshot(&self, root: [u8; 32]) -> Result<Box<dyn AuthenticatedTree + '_>, TreeError>;

    /// Produces an inclusion proof for `key` against the current root.
    fn prove(&self, key: &[u8]) -> Result<TreeProof, TreeError>;

    /// Atomically applies `batch`, advancing the root, and returns the new
    /// root. Implementations must apply operations in order so that a
    /// batch and its `inverted()` counterpart compose to the identity.
    fn commit(&mut self, batch: TreeBatch) -> Result<[u8; 32], TreeError>;
}
