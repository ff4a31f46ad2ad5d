// Path: crates/api/src/store.rs
//! Defines the `ChainStore` trait: the prefixed key-value store the name
//! database's `a`/`u` keyspaces live in (spec.md ssec4.5). The `t` subspace
//! (authenticated tree pages) is owned entirely by the [`crate::tree::AuthenticatedTree`]
//! implementation and never touched through this trait.

use thiserror::Error;

/// Errors a chain store implementation can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage backend failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A batched set of put/delete operations, applied atomically by [`ChainStore::write_batch`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    /// Staged puts, applied before deletes within the same batch.
    pub puts: Vec<(Vec<u8>, Vec<u8>)>,
    /// Staged deletes.
    pub deletes: Vec<Vec<u8>>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self { puts: Vec::new(), deletes: Vec::new() }
    }

    /// Stages a put.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.puts.push((key, value));
        self
    }

    /// Stages a delete.
    pub fn delete(&mut self, key: Vec<u8>) -> &mut Self {
        self.deletes.push(key);
        self
    }
}

/// The prefixed key-value store backing the `a‖nameHash` and `u‖height`
/// keyspaces (spec.md ssec4.5).
pub trait ChainStore {
    /// Loads the raw bytes stored at `key`, if present.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomically applies `batch`.
    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError>;
}
