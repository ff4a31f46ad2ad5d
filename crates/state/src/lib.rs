// Path: crates/state/src/lib.rs
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
//! # Name Auction Reference State
//!
//! An in-memory [`na_api::tree::AuthenticatedTree`] and
//! [`na_api::store::ChainStore`] used by `na-names`' and `na-mempool`'s test
//! suites, and by any harness that doesn't need a durable backend. Spec.md
//! ssec1 treats the authenticated tree as an assumed external primitive; this
//! crate is that primitive's simplest possible faithful stand-in, not a
//! production Merkle/Verkle implementation.

use std::collections::BTreeMap;

use na_api::store::{ChainStore, StoreError, WriteBatch};
use na_api::tree::{AuthenticatedTree, TreeBatch, TreeError, TreeOp, TreeProof};

/// An in-memory, root-indexed authenticated tree.
///
/// The "root" is the SHA3-256 hash of the sorted `(key, value)` pairs
/// currently live in the tree; any mutation changes it, and every past
/// root remains addressable via its own snapshot, which is exactly the
/// external contract spec.md ssec1 and ssec4.5 assume of the real trie.
#[derive(Debug, Clone, Default)]
pub struct MemTree {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    history: BTreeMap<[u8; 32], BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemTree {
    /// Creates an empty tree at the zero root.
    pub fn new() -> Self {
        let mut history = BTreeMap::new();
        history.insert([0u8; 32], BTreeMap::new());
        Self { data: BTreeMap::new(), history }
    }

    fn compute_root(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> [u8; 32] {
        if data.is_empty() {
            return [0u8; 32];
        }
        let mut preimage = Vec::new();
        for (k, v) in data.iter() {
            preimage.extend_from_slice(&(k.len() as u32).to_be_bytes());
            preimage.extend_from_slice(k);
            preimage.extend_from_slice(&(v.len() as u32).to_be_bytes());
            preimage.extend_from_slice(v);
        }
        na_crypto::sha3_256(&preimage)
    }
}

impl AuthenticatedTree for MemTree {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TreeError> {
        Ok(self.data.get(key).cloned())
    }

    fn root(&self) -> [u8; 32] {
        Self::compute_root(&self.data)
    }

    fn snapshot(&self, root: [u8; 32]) -> Result<Box<dyn AuthenticatedTree + '_>, TreeError> {
        let data = self
            .history
            .get(&root)
            .cloned()
            .ok_or_else(|| TreeError::UnknownRoot(hex::encode(root)))?;
        Ok(Box::new(MemTree { data, history: BTreeMap::new() }))
    }

    fn prove(&self, key: &[u8]) -> Result<TreeProof, TreeError> {
        let value = self.data.get(key).ok_or(TreeError::NotFound)?;
        let mut preimage = key.to_vec();
        preimage.extend_from_slice(value);
        Ok(TreeProof(preimage))
    }

    fn commit(&mut self, batch: TreeBatch) -> Result<[u8; 32], TreeError> {
        for op in batch.ops {
            match op {
                TreeOp::Insert { key, value } => {
                    self.data.insert(key, value);
                }
                TreeOp::Remove { key } => {
                    self.data.remove(&key);
                }
            }
        }
        let root = Self::compute_root(&self.data);
        self.history.insert(root, self.data.clone());
        Ok(root)
    }
}

/// An in-memory `ChainStore`.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { data: BTreeMap::new() }
    }
}

impl ChainStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for (k, v) in batch.puts {
            self.data.insert(k, v);
        }
        for k in batch.deletes {
            self.data.remove(&k);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_has_zero_root() {
        let t = MemTree::new();
        assert_eq!(t.root(), [0u8; 32]);
    }

    #[test]
    fn insert_then_remove_restores_root() {
        let mut t = MemTree::new();
        let root0 = t.root();

        let mut batch = TreeBatch::new();
        batch.insert(b"a".to_vec(), b"1".to_vec());
        let root1 = t.commit(batch).unwrap();
        assert_ne!(root0, root1);

        let mut batch = TreeBatch::new();
        batch.remove(b"a".to_vec());
        let root2 = t.commit(batch).unwrap();
        assert_eq!(root0, root2);
    }

    #[test]
    fn snapshot_recovers_historical_state() {
        let mut t = MemTree::new();
        let mut batch = TreeBatch::new();
        batch.insert(b"a".to_vec(), b"1".to_vec());
        let root1 = t.commit(batch).unwrap();

        let mut batch = TreeBatch::new();
        batch.insert(b"a".to_vec(), b"2".to_vec());
        t.commit(batch).unwrap();

        let snap = t.snapshot(root1).unwrap();
        assert_eq!(snap.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn inverted_batch_undoes_an_insert_over_existing_value() {
        let mut t = MemTree::new();
        let mut batch = TreeBatch::new();
        batch.insert(b"a".to_vec(), b"1".to_vec());
        t.commit(batch).unwrap();

        let mut batch = TreeBatch::new();
        batch.insert(b"a".to_vec(), b"2".to_vec());
        let prior = vec![Some(b"1".to_vec())];
        let undo = batch.inverted(&prior);
        t.commit(batch).unwrap();
        assert_eq!(t.get(b"a").unwrap(), Some(b"2".to_vec()));

        t.commit(undo).unwrap();
        assert_eq!(t.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn store_roundtrips_put_and_delete() {
        let mut s = MemStore::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"v".to_vec());
        s.write_batch(batch).unwrap();
        assert_eq!(s.get(b"k").unwrap(), Some(b"v".to_vec()));

        let mut batch = WriteBatch::new();
        batch.delete(b"k".to_vec());
        s.write_batch(batch).unwrap();
        assert_eq!(s.get(b"k").unwrap(), None);
    }
}
