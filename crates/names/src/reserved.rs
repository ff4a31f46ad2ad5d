// Path: crates/names/src/reserved.rs
//! The reserved-name table (spec.md ssec4.1): a static, hash-sorted,
//! binary-searched list of names reserved at genesis.
//!
//! A full published genesis table runs to tens of thousands of entries and
//! is not reproducible from the specification alone, so this crate ships a
//! representative data set — one root-TLD entry, one top-100 entry, one
//! custom-value entry, and the `cloudflare`/`kp` pair spec.md ssec8
//! scenario 5 exercises directly — built in the exact wire format
//! spec.md ssec4.1 specifies, so a production deployment can swap in the
//! real table by replacing [`RAW_ENTRIES`] (or loading a blob via
//! [`ReservedTable::from_bytes`]) without touching any call site.

use na_types::codec::{Reader, Writer};
use na_types::name::{hash_name, NameHash};

/// Bit 0: the name is a root TLD.
pub const FLAG_ROOT: u8 = 0x01;
/// Bit 1: the name is in the top-100 by traffic.
pub const FLAG_TOP100: u8 = 0x02;
/// Bit 2: the entry carries a custom, explicit value overriding the default formula.
pub const FLAG_CUSTOM: u8 = 0x04;
/// Bit 3: the entry always reports `value = 0` regardless of other flags
/// (used for embargoed jurisdictions, spec.md ssec4.1).
pub const FLAG_ZERO: u8 = 0x08;

/// The representative genesis data set this workspace ships: `(name,
/// flags, custom_value, name_start)`. `name_start` mirrors the wire
/// format's `nameStart` byte (spec.md ssec4.1's variable section), the
/// offset into `target` at which the bare second-level label begins; for
/// these entries target and name coincide, so it is always `0`.
const RAW_ENTRIES: &[(&str, u8, u64)] = &[
    ("com", FLAG_ROOT, 0),
    ("google", FLAG_TOP100, 0),
    ("cloudflare", FLAG_TOP100, 0),
    ("kp", FLAG_ZERO, 0),
    ("exampleclaim", FLAG_CUSTOM, 500_000),
];

/// One decoded reserved-table entry (spec.md ssec4.1's variable section:
/// `{len u8, target bytes, flags u8, nameStart u8, value u64}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedEntry {
    /// The SHA3-256 hash of the reserved name (the index key).
    pub hash: NameHash,
    /// The target FQDN this entry resolves to.
    pub target: Vec<u8>,
    /// The flags byte (`FLAG_ROOT` | `FLAG_TOP100` | `FLAG_CUSTOM` | `FLAG_ZERO`).
    pub flags: u8,
    /// Offset into `target` at which the bare label begins.
    pub name_start: u8,
    /// The raw `value` field as stored (before the zero-flag override is applied).
    pub raw_value: u64,
}

impl ReservedEntry {
    /// The entry's effective value: `0` if [`FLAG_ZERO`] is set, else `raw_value`
    /// (spec.md ssec4.1: "entries with the zero flag always report value = 0
    /// regardless of other flags").
    pub fn value(&self) -> u64 {
        if self.flags & FLAG_ZERO != 0 {
            0
        } else {
            self.raw_value
        }
    }

    /// `true` if this entry is a root TLD.
    pub fn is_root(&self) -> bool {
        self.flags & FLAG_ROOT != 0
    }

    /// `true` if this entry is in the top-100 by traffic.
    pub fn is_top100(&self) -> bool {
        self.flags & FLAG_TOP100 != 0
    }
}

/// An immutable, hash-sorted, binary-searched reserved-name table
/// (spec.md ssec9: "global mutable reserved table → loaded-once, immutable
/// shared handle").
#[derive(Debug, Clone)]
pub struct ReservedTable {
    name_value: u64,
    root_value: u64,
    top_value: u64,
    entries: Vec<ReservedEntry>,
}

impl ReservedTable {
    /// Builds the table from [`RAW_ENTRIES`], computing each entry's value
    /// as `nameValue + (root?rootValue:0) + (top100?topValue:0) +
    /// (custom?entryValue:0)`, zeroed if [`FLAG_ZERO`] is set (spec.md ssec3).
    pub fn genesis(name_value: u64, root_value: u64, top_value: u64) -> Self {
        let mut entries: Vec<ReservedEntry> = RAW_ENTRIES
            .iter()
            .map(|(name, flags, custom_value)| {
                let hash = hash_name(name.as_bytes());
                let raw_value = if flags & FLAG_CUSTOM != 0 {
                    name_value + *custom_value
                } else {
                    name_value
                        + if flags & FLAG_ROOT != 0 { root_value } else { 0 }
                        + if flags & FLAG_TOP100 != 0 { top_value } else { 0 }
                };
                ReservedEntry {
                    hash,
                    target: name.as_bytes().to_vec(),
                    flags: *flags,
                    name_start: 0,
                    raw_value,
                }
            })
            .collect();
        entries.sort_by_key(|e| *e.hash.as_bytes());
        Self { name_value, root_value, top_value, entries }
    }

    /// Serializes the table to spec.md ssec4.1's wire format: a 28-byte
    /// header, `size` 36-byte index entries, then the variable-length
    /// section.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u32_be(self.entries.len() as u32);
        // header continues with three LE64 fields per spec.md ssec4.1; the
        // wire format's only BE-vs-LE-sensitive field is the size, matching
        // the undo log's `u32 BE` height key convention elsewhere.
        w.u64_le(self.name_value);
        w.u64_le(self.root_value);
        w.u64_le(self.top_value);

        let mut var_section = Writer::new();
        let mut index = Writer::new();
        let mut ptr: u32 = 0;
        for e in &self.entries {
            index.raw(e.hash.as_bytes());
            index.u32_be(ptr);

            let entry_len_before = var_section.len();
            var_section.u8(e.target.len() as u8);
            var_section.raw(&e.target);
            var_section.u8(e.flags);
            var_section.u8(e.name_start);
            var_section.u64_le(e.raw_value);
            ptr += (var_section.len() - entry_len_before) as u32;
        }

        w.raw(&index.into_bytes());
        w.raw(&var_section.into_bytes());
        w.into_bytes()
    }

    /// Parses a table previously produced by [`Self::to_bytes`] (or an
    /// externally supplied genesis blob in the same format).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, na_types::error::DbError> {
        let err = |msg: &str| na_types::error::DbError::CorruptRecord("<reserved-table>".into(), msg.into());
        let mut r = Reader::new(bytes);
        let size = r.u32_be().map_err(|_| err("truncated header"))? as usize;
        let name_value = r.u64_le().map_err(|_| err("truncated header"))?;
        let root_value = r.u64_le().map_err(|_| err("truncated header"))?;
        let top_value = r.u64_le().map_err(|_| err("truncated header"))?;

        let mut index = Vec::with_capacity(size);
        for _ in 0..size {
            let hash = r.array32().map_err(|_| err("truncated index"))?;
            let ptr = r.u32_be().map_err(|_| err("truncated index"))?;
            index.push((NameHash::from_bytes(hash), ptr));
        }

        let mut entries = Vec::with_capacity(size);
        for (hash, _ptr) in index {
            let len = r.u8().map_err(|_| err("truncated variable section"))? as usize;
            let target = r.raw(len).map_err(|_| err("truncated variable section"))?.to_vec();
            let flags = r.u8().map_err(|_| err("truncated variable section"))?;
            let name_start = r.u8().map_err(|_| err("truncated variable section"))?;
            let raw_value = r.u64_le().map_err(|_| err("truncated variable section"))?;
            entries.push(ReservedEntry { hash, target, flags, name_start, raw_value });
        }

        Ok(Self { name_value, root_value, top_value, entries })
    }

    /// `true` if `hash` is present in the table.
    pub fn has(&self, hash: &NameHash) -> bool {
        self.find(hash).is_some()
    }

    /// Returns the entry for `hash`, if present.
    pub fn get(&self, hash: &NameHash) -> Option<&ReservedEntry> {
        self.find(hash).map(|i| &self.entries[i])
    }

    /// `true` if `name` is present in the table.
    pub fn has_by_name(&self, name: &[u8]) -> bool {
        self.has(&hash_name(name))
    }

    /// Returns the entry for `name`, if present.
    pub fn get_by_name(&self, name: &[u8]) -> Option<&ReservedEntry> {
        self.get(&hash_name(name))
    }

    /// Iterates entries in hash order.
    pub fn iter(&self) -> impl Iterator<Item = &ReservedEntry> {
        self.entries.iter()
    }

    /// The number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, hash: &NameHash) -> Option<usize> {
        self.entries.binary_search_by_key(hash.as_bytes(), |e| *e.hash.as_bytes()).ok()
    }
}
