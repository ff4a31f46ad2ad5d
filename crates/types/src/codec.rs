// Path: crates/types/src/codec.rs
//! Two separate binary encodings live in this crate, deliberately kept apart:
//!
//! - The **canonical codec** ([`to_bytes_canonical`]/[`from_bytes_canonical`])
//!   wraps `parity-scale-codec` for bookkeeping structures whose on-disk
//!   layout is an implementation detail (mempool shadow state, telemetry
//!   snapshots). Any type that derives `Encode`/`Decode` gets this for free.
//! - The **wire format** ([`varint`], [`Writer`], [`Reader`]) is a hand-rolled,
//!   bit-exact byte layout for structures spec.md ssec6 pins down literally
//!   (the auction record and its undo log). A derive macro's field order and
//!   discriminant width are not something this crate is willing to bet
//!   consensus compatibility on, so these are written and read by hand.

use parity_scale_codec::{Decode, Encode};

use crate::error::DbError;

/// Encodes `value` using the canonical (SCALE) codec.
pub fn to_bytes_canonical<T: Encode>(value: &T) -> Vec<u8> {
    value.encode()
}

/// Decodes `bytes` using the canonical (SCALE) codec.
pub fn from_bytes_canonical<T: Decode>(bytes: &[u8]) -> Result<T, DbError> {
    T::decode(&mut &bytes[..]).map_err(|e| DbError::CorruptRecord("<canonical>".into(), e.to_string()))
}

/// A growable byte buffer with the handful of fixed-width and varint write
/// primitives the wire format needs.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends a single byte.
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    /// Appends a big-endian `u32`.
    pub fn u32_be(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Appends a little-endian `u32`.
    pub fn u32_le(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a little-endian `u64`.
    pub fn u64_le(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Appends a raw byte slice with no length prefix.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a CompactSize-prefixed byte slice.
    pub fn var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        write_varint(&mut self.buf, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a bare CompactSize-encoded integer.
    pub fn varint(&mut self, v: u64) -> &mut Self {
        write_varint(&mut self.buf, v);
        self
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// A cursor over a byte slice with the fixed-width and varint read
/// primitives the wire format needs. Every method returns [`DbError`] on
/// truncation, since a short read here always means on-disk corruption.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wraps a byte slice for sequential reading.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DbError> {
        let end = self.pos.checked_add(n).ok_or_else(|| {
            DbError::CorruptRecord("<wire>".into(), "length overflow".into())
        })?;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| DbError::CorruptRecord("<wire>".into(), "truncated".into()))?;
        self.pos = end;
        Ok(slice)
    }

    /// Reads a single byte.
    pub fn u8(&mut self) -> Result<u8, DbError> {
        let slice = self.take(1)?;
        Ok(slice[0])
    }

    /// Reads a big-endian `u32`.
    pub fn u32_be(&mut self) -> Result<u32, DbError> {
        let slice = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(slice);
        Ok(u32::from_be_bytes(arr))
    }

    /// Reads a little-endian `u64`.
    pub fn u64_le(&mut self) -> Result<u64, DbError> {
        let slice = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(slice);
        Ok(u64::from_le_bytes(arr))
    }

    /// Reads a little-endian `u32`.
    pub fn u32_le(&mut self) -> Result<u32, DbError> {
        let slice = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(slice);
        Ok(u32::from_le_bytes(arr))
    }

    /// Reads exactly `n` raw bytes.
    pub fn raw(&mut self, n: usize) -> Result<&'a [u8], DbError> {
        self.take(n)
    }

    /// Reads a fixed-size array of raw bytes.
    pub fn array32(&mut self) -> Result<[u8; 32], DbError> {
        let slice = self.take(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(slice);
        Ok(arr)
    }

    /// Reads a CompactSize-prefixed byte slice.
    pub fn var_bytes(&mut self) -> Result<&'a [u8], DbError> {
        let len = self.varint()? as usize;
        self.take(len)
    }

    /// Reads a bare CompactSize-encoded integer.
    pub fn varint(&mut self) -> Result<u64, DbError> {
        let first = self.u8()?;
        match first {
            0..=0xfc => Ok(first as u64),
            0xfd => {
                let slice = self.take(2)?;
                let mut arr = [0u8; 2];
                arr.copy_from_slice(slice);
                Ok(u16::from_le_bytes(arr) as u64)
            }
            0xfe => {
                let slice = self.take(4)?;
                let mut arr = [0u8; 4];
                arr.copy_from_slice(slice);
                Ok(u32::from_le_bytes(arr) as u64)
            }
            0xff => {
                let slice = self.take(8)?;
                let mut arr = [0u8; 8];
                arr.copy_from_slice(slice);
                Ok(u64::from_le_bytes(arr))
            }
        }
    }

    /// Returns `true` once every byte in the backing slice has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}

/// Writes `v` in Bitcoin/Handshake CompactSize form: a single byte for
/// `0..=0xfc`, else a marker byte (`0xfd`/`0xfe`/`0xff`) followed by a
/// little-endian 2/4/8-byte integer.
fn write_varint(buf: &mut Vec<u8>, v: u64) {
    if v <= 0xfc {
        buf.push(v as u8);
    } else if v <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(v as u16).to_le_bytes());
    } else if v <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(v as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrips_across_all_width_boundaries() {
        for v in [0u64, 1, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000, u64::MAX] {
            let mut w = Writer::new();
            w.varint(v);
            let bytes = w.into_bytes();
            let mut r = Reader::new(&bytes);
            assert_eq!(r.varint().unwrap(), v);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn varint_uses_minimal_width() {
        let mut w = Writer::new();
        w.varint(0xfc);
        assert_eq!(w.into_bytes(), vec![0xfc]);

        let mut w = Writer::new();
        w.varint(0xfd);
        assert_eq!(w.into_bytes(), vec![0xfd, 0xfd, 0x00]);
    }

    #[test]
    fn var_bytes_roundtrip() {
        let mut w = Writer::new();
        w.var_bytes(b"hello world");
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.var_bytes().unwrap(), b"hello world");
    }

    #[test]
    fn reader_reports_truncation_as_db_error() {
        let bytes = [0x01u8];
        let mut r = Reader::new(&bytes);
        assert!(r.u32_be().is_err());
    }

    #[derive(Encode, Decode, PartialEq, Eq, Debug)]
    struct Example {
        a: u32,
        b: Vec<u8>,
    }

    #[test]
    fn canonical_codec_roundtrips() {
        let v = Example { a: 7, b: vec![1, 2, 3] };
        let bytes = to_bytes_canonical(&v);
        let back: Example = from_bytes_canonical(&bytes).unwrap();
        assert_eq!(v, back);
    }
}
