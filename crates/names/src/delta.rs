// Path: crates/names/src/delta.rs
//! Reversible field-level deltas and the `AuctionTxn` builder that is the
//! only way `na-names` ever mutates an [`Auction`] (spec.md ssec4.4,
//! ssec9 "Mutator side effects -> explicit transaction builder"). Every
//! setter compares new-vs-current, no-ops if equal, and records the *old*
//! value into the matching delta slot only the first time that field
//! changes within the surrounding block.

use na_types::codec::{Reader, Writer};
use na_types::error::DbError;
use na_types::name::Outpoint;

use crate::auction::Auction;

/// Stable wire tags for undo-log field ops (spec.md ssec6: "field tags
/// stable across versions"). `0..=7` reuse the record's own `fieldFlags`
/// bit positions; `8`/`9`/`10` are added for `height`/`renewal`/`name`,
/// which are always present in the record and so have no presence bit of
/// their own, but still need a tag here since an undo op must say "this
/// field changed" even for always-present fields.
pub mod tag {
    /// `owner` changed.
    pub const OWNER: u8 = 0;
    /// `value` changed.
    pub const VALUE: u8 = 1;
    /// `highest` changed.
    pub const HIGHEST: u8 = 2;
    /// `data` changed.
    pub const DATA: u8 = 3;
    /// `transfer` changed.
    pub const TRANSFER: u8 = 4;
    /// `revoked` changed.
    pub const REVOKED: u8 = 5;
    /// `claimed` changed.
    pub const CLAIMED: u8 = 6;
    /// `weak` changed.
    pub const WEAK: u8 = 7;
    /// `height` changed.
    pub const HEIGHT: u8 = 8;
    /// `renewal` changed.
    pub const RENEWAL: u8 = 9;
    /// `name` changed.
    pub const NAME: u8 = 10;
}

/// A per-field "previous value" slot. `None` means "unchanged so far
/// within this block"; `Some` holds the value the field had *before* the
/// first change (spec.md ssec4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionDelta {
    /// Prior `name`, if it changed.
    pub name: Option<Vec<u8>>,
    /// Prior `height`, if it changed.
    pub height: Option<u32>,
    /// Prior `renewal`, if it changed.
    pub renewal: Option<u32>,
    /// Prior `owner`, if it changed.
    pub owner: Option<Option<Outpoint>>,
    /// Prior `value`, if it changed.
    pub value: Option<Option<u64>>,
    /// Prior `highest`, if it changed.
    pub highest: Option<Option<u64>>,
    /// Prior `data`, if it changed.
    pub data: Option<Option<Vec<u8>>>,
    /// Prior `transfer`, if it changed.
    pub transfer: Option<Option<u32>>,
    /// Prior `revoked`, if it changed.
    pub revoked: Option<Option<u32>>,
    /// Prior `claimed`, if it changed.
    pub claimed: Option<bool>,
    /// Prior `weak`, if it changed.
    pub weak: Option<bool>,
}

impl AuctionDelta {
    /// `true` if no field was touched.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.height.is_none()
            && self.renewal.is_none()
            && self.owner.is_none()
            && self.value.is_none()
            && self.highest.is_none()
            && self.data.is_none()
            && self.transfer.is_none()
            && self.revoked.is_none()
            && self.claimed.is_none()
            && self.weak.is_none()
    }

    /// Installs every present slot onto `record` (spec.md ssec4.4 `applyState`),
    /// restoring the pre-block values: used by disconnect to undo a block.
    pub fn apply_state(&self, record: &mut Auction) {
        if let Some(v) = &self.name {
            record.name = v.clone();
        }
        if let Some(v) = self.height {
            record.height = v;
        }
        if let Some(v) = self.renewal {
            record.renewal = v;
        }
        if let Some(v) = &self.owner {
            record.owner = *v;
        }
        if let Some(v) = &self.value {
            record.value = *v;
        }
        if let Some(v) = &self.highest {
            record.highest = *v;
        }
        if let Some(v) = &self.data {
            record.data = v.clone();
        }
        if let Some(v) = &self.transfer {
            record.transfer = *v;
        }
        if let Some(v) = &self.revoked {
            record.revoked = *v;
        }
        if let Some(v) = self.claimed {
            record.claimed = v;
        }
        if let Some(v) = self.weak {
            record.weak = v;
        }
    }

    /// Serializes the populated slots as an ordered list of `{fieldTag,
    /// oldValueEncoded}` ops, in ascending tag order. The undo-blob format
    /// (spec.md ssec6) stores a block's ops "in reverse order"; since this
    /// list is built once per touched name from the single aggregated
    /// delta (not per-transaction), any fixed order composes correctly as
    /// long as `decode_ops` applies them the same way — we use ascending
    /// tag order for determinism.
    pub fn encode_ops(&self) -> Vec<u8> {
        let mut w = Writer::new();
        let mut count = 0u32;
        let mut body = Writer::new();

        if let Some(v) = &self.name {
            body.u8(tag::NAME).var_bytes(v);
            count += 1;
        }
        if let Some(v) = self.height {
            body.u8(tag::HEIGHT).u32_be(v);
            count += 1;
        }
        if let Some(v) = self.renewal {
            body.u8(tag::RENEWAL).u32_be(v);
            count += 1;
        }
        if let Some(v) = &self.owner {
            body.u8(tag::OWNER);
            encode_option_outpoint(&mut body, v);
            count += 1;
        }
        if let Some(v) = &self.value {
            body.u8(tag::VALUE);
            encode_option_u64(&mut body, *v);
            count += 1;
        }
        if let Some(v) = &self.highest {
            body.u8(tag::HIGHEST);
            encode_option_u64(&mut body, *v);
            count += 1;
        }
        if let Some(v) = &self.data {
            body.u8(tag::DATA);
            match v {
                Some(d) => {
                    body.u8(1);
                    body.var_bytes(d);
                }
                None => {
                    body.u8(0);
                }
            }
            count += 1;
        }
        if let Some(v) = &self.transfer {
            body.u8(tag::TRANSFER);
            encode_option_u32(&mut body, *v);
            count += 1;
        }
        if let Some(v) = &self.revoked {
            body.u8(tag::REVOKED);
            encode_option_u32(&mut body, *v);
            count += 1;
        }
        if let Some(v) = self.claimed {
            body.u8(tag::CLAIMED).u8(v as u8);
            count += 1;
        }
        if let Some(v) = self.weak {
            body.u8(tag::WEAK).u8(v as u8);
            count += 1;
        }

        w.u32_be(count);
        w.raw(&body.into_bytes());
        w.into_bytes()
    }

    /// Parses an op list previously produced by [`Self::encode_ops`] and
    /// installs the decoded prior values onto a fresh `AuctionDelta`.
    pub fn decode_ops(bytes: &[u8]) -> Result<Self, DbError> {
        let err = |msg: &str| DbError::CorruptRecord("<undo-ops>".into(), msg.into());
        let mut r = Reader::new(bytes);
        let count = r.u32_be().map_err(|_| err("truncated op count"))?;
        let mut delta = AuctionDelta::default();
        for _ in 0..count {
            let t = r.u8().map_err(|_| err("truncated op tag"))?;
            match t {
                tag::NAME => delta.name = Some(r.var_bytes().map_err(|_| err("truncated name op"))?.to_vec()),
                tag::HEIGHT => delta.height = Some(r.u32_be().map_err(|_| err("truncated height op"))?),
                tag::RENEWAL => delta.renewal = Some(r.u32_be().map_err(|_| err("truncated renewal op"))?),
                tag::OWNER => delta.owner = Some(decode_option_outpoint(&mut r)?),
                tag::VALUE => delta.value = Some(decode_option_u64(&mut r)?),
                tag::HIGHEST => delta.highest = Some(decode_option_u64(&mut r)?),
                tag::DATA => {
                    let present = r.u8().map_err(|_| err("truncated data presence"))?;
                    delta.data = Some(if present != 0 {
                        Some(r.var_bytes().map_err(|_| err("truncated data op"))?.to_vec())
                    } else {
                        None
                    });
                }
                tag::TRANSFER => delta.transfer = Some(decode_option_u32(&mut r)?),
                tag::REVOKED => delta.revoked = Some(decode_option_u32(&mut r)?),
                tag::CLAIMED => delta.claimed = Some(r.u8().map_err(|_| err("truncated claimed op"))? != 0),
                tag::WEAK => delta.weak = Some(r.u8().map_err(|_| err("truncated weak op"))? != 0),
                other => return Err(err(&format!("unknown undo op tag {other}"))),
            }
        }
        Ok(delta)
    }
}

fn encode_option_outpoint(w: &mut Writer, v: &Option<Outpoint>) {
    match v {
        Some(o) => {
            w.u8(1);
            w.raw(&o.hash);
            w.varint(o.index as u64);
        }
        None => {
            w.u8(0);
        }
    }
}

fn decode_option_outpoint(r: &mut Reader<'_>) -> Result<Option<Outpoint>, DbError> {
    let err = |msg: &str| DbError::CorruptRecord("<undo-ops>".into(), msg.into());
    let present = r.u8().map_err(|_| err("truncated owner presence"))?;
    if present == 0 {
        return Ok(None);
    }
    let hash = r.array32().map_err(|_| err("truncated owner hash"))?;
    let index = r.varint().map_err(|_| err("truncated owner index"))? as u32;
    Ok(Some(Outpoint::new(hash, index)))
}

fn encode_option_u64(w: &mut Writer, v: Option<u64>) {
    match v {
        Some(x) => {
            w.u8(1);
            w.varint(x);
        }
        None => {
            w.u8(0);
        }
    }
}

fn decode_option_u64(r: &mut Reader<'_>) -> Result<Option<u64>, DbError> {
    let err = |msg: &str| DbError::CorruptRecord("<undo-ops>".into(), msg.into());
    let present = r.u8().map_err(|_| err("truncated u64 presence"))?;
    if present == 0 {
        return Ok(None);
    }
    Ok(Some(r.varint().map_err(|_| err("truncated u64 op"))?))
}

fn encode_option_u32(w: &mut Writer, v: Option<u32>) {
    match v {
        Some(x) => {
            w.u8(1);
            w.u32_be(x);
        }
        None => {
            w.u8(0);
        }
    }
}

fn decode_option_u32(r: &mut Reader<'_>) -> Result<Option<u32>, DbError> {
    let err = |msg: &str| DbError::CorruptRecord("<undo-ops>".into(), msg.into());
    let present = r.u8().map_err(|_| err("truncated u32 presence"))?;
    if present == 0 {
        return Ok(None);
    }
    Ok(Some(r.u32_be().map_err(|_| err("truncated u32 op"))?))
}

/// Owns the working copy of one name's [`Auction`] plus its accumulating
/// [`AuctionDelta`] for the current block, and is the only path by which
/// `na-names` mutates a record (spec.md ssec9). Every setter is a
/// compare-and-possibly-record operation; `commit`/`discard` are the only
/// way the delta leaves this type, eliminating the "forgot to clear the
/// delta between blocks" footgun spec.md ssec9 calls out.
#[derive(Debug, Clone)]
pub struct AuctionTxn {
    record: Auction,
    delta: AuctionDelta,
}

impl AuctionTxn {
    /// Opens a mutation scope over `record` with an empty delta.
    pub fn new(record: Auction) -> Self {
        Self { record, delta: AuctionDelta::default() }
    }

    /// The working copy's current state, reflecting every setter call so far.
    pub fn record(&self) -> &Auction {
        &self.record
    }

    /// The accumulated delta so far.
    pub fn delta(&self) -> &AuctionDelta {
        &self.delta
    }

    /// Consumes the builder, returning the final record and its delta.
    pub fn commit(self) -> (Auction, AuctionDelta) {
        (self.record, self.delta)
    }

    /// Discards every pending change, returning nothing: the caller simply
    /// drops the builder and the underlying view is left untouched.
    pub fn discard(self) {}

    /// Sets `name`, recording the prior value on first change.
    pub fn set_name(&mut self, value: Vec<u8>) -> &mut Self {
        if self.record.name != value {
            if self.delta.name.is_none() {
                self.delta.name = Some(self.record.name.clone());
            }
            self.record.name = value;
        }
        self
    }

    /// Sets `height`, recording the prior value on first change.
    pub fn set_height(&mut self, value: u32) -> &mut Self {
        if self.record.height != value {
            self.delta.height.get_or_insert(self.record.height);
            self.record.height = value;
        }
        self
    }

    /// Sets `renewal`, recording the prior value on first change.
    pub fn set_renewal(&mut self, value: u32) -> &mut Self {
        if self.record.renewal != value {
            self.delta.renewal.get_or_insert(self.record.renewal);
            self.record.renewal = value;
        }
        self
    }

    /// Sets `owner`, recording the prior value on first change.
    pub fn set_owner(&mut self, value: Option<Outpoint>) -> &mut Self {
        if self.record.owner != value {
            if self.delta.owner.is_none() {
                self.delta.owner = Some(self.record.owner);
            }
            self.record.owner = value;
        }
        self
    }

    /// Sets `value`, recording the prior value on first change.
    pub fn set_value(&mut self, value: Option<u64>) -> &mut Self {
        if self.record.value != value {
            if self.delta.value.is_none() {
                self.delta.value = Some(self.record.value);
            }
            self.record.value = value;
        }
        self
    }

    /// Sets `highest`, recording the prior value on first change.
    pub fn set_highest(&mut self, value: Option<u64>) -> &mut Self {
        if self.record.highest != value {
            if self.delta.highest.is_none() {
                self.delta.highest = Some(self.record.highest);
            }
            self.record.highest = value;
        }
        self
    }

    /// Sets `data`, recording the prior value on first change.
    pub fn set_data(&mut self, value: Option<Vec<u8>>) -> &mut Self {
        if self.record.data != value {
            if self.delta.data.is_none() {
                self.delta.data = Some(self.record.data.clone());
            }
            self.record.data = value;
        }
        self
    }

    /// Sets `transfer`, recording the prior value on first change.
    pub fn set_transfer(&mut self, value: Option<u32>) -> &mut Self {
        if self.record.transfer != value {
            if self.delta.transfer.is_none() {
                self.delta.transfer = Some(self.record.transfer);
            }
            self.record.transfer = value;
        }
        self
    }

    /// Sets `revoked`, recording the prior value on first change.
    pub fn set_revoked(&mut self, value: Option<u32>) -> &mut Self {
        if self.record.revoked != value {
            if self.delta.revoked.is_none() {
                self.delta.revoked = Some(self.record.revoked);
            }
            self.record.revoked = value;
        }
        self
    }

    /// Sets `claimed`, recording the prior value on first change.
    pub fn set_claimed(&mut self, value: bool) -> &mut Self {
        if self.record.claimed != value {
            self.delta.claimed.get_or_insert(self.record.claimed);
            self.record.claimed = value;
        }
        self
    }

    /// Sets `weak`, recording the prior value on first change.
    pub fn set_weak(&mut self, value: bool) -> &mut Self {
        if self.record.weak != value {
            self.delta.weak.get_or_insert(self.record.weak);
            self.record.weak = value;
        }
        self
    }

    /// Resets every field to the null record's defaults and sets `name` to
    /// `name`. Used when OPEN/BID/CLAIM opens a fresh auction cycle over a
    /// null or expired record (spec.md ssec4.5). The prior `name` is
    /// recorded into the delta like every other field, so disconnecting the
    /// block restores it (and a freshly-opened name reverts to null).
    pub fn reset_for_open(&mut self, name: Vec<u8>, height: u32) -> &mut Self {
        self.set_name(name);
        self.set_owner(None);
        self.set_value(None);
        self.set_highest(None);
        self.set_data(None);
        self.set_transfer(None);
        self.set_revoked(None);
        self.set_claimed(false);
        self.set_weak(false);
        self.set_renewal(height);
        self.set_height(height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setter_is_noop_when_value_unchanged() {
        let mut txn = AuctionTxn::new(Auction { height: 5, ..Auction::null() });
        txn.set_height(5);
        assert!(txn.delta().height.is_none());
    }

    #[test]
    fn first_change_records_old_value_subsequent_changes_do_not() {
        let mut txn = AuctionTxn::new(Auction { height: 5, ..Auction::null() });
        txn.set_height(10);
        assert_eq!(txn.delta().height, Some(5));
        txn.set_height(20);
        // still records the pre-block value, not the intermediate one
        assert_eq!(txn.delta().height, Some(5));
        assert_eq!(txn.record().height, 20);
    }

    #[test]
    fn apply_delta_of_undo_restores_pre_block_record() {
        let original = Auction {
            name: b"alpha".to_vec(),
            height: 20,
            renewal: 20,
            owner: None,
            value: None,
            highest: None,
            data: None,
            transfer: None,
            revoked: None,
            claimed: false,
            weak: false,
        };
        let mut txn = AuctionTxn::new(original.clone());
        txn.set_owner(Some(Outpoint::new([9u8; 32], 2)));
        txn.set_value(Some(500));
        txn.set_renewal(41);
        let (mutated, delta) = txn.commit();
        assert_ne!(mutated, original);

        let mut restored = mutated;
        delta.apply_state(&mut restored);
        assert_eq!(restored, original);
    }

    #[test]
    fn undo_ops_round_trip_through_wire_bytes() {
        let mut txn = AuctionTxn::new(Auction { height: 5, renewal: 5, ..Auction::null() });
        txn.set_height(10);
        txn.set_owner(Some(Outpoint::new([1u8; 32], 0)));
        txn.set_data(Some(vec![9, 9]));
        txn.set_claimed(true);
        let (_, delta) = txn.commit();

        let bytes = delta.encode_ops();
        let decoded = AuctionDelta::decode_ops(&bytes).unwrap();
        assert_eq!(delta, decoded);
    }

    #[test]
    fn reset_for_open_clears_every_mutable_field() {
        let existing = Auction {
            name: b"old".to_vec(),
            height: 1,
            renewal: 1,
            owner: Some(Outpoint::new([1u8; 32], 0)),
            value: Some(5),
            highest: Some(5),
            data: Some(vec![1]),
            transfer: Some(2),
            revoked: None,
            claimed: true,
            weak: true,
        };
        let mut txn = AuctionTxn::new(existing);
        txn.reset_for_open(b"alpha".to_vec(), 20);
        let record = txn.record();
        assert_eq!(record.name, b"alpha");
        assert_eq!(record.height, 20);
        assert_eq!(record.renewal, 20);
        assert!(record.owner.is_none());
        assert!(record.value.is_none());
        assert!(!record.claimed);
        assert!(!record.weak);
        assert_eq!(txn.delta().name, Some(b"old".to_vec()));
    }

    #[test]
    fn reset_for_open_over_null_record_reverts_name_to_empty() {
        let mut txn = AuctionTxn::new(Auction::null());
        txn.reset_for_open(b"beta".to_vec(), 10);
        let (mutated, delta) = txn.commit();
        assert_eq!(mutated.name, b"beta");

        let mut restored = mutated;
        delta.apply_state(&mut restored);
        assert!(restored.is_null());
    }
}
