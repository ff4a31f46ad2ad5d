// Path: crates/names/src/auction.rs
//! The per-name auction record and the pure `state`/`isExpired`/`isWeak`
//! functions derived from it (spec.md ssec3, ssec4.3), plus its bit-exact
//! wire encoding (spec.md ssec6).

use na_types::codec::{Reader, Writer};
use na_types::error::DbError;
use na_types::name::{NameHash, Outpoint};
use na_types::params::NetworkParams;

/// Bit position of each optional field in the record's `fieldFlags` byte
/// (spec.md ssec6). `claimed`/`weak` are encoded as presence of the flag
/// bit alone, with no trailing payload.
pub mod flag {
    /// `owner` is present.
    pub const OWNER: u8 = 1 << 0;
    /// `value` is present (i.e. not the `-1` "absent" sentinel).
    pub const VALUE: u8 = 1 << 1;
    /// `highest` is present.
    pub const HIGHEST: u8 = 1 << 2;
    /// `data` is present.
    pub const DATA: u8 = 1 << 3;
    /// `transfer` is present (i.e. not `-1`).
    pub const TRANSFER: u8 = 1 << 4;
    /// `revoked` is present.
    pub const REVOKED: u8 = 1 << 5;
    /// The record was established via a DNSSEC claim.
    pub const CLAIMED: u8 = 1 << 6;
    /// The claim relied on a non-rolled-over trust anchor.
    pub const WEAK: u8 = 1 << 7;
}

/// The phase an auction record is in at a given height (spec.md ssec3, ssec4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The name was just opened; bidding has not yet started.
    Opening,
    /// Blinded bids are being accepted.
    Bidding,
    /// Bids are being revealed.
    Reveal,
    /// The auction has concluded; the name is registered (or never bid on
    /// and now simply dormant, per `isExpired`).
    Closed,
    /// The name was permanently revoked.
    Revoked,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Opening => "OPENING",
            Self::Bidding => "BIDDING",
            Self::Reveal => "REVEAL",
            Self::Closed => "CLOSED",
            Self::Revoked => "REVOKED",
        };
        write!(f, "{s}")
    }
}

/// One name's auction record (spec.md ssec3). `nameHash` is not a field:
/// it is the storage key the caller already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    /// The raw name bytes (`<= 63` octets).
    pub name: Vec<u8>,
    /// Block at which the current auction cycle opened.
    pub height: u32,
    /// Block of the most recent renewal.
    pub renewal: u32,
    /// The unspent output owning the name, once registered.
    pub owner: Option<Outpoint>,
    /// The amount owed by the eventual REGISTER (the second-price value
    /// once reveals have been processed).
    pub value: Option<u64>,
    /// The highest revealed bid value, retained for vickrey accounting.
    pub highest: Option<u64>,
    /// The last-committed resource-record bundle.
    pub data: Option<Vec<u8>>,
    /// Block at which a TRANSFER was requested.
    pub transfer: Option<u32>,
    /// Block at which the name was revoked.
    pub revoked: Option<u32>,
    /// `true` if this record was established via a DNSSEC ownership proof.
    pub claimed: bool,
    /// `true` if the claim relied on a non-rolled-over trust anchor.
    pub weak: bool,
}

impl Auction {
    /// The all-defaults "null record" (spec.md ssec3): removed from storage
    /// rather than persisted.
    pub fn null() -> Self {
        Self {
            name: Vec::new(),
            height: 0,
            renewal: 0,
            owner: None,
            value: None,
            highest: None,
            data: None,
            transfer: None,
            revoked: None,
            claimed: false,
            weak: false,
        }
    }

    /// `true` if every field is at its zero/absent default.
    pub fn is_null(&self) -> bool {
        self.name.is_empty()
            && self.height == 0
            && self.renewal == 0
            && self.owner.is_none()
            && self.value.is_none()
            && self.highest.is_none()
            && self.data.is_none()
            && self.transfer.is_none()
            && self.revoked.is_none()
            && !self.claimed
            && !self.weak
    }

    /// Derives the record's phase at `height` (spec.md ssec4.3).
    pub fn state(&self, height: u32, params: &NetworkParams) -> Phase {
        if self.revoked.is_some() {
            return Phase::Revoked;
        }
        if self.claimed {
            return Phase::Closed;
        }
        let open_period = params.open_period();
        if height < self.height + open_period {
            return Phase::Opening;
        }
        if height < self.height + open_period + params.bidding_period {
            return Phase::Bidding;
        }
        if height < self.height + open_period + params.bidding_period + params.reveal_period {
            return Phase::Reveal;
        }
        Phase::Closed
    }

    /// `true` if the record should be treated as expired at `height`
    /// (spec.md ssec4.3): revoked past `auctionMaturity`, or CLOSED past
    /// `renewalWindow` since the last renewal, or CLOSED with no owner.
    pub fn is_expired(&self, height: u32, params: &NetworkParams) -> bool {
        if let Some(revoked) = self.revoked {
            if height >= revoked + params.auction_maturity {
                return true;
            }
        }
        if self.state(height, params) == Phase::Closed {
            if height >= self.renewal + params.renewal_window {
                return true;
            }
            if self.owner.is_none() {
                return true;
            }
        }
        false
    }

    /// `true` if a weak claim's lockup window has not yet elapsed at `height`.
    pub fn is_weak(&self, height: u32, params: &NetworkParams) -> bool {
        self.weak && height < self.height + params.weak_lockup
    }

    /// Serializes the record to spec.md ssec6's bit-exact wire format. The
    /// null record serializes to an empty byte string; callers delete
    /// rather than write in that case (spec.md ssec3).
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_null() {
            return Vec::new();
        }
        let mut flags = 0u8;
        if self.owner.is_some() {
            flags |= flag::OWNER;
        }
        if self.value.is_some() {
            flags |= flag::VALUE;
        }
        if self.highest.is_some() {
            flags |= flag::HIGHEST;
        }
        if self.data.is_some() {
            flags |= flag::DATA;
        }
        if self.transfer.is_some() {
            flags |= flag::TRANSFER;
        }
        if self.revoked.is_some() {
            flags |= flag::REVOKED;
        }
        if self.claimed {
            flags |= flag::CLAIMED;
        }
        if self.weak {
            flags |= flag::WEAK;
        }

        let mut w = Writer::new();
        w.u8(self.name.len() as u8);
        w.raw(&self.name);
        w.u32_le(self.height);
        w.u32_le(self.renewal);
        w.u8(flags);
        if let Some(owner) = &self.owner {
            w.raw(&owner.hash);
            w.varint(owner.index as u64);
        }
        if let Some(value) = self.value {
            w.varint(value);
        }
        if let Some(highest) = self.highest {
            w.varint(highest);
        }
        if let Some(data) = &self.data {
            w.var_bytes(data);
        }
        if let Some(transfer) = self.transfer {
            w.u32_le(transfer);
        }
        if let Some(revoked) = self.revoked {
            w.u32_le(revoked);
        }
        w.into_bytes()
    }

    /// Parses a record previously produced by [`Self::to_bytes`]. An empty
    /// slice decodes to the null record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DbError> {
        if bytes.is_empty() {
            return Ok(Self::null());
        }
        let err = |msg: &str| DbError::CorruptRecord("<auction>".into(), msg.into());
        let mut r = Reader::new(bytes);
        let name_len = r.u8().map_err(|_| err("truncated name length"))? as usize;
        let name = r.raw(name_len).map_err(|_| err("truncated name"))?.to_vec();
        let height = r.u32_le().map_err(|_| err("truncated height"))?;
        let renewal = r.u32_le().map_err(|_| err("truncated renewal"))?;
        let flags = r.u8().map_err(|_| err("truncated flags"))?;

        let owner = if flags & flag::OWNER != 0 {
            let hash = r.array32().map_err(|_| err("truncated owner hash"))?;
            let index = r.varint().map_err(|_| err("truncated owner index"))? as u32;
            Some(Outpoint::new(hash, index))
        } else {
            None
        };
        let value = if flags & flag::VALUE != 0 {
            Some(r.varint().map_err(|_| err("truncated value"))?)
        } else {
            None
        };
        let highest = if flags & flag::HIGHEST != 0 {
            Some(r.varint().map_err(|_| err("truncated highest"))?)
        } else {
            None
        };
        let data = if flags & flag::DATA != 0 {
            Some(r.var_bytes().map_err(|_| err("truncated data"))?.to_vec())
        } else {
            None
        };
        let transfer = if flags & flag::TRANSFER != 0 {
            Some(r.u32_le().map_err(|_| err("truncated transfer"))?)
        } else {
            None
        };
        let revoked = if flags & flag::REVOKED != 0 {
            Some(r.u32_le().map_err(|_| err("truncated revoked"))?)
        } else {
            None
        };
        let claimed = flags & flag::CLAIMED != 0;
        let weak = flags & flag::WEAK != 0;

        Ok(Self { name, height, renewal, owner, value, highest, data, transfer, revoked, claimed, weak })
    }
}
