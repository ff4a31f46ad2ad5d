// Path: crates/types/src/params.rs
//! Network parameters (spec.md ssec6): every tunable that governs rollout
//! timing, auction window lengths, and lockup/maturity thresholds.

/// The external network-parameter surface. Every height-window computation
/// in `na-names` takes a `&NetworkParams` rather than hardcoding constants,
/// mirroring the way the teacher threads `ChainParams` through its state
/// transition functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    /// Spacing, in blocks, between successive commitments of the name tree
    /// root into the block header.
    pub tree_interval: u32,
    /// Length, in blocks, of the BIDDING phase.
    pub bidding_period: u32,
    /// Length, in blocks, of the REVEAL phase.
    pub reveal_period: u32,
    /// Blocks after `renewal` before a CLOSED name with no recorded renewal
    /// activity becomes expired.
    pub renewal_window: u32,
    /// Blocks after `revoked` before a revoked name becomes expired.
    pub auction_maturity: u32,
    /// Blocks during which a name won via a weak/claimed proof remains
    /// locked and ineligible for transfer.
    pub weak_lockup: u32,
    /// Blocks a TRANSFER must mature before FINALIZE is accepted.
    pub transfer_lockup: u32,
    /// Minimum depth a renewal's block-hash commitment must have relative
    /// to the current height.
    pub renewal_maturity: u32,
    /// Maximum age a renewal's block-hash commitment may have relative to
    /// the current height.
    pub renewal_period: u32,
    /// Spacing, in blocks, between successive weekly rollout cohorts.
    pub rollout_interval: u32,
    /// The height at which auctions (and rollout week 0) begin.
    pub auction_start: u32,
    /// Height after which the reserved-name table and the DNSSEC claim
    /// path both close.
    pub claim_period: u32,
    /// Network-specific short string prefixed to claim-data TXT payloads.
    pub claim_prefix: &'static str,
    /// When `true`, all names are immediately biddable; rollout scheduling
    /// is bypassed (used by tests and private networks).
    pub no_rollout: bool,
    /// When `true`, the reserved-name table is ignored and every
    /// syntactically valid name is auctioned normally.
    pub no_reserved: bool,
}

impl NetworkParams {
    /// `openPeriod`, derived rather than stored (spec.md ssec3):
    /// `treeInterval + 1`.
    pub fn open_period(&self) -> u32 {
        self.tree_interval + 1
    }

    /// The corrected end height of the REVEAL phase: `start + revealPeriod`.
    ///
    /// The historical implementation this engine is modeled on computed
    /// `start + openPeriod + biddingPeriod + revealPeriod`, overstating the
    /// boundary by `openPeriod + biddingPeriod`; that variant is not
    /// reproduced here.
    pub fn reveal_period_end(&self, start: u32) -> u32 {
        start + self.reveal_period
    }

    /// The canonical mainnet-analogue preset.
    pub fn mainnet() -> Self {
        Self {
            tree_interval: 36,
            bidding_period: 5 * 144,
            reveal_period: 10 * 144,
            renewal_window: 2 * 365 * 144,
            auction_maturity: 2 * 7 * 144,
            weak_lockup: 4 * 7 * 144,
            transfer_lockup: 2 * 144,
            renewal_maturity: 2 * 7 * 144,
            renewal_period: 365 * 144,
            rollout_interval: 7 * 144,
            auction_start: 2016,
            claim_period: 4 * 365 * 144,
            claim_prefix: "hs1",
            no_rollout: false,
            no_reserved: false,
        }
    }

    /// A smaller, faster-cycling preset suitable for a public test network.
    pub fn testnet() -> Self {
        Self {
            tree_interval: 8,
            bidding_period: 36,
            reveal_period: 72,
            renewal_window: 14 * 144,
            auction_maturity: 144,
            weak_lockup: 7 * 144,
            transfer_lockup: 48,
            renewal_maturity: 144,
            renewal_period: 30 * 144,
            rollout_interval: 144,
            auction_start: 0,
            claim_period: 90 * 144,
            claim_prefix: "ts1",
            no_rollout: false,
            no_reserved: false,
        }
    }

    /// A private-network preset with rollout and reservation disabled, for
    /// local development.
    pub fn simnet() -> Self {
        Self {
            tree_interval: 5,
            bidding_period: 5,
            reveal_period: 10,
            renewal_window: 200,
            auction_maturity: 50,
            weak_lockup: 400,
            transfer_lockup: 10,
            renewal_maturity: 5,
            renewal_period: 50,
            rollout_interval: 50,
            auction_start: 0,
            claim_period: 500,
            claim_prefix: "ss1",
            no_rollout: true,
            no_reserved: true,
        }
    }

    /// The literal parameter set used by spec.md ssec8's worked scenarios:
    /// `treeInterval=5, biddingPeriod=5, revealPeriod=10, renewalWindow=200,
    /// auctionMaturity=50, weakLockup=400, rolloutInterval=50,
    /// auctionStart=0`. Rollout and reservation remain active, unlike
    /// [`Self::simnet`], since several of the worked scenarios depend on
    /// them.
    pub fn example() -> Self {
        Self {
            tree_interval: 5,
            bidding_period: 5,
            reveal_period: 10,
            renewal_window: 200,
            auction_maturity: 50,
            weak_lockup: 400,
            transfer_lockup: 10,
            renewal_maturity: 400,
            renewal_period: 2000,
            rollout_interval: 50,
            auction_start: 0,
            claim_period: 1000,
            claim_prefix: "ex1",
            no_rollout: false,
            no_reserved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_period_is_tree_interval_plus_one() {
        let p = NetworkParams::example();
        assert_eq!(p.open_period(), 6);
    }

    #[test]
    fn reveal_period_end_does_not_overstate() {
        let p = NetworkParams::example();
        assert_eq!(p.reveal_period_end(100), 110);
    }

    #[test]
    fn presets_are_internally_distinct() {
        assert_ne!(NetworkParams::mainnet(), NetworkParams::testnet());
        assert_ne!(NetworkParams::testnet(), NetworkParams::simnet());
    }
}
