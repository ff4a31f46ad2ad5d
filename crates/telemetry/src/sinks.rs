// Path: crates/telemetry/src/sinks.rs
//! Abstract metrics trait decoupling `na-names`/`na-mempool` instrumentation
//! from any particular backend.

use once_cell::sync::OnceCell;

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `NameMetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn NameMetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured metrics sink, or a no-op
/// sink if none has been installed via [`set_sink`].
pub fn metrics() -> &'static dyn NameMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Installs the global metrics sink. Returns `Err(())` if a sink has
/// already been installed (mirrors `OnceCell::set`'s contract).
pub fn set_sink(sink: &'static dyn NameMetricsSink) -> Result<(), ()> {
    SINK.set(sink).map_err(|_| ())
}

/// Counters and gauges the name auction consensus engine reports at its
/// natural observability seams: auction lifecycle transitions, covenant
/// rejections by reason, and mempool evictions.
pub trait NameMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the count of auctions opened (OPEN/BID/CLAIM on a fresh name).
    fn inc_auctions_opened(&self);
    /// Increments the count of auctions closed via REGISTER.
    fn inc_auctions_registered(&self);
    /// Increments the count of auction records that transitioned to expired.
    fn inc_auctions_expired(&self);
    /// Increments the count of auction records revoked.
    fn inc_auctions_revoked(&self);
    /// Increments a counter for a covenant rejected during contextual
    /// verification, labeled by the stable error code.
    fn inc_covenant_rejected(&self, error_code: &'static str);
    /// Increments a counter for transactions evicted from the mempool
    /// shadow-state on a phase transition, labeled by the category evicted.
    fn inc_mempool_evicted(&self, category: &'static str);
    /// Sets the gauge for the number of names currently watched by the
    /// mempool shadow-state.
    fn set_mempool_watched_names(&self, count: u64);
    /// Observes the duration, in seconds, of a single `connectBlock` call.
    fn observe_connect_block_duration(&self, duration_secs: f64);
}

impl NameMetricsSink for NopSink {
    fn inc_auctions_opened(&self) {}
    fn inc_auctions_registered(&self) {}
    fn inc_auctions_expired(&self) {}
    fn inc_auctions_revoked(&self) {}
    fn inc_covenant_rejected(&self, _error_code: &'static str) {}
    fn inc_mempool_evicted(&self, _category: &'static str) {}
    fn set_mempool_watched_names(&self, _count: u64) {}
    fn observe_connect_block_duration(&self, _duration_secs: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sink_is_nop_and_does_not_panic() {
        let sink = metrics();
        sink.inc_auctions_opened();
        sink.inc_covenant_rejected("COVENANT_BAD_TRANSITION");
        sink.set_mempool_watched_names(3);
    }
}
