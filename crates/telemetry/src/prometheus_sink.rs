// Path: crates/telemetry/src/prometheus_sink.rs
//! A concrete [`crate::sinks::NameMetricsSink`] backed by the `prometheus`
//! crate's default registry, the counter/gauge-vector style the teacher's
//! `ioi-telemetry::prometheus` module uses for its own sinks.

use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

use crate::sinks::NameMetricsSink;

/// A `prometheus`-backed metrics sink. Construct once per process and
/// install globally via [`crate::sinks::set_sink`] (which requires a
/// `'static` reference, so callers typically leak a `Box` or store this in
/// a `once_cell::sync::Lazy`).
#[derive(Debug)]
pub struct PrometheusSink {
    auctions_opened: prometheus::Counter,
    auctions_registered: prometheus::Counter,
    auctions_expired: prometheus::Counter,
    auctions_revoked: prometheus::Counter,
    covenant_rejected: CounterVec,
    mempool_evicted: CounterVec,
    mempool_watched_names: Gauge,
    connect_block_duration: Histogram,
}

impl PrometheusSink {
    /// Registers every metric against `registry` and returns the sink.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let auctions_opened =
            prometheus::Counter::with_opts(Opts::new("na_auctions_opened_total", "Auctions opened"))?;
        let auctions_registered = prometheus::Counter::with_opts(Opts::new(
            "na_auctions_registered_total",
            "Auctions closed via REGISTER",
        ))?;
        let auctions_expired = prometheus::Counter::with_opts(Opts::new(
            "na_auctions_expired_total",
            "Auction records that transitioned to expired",
        ))?;
        let auctions_revoked = prometheus::Counter::with_opts(Opts::new(
            "na_auctions_revoked_total",
            "Auction records revoked",
        ))?;
        let covenant_rejected = CounterVec::new(
            Opts::new("na_covenant_rejected_total", "Covenants rejected during contextual verification"),
            &["error_code"],
        )?;
        let mempool_evicted = CounterVec::new(
            Opts::new("na_mempool_evicted_total", "Transactions evicted from the mempool shadow-state"),
            &["category"],
        )?;
        let mempool_watched_names = Gauge::with_opts(Opts::new(
            "na_mempool_watched_names",
            "Names currently watched by the mempool shadow-state",
        ))?;
        let connect_block_duration = Histogram::with_opts(HistogramOpts::new(
            "na_connect_block_duration_seconds",
            "Duration of a single connectBlock call",
        ))?;

        registry.register(Box::new(auctions_opened.clone()))?;
        registry.register(Box::new(auctions_registered.clone()))?;
        registry.register(Box::new(auctions_expired.clone()))?;
        registry.register(Box::new(auctions_revoked.clone()))?;
        registry.register(Box::new(covenant_rejected.clone()))?;
        registry.register(Box::new(mempool_evicted.clone()))?;
        registry.register(Box::new(mempool_watched_names.clone()))?;
        registry.register(Box::new(connect_block_duration.clone()))?;

        Ok(Self {
            auctions_opened,
            auctions_registered,
            auctions_expired,
            auctions_revoked,
            covenant_rejected,
            mempool_evicted,
            mempool_watched_names,
            connect_block_duration,
        })
    }
}

impl NameMetricsSink for PrometheusSink {
    fn inc_auctions_opened(&self) {
        self.auctions_opened.inc();
    }

    fn inc_auctions_registered(&self) {
        self.auctions_registered.inc();
    }

    fn inc_auctions_expired(&self) {
        self.auctions_expired.inc();
    }

    fn inc_auctions_revoked(&self) {
        self.auctions_revoked.inc();
    }

    fn inc_covenant_rejected(&self, error_code: &'static str) {
        self.covenant_rejected.with_label_values(&[error_code]).inc();
    }

    fn inc_mempool_evicted(&self, category: &'static str) {
        self.mempool_evicted.with_label_values(&[category]).inc();
    }

    fn set_mempool_watched_names(&self, count: u64) {
        self.mempool_watched_names.set(count as f64);
    }

    fn observe_connect_block_duration(&self, duration_secs: f64) {
        self.connect_block_duration.observe(duration_secs);
    }
}
