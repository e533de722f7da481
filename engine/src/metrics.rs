//! Prometheus metrics for attestation outcomes.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use attestor_types::ErrorKind;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Attestations that got a status record.
    pub started: IntCounter,
    pub proof_ready: IntCounter,
    /// Failures, labelled by error kind.
    pub failed: IntCounterVec,
    /// Attestations currently between start and a terminal phase.
    pub in_flight: IntGauge,
    /// Live cache proxy entries, refreshed on scrape.
    pub cache_entries: IntGauge,
    /// Status records held, refreshed on scrape.
    pub status_records: IntGauge,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let started = register_int_counter_with_registry!(
            Opts::new("attestor_attestations_started_total", "Attestations started"),
            registry
        )?;

        let proof_ready = register_int_counter_with_registry!(
            Opts::new(
                "attestor_attestations_proof_ready_total",
                "Attestations that ended with a decoded proof"
            ),
            registry
        )?;

        let failed = register_int_counter_vec_with_registry!(
            Opts::new("attestor_attestations_failed_total", "Failed attestations by error kind"),
            &["kind"],
            registry
        )?;
        for kind in ErrorKind::ALL {
            failed.with_label_values(&[kind.as_str()]);
        }

        let in_flight = register_int_gauge_with_registry!(
            Opts::new("attestor_attestations_in_flight", "Attestations not yet terminal"),
            registry
        )?;

        let cache_entries = register_int_gauge_with_registry!(
            Opts::new("attestor_cache_entries", "Entries held by the cache proxy"),
            registry
        )?;

        let status_records = register_int_gauge_with_registry!(
            Opts::new("attestor_status_records", "Status records held by the store"),
            registry
        )?;

        Ok(Self {
            registry,
            started,
            proof_ready,
            failed,
            in_flight,
            cache_entries,
            status_records,
        })
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.failed.with_label_values(&[kind.as_str()]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
