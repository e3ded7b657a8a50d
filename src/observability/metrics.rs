//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_registrations_total` (counter): by result
//! - `registry_heartbeats_total` (counter): by result
//! - `registry_deregistrations_total` (counter): by result
//! - `registry_probe_reachable` (gauge): 1=reachable, 0=inaccessible, by app/host
//! - `registry_sweep_duration_seconds` (histogram)

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn result_label(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_registration(ok: bool) {
    metrics::counter!("registry_registrations_total", "result" => result_label(ok)).increment(1);
}

pub fn record_heartbeat(ok: bool) {
    metrics::counter!("registry_heartbeats_total", "result" => result_label(ok)).increment(1);
}

pub fn record_deregistration(ok: bool) {
    metrics::counter!("registry_deregistrations_total", "result" => result_label(ok))
        .increment(1);
}

pub fn record_probe(app: &str, host: &str, reachable: bool) {
    metrics::gauge!(
        "registry_probe_reachable",
        "app" => app.to_string(),
        "host" => host.to_string()
    )
    .set(if reachable { 1.0 } else { 0.0 });
}

pub fn record_sweep_duration(duration: Duration) {
    metrics::histogram!("registry_sweep_duration_seconds").record(duration.as_secs_f64());
}
