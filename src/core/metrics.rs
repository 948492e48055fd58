use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }
    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Record one language-model round trip.
pub(crate) fn record_llm_call(purpose: &'static str, succeeded: bool, elapsed: Duration) {
    let status = if succeeded { "ok" } else { "error" };
    metrics::counter!("llm_requests_total", "purpose" => purpose, "status" => status).increment(1);
    metrics::histogram!("llm_request_duration_seconds", "purpose" => purpose)
        .record(elapsed.as_secs_f64());
}
