//! Prometheus metrics setup.

use anyhow::{Context, Result};
use ::metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the pipeline metrics.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(
        "geoapi_requests_total",
        "Requests that went through the API pipeline, by backend"
    );
    describe_counter!(
        "geoapi_format_rejections_total",
        "Requests rejected because of an unsupported output format"
    );
    describe_histogram!(
        "geoapi_request_duration_ms",
        Unit::Milliseconds,
        "Time spent in the API pipeline"
    );

    Ok(handle)
}
