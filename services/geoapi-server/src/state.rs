//! Application state shared by the HTTP backends.

use std::sync::Arc;

use geoapi_core::{Api, GeoApiConfig};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared application state.
pub struct AppState {
    /// Validated configuration, locales and API rules.
    pub api: Arc<Api>,

    /// Prometheus handle for `/metrics`, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(api: Arc<Api>, prometheus: Option<PrometheusHandle>) -> Self {
        Self { api, prometheus }
    }

    /// State without a metrics recorder, for tests and embedding.
    pub fn from_config(config: GeoApiConfig) -> geoapi_core::ConfigResult<Self> {
        Ok(Self::new(Arc::new(Api::new(config)?), None))
    }
}
