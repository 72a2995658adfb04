//! Conformance handler.

use geoapi_core::{Api, ApiRequest, ApiResponse};
use geoapi_protocol::ConformanceClasses;

use super::{html, respond};

/// GET /conformance - Conformance declaration
pub fn conformance(
    api: &Api,
    request: &ApiRequest,
    _args: &[String],
) -> anyhow::Result<ApiResponse> {
    let classes = ConformanceClasses::current();
    respond(api, request, &classes, html::conformance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoapi_core::{GeoApiConfig, RequestParts};
    use geoapi_protocol::conformance::COLLECTIONS;

    #[test]
    fn test_conformance_json() {
        let api = Api::new(GeoApiConfig::default()).unwrap();
        let request = api.request(RequestParts::new("GET", "/conformance"));
        let response = conformance(&api, &request, &[]).unwrap();

        assert_eq!(response.status, 200);
        let body: serde_json::Value =
            serde_json::from_slice(&response.content.into_bytes()).unwrap();
        let classes = body["conformsTo"].as_array().unwrap();
        assert!(classes.iter().any(|c| c == COLLECTIONS));
    }
}
