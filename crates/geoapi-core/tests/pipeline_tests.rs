//! End-to-end tests for request normalization and the execution pipeline.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flate2::read::GzDecoder;
use geoapi_core::headers::{get_header, CONTENT_ENCODING, CONTENT_LANGUAGE, CONTENT_TYPE};
use geoapi_core::{
    execute, execute_async, Api, ApiRequest, ApiResponse, Backend, ExecuteOptions,
    GeoApiConfig, RequestParts,
};
use serde_json::json;

fn api(yaml: &str) -> Arc<Api> {
    let config = GeoApiConfig::from_yaml_str(yaml).unwrap();
    Arc::new(Api::new(config).unwrap())
}

fn collections(api: &Api, request: &ApiRequest, _: &[String]) -> anyhow::Result<ApiResponse> {
    let headers = api.response_headers(request);
    let body = json!({
        "locale": request.locale().to_string(),
        "links": [{"rel": request.get_linkrel("json"), "type": "application/json"}]
    });
    Ok(ApiResponse::ok(headers, api.json_content(body)))
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

// ============================================================================
// Envelope scenarios
// ============================================================================

#[test]
fn test_format_query_with_default_locale() {
    let api = api("server:\n  languages: [en, fr]\n");
    let request = api.request(RequestParts::new("GET", "/collections").with_query("f=json"));

    assert_eq!(request.format(), Some("json"));
    assert_eq!(request.locale().to_string(), "en");
    assert_eq!(request.raw_locale(), None);
}

#[test]
fn test_accept_language_keeps_raw_header() {
    let api = api("server:\n  languages: [en, fr]\n");
    let request = api.request(
        RequestParts::new("GET", "/collections").with_header("Accept-Language", "fr-CA,fr;q=0.8"),
    );

    assert_eq!(request.locale().to_string(), "fr");
    assert_eq!(request.raw_locale(), Some("fr-CA,fr;q=0.8"));
}

#[test]
fn test_lang_param_raw_wins_over_header() {
    let api = api("server:\n  languages: [en, fr]\n");
    let request = api.request(
        RequestParts::new("GET", "/")
            .with_query("lang=en-GB")
            .with_header("Accept-Language", "fr"),
    );

    assert_eq!(request.raw_locale(), Some("en-GB"));
    assert_eq!(request.locale().to_string(), "en");
}

#[test]
fn test_accept_header_table_order() {
    let api = api("");
    let request = api.request(
        RequestParts::new("GET", "/").with_header("Accept", "application/json;q=0.9, text/html;q=0.1"),
    );
    assert_eq!(request.format(), Some("html"));

    let headers = api.response_headers(&request);
    assert_eq!(get_header(&headers, CONTENT_TYPE), Some("text/html"));
}

// ============================================================================
// Synchronous pipeline
// ============================================================================

#[test]
fn test_sync_pipeline_success() {
    let api = api("server:\n  languages: [en, fr]\n");
    let request = api.request(RequestParts::new("GET", "/collections").with_query("lang=fr"));

    let response = execute(
        &api,
        &collections,
        &request,
        &[],
        &ExecuteOptions::DEFAULT,
        Backend::Blocking,
    )
    .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(get_header(&response.headers, CONTENT_LANGUAGE), Some("fr"));
    let body: serde_json::Value = serde_json::from_slice(&response.content.into_bytes()).unwrap();
    assert_eq!(body["locale"], "fr");
    assert_eq!(body["links"][0]["rel"], "self");
}

#[test]
fn test_sync_pipeline_format_exception_is_gzipped() {
    let api = api("server:\n  gzip: true\n  languages: [fr, en]\n");
    let request = api.request(
        RequestParts::new("GET", "/collections")
            .with_query("f=xml")
            .with_header("Accept-Encoding", "gzip, deflate"),
    );

    let response = execute(
        &api,
        &collections,
        &request,
        &[],
        &ExecuteOptions::DEFAULT,
        Backend::Blocking,
    )
    .unwrap();

    assert_eq!(response.status, 400);
    assert_eq!(get_header(&response.headers, CONTENT_LANGUAGE), Some("en-US"));
    assert_eq!(get_header(&response.headers, CONTENT_ENCODING), Some("gzip"));

    let body: serde_json::Value =
        serde_json::from_slice(&gunzip(&response.content.into_bytes())).unwrap();
    assert_eq!(body["code"], "InvalidParameterValue");
    assert_eq!(body["description"], "Invalid format: xml");
}

// ============================================================================
// Async pipeline
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_pipeline_matches_sync() {
    let api = api("server:\n  languages: [en, fr]\n");
    let parts = RequestParts::new("GET", "/collections").with_header("Accept-Language", "fr");

    let sync = execute(
        &api,
        &collections,
        &api.request(parts.clone()),
        &[],
        &ExecuteOptions::DEFAULT,
        Backend::Blocking,
    )
    .unwrap();

    let async_ = execute_async(
        api.clone(),
        collections,
        api.request(parts),
        Vec::new(),
        ExecuteOptions::DEFAULT,
        Backend::Axum,
    )
    .await
    .unwrap();

    assert_eq!(sync.status, async_.status);
    assert_eq!(sync.content, async_.content);
    assert_eq!(
        get_header(&sync.headers, CONTENT_LANGUAGE),
        get_header(&async_.headers, CONTENT_LANGUAGE)
    );
}

#[tokio::test]
async fn test_async_short_circuit_counts_no_calls() {
    let api = api("");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let counting = move |api: &Api, request: &ApiRequest, args: &[String]| {
        counter.fetch_add(1, Ordering::SeqCst);
        collections(api, request, args)
    };

    for query in ["f=xml", "f=json", "f=bogus", ""] {
        let request = api.request(RequestParts::new("GET", "/").with_query(query));
        let _ = execute_async(
            api.clone(),
            counting.clone(),
            request,
            Vec::new(),
            ExecuteOptions::DEFAULT,
            Backend::Axum,
        )
        .await
        .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
