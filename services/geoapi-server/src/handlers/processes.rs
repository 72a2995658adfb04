//! Process execution handler.
//!
//! Processes are the `type: process` resources of the configuration. Every
//! configured process echoes its inputs back as its outputs.

use geoapi_core::{Api, ApiRequest, ApiResponse};
use geoapi_protocol::{media_types, ApiError};
use serde_json::{json, Map, Value};

/// POST /processes/{process_id}/execution - Synchronous execution
pub fn execute_process(
    api: &Api,
    request: &ApiRequest,
    args: &[String],
) -> anyhow::Result<ApiResponse> {
    let id = args.first().map(String::as_str).unwrap_or_default();

    if api.config().resource(id).filter(|r| r.kind == "process").is_none() {
        let error = ApiError::NotFound(format!("Process not found: {}", id));
        return Ok(api.exception_response(request, &error));
    }

    let inputs = match parse_inputs(request.data()) {
        Ok(inputs) => inputs,
        Err(message) => {
            let error = ApiError::InvalidParameterValue(message);
            return Ok(api.exception_response(request, &error));
        }
    };

    // Execution results are JSON whatever `f` asked for
    let options = api.header_options().with_type(media_types::JSON);
    let headers = request.get_response_headers(&options);

    let document = json!({
        "processID": id,
        "status": "successful",
        "outputs": inputs,
    });
    Ok(ApiResponse::ok(headers, api.json_content(document)))
}

/// The `inputs` member of an execute request; an empty body has no inputs.
fn parse_inputs(body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    let document: Value = serde_json::from_slice(body)
        .map_err(|e| format!("Invalid execute request: {}", e))?;

    match document {
        Value::Object(mut members) => Ok(members
            .remove("inputs")
            .unwrap_or_else(|| Value::Object(Map::new()))),
        _ => Err("Invalid execute request: expected a JSON object".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoapi_core::headers::{get_header, CONTENT_TYPE};
    use geoapi_core::{GeoApiConfig, RequestParts};

    fn api() -> Api {
        let config = GeoApiConfig::from_yaml_str(
            "resources:\n  echo:\n    type: process\n    title: Echo\n  lakes:\n    type: collection\n",
        )
        .unwrap();
        Api::new(config).unwrap()
    }

    fn execute(api: &Api, id: &str, body: &str) -> ApiResponse {
        let parts = RequestParts::new("POST", format!("/processes/{}/execution", id))
            .with_query("f=html")
            .with_body(body.to_string());
        let request = api.request_with_data(parts);
        execute_process(api, &request, &[id.to_string()]).unwrap()
    }

    fn json_body(response: ApiResponse) -> Value {
        serde_json::from_slice(&response.content.into_bytes()).unwrap()
    }

    #[test]
    fn test_echo_returns_inputs() {
        let api = api();
        let response = execute(&api, "echo", r#"{"inputs": {"message": "bonjour"}}"#);

        assert_eq!(response.status, 200);
        assert_eq!(response.header(CONTENT_TYPE), Some(media_types::JSON));
        let body = json_body(response);
        assert_eq!(body["processID"], "echo");
        assert_eq!(body["outputs"]["message"], "bonjour");
    }

    #[test]
    fn test_empty_body_has_no_inputs() {
        let api = api();
        let body = json_body(execute(&api, "echo", "  "));
        assert_eq!(body["outputs"], json!({}));
    }

    #[test]
    fn test_invalid_body_is_rejected() {
        let api = api();

        let response = execute(&api, "echo", "{not json");
        assert_eq!(response.status, 400);
        assert_eq!(
            get_header(&response.headers, CONTENT_TYPE),
            Some("application/json; charset=UTF-8")
        );

        let response = execute(&api, "echo", "[1, 2]");
        assert_eq!(response.status, 400);
        assert_eq!(
            json_body(response)["description"],
            "Invalid execute request: expected a JSON object"
        );
    }

    #[test]
    fn test_unknown_process_not_found() {
        let api = api();
        assert_eq!(execute(&api, "lakes", "{}").status, 404);
        assert_eq!(execute(&api, "buffer", "{}").status, 404);
    }
}
