//! Landing page handler.

use geoapi_core::{Api, ApiRequest, ApiResponse};
use geoapi_protocol::LandingPage;

use super::{format_links, html, localized, respond};

/// GET / - Landing page
pub fn landing_page(
    api: &Api,
    request: &ApiRequest,
    _args: &[String],
) -> anyhow::Result<ApiResponse> {
    let identification = &api.config().metadata.identification;
    let locale = request.locale();

    let title = localized(&identification.title, locale).unwrap_or_else(|| "geoapi".to_string());
    let description = localized(&identification.description, locale).unwrap_or_default();

    let base_url = api.base_url();
    let landing = format_links(request, base_url, "This document")
        .into_iter()
        .fold(LandingPage::new(title, description, base_url), |landing, link| {
            landing.with_link(link)
        });

    respond(api, request, &landing, html::landing_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoapi_core::{GeoApiConfig, RequestParts};

    fn api() -> Api {
        let config = GeoApiConfig::from_yaml_str(
            r#"
server:
  url: http://localhost:5000/
  languages: [en-US, fr-CA]
metadata:
  identification:
    title:
      en: geoapi default instance
      fr: instance par défaut
"#,
        )
        .unwrap();
        Api::new(config).unwrap()
    }

    #[test]
    fn test_landing_page_json() {
        let api = api();
        let request = api.request(RequestParts::new("GET", "/"));
        let response = landing_page(&api, &request, &[]).unwrap();

        let body: serde_json::Value =
            serde_json::from_slice(&response.content.into_bytes()).unwrap();
        assert_eq!(body["title"], "geoapi default instance");

        let links = body["links"].as_array().unwrap();
        assert!(links
            .iter()
            .any(|l| l["rel"] == "conformance" && l["href"] == "http://localhost:5000/conformance"));
        assert!(links
            .iter()
            .any(|l| l["rel"] == "self" && l["href"] == "http://localhost:5000?f=json"));
    }

    #[test]
    fn test_landing_page_localized_html() {
        let api = api();
        let request = api.request(RequestParts::new("GET", "/").with_query("f=html&lang=fr"));
        let response = landing_page(&api, &request, &[]).unwrap();

        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.header("Content-Language"), Some("fr-CA"));
        let html = String::from_utf8(response.content.into_bytes().to_vec()).unwrap();
        assert!(html.contains("<h1>instance par défaut</h1>"));
    }
}
