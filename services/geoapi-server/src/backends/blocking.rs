//! Blocking backend: in-memory `http` requests and responses.
//!
//! The request body is already in memory, so envelopes are built eagerly
//! and the whole pipeline runs on the calling thread. [`Dispatcher`] adds
//! the API rules and the route table on top; the hyper backend runs one on
//! its worker threads.

use std::sync::Arc;

use bytes::Bytes;
use geoapi_core::{
    execute, Api, ApiRequest, ApiResponse, Backend, ExecuteOptions, Handler, QueryParams,
    RequestParts, SlashRule,
};
use http::{header, HeaderName, HeaderValue, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::{error, warn};

use super::MAX_BODY_BYTES;
use crate::routes::{Route, ROUTES};

/// Extract the canonical request fields.
pub fn parts_from_http<B: AsRef<[u8]>>(req: &http::Request<B>) -> RequestParts {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(value) => Some((name.as_str().to_string(), value.to_string())),
            Err(_) => {
                warn!(header = %name, "Ignoring non-ASCII header value");
                None
            }
        })
        .collect();

    RequestParts {
        method: req.method().as_str().to_string(),
        path: req.uri().path().to_string(),
        query: QueryParams::from_query(req.uri().query().unwrap_or_default()),
        headers,
        body: Some(Bytes::copy_from_slice(req.body().as_ref())),
    }
}

/// Build an envelope without the request body.
pub fn from_http<B: AsRef<[u8]>>(api: &Api, req: &http::Request<B>) -> ApiRequest {
    api.request(parts_from_http(req))
}

/// Build an envelope that keeps the request body.
pub fn from_http_with_data<B: AsRef<[u8]>>(api: &Api, req: &http::Request<B>) -> ApiRequest {
    api.request_with_data(parts_from_http(req))
}

/// Render a response triple.
pub fn to_response(response: ApiResponse) -> http::Response<Bytes> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut res = http::Response::new(response.content.into_bytes());
    *res.status_mut() = status;
    copy_headers(response.headers, res.headers_mut());
    res
}

/// Copy a header map onto a native header map, skipping invalid entries.
pub fn copy_headers(headers: geoapi_core::Headers, target: &mut http::HeaderMap) {
    for (name, value) in headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                target.insert(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid response header"),
        }
    }
}

/// Normalize `req`, run `handler` through the pipeline and render the result.
pub fn execute_from_http<B, H>(
    api: &Api,
    handler: &H,
    req: &http::Request<B>,
    args: &[String],
    options: &ExecuteOptions,
) -> anyhow::Result<http::Response<Bytes>>
where
    B: AsRef<[u8]>,
    H: Handler + ?Sized,
{
    let request = if req.method() == http::Method::POST {
        from_http_with_data(api, req)
    } else {
        from_http(api, req)
    };

    let response = execute(api, handler, &request, args, options, Backend::Blocking)?;
    Ok(to_response(response))
}

/// A plain 500 for handler errors.
pub fn internal_error() -> http::Response<Bytes> {
    let mut res = http::Response::new(Bytes::from_static(b"Internal Server Error"));
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain"),
    );
    res
}

/// A bare response with an empty body.
pub(crate) fn status_only(status: StatusCode) -> http::Response<Bytes> {
    let mut res = http::Response::new(Bytes::new());
    *res.status_mut() = status;
    res
}

fn redirect(location: &str) -> http::Response<Bytes> {
    let mut res = status_only(StatusCode::TEMPORARY_REDIRECT);
    if let Ok(value) = HeaderValue::try_from(location) {
        res.headers_mut().insert(header::LOCATION, value);
    }
    res
}

/// Routes in-memory requests for one backend: trailing-slash rules, URL
/// prefix, route table, then the pipeline on the calling thread.
pub struct Dispatcher {
    api: Arc<Api>,
    backend: Backend,
    routes: MatchitRouter<Vec<&'static Route>>,
}

impl Dispatcher {
    pub fn new(api: Arc<Api>, backend: Backend) -> anyhow::Result<Self> {
        // One matchit entry per path, holding every method served there
        let mut grouped: Vec<(&'static str, Vec<&'static Route>)> = Vec::new();
        for route in ROUTES {
            match grouped.iter_mut().find(|(path, _)| *path == route.path) {
                Some((_, methods)) => methods.push(route),
                None => grouped.push((route.path, vec![route])),
            }
        }

        let mut routes = MatchitRouter::new();
        for (path, methods) in grouped {
            routes.insert(path, methods)?;
        }

        Ok(Self {
            api,
            backend,
            routes,
        })
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Route and execute one request.
    pub fn handle<B: AsRef<[u8]>>(&self, req: &http::Request<B>) -> http::Response<Bytes> {
        let rules = self.api.rules();

        let path = match rules.check_path(self.backend, req.uri().path()) {
            SlashRule::Continue => req.uri().path().to_string(),
            SlashRule::Rewrite(path) => path,
            SlashRule::Redirect(location) => {
                let location = match req.uri().query() {
                    Some(query) => format!("{}?{}", location, query),
                    None => location,
                };
                return redirect(&location);
            }
            SlashRule::NotFound => return status_only(StatusCode::NOT_FOUND),
        };

        let route_path = match rules.strip_prefix(self.backend, &path) {
            Some("") => "/",
            Some(rest) => rest,
            None => return status_only(StatusCode::NOT_FOUND),
        };

        let matched = match self.routes.at(route_path) {
            Ok(matched) => matched,
            Err(_) => return status_only(StatusCode::NOT_FOUND),
        };

        let route = match matched
            .value
            .iter()
            .find(|r| r.method.as_http() == req.method())
        {
            Some(route) => *route,
            None => return status_only(StatusCode::METHOD_NOT_ALLOWED),
        };

        if req.body().as_ref().len() > MAX_BODY_BYTES {
            return status_only(StatusCode::PAYLOAD_TOO_LARGE);
        }

        let args: Vec<String> = matched.params.iter().map(|(_, v)| v.to_string()).collect();

        let mut parts = parts_from_http(req);
        parts.path = path.clone();
        if !route.method.has_body() {
            parts.body = None;
        }
        let request = self.api.request_with_data(parts);

        match execute(
            &self.api,
            &route.handler,
            &request,
            &args,
            &route.options,
            self.backend,
        ) {
            Ok(response) => to_response(response),
            Err(e) => {
                error!(error = %e, path = %path, backend = %self.backend, "Handler failed");
                internal_error()
            }
        }
    }
}
