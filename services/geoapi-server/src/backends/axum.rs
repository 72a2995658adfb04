//! Axum backend.
//!
//! Request bodies are streamed, so the body-keeping envelope has to await
//! them first. Business logic runs through the execution bridge; the
//! trailing-slash rules run as middleware in front of the router.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, StatusCode, Uri},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Extension, Json, Router,
};
use geoapi_core::{
    execute_async, Api, ApiRequest, ApiResponse, Backend, Content, QueryParams, Representation,
    RequestParts, SlashRule,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use super::blocking::copy_headers;
use super::{exceeds_body_limit, MAX_BODY_BYTES};
use crate::handlers::health;
use crate::routes::{axum_path, mounted_path, Route, RouteMethod, ROUTES};
use crate::state::AppState;

/// A handler error, rendered as a bare 500.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Handler failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for HandlerError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

fn parts_from_axum(req: &Request) -> RequestParts {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    RequestParts {
        method: req.method().as_str().to_string(),
        path: req.uri().path().to_string(),
        query: QueryParams::from_query(req.uri().query().unwrap_or_default()),
        headers,
        body: None,
    }
}

/// Build an envelope without reading the body.
pub fn from_axum(api: &Api, req: &Request) -> ApiRequest {
    api.request(parts_from_axum(req))
}

/// Build an envelope after reading the whole body.
pub async fn from_axum_with_data(api: &Api, req: Request) -> Result<ApiRequest, axum::Error> {
    let mut parts = parts_from_axum(&req);
    let body = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES).await?;
    parts.body = Some(body);
    Ok(api.request_with_data(parts))
}

/// Render a response triple.
pub fn to_response(response: ApiResponse) -> Response {
    let representation = response.representation();
    let ApiResponse {
        headers,
        status,
        content,
    } = response;

    let mut res = match (representation, content) {
        (Representation::Html, content) => Html(content.into_bytes()).into_response(),
        (Representation::Json, Content::Json(value)) => Json(value).into_response(),
        (_, content) => Body::from(content.into_bytes()).into_response(),
    };

    *res.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    copy_headers(headers, res.headers_mut());
    res
}

async fn dispatch(
    state: Arc<AppState>,
    route: &'static Route,
    params: Vec<(String, String)>,
    req: Request,
) -> Result<Response, HandlerError> {
    let api = Arc::clone(&state.api);
    let request = if route.method.has_body() {
        match from_axum_with_data(&api, req).await {
            Ok(request) => request,
            Err(e) if exceeds_body_limit(&e) => {
                debug!(limit = MAX_BODY_BYTES, "Request body too large");
                return Ok(StatusCode::PAYLOAD_TOO_LARGE.into_response());
            }
            Err(e) => {
                debug!(error = %e, "Failed to read request body");
                return Ok(StatusCode::BAD_REQUEST.into_response());
            }
        }
    } else {
        from_axum(&api, &req)
    };

    let args = params.into_iter().map(|(_, value)| value).collect();
    let response = execute_async(
        api,
        route.handler,
        request,
        args,
        route.options,
        Backend::Axum,
    )
    .await?;

    Ok(to_response(response))
}

fn method_filter(method: RouteMethod) -> MethodFilter {
    match method {
        RouteMethod::Get => MethodFilter::GET,
        RouteMethod::Post => MethodFilter::POST,
    }
}

fn api_router(prefix: &str) -> Router {
    let mut router = Router::new();

    for route in ROUTES {
        let handler = move |Extension(state): Extension<Arc<AppState>>,
                            params: Option<Path<Vec<(String, String)>>>,
                            req: Request| async move {
            let params = params.map(|Path(p)| p).unwrap_or_default();
            dispatch(state, route, params, req).await
        };

        let path = axum_path(&mounted_path(prefix, route.path));
        router = router.route(&path, on(method_filter(route.method), handler.clone()));

        // Prefix root with a trailing slash
        if !prefix.is_empty() && route.path == "/" {
            let slashed = format!("{}/", prefix);
            router = router.route(&slashed, on(method_filter(route.method), handler));
        }
    }

    router
}

async fn api_rules_middleware(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let rule = state
        .api
        .rules()
        .check_path(Backend::Axum, req.uri().path());

    match rule {
        SlashRule::Continue => next.run(req).await,
        SlashRule::NotFound => StatusCode::NOT_FOUND.into_response(),
        SlashRule::Redirect(location) => {
            let location = match req.uri().query() {
                Some(query) => format!("{}?{}", location, query),
                None => location,
            };
            (
                StatusCode::TEMPORARY_REDIRECT,
                [(header::LOCATION, location)],
            )
                .into_response()
        }
        SlashRule::Rewrite(path) => {
            let path_and_query = match req.uri().query() {
                Some(query) => format!("{}?{}", path, query),
                None => path,
            };
            match path_and_query.parse::<Uri>() {
                Ok(uri) => *req.uri_mut() = uri,
                Err(e) => warn!(error = %e, "Could not rewrite request path"),
            }
            next.run(req).await
        }
    }
}

/// Build the axum application for `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let api = Arc::clone(&state.api);
    let prefix = api.rules().url_prefix(Backend::Axum);

    let inner = api_router(prefix)
        .route("/health", get(health::health_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(Extension(Arc::clone(&state)));

    let app = Router::new()
        .fallback_service(inner)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            api_rules_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    if api.config().server.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Serve the axum application until a shutdown signal arrives.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, prefix = state.api.rules().url_prefix(Backend::Axum), "geoapi listening (axum)");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(super::shutdown_signal())
        .await?;
    Ok(())
}
