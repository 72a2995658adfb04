//! The API route table shared by every backend.
//!
//! Paths are relative to the backend's URL prefix and use `{name}`
//! placeholders; placeholder values are passed to the handler as
//! positional arguments.

use geoapi_core::{Api, ApiRequest, ApiResponse, ExecuteOptions};

use crate::handlers::{collections, conformance, landing, processes};

/// Business logic signature of every route.
pub type HandlerFn = fn(&Api, &ApiRequest, &[String]) -> anyhow::Result<ApiResponse>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
}

impl RouteMethod {
    pub fn as_http(&self) -> http::Method {
        match self {
            RouteMethod::Get => http::Method::GET,
            RouteMethod::Post => http::Method::POST,
        }
    }

    /// Whether the handler needs the request body.
    pub fn has_body(&self) -> bool {
        matches!(self, RouteMethod::Post)
    }
}

#[derive(Clone, Copy)]
pub struct Route {
    pub method: RouteMethod,
    pub path: &'static str,
    pub handler: HandlerFn,
    pub options: ExecuteOptions,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish()
    }
}

pub static ROUTES: &[Route] = &[
    Route {
        method: RouteMethod::Get,
        path: "/",
        handler: landing::landing_page,
        options: ExecuteOptions::DEFAULT,
    },
    Route {
        method: RouteMethod::Get,
        path: "/conformance",
        handler: conformance::conformance,
        options: ExecuteOptions::DEFAULT,
    },
    Route {
        method: RouteMethod::Get,
        path: "/collections",
        handler: collections::list_collections,
        options: ExecuteOptions::DEFAULT,
    },
    Route {
        method: RouteMethod::Get,
        path: "/collections/{collection_id}",
        handler: collections::get_collection,
        options: ExecuteOptions::DEFAULT,
    },
    Route {
        method: RouteMethod::Post,
        path: "/processes/{process_id}/execution",
        handler: processes::execute_process,
        options: ExecuteOptions::DEFAULT,
    },
];

/// A route path in axum's `:name` placeholder syntax.
pub fn axum_path(path: &str) -> String {
    path.replace('{', ":").replace('}', "")
}

/// A route path mounted under `prefix`.
pub fn mounted_path(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path) {
        (true, _) => path.to_string(),
        (false, "/") => prefix.to_string(),
        (false, _) => format!("{}{}", prefix, path),
    }
}
