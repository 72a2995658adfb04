//! Collection handlers.
//!
//! Collections are the `type: collection` resources of the configuration.
//! Hidden collections are left out of the listing but can still be fetched
//! by identifier.

use geoapi_core::config::{ResourceConfig, Visibility};
use geoapi_core::{Api, ApiRequest, ApiResponse, Locale};
use geoapi_protocol::{media_types, ApiError, Collection, CollectionList, Link};

use super::{format_links, html, localized, respond};

fn collection_document(
    request: &ApiRequest,
    base_url: &str,
    id: &str,
    resource: &ResourceConfig,
    locale: &Locale,
) -> Collection {
    let href = format!("{}/collections/{}", base_url, id);

    let mut collection = Collection::new(id);
    if let Some(title) = localized(&resource.title, locale) {
        collection = collection.with_title(title);
    }
    if let Some(description) = localized(&resource.description, locale) {
        collection = collection.with_description(description);
    }
    if let Some(keywords) = resource.keywords.translate(locale) {
        collection = collection.with_keywords(keywords.clone());
    }

    format_links(request, &href, "This collection")
        .into_iter()
        .fold(collection, |collection, link| collection.with_link(link))
}

/// GET /collections - List visible collections
pub fn list_collections(
    api: &Api,
    request: &ApiRequest,
    _args: &[String],
) -> anyhow::Result<ApiResponse> {
    let base_url = api.base_url();
    let locale = request.locale();

    let collections = api
        .config()
        .resources
        .iter()
        .filter(|(_, r)| r.is_collection() && r.visibility == Visibility::Default)
        .map(|(id, r)| collection_document(request, base_url, id, r, locale))
        .collect();

    let href = format!("{}/collections", base_url);
    let list = format_links(request, &href, "Collections")
        .into_iter()
        .fold(CollectionList::new(collections), |list, link| list.with_link(link))
        .with_link(
            Link::new(base_url, "root")
                .with_type(media_types::JSON)
                .with_title("Landing page"),
        );

    respond(api, request, &list, html::collections)
}

/// GET /collections/{collection_id} - Collection metadata
pub fn get_collection(
    api: &Api,
    request: &ApiRequest,
    args: &[String],
) -> anyhow::Result<ApiResponse> {
    let id = args.first().map(String::as_str).unwrap_or_default();

    let resource = match api.config().resource(id).filter(|r| r.is_collection()) {
        Some(resource) => resource,
        None => {
            let error = ApiError::NotFound(format!("Collection not found: {}", id));
            return Ok(api.exception_response(request, &error));
        }
    };

    let collection =
        collection_document(request, api.base_url(), id, resource, request.locale());
    respond(api, request, &collection, html::collection)
}
