//! Axum handler for the field listing.
//!
//! # Routes
//!
//! - `GET {catalog_path}.html` — HTML table of registered fields
//! - `GET {catalog_path}.{format}` — catalog through any bound serializer
//!
//! Everything else answers `404` with a JSON error body.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::catalog::FieldListing;

/// Build a router serving `listing`.
///
/// The listing decides which paths it answers, so the handler is installed
/// as the fallback; merge this router into a larger application as needed.
pub fn catalog_router(listing: FieldListing) -> Router {
    Router::new()
        .fallback(catalog_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(listing))
}

async fn catalog_handler(
    State(listing): State<Arc<FieldListing>>,
    method: Method,
    uri: Uri,
) -> Response {
    let path = uri.path();

    if !listing.matches(path, method.as_str()) {
        tracing::debug!("No field listing route for {} {}", method, path);
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("No route for {} {}", method, path),
            })),
        )
            .into_response();
    }

    match listing.handle(path, method.as_str(), &[]) {
        Ok(body) => {
            let content_type = listing
                .content_type(path)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to render field listing for {}: {}", path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
