//! Bundled frontend assets, served from the router fallback.

use axum::{
    body::Body,
    http::{Response, StatusCode, Uri, header},
    response::IntoResponse,
};
use rust_embed::RustEmbed;
use tracing::{debug, instrument};

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct Assets;

/// Serve an embedded asset, falling back to `index.html` for client-side routes
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/');

    if path.is_empty() || path.ends_with('/') {
        path = "index.html";
    }

    if let Some(content) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        // Hashed bundler output can be cached indefinitely
        let cache_control = if path.starts_with("assets/") {
            "public, max-age=31536000, immutable"
        } else {
            "no-cache"
        };

        return asset_response(StatusCode::OK, mime.as_ref(), cache_control, content.data.into_owned());
    }

    if let Some(index) = Assets::get("index.html") {
        debug!("Serving index.html for client route {}", uri.path());
        return asset_response(StatusCode::OK, "text/html", "no-cache", index.data.into_owned());
    }

    StatusCode::NOT_FOUND.into_response()
}

fn asset_response(status: StatusCode, content_type: &str, cache_control: &'static str, data: Vec<u8>) -> axum::response::Response {
    match Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data))
    {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
