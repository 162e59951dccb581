//! Dashboard page serving from the configured directory.
//!
//! The dashboard is a set of prebuilt HTML pages living next to the server,
//! not embedded assets; `/`, `/individual`, and `/world-class` map to fixed
//! filenames and everything else falls through to a plain asset lookup.

use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use std::path::{Component, Path};
use std::sync::Arc;

use super::api::ApiState;

/// Filename behind `/`
pub const UNIFIED_PAGE: &str = "unified-monitor.html";
/// Filename behind `/individual`
pub const INDIVIDUAL_PAGE: &str = "individual-agent-monitor.html";
/// Filename behind `/world-class`
pub const WORLD_CLASS_PAGE: &str = "world-class-index.html";

/// Reject anything that could escape the serving directory.
fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Serve one file from the serving directory
fn serve_file(serve_dir: &Path, name: &str, missing_message: &str) -> Response<Body> {
    if !is_safe_relative(name) {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Body::from("Invalid path"))
            .unwrap_or_default();
    }

    let path = serve_dir.join(name);
    match std::fs::read(&path) {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
                .body(Body::from(content))
                .unwrap_or_default()
        }
        Err(e) => {
            tracing::debug!("Static file {:?} not served: {}", path, e);
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::from(missing_message.to_string()))
                .unwrap_or_default()
        }
    }
}

/// Handler for `/`: the unified monitor page
pub async fn unified(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    serve_file(
        &state.settings.web.serve_dir,
        UNIFIED_PAGE,
        "Unified monitor not found",
    )
}

/// Handler for `/individual`: the per-agent monitor page
pub async fn individual(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    serve_file(
        &state.settings.web.serve_dir,
        INDIVIDUAL_PAGE,
        "Individual agent monitor not found",
    )
}

/// Handler for `/world-class`: the world-class monitor page
pub async fn world_class(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    serve_file(
        &state.settings.web.serve_dir,
        WORLD_CLASS_PAGE,
        "World-class monitor not found",
    )
}

/// Handler for any other static asset under the serving directory
pub async fn asset(
    State(state): State<Arc<ApiState>>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    serve_file(&state.settings.web.serve_dir, &path, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative("index.html"));
        assert!(is_safe_relative("assets/app.js"));
        assert!(!is_safe_relative("../secrets"));
        assert!(!is_safe_relative("a/../../b"));
        assert!(!is_safe_relative("/etc/passwd"));
    }

    #[test]
    fn test_serve_file_missing_is_404_with_message() {
        let tmp = tempfile::TempDir::new().unwrap();
        let response = serve_file(tmp.path(), UNIFIED_PAGE, "Unified monitor not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_serve_file_sets_content_type() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("page.html"), "<html></html>").unwrap();
        let response = serve_file(tmp.path(), "page.html", "missing");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, "text/html");
    }
}
