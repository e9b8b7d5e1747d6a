//! HTTP handler for static file serving.

use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::AppState;

/// Serve a file from the static directory, `/` meaning `index.html`.
///
/// Paths that would leave the directory, and files that cannot be read, are answered with
/// `404 Not Found`.
#[instrument(skip(state))]
pub async fn serve_static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.config.static_dir, uri.path()) else {
        debug!("Rejected static path");
        return not_found();
    };

    match tokio::fs::read(&path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            let content_type = if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
                format!("{mime}; charset=utf-8")
            } else {
                mime.to_string()
            };

            ([(header::CONTENT_TYPE, content_type)], Body::from(content)).into_response()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Static file not served");
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Map a request path onto `root`. Returns `None` for anything but plain relative segments.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    let relative = if relative.is_empty() { "index.html" } else { relative };

    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            _ => return None,
        }
    }
    Some(path)
}
