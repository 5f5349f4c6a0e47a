use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Serve a generated PNG by name
///
/// Errors are plain text. Names are validated before the filesystem is
/// touched, so traversal attempts never reach a path lookup.
pub async fn get_output_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let Some(path) = state.store.output_path_for(&filename) else {
        tracing::debug!(filename = %filename, "Rejected output filename");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "File not found").into_response()
        },
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read output file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
        },
    }
}
