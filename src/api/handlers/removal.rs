use crate::api::{errors::ApiError, AppState};
use crate::services::{extension_of, StagedFiles};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovalResponse {
    pub output_url: String,
}

/// Upload an image and get back the URL of its background-free PNG
pub async fn remove_background(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RemovalResponse>, ApiError> {
    // Not a multipart request at all: no file part either
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file part"))?;

    let (filename, data) = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file part"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    if data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let staged = StagedFiles::new(state.store.reserve(&extension_of(&filename)));
    let token = staged.reservation().token;
    tracing::info!(%token, filename = %filename, size = data.len(), "Processing upload");

    if let Err(e) = process_upload(&state, &staged, data).await {
        tracing::error!(%token, filename = %filename, error = %e, "Error processing image");
        // Dropping the guard removes both input and output
        drop(staged);
        return Err(ApiError::internal(format!("Failed to process image. {e}")));
    }

    let output_name = staged.commit();
    let output_url = format!("{}/outputs/{}", base_url(&state, &headers), output_name);
    tracing::info!(%token, %output_url, "Background removed");

    Ok(Json(RemovalResponse { output_url }))
}

/// First file field named `file`, as (client filename, contents)
///
/// A plain text field named `file` carries no filename and is not a file part.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some((filename, data)));
    }
    Ok(None)
}

async fn process_upload(
    state: &AppState,
    staged: &StagedFiles,
    data: Bytes,
) -> crate::Result<()> {
    let reservation = staged.reservation();

    tokio::fs::write(&reservation.input_path, &data)
        .await
        .map_err(|e| crate::GatewayError::file_io_error("save upload", &reservation.input_path, &e))?;

    let png = state.remover.remove(data.to_vec()).await?;

    tokio::fs::write(&reservation.output_path, &png)
        .await
        .map_err(|e| crate::GatewayError::file_io_error("save output", &reservation.output_path, &e))?;

    Ok(())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!(
            "Upload exceeds the maximum request size: {}",
            err.body_text()
        ))
    } else {
        ApiError::bad_request(format!("Failed to parse multipart data: {}", err.body_text()))
    }
}

/// Externally visible base URL, without trailing slash
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(public_url) = &state.config.public_url {
        return public_url.as_str().trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| state.config.bind_addr.to_string(), str::to_string);

    format!("{scheme}://{host}")
}
