use crate::error::AppError;
use crate::services::streamer;
use crate::utils::validation::sanitize_filename;
use axum::{
    extract::{Multipart, State},
    response::Response,
};
use bytes::Bytes;

/// The multipart field the original client writes its photo into.
const UPLOAD_FIELD: &str = "uploadedfile";

#[utoipa::path(
    post,
    path = "/process",
    request_body(content = String, content_type = "multipart/form-data", description = "Image upload in the 'uploadedfile' field"),
    responses(
        (status = 200, description = "Processed image, streamed as an octet-stream download"),
        (status = 400, description = "Missing or invalid 'uploadedfile' field"),
        (status = 404, description = "Worker signalled completion but produced no output"),
        (status = 500, description = "Upload could not be persisted"),
        (status = 504, description = "Worker did not produce a result in time")
    ),
    tag = "relay"
)]
pub async fn process_image(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("unnamed").to_string();
        let filename = sanitize_filename(&original_filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        upload = Some((filename, data));
    }

    let (filename, data) = upload.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{UPLOAD_FIELD}'"))
    })?;

    let job = state.relay.prepare(&filename);
    tracing::info!(
        upload = %job.upload_path.display(),
        token = ?job.token,
        size = data.len(),
        "Received upload"
    );

    state.relay.store_upload(&job, &data).await?;
    state.relay.signal_ready(&job).await?;
    state.relay.await_result(&job).await?;

    tracing::info!(output = %job.output_path.display(), "Worker finished, streaming result");
    streamer::stream_file(&job.output_path, &job.download_name).await
}
