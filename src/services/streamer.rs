use crate::error::AppError;
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::Path;
use tokio_util::io::ReaderStream;

/// RFC-1123 as required for HTTP `Last-Modified`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Stream a file from disk as a binary download.
///
/// Emits the full legacy header set the original relay sent, including an
/// explicit `Content-Length` taken from file metadata. A missing file is
/// `ResultMissing` (a bare 404) and no streaming headers are emitted.
pub async fn stream_file(path: &Path, download_name: &str) -> Result<Response, AppError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::ResultMissing),
        Err(e) => return Err(AppError::Io(e)),
    };

    let size = metadata.len();
    let last_modified: DateTime<Utc> = metadata.modified()?.into();

    let file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::ResultMissing),
        Err(e) => return Err(AppError::Io(e)),
    };

    let body = Body::from_stream(ReaderStream::new(file));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Description", "File Transfer")
        .header(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
        .header(header::CACHE_CONTROL, "public, must-revalidate, max-age=0")
        .header(header::PRAGMA, "no-cache")
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename={download_name}"),
        )
        .header("Content-Transfer-Encoding", "binary")
        .header(
            header::LAST_MODIFIED,
            last_modified.format(HTTP_DATE_FORMAT).to_string(),
        )
        .header(header::CONNECTION, "close")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
