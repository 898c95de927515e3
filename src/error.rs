use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    // Legacy wording kept verbatim so existing clients can match on it.
    #[error("There was an error uploading the file to {dest} !")]
    UploadFailed { dest: String },

    #[error("Timed out waiting for the worker to produce a result")]
    WorkerTimeout,

    #[error("Processed file not found")]
    ResultMissing,

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UploadFailed { .. } => {
                let msg = self.to_string();
                tracing::error!("{}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::WorkerTimeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            // The original contract: missing result is a bare 404 with no body.
            AppError::ResultMissing => return StatusCode::NOT_FOUND.into_response(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
