use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("User not found")]
    UserNotFound,

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReportError::UserNotFound => StatusCode::NOT_FOUND,
            ReportError::Storage(e) => {
                error!("Request failed on storage {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
