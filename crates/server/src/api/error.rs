//! Mapping of service failures to HTTP responses.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use loudnorm_core::ServiceError;
use serde::Serialize;
use tracing::{error, warn};

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// An error ready to be turned into a response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        if e.is_client_error() {
            Self::bad_request(e.to_string())
        } else {
            Self::internal(e.to_string())
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        // Keeps 413 for bodies over the limit, 400 for everything else.
        Self::new(e.status(), e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "Request failed");
        } else {
            warn!(status = %self.status, detail = %self.detail, "Request rejected");
        }
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}
