//! Wire types for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schemars::JsonSchema;
use thiserror::Error;

use crate::{prelude::*, recognizer::RecognizeError};

/// Body of a `POST /ocr` request.
///
/// Unknown fields are ignored.
#[derive(Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecognizeRequest {
    /// Path of the image to OCR, on the server's filesystem. Relative paths
    /// are resolved against the server's working directory.
    pub image_path: String,
}

/// Body of a successful `POST /ocr` response.
#[derive(Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RecognizeResponse {
    /// All recognized text, concatenated, with spaces removed.
    pub text: String,
}

/// Body of any failed request.
#[derive(Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ErrorResponse {
    /// A human-readable description of what went wrong.
    pub error: String,
}

/// Everything that can go wrong while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body was not JSON, or had no string `image_path`.
    #[error("Invalid request payload")]
    InvalidPayload,

    /// Nothing exists at the requested path.
    #[error("Image file not found at: {0}")]
    ImageNotFound(String),

    /// The OCR engine failed.
    #[error("Error processing image: {0}")]
    Processing(#[from] RecognizeError),
}

impl ApiError {
    /// The HTTP status we report for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload => StatusCode::BAD_REQUEST,
            ApiError::ImageNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
