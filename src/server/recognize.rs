//! Handler for `POST /ocr`.

use axum::{Json, body::Bytes, extract::State};
use tokio::fs;

use super::{
    AppState,
    api::{ApiError, RecognizeRequest, RecognizeResponse},
};
use crate::prelude::*;

/// Handler for `POST /ocr`.
///
/// We take the raw body instead of using axum's `Json` extractor, because any
/// malformed body must produce our own 400 response, whatever its
/// `Content-Type`.
pub async fn recognize(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecognizeResponse>, ApiError> {
    info!(payload = %String::from_utf8_lossy(&body), "Received request");

    let request = serde_json::from_slice::<RecognizeRequest>(&body).map_err(|err| {
        warn!(error = %err, "Invalid request payload");
        ApiError::InvalidPayload
    })?;
    let image_path = request.image_path;
    info!(image_path = %image_path, "Resolved image path");

    // Checking and then opening is racy, but the engine reports a vanished
    // file as an ordinary processing error.
    if !matches!(fs::try_exists(&image_path).await, Ok(true)) {
        warn!(image_path = %image_path, "Image file not found");
        return Err(ApiError::ImageNotFound(image_path));
    }

    match state.recognizer.recognize(Path::new(&image_path)).await {
        Ok(text) => {
            info!(text = %text, "Extracted text");
            Ok(Json(RecognizeResponse { text }))
        }
        Err(err) => {
            error!(error = %err, "Error processing image");
            Err(ApiError::Processing(err))
        }
    }
}
