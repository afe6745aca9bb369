//! `POST /verify`: compare one uploaded photo against the golden face.

use crate::check::decode_probe;
use crate::engine::EngineError;
use crate::error::{verdict_response, VerifyFailure, VerifyResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use facegate_core::VerifyError;
use std::sync::Arc;

/// Multipart field carrying the probe image.
pub const IMAGE_FIELD: &str = "image";

pub async fn verify(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyResponse>, VerifyFailure> {
    let multipart = multipart.map_err(|rejection| {
        tracing::warn!(error = %rejection, "verify: request is not multipart");
        VerifyFailure::MissingImage
    })?;
    let bytes = read_image_field(multipart).await?;

    if !state.engine.is_ready() {
        tracing::warn!("verify: reference not initialized");
        return Err(VerifyFailure::NotReady);
    }

    let probe = tokio::task::spawn_blocking(move || decode_probe(&bytes))
        .await
        .map_err(|e| VerifyFailure::Internal(e.to_string()))??;
    tracing::info!(width = probe.width, height = probe.height, "verify: image received");

    let verdict = state.engine.verify(probe).await.map_err(|e| {
        if !matches!(e, EngineError::Verify(VerifyError::NotReady)) {
            tracing::error!(error = %e, "verify: unexpected failure");
        }
        VerifyFailure::from(e)
    })?;
    tracing::info!(?verdict, "verify: comparison finished");
    verdict_response(verdict).map(Json)
}

/// Pull the bytes of the `image` file part, skipping any other fields.
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes, VerifyFailure> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if is_image_part(field.name(), field.file_name()) => {
                return field.bytes().await.map_err(|e| {
                    tracing::warn!(error = %e, "verify: could not read image part");
                    VerifyFailure::UndecodableImage
                });
            }
            Ok(Some(_)) => continue,
            Ok(None) => {
                tracing::warn!("verify: no image part in request");
                return Err(VerifyFailure::MissingImage);
            }
            Err(e) => {
                tracing::warn!(error = %e, "verify: malformed multipart body");
                return Err(VerifyFailure::MissingImage);
            }
        }
    }
}

/// Only file parts count as an upload; a plain text field named `image` does not.
fn is_image_part(name: Option<&str>, file_name: Option<&str>) -> bool {
    name == Some(IMAGE_FIELD) && file_name.is_some()
}
