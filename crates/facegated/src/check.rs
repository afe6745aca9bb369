//! The steps of one verification that do not depend on HTTP, shared by
//! `POST /verify` and `facegate check`.

use crate::error::{verdict_response, VerifyFailure, VerifyResponse};
use facegate_core::{FaceAnalyzer, Reference, RgbFrame};

/// Decode an uploaded image, mapping any failure to "Could not process image".
pub fn decode_probe(bytes: &[u8]) -> Result<RgbFrame, VerifyFailure> {
    RgbFrame::decode(bytes).map_err(|e| {
        tracing::warn!(error = %e, size = bytes.len(), "could not decode image");
        VerifyFailure::UndecodableImage
    })
}

/// Verify encoded image bytes in-process.
///
/// Readiness is checked before the bytes are decoded, as `POST /verify` does.
pub fn check_image(
    reference: &dyn Reference,
    analyzer: &mut dyn FaceAnalyzer,
    bytes: &[u8],
) -> Result<VerifyResponse, VerifyFailure> {
    if !reference.is_ready() {
        return Err(VerifyFailure::NotReady);
    }
    let probe = decode_probe(bytes)?;
    let verdict = reference.verify(analyzer, &probe)?;
    verdict_response(verdict)
}
