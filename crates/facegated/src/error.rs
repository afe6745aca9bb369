use crate::engine::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use facegate_core::{Verdict, VerifyError};
use serde::{Deserialize, Serialize};

/// Top-level verdict carried in every `/verify` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    Success,
    Failure,
}

/// `/verify` response body: `{"status": ..., "error"?: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: VerifyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    pub fn success() -> Self {
        Self {
            status: VerifyStatus::Success,
            error: None,
        }
    }

    /// The faces were compared and did not match.
    pub fn mismatch() -> Self {
        Self {
            status: VerifyStatus::Failure,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: VerifyStatus::Failure,
            error: Some(error.into()),
        }
    }
}

/// Every way `/verify` can fail, with the message the client sees.
#[derive(Debug, thiserror::Error)]
pub enum VerifyFailure {
    #[error("No image file found")]
    MissingImage,

    #[error("Could not process image")]
    UndecodableImage,

    #[error("Server not ready")]
    NotReady,

    #[error("No face detected")]
    NoFaceDetected,

    #[error("{0}")]
    Internal(String),
}

impl VerifyFailure {
    /// Client input problems are 400 and readiness is 500. Domain and
    /// unexpected failures still answer 200 with a failure body.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerifyFailure::MissingImage | VerifyFailure::UndecodableImage => {
                StatusCode::BAD_REQUEST
            }
            VerifyFailure::NotReady => StatusCode::INTERNAL_SERVER_ERROR,
            VerifyFailure::NoFaceDetected | VerifyFailure::Internal(_) => StatusCode::OK,
        }
    }
}

impl From<VerifyError> for VerifyFailure {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotReady => VerifyFailure::NotReady,
            other => VerifyFailure::Internal(other.to_string()),
        }
    }
}

impl From<EngineError> for VerifyFailure {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Verify(e) => e.into(),
            other => VerifyFailure::Internal(other.to_string()),
        }
    }
}

impl From<VerifyFailure> for VerifyResponse {
    fn from(failure: VerifyFailure) -> Self {
        VerifyResponse::failure(failure.to_string())
    }
}

impl IntoResponse for VerifyFailure {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(VerifyResponse::from(self))).into_response()
    }
}

/// The `/verify` answer for a completed comparison.
pub fn verdict_response(verdict: Verdict) -> Result<VerifyResponse, VerifyFailure> {
    match verdict {
        Verdict::Matched => Ok(VerifyResponse::success()),
        Verdict::NotMatched => Ok(VerifyResponse::mismatch()),
        Verdict::NoFaceDetected => Err(VerifyFailure::NoFaceDetected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_body_has_no_error_key() {
        let body = serde_json::to_string(&VerifyResponse::success()).unwrap();
        assert_eq!(body, r#"{"status":"success"}"#);
    }

    #[test]
    fn test_mismatch_body() {
        let body = serde_json::to_string(&VerifyResponse::mismatch()).unwrap();
        assert_eq!(body, r#"{"status":"failure"}"#);
    }

    #[test]
    fn test_failure_body() {
        let body = serde_json::to_string(&VerifyResponse::failure("No face detected")).unwrap();
        assert_eq!(body, r#"{"status":"failure","error":"No face detected"}"#);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(VerifyFailure::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(VerifyFailure::UndecodableImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(VerifyFailure::NotReady.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(VerifyFailure::NoFaceDetected.status_code(), StatusCode::OK);
        assert_eq!(VerifyFailure::Internal("boom".into()).status_code(), StatusCode::OK);
    }

    #[test]
    fn test_internal_message_is_verbatim() {
        let failure = VerifyFailure::Internal("reference image: io".into());
        assert_eq!(failure.to_string(), "reference image: io");
    }

    #[test]
    fn test_verdict_response() {
        assert_eq!(verdict_response(Verdict::Matched).unwrap(), VerifyResponse::success());
        assert_eq!(verdict_response(Verdict::NotMatched).unwrap(), VerifyResponse::mismatch());
        assert!(matches!(
            verdict_response(Verdict::NoFaceDetected),
            Err(VerifyFailure::NoFaceDetected)
        ));
    }

    #[test]
    fn test_not_ready_survives_engine_wrapping() {
        let failure = VerifyFailure::from(EngineError::Verify(VerifyError::NotReady));
        assert!(matches!(failure, VerifyFailure::NotReady));
        assert_eq!(failure.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_other_engine_errors_keep_their_message() {
        let failure = VerifyFailure::from(EngineError::Panicked("bad tensor".into()));
        assert_eq!(
            VerifyResponse::from(failure),
            VerifyResponse::failure("face analysis panicked: bad tensor")
        );
    }
}
