//! The golden reference and the two ways of verifying a probe against it.
//!
//! [`RedetectReference`] keeps only the image path and re-runs detection on
//! it for every probe. [`CachedReference`] encodes the image once at startup
//! and keeps the encoding for the life of the process. Both are immutable
//! once built; readiness is fixed at construction.

use crate::analyzer::{AnalyzerError, FaceAnalyzer};
use crate::frame::{FrameError, RgbFrame};
use crate::types::Embedding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Which reference strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Re-detect the reference image on every request.
    Redetect,
    /// Encode the reference once at startup.
    #[default]
    Cached,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Redetect => "redetect",
            Strategy::Cached => "cached",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redetect" => Ok(Strategy::Redetect),
            "cached" => Ok(Strategy::Cached),
            other => Err(format!(
                "unknown strategy {other:?} (expected \"redetect\" or \"cached\")"
            )),
        }
    }
}

/// Domain outcome of one verification. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    NotMatched,
    NoFaceDetected,
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("reference encoding is not available")]
    NotReady,
    #[error("reference image: {0}")]
    ReferenceImage(#[from] FrameError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// A golden reference that probes can be verified against.
pub trait Reference: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Whether verification can be attempted at all.
    fn is_ready(&self) -> bool;

    /// Decide whether the first face in `probe` is the reference person.
    fn verify(
        &self,
        analyzer: &mut dyn FaceAnalyzer,
        probe: &RgbFrame,
    ) -> Result<Verdict, VerifyError>;
}

/// Reference that re-runs detection on the stored image for every probe.
#[derive(Debug, Clone)]
pub struct RedetectReference {
    image_path: PathBuf,
}

impl RedetectReference {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
        }
    }
}

impl Reference for RedetectReference {
    fn strategy(&self) -> Strategy {
        Strategy::Redetect
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn verify(
        &self,
        analyzer: &mut dyn FaceAnalyzer,
        probe: &RgbFrame,
    ) -> Result<Verdict, VerifyError> {
        let Some(probe_face) = analyzer.detect_and_encode(probe)?.into_iter().next() else {
            return Ok(Verdict::NoFaceDetected);
        };

        // Detection is enforced on both sides; an unreadable reference
        // counts as a reference without a face.
        let golden = match RgbFrame::open(&self.image_path) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    path = %self.image_path.display(),
                    error = %e,
                    "reference image unreadable"
                );
                return Ok(Verdict::NoFaceDetected);
            }
        };
        let Some(golden_face) = analyzer.detect_and_encode(&golden)?.into_iter().next() else {
            tracing::warn!(
                path = %self.image_path.display(),
                "no face detected in reference image"
            );
            return Ok(Verdict::NoFaceDetected);
        };

        Ok(decide(analyzer, &probe_face, &golden_face))
    }
}

/// Reference holding one encoding computed at startup.
#[derive(Debug, Clone)]
pub struct CachedReference {
    encoding: Option<Embedding>,
}

impl CachedReference {
    pub fn new(encoding: Option<Embedding>) -> Self {
        Self { encoding }
    }
}

impl Reference for CachedReference {
    fn strategy(&self) -> Strategy {
        Strategy::Cached
    }

    fn is_ready(&self) -> bool {
        self.encoding.is_some()
    }

    fn verify(
        &self,
        analyzer: &mut dyn FaceAnalyzer,
        probe: &RgbFrame,
    ) -> Result<Verdict, VerifyError> {
        let golden = self.encoding.as_ref().ok_or(VerifyError::NotReady)?;
        let Some(probe_face) = analyzer.detect_and_encode(probe)?.into_iter().next() else {
            return Ok(Verdict::NoFaceDetected);
        };
        Ok(decide(analyzer, &probe_face, golden))
    }
}

fn decide(analyzer: &dyn FaceAnalyzer, probe: &Embedding, golden: &Embedding) -> Verdict {
    if analyzer.same_identity(probe, golden) {
        Verdict::Matched
    } else {
        Verdict::NotMatched
    }
}

/// Build the reference for `strategy` from the golden image at `golden_path`.
///
/// Never fails: problems are logged and produce a degraded reference
/// (a cached reference without an encoding, or a re-detect reference whose
/// requests will report the underlying error).
pub fn initialize(
    strategy: Strategy,
    golden_path: &Path,
    analyzer: &mut dyn FaceAnalyzer,
) -> Arc<dyn Reference> {
    if golden_path.exists() {
        tracing::info!(path = %golden_path.display(), "found golden image");
    } else {
        tracing::error!(path = %golden_path.display(), "golden image not found");
    }

    let encodings = RgbFrame::open(golden_path)
        .map_err(VerifyError::from)
        .and_then(|frame| Ok(analyzer.detect_and_encode(&frame)?));

    match strategy {
        Strategy::Redetect => {
            match &encodings {
                Ok(faces) if !faces.is_empty() => {
                    tracing::info!(faces = faces.len(), "golden image is valid and ready");
                }
                Ok(_) => tracing::warn!("analyzer warmed up, but no face found in golden image"),
                Err(e) => tracing::error!(error = %e, "golden image warm-up failed"),
            }
            Arc::new(RedetectReference::new(golden_path))
        }
        Strategy::Cached => {
            let encoding = match encodings {
                Ok(faces) => {
                    let first = faces.into_iter().next();
                    match &first {
                        Some(e) => tracing::info!(dim = e.dim(), "golden encoding cached"),
                        None => tracing::error!("no face in golden image; verification disabled"),
                    }
                    first
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "failed to encode golden image; verification disabled"
                    );
                    None
                }
            };
            Arc::new(CachedReference::new(encoding))
        }
    }
}
