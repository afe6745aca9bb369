//! The face-analysis capability behind verification.
//!
//! Callers only see two operations: detect-and-encode every face in a frame,
//! and decide whether two encodings belong to the same identity. The ONNX
//! implementation chains SCRFD detection with ArcFace extraction.

use crate::detector::{DetectorError, FaceDetector};
use crate::frame::RgbFrame;
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{CosineMatcher, Embedding};
use std::path::Path;
use thiserror::Error;

/// Cosine similarity at or above which two ArcFace embeddings are the same person.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.40;

pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("face analyzer unavailable: {0}")]
    Unavailable(String),
}

/// Detect-and-encode plus same-identity decision.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self` on the encoding call.
pub trait FaceAnalyzer: Send {
    /// Encode every face found in `frame`, most confident first.
    /// An empty vector means no face was detected.
    fn detect_and_encode(&mut self, frame: &RgbFrame) -> Result<Vec<Embedding>, AnalyzerError>;

    /// Whether two encodings belong to the same person.
    fn same_identity(&self, probe: &Embedding, reference: &Embedding) -> bool;

    /// False when this analyzer is a stand-in for one that failed to load.
    fn is_loaded(&self) -> bool {
        true
    }
}

/// SCRFD + ArcFace analyzer running on ONNX Runtime.
pub struct OnnxAnalyzer {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
    matcher: CosineMatcher,
}

impl OnnxAnalyzer {
    /// Load both models from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, AnalyzerError> {
        let detector = FaceDetector::load(&model_dir.join(SCRFD_MODEL_FILE))?;
        let recognizer = FaceRecognizer::load(&model_dir.join(ARCFACE_MODEL_FILE))?;
        Ok(Self {
            detector,
            recognizer,
            matcher: CosineMatcher::new(DEFAULT_SIMILARITY_THRESHOLD),
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.matcher = CosineMatcher::new(threshold);
        self
    }
}

impl FaceAnalyzer for OnnxAnalyzer {
    fn detect_and_encode(&mut self, frame: &RgbFrame) -> Result<Vec<Embedding>, AnalyzerError> {
        let faces = self.detector.detect(frame)?;
        let mut encodings = Vec::with_capacity(faces.len());
        for face in faces.iter().filter(|f| f.landmarks.is_some()) {
            encodings.push(self.recognizer.extract(frame, face)?);
        }
        tracing::debug!(
            detected = faces.len(),
            encoded = encodings.len(),
            "detect_and_encode"
        );
        Ok(encodings)
    }

    fn same_identity(&self, probe: &Embedding, reference: &Embedding) -> bool {
        let result = self.matcher.compare(probe, reference);
        tracing::debug!(
            similarity = result.similarity,
            threshold = self.matcher.threshold,
            matched = result.matched,
            "compared encodings"
        );
        result.matched
    }
}

/// Stand-in used when the real analyzer could not be loaded.
///
/// Every encoding call fails with the load error, so requests
/// report why the service is degraded instead of crashing it.
#[derive(Debug, Clone)]
pub struct UnavailableAnalyzer {
    reason: String,
}

impl UnavailableAnalyzer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FaceAnalyzer for UnavailableAnalyzer {
    fn detect_and_encode(&mut self, _frame: &RgbFrame) -> Result<Vec<Embedding>, AnalyzerError> {
        Err(AnalyzerError::Unavailable(self.reason.clone()))
    }

    fn same_identity(&self, _probe: &Embedding, _reference: &Embedding) -> bool {
        false
    }

    fn is_loaded(&self) -> bool {
        false
    }
}
