//! facegate-core: face detection, recognition and reference verification.
//!
//! Uses SCRFD for face detection and ArcFace for face recognition,
//! both running via ONNX Runtime for CPU inference. The service talks to
//! them only through [`FaceAnalyzer`] and [`Reference`].

pub mod alignment;
pub mod analyzer;
pub mod detector;
pub mod frame;
pub mod recognizer;
pub mod reference;
pub mod types;

use std::path::PathBuf;

pub use analyzer::{AnalyzerError, FaceAnalyzer, OnnxAnalyzer, UnavailableAnalyzer};
pub use frame::{FrameError, RgbFrame};
pub use reference::{CachedReference, RedetectReference, Reference, Strategy, Verdict, VerifyError};
pub use types::{BoundingBox, CosineMatcher, Embedding, MatchResult};

/// Default location of the ONNX model files:
/// `$XDG_DATA_HOME/facegate/models`, falling back to `~/.local/share/facegate/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facegate")
        .join("models")
}
