//! One-time startup: check the on-disk layout, load the analyzer, build the
//! golden reference and start the engine. Nothing here aborts the process
//! on a missing file or model; the daemon comes up degraded instead.

use crate::config::Config;
use crate::engine::{spawn_engine, EngineError, EngineHandle};
use facegate_core::{reference, FaceAnalyzer, OnnxAnalyzer, UnavailableAnalyzer};
use std::path::Path;

/// Log an error for every expected directory or file that is missing.
/// Returns the number of problems found.
pub fn check_layout(config: &Config) -> usize {
    let golden = config.golden_image_path();
    let checks: [(&str, &Path, bool); 3] = [
        ("face data directory", &config.face_data_dir, config.face_data_dir.is_dir()),
        ("golden image", &golden, golden.is_file()),
        ("templates directory", &config.templates_dir, config.templates_dir.is_dir()),
    ];

    let mut problems = 0;
    for (what, path, ok) in checks {
        if ok {
            tracing::debug!(path = %path.display(), "{what} present");
        } else {
            tracing::error!(path = %path.display(), "{what} not found");
            problems += 1;
        }
    }
    problems
}

/// Load the ONNX analyzer, or a stand-in that reports why it could not load.
pub fn load_analyzer(config: &Config) -> Box<dyn FaceAnalyzer> {
    tracing::info!(dir = %config.model_dir.display(), "loading face models");
    match OnnxAnalyzer::load(&config.model_dir) {
        Ok(analyzer) => {
            tracing::info!(threshold = config.similarity_threshold, "face models loaded");
            Box::new(analyzer.with_threshold(config.similarity_threshold))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load face models; verification will fail");
            Box::new(UnavailableAnalyzer::new(e.to_string()))
        }
    }
}

/// Build the golden reference with `analyzer` and hand both to the engine thread.
pub fn start_engine(
    config: &Config,
    mut analyzer: Box<dyn FaceAnalyzer>,
) -> Result<EngineHandle, EngineError> {
    let problems = check_layout(config);
    let golden = config.golden_image_path();
    let reference = reference::initialize(config.strategy, &golden, analyzer.as_mut());

    tracing::info!(
        strategy = %reference.strategy(),
        ready = reference.is_ready(),
        layout_problems = problems,
        "initialization complete"
    );

    spawn_engine(analyzer, reference)
}
