use crate::engine::EngineHandle;
use std::path::PathBuf;

/// Shared application state, built once at startup.
pub struct AppState {
    pub engine: EngineHandle,
    /// Directory holding the two HTML pages.
    pub templates_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: EngineHandle, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            templates_dir: templates_dir.into(),
        }
    }
}
