use facegate_core::Strategy;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid bind address {0:?}")]
    Address(String),
}

/// Daemon configuration.
///
/// Built from defaults, then an optional TOML file named by `FACEGATE_CONFIG`,
/// then `FACEGATE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Interface to bind (default: 127.0.0.1).
    pub host: String,
    /// TCP port (default: 5000).
    pub port: u16,
    /// Directory holding the golden image (default: face_data).
    pub face_data_dir: PathBuf,
    /// Golden image path. Defaults to `<face_data_dir>/golden.jpg`.
    pub golden_image: Option<PathBuf>,
    /// Directory holding index.html and taunting.html (default: templates).
    pub templates_dir: PathBuf,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Reference strategy: "cached" (encode once) or "redetect" (every request).
    pub strategy: Strategy,
    /// Cosine similarity threshold for a positive match.
    pub similarity_threshold: f32,
    /// Maximum accepted upload size in MiB.
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            face_data_dir: PathBuf::from("face_data"),
            golden_image: None,
            templates_dir: PathBuf::from("templates"),
            model_dir: facegate_core::default_model_dir(),
            strategy: Strategy::default(),
            similarity_threshold: facegate_core::analyzer::DEFAULT_SIMILARITY_THRESHOLD,
            max_upload_mb: 16,
        }
    }
}

impl Config {
    /// Load configuration from the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("FACEGATE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `FACEGATE_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FACEGATE_HOST") {
            self.host = v;
        }
        override_parsed(&lookup, "FACEGATE_PORT", &mut self.port);
        if let Some(v) = lookup("FACEGATE_FACE_DATA_DIR") {
            self.face_data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FACEGATE_GOLDEN_IMAGE") {
            self.golden_image = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FACEGATE_TEMPLATES_DIR") {
            self.templates_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FACEGATE_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        override_parsed(&lookup, "FACEGATE_STRATEGY", &mut self.strategy);
        override_parsed(&lookup, "FACEGATE_SIMILARITY_THRESHOLD", &mut self.similarity_threshold);
        override_parsed(&lookup, "FACEGATE_MAX_UPLOAD_MB", &mut self.max_upload_mb);
    }

    /// Path of the golden reference image.
    pub fn golden_image_path(&self) -> PathBuf {
        self.golden_image
            .clone()
            .unwrap_or_else(|| self.face_data_dir.join("golden.jpg"))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::Address(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable config override"),
    }
}
