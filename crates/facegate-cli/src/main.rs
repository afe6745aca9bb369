use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_core::{reference, FaceAnalyzer, Reference, RgbFrame};
use facegated::{check, init, Config, VerifyFailure, VerifyResponse};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "facegate", about = "Check photos against the facegate golden face")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one photo against the golden image, as POST /verify would
    Check {
        /// Photo to verify
        image: PathBuf,
    },
    /// Print the face encodings found in a photo as JSON
    Encode {
        /// Photo to encode
        image: PathBuf,
    },
}

#[derive(Serialize)]
struct EncodedFace {
    dim: usize,
    values: Vec<f32>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Check { image } => check(&config, &image),
        Commands::Encode { image } => encode(&config, &image),
    }
}

fn check(config: &Config, image: &Path) -> Result<ExitCode> {
    let mut analyzer = init::load_analyzer(config);
    let golden = reference::initialize(
        config.strategy,
        &config.golden_image_path(),
        analyzer.as_mut(),
    );

    let response = check_file(golden.as_ref(), analyzer.as_mut(), image);
    println!("{}", serde_json::to_string(&response)?);
    Ok(if response == VerifyResponse::success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify the photo at `image`, answering exactly as `POST /verify` would.
fn check_file(
    golden: &dyn Reference,
    analyzer: &mut dyn FaceAnalyzer,
    image: &Path,
) -> VerifyResponse {
    let bytes = match std::fs::read(image) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %image.display(), error = %e, "could not read image");
            return VerifyFailure::MissingImage.into();
        }
    };
    check::check_image(golden, analyzer, &bytes).unwrap_or_else(VerifyResponse::from)
}

fn encode(config: &Config, image: &Path) -> Result<ExitCode> {
    let mut analyzer = init::load_analyzer(config);
    let frame = RgbFrame::open(image).with_context(|| format!("decoding {}", image.display()))?;
    let faces: Vec<EncodedFace> = analyzer
        .detect_and_encode(&frame)?
        .into_iter()
        .map(|e| EncodedFace {
            dim: e.dim(),
            values: e.values,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&faces)?);
    Ok(if faces.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
