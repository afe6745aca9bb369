use anyhow::Result;
use facegated::{init, server, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("facegated starting");

    let config = Config::load()?;
    tracing::info!(
        strategy = %config.strategy,
        golden = %config.golden_image_path().display(),
        models = %config.model_dir.display(),
        "configuration loaded"
    );

    let analyzer = init::load_analyzer(&config);
    let engine = init::start_engine(&config, analyzer)?;

    server::serve(&config, engine).await
}
