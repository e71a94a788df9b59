mod runner;

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_METRICS_PATH: &str = "metrics.jsonl";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runner=info,sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = env::var_os("EVO_CONFIG").map(PathBuf::from);
    let metrics_path = env::var_os("EVO_METRICS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_METRICS_PATH));
    let checkpoint_path = env::var_os("EVO_CHECKPOINT").map(PathBuf::from);

    tracing::info!("Starting fortress evolution runner");

    let config = runner::load_config(config_path.as_deref())?;
    let runner = runner::Runner::new(config, metrics_path, checkpoint_path);
    runner.run()?;

    Ok(())
}
