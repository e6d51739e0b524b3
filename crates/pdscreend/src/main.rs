//! pdscreen daemon - serves Parkinson's risk predictions over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use pdscreen_common::{load_classifier, DecisionPolicy};
use pdscreend::config::Config;
use pdscreend::network::PredictionMetrics;
use pdscreend::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdscreend")]
#[command(about = "Parkinson's disease risk screening daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (defaults to $PDSCREEN_CONFIG, then /etc/pdscreen/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides [server] bind
    #[arg(long)]
    bind: Option<String>,

    /// Model artifact, overrides [model] path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Write a default config file to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        return Config::save_default(path);
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(model) = args.model {
        config.model.path = model;
    }

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("[BOOT] pdscreend v{} starting", env!("CARGO_PKG_VERSION"));

    let model = load_classifier(&config.model.path).with_context(|| {
        format!(
            "Failed to load model artifact {}",
            config.model.path.display()
        )
    })?;
    let info = model.info();
    info!(
        "[BOOT] Model ready: kind={} version={} probability={}",
        info.kind, info.version, info.supports_probability
    );

    let policy = DecisionPolicy::new(model).with_numeric_threshold(config.policy.numeric_threshold);
    info!(
        "[BOOT] Numeric threshold: {} non-zero features",
        policy.numeric_threshold()
    );

    let metrics = PredictionMetrics::new().context("Failed to register metrics")?;
    server::run(AppState::new(policy, metrics), &config.server).await
}
