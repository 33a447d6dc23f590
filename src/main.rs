use anyhow::Context;
use batchtrace::collect;
use batchtrace::config::Config;
use batchtrace::logging::{init_logging, LogConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&LogConfig::from(&config));

    if let Err(e) = run(&config).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let results = collect::run(config)
        .await
        .context("Failed to collect experiment results")?;

    info!(
        "Wrote tables for {} experiments to {}",
        results.len(),
        config.results_dir.display()
    );
    Ok(())
}
