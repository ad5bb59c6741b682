use anyhow::Result;
use helios::{Config, Controller, PassOutcome};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    helios::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Helios {} ({}) starting",
        env!("APP_VERSION"),
        env!("APP_GIT_SHA")
    );

    if !config.enabled {
        info!("Controller disabled in configuration, exiting");
        return Ok(());
    }

    let controller = Controller::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create controller: {}", e))?;

    info!("Starting checks with policy {}", controller.policy_name());
    match controller.run_once().await {
        PassOutcome::Aborted(reason) => {
            error!("Pass aborted: {}", reason);
            Err(anyhow::anyhow!("Pass aborted: {}", reason))
        }
        outcome => {
            info!("Pass finished: {:?}", outcome);
            Ok(())
        }
    }
}
