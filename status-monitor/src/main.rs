use status_monitor::config::{AppConfig, LogSettings};
use status_monitor::logging;
use status_monitor::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = logging::init_logging(&LogSettings::from_env())?;

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!(
        status_api_url = %config.status_api_url,
        interval_secs = config.check_interval.as_secs(),
        payload_format = ?config.payload_format,
        notify_on_first_run = config.notify_on_first_run,
        "Starting status monitor v{}",
        env!("CARGO_PKG_VERSION")
    );

    let scheduler = Scheduler::from_config(&config)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            // Keep polling; the process can still be killed externally.
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    scheduler.run(cancel).await;
    Ok(())
}
