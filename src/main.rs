use std::sync::Arc;

use anyhow::Context;
use tello_link::{Command, Session, SessionConfig, TelemetryLimits};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = SessionConfig::default();

    info!("Tello link starting");
    info!("  device:    {}", config.device_addr);
    info!("  telemetry: {}", config.state_addr);
    info!("  video:     {}", config.video_stream);

    let session = Arc::new(
        Session::start(config)
            .await
            .context("failed to open device sockets")?,
    );

    // Enter SDK mode before anything else reaches the device
    match session.send(&Command::Command).await {
        Ok(response) => info!("SDK mode: {}", response.trim()),
        Err(e) => warn!("Entering SDK mode failed: {}", e),
    }

    match session.send(&Command::QueryBattery).await {
        Ok(level) => info!("Battery: {}%", level.trim()),
        Err(e) => warn!("Battery query failed: {}", e),
    }

    // Spawn telemetry logging task
    let session_clone = session.clone();
    let logger = tokio::spawn(async move {
        let limits = TelemetryLimits::default();
        let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(1000));
        loop {
            ticker.tick().await;
            let Some(state) = session_clone.get_state() else {
                debug!("No telemetry yet");
                continue;
            };

            info!(
                bat = ?state.battery_percent(),
                h = ?state.height_cm(),
                tof = ?state.tof_cm(),
                temp = ?state.temperature_range(),
                "Telemetry"
            );
            for alert in state.alerts(&limits) {
                warn!("{}", alert);
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");

    logger.abort();
    session.close().await;

    if let Err(e) = logger.await {
        if !e.is_cancelled() {
            error!("Telemetry logger failed: {}", e);
        }
    }
    Ok(())
}
