//! roomctl - room occupancy and climate controller
//!
//! Infers the occupancy of a room from two doorway proximity sensors and
//! drives an AC unit over infrared according to occupancy thresholds, while
//! reporting state to a remote telemetry endpoint and a local log.
//!
//! Module structure:
//! - `domain/` - Core types (SensorSide, PassageEvent, IrCommand, ClimateTier)
//! - `io/` - External interfaces (ultrasonic bus, IR blaster, MQTT, log file)
//! - `services/` - State machines (DirectionSequencer, ClimateController, RoomController)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use roomctl::infra::{Config, Metrics};
use roomctl::io::{create_telemetry_channel, TelemetryPublisher};
use roomctl::services::RoomController;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Room occupancy and climate controller
#[derive(Parser, Debug)]
#[command(name = "roomctl", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("roomctl starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        sensor_device = %config.sensor_device(),
        ir_device = %config.ir_device(),
        poll_interval_ms = %config.sensor_poll_interval_ms(),
        flush_interval_secs = %config.flush_interval_secs(),
        log_file = %config.log_file(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());

    // Telemetry channel and MQTT publisher
    let (telemetry_sender, telemetry_rx) =
        create_telemetry_channel(1000, config.site_id().to_string());
    let publisher = TelemetryPublisher::new(&config, telemetry_rx);
    let publisher_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        publisher.run(publisher_shutdown).await;
    });

    // Periodic metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run the control loop - it owns all occupancy and climate state
    let mut controller = RoomController::new(&config, metrics, Some(telemetry_sender));
    controller.run(shutdown_rx).await;

    info!("roomctl shutdown complete");
    Ok(())
}
