use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::DeviceService;
use device_service::{build_publisher, parse_params, service_settings, watch_async_objects};
use infrastructure::{FileMetadataStore, ServiceConfig, SimulatorConfig, SimulatorDriver};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long)]
    config_dir: Option<String>,

    /// Override the metadata file
    #[arg(long)]
    metadata: Option<String>,

    /// Override MQTT Host
    #[arg(long)]
    mqtt_host: Option<String>,

    /// Override MQTT Port
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// Run one command against this device (id or name) and exit
    #[arg(long, requires = "command")]
    device: Option<String>,

    /// Command to run with --device
    #[arg(long, requires = "device")]
    command: Option<String>,

    /// NAME=VALUE parameter; turns the one-shot command into a write
    #[arg(long = "param", requires = "command")]
    params: Vec<String>,
}

async fn run() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,device_service=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Running from the workspace root picks up the crate's sample config
    let config_dir = args.config_dir.clone().unwrap_or_else(|| {
        let dev_dir = "crates/device-service/config";
        if std::path::Path::new(dev_dir).exists() {
            dev_dir.to_string()
        } else {
            "config".to_string()
        }
    });
    info!(config_dir = %config_dir, pid = std::process::id(), "Device service starting");

    let mut config = ServiceConfig::load(&config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir))?;
    if let Some(path) = args.metadata {
        config.metadata.path = path;
    }
    if let Some(mqtt) = config.mqtt.as_mut() {
        if let Some(host) = args.mqtt_host {
            mqtt.host = host;
        }
        if let Some(port) = args.mqtt_port {
            mqtt.port = port;
        }
    }

    let metadata = Arc::new(FileMetadataStore::load(&config.metadata.path).await?);
    let driver = Arc::new(SimulatorDriver::new(SimulatorConfig {
        async_interval_ms: config.simulator.async_interval_ms,
    }));
    let service = DeviceService::new(
        service_settings(&config),
        driver.clone(),
        build_publisher(&config),
        metadata,
    );

    service
        .start()
        .await
        .context("Failed to start device service")?;
    let watched = watch_async_objects(&service, &driver).await;
    info!(service = %service.name(), watched, "Ready");

    if let (Some(device), Some(command)) = (args.device, args.command) {
        let result = one_shot(&service, &device, &command, &args.params).await;
        service.stop(false).await;
        return result;
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
    }
    service.stop(false).await;
    Ok(())
}

async fn one_shot(
    service: &DeviceService,
    device: &str,
    command: &str,
    params: &[String],
) -> Result<()> {
    if params.is_empty() {
        let outcome = service.execute_get(device, command).await?;
        if !outcome.transforms_ok {
            warn!(device = %device, command = %command, "Some readings were dropped");
        }
        println!("{}", serde_json::to_string_pretty(&outcome.event)?);
    } else {
        let params = parse_params(params)?;
        service.execute_put(device, command, &params).await?;
        info!(device = %device, command = %command, "Write accepted");
    }
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run()) {
        eprintln!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}
