//! driveway-monitor binary.

use clap::Parser;
use tracing::{error, info};

use dmon_worker::{app, logging, Args, Config};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    // Load environment variables before parsing so .env can set DMON_CONFIG
    dotenvy::dotenv().ok();

    let args = Args::parse();
    logging::init(args.debug);

    info!("Starting driveway-monitor");

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app::run(args, config).await {
        error!("driveway-monitor failed: {}", e);
        std::process::exit(1);
    }
}
