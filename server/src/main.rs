mod commands;
mod state;

use std::net::SocketAddr;
use std::process;

use clap::{Arg, Command};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use leadbook::config::{load_config, Config};

use crate::state::AppState;

fn init_tracing() {
    // Route `log` records from the database layer into tracing.
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to install log bridge: {}", e);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    let matches = Command::new("leadbook-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves the leadbook contact ingestion API")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file"),
        )
        .get_matches();

    init_tracing();

    let config = match matches.get_one::<String>("config") {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config from {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = run(config).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = config.listen_address.parse()?;
    info!(
        "Starting leadbook-server v{} (database: {}, uploads: {})",
        env!("CARGO_PKG_VERSION"),
        config.database_path,
        config.upload_directory
    );

    let state = AppState::open(config)?;
    let app = commands::router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
