//! Service host binary.
//!
//! Loads the configuration, starts the host with the built-in status handler
//! and blocks until a termination signal has shut it down.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use service_host::config::load_config;
use service_host::http::StatusHandlerProvider;
use service_host::observability::{logging, metrics};
use service_host::plugin::HandlerProvider;
use service_host::{Server, ServerConfig, ServiceLocator};

#[derive(Parser, Debug)]
#[command(name = "service-host", version, about = "Pluggable HTTP(S) service host")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/server.toml")]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("service-host: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if let Err(e) = logging::init(level, &config.log_format) {
        eprintln!("service-host: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.io_threads)
        .max_blocking_threads(config.worker_threads)
        .thread_name("service-host")
        .enable_all()
        .build();

    let runtime = match runtime {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(config))
}

async fn run(config: ServerConfig) -> ExitCode {
    if let Some(address) = &config.metrics_address {
        match address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(metrics_address = %address, error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address"),
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service_id = %config.service_id,
        http = config.enable_http,
        https = config.enable_https,
        registry = config.enable_registry,
        "service-host starting"
    );

    let plugins = ServiceLocator::new()
        .with::<dyn HandlerProvider>(Arc::new(StatusHandlerProvider));

    let server = Server::builder(config).plugins(plugins).build();

    if let Err(e) = server.start().await {
        tracing::error!(error = %e, "Unable to start server");
        return ExitCode::FAILURE;
    }

    server.wait().await;
    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
