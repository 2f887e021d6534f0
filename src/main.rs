use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use greeter::cli::Cli;
use greeter::config::{resolve_config, ObservabilityConfig};
use greeter::lifecycle::startup;
use greeter::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            // Config never loaded: log with defaults plus whatever the flags asked for.
            let mut observability = ObservabilityConfig::default();
            if let Some(format) = cli.log_format {
                observability.log_format = format;
            }
            if let Err(init) = logging::init_logging(&observability) {
                eprintln!("greeter: failed to initialize logging: {init}");
                eprintln!("greeter: invalid configuration: {e}");
                return ExitCode::FAILURE;
            }
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("greeter: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        cache_address = %config.cache.address,
        static_dir = %config.assets.dir.display(),
        shutdown_secs = config.timeouts.shutdown_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
