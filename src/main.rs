//! Task Tracker API server.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `sqlite` (default) | `postgres` | `in_memory`
//! - `DATABASE_URL`: connection URL (default: `sqlite://tasks.db`, required when `STORAGE_MODE=postgres`)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `task_tracker=debug`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `5001`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker::api::{self, AppState};
use task_tracker::config::{LogFormat, ServerConfig, parse_worker_threads};
use task_tracker::infrastructure::{RepositoryConfig, RepositoryFactory};

fn main() {
    dotenvy::dotenv().ok();

    let available_parallelism = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(16);
    let worker_threads = parse_worker_threads(
        std::env::var("WORKER_THREADS").ok().as_deref(),
        available_parallelism,
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if let Some(warning) = &worker_threads.warning {
        eprintln!("{warning}");
    }
    if let Some(threads) = worker_threads.threads {
        builder.worker_threads(threads);
        if worker_threads.warning.is_none() {
            eprintln!("Tokio worker_threads set to: {threads}");
        }
    } else if worker_threads.warning.is_none() {
        eprintln!("Tokio worker_threads: using default (logical CPU count)");
    }

    let runtime = builder.build().expect("Failed to create tokio runtime");
    runtime.block_on(async_main());
}

fn init_tracing(log_format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "task_tracker=debug,tower_http=debug".into());

    let (json_layer, pretty_layer) = match log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();
}

async fn async_main() {
    let server_config = ServerConfig::from_env();
    init_tracing(server_config.log_format);

    tracing::info!("Starting Task Tracker API");

    let repository_config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Configuration error");
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?repository_config.storage_mode,
        "Repository configuration loaded"
    );

    let repository = match RepositoryFactory::new(repository_config).create() {
        Ok(repository) => {
            tracing::info!("Repository initialized successfully");
            repository
        }
        Err(error) => {
            tracing::error!(%error, "Failed to initialize repository");
            std::process::exit(1);
        }
    };

    // Requests retry schema creation, so an unreachable store is not fatal here
    if let Err(error) = repository.ensure_schema().await {
        tracing::warn!(%error, "Could not prepare the tasks table at startup");
    }

    let application = api::router(AppState::new(repository.clone()));

    let address: SocketAddr = match server_config.bind_address().parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, address = %server_config.bind_address(), "Invalid server address");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    let served = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    repository.close().await;
    tracing::info!("Task store closed");

    if let Err(error) = served {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
