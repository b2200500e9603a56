use anyhow::{bail, Context, Result};
use axum::{serve, Router};
use registration_api::core::config::Config;
use registration_api::core::routes::build_router;
use registration_api::core::state::AppState;
use registration_api::core::tracing_init::init_tracing;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

fn main() -> Result<()> {
    // A missing .env file is fine; the real environment may carry everything
    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path).context(format!(
        "Failed to load configuration from '{}'",
        config_path.display()
    ))?;

    init_tracing(&config.logging)?;

    for name in config.missing_credentials() {
        warn!(variable = name, "Table store credential not set, store calls will fail");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        backend = %config.store.backend,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Registration API starting"
    );

    let state = AppState::from_config(config.clone())?;

    let app = build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        ),
    );

    let tcp_handle = match config.server.port {
        Some(port) => Some(spawn_tcp(app.clone(), port).await?),
        None => None,
    };

    let unix_handle = match &config.server.unix_socket {
        Some(path) => Some(spawn_unix(app, path.clone())?),
        None => None,
    };

    info!("HTTP server(s) started, waiting for shutdown signal");

    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => report("TCP", result),
                result = unix => report("Unix socket", result),
            }
        }
        (Some(tcp), None) => report("TCP", tcp.await),
        (None, Some(unix)) => report("Unix socket", unix.await),
        (None, None) => {
            error!("No listeners configured");
            bail!("No listeners configured");
        }
    }

    info!("Shutting down gracefully");

    Ok(())
}

async fn spawn_tcp(app: Router, port: u16) -> Result<JoinHandle<Result<()>>> {
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind TCP listener to {}", addr))?;

    info!(address = %addr, "TCP listener bound");

    Ok(tokio::spawn(async move {
        serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
    }))
}

#[cfg(unix)]
fn spawn_unix(app: Router, path: PathBuf) -> Result<JoinHandle<Result<()>>> {
    use tokio::net::UnixListener;

    if path.exists() {
        std::fs::remove_file(&path).context(format!(
            "Failed to remove existing Unix socket: {}",
            path.display()
        ))?;
    }

    let listener = UnixListener::bind(&path).context(format!(
        "Failed to bind Unix socket listener to {}",
        path.display()
    ))?;

    info!(path = %path.display(), "Unix socket listener bound");

    Ok(tokio::spawn(async move {
        serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Unix socket server error")
    }))
}

#[cfg(not(unix))]
fn spawn_unix(_app: Router, path: PathBuf) -> Result<JoinHandle<Result<()>>> {
    bail!("Unix sockets are not supported on this platform: {}", path.display())
}

fn report(listener: &str, result: Result<Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(listener, error = %e, "Server failed"),
        Err(e) => error!(listener, error = %e, "Server task failed"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
