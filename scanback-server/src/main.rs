//! # scanback server
//!
//! Serves the authenticated scan trigger over HTTPS (when a certificate and
//! key are configured) or plain HTTP, and runs the background scan worker.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::Router;
use clap::Parser;
use scanback_config::{Config, ConfigLoad, ConfigLoader, TlsConfig};
use scanback_server::{
    AppState,
    infra::{startup::ScanPipeline, tls::load_rustls_config},
    routes::create_app,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grace period for open connections once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "scanback-server")]
#[command(
    about = "Authenticated HTTP trigger that nmap-scans whoever calls it"
)]
struct Cli {
    /// Configuration file (.json/.conf are JSON, anything else TOML)
    #[arg(short, long, env = "SCANBACK_CONFIG")]
    config: Option<PathBuf>,

    /// Environment file loaded before the configuration
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(load_runtime_config(&cli)?);
    run_server(config).await
}

fn load_runtime_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.address = host;
    }

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(config)
}

#[derive(Debug)]
enum ServerMode {
    Https { addr: SocketAddr, tls: TlsConfig },
    Http { addr: SocketAddr },
}

fn determine_server_mode(config: &Config) -> ServerMode {
    let addr = config.server.bind_addr();
    match &config.tls {
        Some(tls) => ServerMode::Https {
            addr,
            tls: tls.clone(),
        },
        None => ServerMode::Http { addr },
    }
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let pipeline = ScanPipeline::start(&config, shutdown.clone()).await?;

    let state = AppState::new(Arc::clone(&config), pipeline.queue.clone());
    let router = create_app(state);

    tokio::spawn(watch_for_shutdown(shutdown.clone()));

    let served = serve(router, determine_server_mode(&config), &shutdown).await;

    // stop the worker even when the listener failed
    shutdown.cancel();
    let report = pipeline.stop().await?;
    info!(
        completed = report.completed,
        failed = report.failed,
        abandoned = report.abandoned,
        "scanback stopped"
    );

    served
}

async fn serve(
    router: Router,
    mode: ServerMode,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let make_service =
        router.into_make_service_with_connect_info::<SocketAddr>();

    match mode {
        ServerMode::Https { addr, tls } => {
            let rustls_config = load_rustls_config(&tls)
                .await
                .context("failed to configure TLS")?;

            let handle = axum_server::Handle::new();
            let signal = shutdown.clone();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                signal.cancelled().await;
                shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            info!("Starting scanback (HTTPS) on {addr}");
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(make_service)
                .await
                .with_context(|| format!("HTTPS server on {addr} failed"))?;
        }
        ServerMode::Http { addr } => {
            warn!(
                "TLS is not configured. Set certFile and keyFile to keep Basic credentials off the wire."
            );
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            info!("Starting scanback (HTTP) on {addr}");
            axum::serve(listener, make_service)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await
                .with_context(|| format!("HTTP server on {addr} failed"))?;
        }
    }

    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown requested");
    shutdown.cancel();
}
