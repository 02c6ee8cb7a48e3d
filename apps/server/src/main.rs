//! cf-broker-proxy entry point
//!
//! Reads configuration from the environment (and `.env` when present), builds
//! the Cloud Controller client and broker, then serves until Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use cfbroker_core::{branding, BrokerProxy, CloudControllerClient};
use cfbroker_gateway::{BrokerConfig, BrokerServer};
use tracing::{info, Level};

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{
        fmt::{self, writer::MakeWriterExt},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    // RUST_LOG wins; otherwise info with the workspace crates at debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,cfbroker_core=debug,cfbroker_gateway=debug,cf_broker_proxy=debug")
    });

    let (stdout, guard) = tracing_appender::non_blocking(std::io::stdout());

    let stdout_layer = fmt::layer()
        .with_writer(stdout)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr.with_max_level(Level::ERROR))
        .with_ansi(false)
        .with_line_number(true)
        .with_file(true)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(stderr_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _guard = init_tracing();

    info!("Starting {} {}", branding::DISPLAY_NAME, env!("CARGO_PKG_VERSION"));

    let config = BrokerConfig::from_env().context("invalid configuration")?;
    info!(
        "Cloud Controller: {} (skip_ssl_validation={})",
        config.cloud_controller.api_url, config.cloud_controller.skip_ssl_validation
    );

    let client = CloudControllerClient::new(config.cloud_controller)
        .context("failed to build Cloud Controller client")?;
    let proxy = Arc::new(BrokerProxy::new(Arc::new(client)));

    BrokerServer::new(config.server, proxy, config.credentials)
        .run(shutdown_signal())
        .await
}
