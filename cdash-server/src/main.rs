//! # cdash Binary
//!
//! Wire configuration, the daily store, the sampling loop and the HTTP read
//! surface together, then wait for SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cdash_client::RpcClient;
use cdash_engine::{KVStore, SledStore};
use cdash_server::{
    serve, Accumulator, Cli, Config, HttpState, LatestValue, Metrics, RpcSampler, SystemClock,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(cli).context("invalid configuration")?;
    init_tracing(config.log_filter.as_deref());

    info!("starting dashboard");
    let store = Arc::new(
        SledStore::open(&config.db_path)
            .with_context(|| format!("open db at {}", config.db_path.display()))?,
    );

    let client = RpcClient::with_config(config.client.clone()).context("build rpc client")?;
    let latest = LatestValue::new();
    let metrics = Arc::new(Metrics::new());
    let cancel = CancellationToken::new();

    let accumulator = Accumulator::new(
        RpcSampler::new(client),
        Arc::clone(&store),
        SystemClock,
        latest.clone(),
        Arc::clone(&metrics),
        config.endpoints.clone(),
        config.accumulator.clone(),
    );
    let sampling = accumulator.spawn(cancel.clone());

    let state = HttpState {
        store: Arc::clone(&store),
        latest,
        metrics,
        started_at: Instant::now(),
    };
    let shutdown = {
        let cancel = cancel.clone();
        async move {
            wait_for_signal().await;
            cancel.cancel();
        }
    };

    let served = serve(config.listen, state, shutdown).await;
    // Stop sampling even when the listener failed to bind.
    cancel.cancel();
    if let Err(err) = sampling.await {
        warn!(error = %err, "sampling task ended abnormally");
    }
    if let Err(err) = store.flush() {
        error!(error = %err, "final flush failed");
    }
    info!("dashboard stopped");

    served.context("http server")?;
    Ok(())
}

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => info!("received interrupt"),
        _ = terminate => info!("received terminate"),
    }
}
