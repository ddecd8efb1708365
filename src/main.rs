use anyhow::Context;
use circlesplit::engine::SettlementClock;
use circlesplit::orchestration::{LedgerService, PollerRegistry, SplitExecutor};
use circlesplit::receipt::ScanChain;
use circlesplit::{api, config::Config, EvmRpcSource};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let rpc = Arc::new(
        EvmRpcSource::new(
            config.rpc_url.clone(),
            config.debt_tracker_address.clone(),
            config.circle_score_address.clone(),
            config.request_timeout,
        )
        .context("Failed to build RPC client")?
        .with_confirmation_timeout(config.confirmation_timeout),
    );

    let service = LedgerService::new(
        rpc.clone(),
        rpc.clone(),
        SettlementClock::new(config.settlement_offset_secs),
    );
    let registry = PollerRegistry::new(service, config.poll_interval);
    for user in &config.watch_users {
        registry.watch(user).await;
    }

    let scanner = ScanChain::from_config(&config).context("Failed to build scanner client")?;
    if scanner.is_empty() {
        tracing::warn!("No receipt scanner configured, scans will return the demo receipt");
    }

    let app = api::create_router(api::AppState::new(
        registry,
        SplitExecutor::new(rpc),
        scanner,
    ));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
