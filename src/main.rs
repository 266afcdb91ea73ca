//! Request Router devnet
//!
//! Runs the router against an in-memory ledger seeded from configuration and
//! lets a keeper sweep pending requests every block until shutdown.

use alloy_primitives::U256;
use anyhow::Result;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use request_router::config::DevnetConfig;
use request_router::ledger::{MemoryLedger, MemoryMarket};
use request_router::{
    metrics, Context, Keeper, MintRequest, RequestRouter, Settings, StaticAuthority,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Request Router v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    let devnet = settings
        .devnet
        .clone()
        .ok_or_else(|| anyhow::anyhow!("The [devnet] section is required to run locally"))?;
    info!(
        "Loaded configuration with {} executors and {} markets",
        settings.access.executors.len(),
        devnet.markets.len()
    );

    let mut router = RequestRouter::new(
        settings.router.address,
        settings.router.stable_token,
        settings.router_config()?,
        StaticAuthority::new(settings.access.governors.iter().copied()),
    );
    let mut ledger = seed_ledger(&settings, &devnet);
    let mut keeper = Keeper::new(settings.keeper.executor, settings.keeper.fee_receiver);
    let gas_price = U256::from(devnet.gas_price);
    let mut height: u64 = 1;

    for mint in &devnet.mints {
        let request = MintRequest::mint(
            mint.account,
            mint.market,
            U256::from(mint.amount),
            mint.account,
            U256::from(mint.execution_fee),
        );
        let ctx = Context::new(mint.account, height, gas_price).with_value(request.execution_fee);
        if let Err(e) = router.submit_mint(&mut ledger, &ctx, request, None) {
            warn!("Seed mint for {} rejected: {}", mint.account, e);
        }
    }

    info!("Request Router is running");

    let mut block_interval = interval(Duration::from_millis(settings.keeper.poll_interval_ms));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = block_interval.tick() => {
                for event in router.take_events() {
                    info!("Event {}: {}", event.name(), serde_json::to_string(&event)?);
                    keeper.observe(&event);
                }

                height += 1;
                let report = keeper.sweep(&mut router, &mut ledger, height, gas_price);
                if report.failed > 0 {
                    error!("Keeper sweep at height {} had {} failures", height, report.failed);
                }
            }

            _ = &mut shutdown => break,
        }
    }

    info!("Shutdown signal received, stopping...");
    info!("Final metrics:\n{}", metrics::gather());
    info!(
        "Request Router stopped at height {} with {} pending requests",
        height,
        router.store().len()
    );
    Ok(())
}

fn seed_ledger(settings: &Settings, devnet: &DevnetConfig) -> MemoryLedger {
    let mut ledger = MemoryLedger::new(
        settings.router.wrapped_native,
        settings.router.stable_token,
        devnet.engine,
    );

    for market in &devnet.markets {
        ledger.add_market(market.asset, MemoryMarket::new(market.share_token));
    }

    for balance in &devnet.balances {
        let amount = U256::from(balance.amount);
        match balance.token {
            Some(token) => {
                ledger.mint_token(token, balance.account, amount);
                ledger.approve(token, balance.account, settings.router.address, U256::MAX);
            }
            None => ledger.fund_native(balance.account, amount),
        }
    }

    ledger
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,request_router=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
