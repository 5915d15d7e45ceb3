// src/main.rs
use anyhow::Result as AnyhowResult;
use dotenvy::dotenv;
use ethers::providers::{Http, Provider};
use staking_dashboard::chain::{AutoPoolReader, ChainReader, RpcChain};
use staking_dashboard::config::Config;
use staking_dashboard::dashboard::Dashboard;
use staking_dashboard::server;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let provider = Arc::new(Provider::<Http>::try_from(config.rpc_url.as_str())?);
    let chain = Arc::new(RpcChain::new(provider.clone()));
    let pool = Arc::new(AutoPoolReader::new(
        config.pool_address,
        provider,
        config.multicall_address,
    ));

    let chain_id = chain.chain_id().await?;
    info!(
        chain_id,
        pool = ?config.pool_address,
        pool_id = %config.dashboard.pool_id,
        batched = config.multicall_address.is_some(),
        "connected to node"
    );

    let dashboard = Arc::new(Dashboard::new(chain, pool, config.dashboard, chain_id));
    let app = server::router(dashboard);

    let listener = TcpListener::bind(config.bind_address).await?;
    info!(address = %config.bind_address, "serving dashboard");
    axum::serve(listener, app).await?;

    Ok(())
}
