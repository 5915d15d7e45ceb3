use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use ethers::types::{Address, U256};
use serde_json::Value;
use staking_dashboard::chain::{ChainError, ChainReader, StakedPosition, StakingPoolReader};
use staking_dashboard::config::{DashboardSettings, Mode};
use staking_dashboard::dashboard::Dashboard;
use staking_dashboard::server;
use std::sync::Arc;
use tower::ServiceExt;

const WALLET: &str = "0xabababababababababababababababababababab";

struct StaticChain;

#[async_trait]
impl ChainReader for StaticChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(25)
    }

    async fn last_block_number(&self) -> Result<u64, ChainError> {
        Ok(10_500_000)
    }

    async fn native_balance(&self, _address: Address) -> Result<U256, ChainError> {
        // 42.999... CRO truncates to 42.99
        Ok(U256::from_dec_str("42999999999999999999").unwrap())
    }
}

struct StaticPool {
    position: Option<StakedPosition>,
}

#[async_trait]
impl StakingPoolReader for StaticPool {
    async fn staked_position(
        &self,
        _pool_id: U256,
        _user: Address,
    ) -> Result<StakedPosition, ChainError> {
        self.position
            .ok_or_else(|| ChainError::Contract("execution reverted".into()))
    }
}

fn app(position: Option<StakedPosition>, mode: Mode) -> Router {
    let settings = DashboardSettings {
        mode,
        ..DashboardSettings::default()
    };
    let dashboard = Dashboard::new(
        Arc::new(StaticChain),
        Arc::new(StaticPool { position }),
        settings,
        25,
    );
    server::router(Arc::new(dashboard))
}

fn staked() -> Option<StakedPosition> {
    Some(StakedPosition {
        current: U256::exp10(18) * U256::from(2u64),
        initial: U256::exp10(18),
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn fresh_wallet_has_empty_view() {
    let app = app(staked(), Mode::Production);
    let (status, view) = send_json(&app, "GET", &format!("/wallets/{WALLET}"), Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["address"], WALLET);
    assert_eq!(view["chainId"], 25);
    assert_eq!(view["walletProvider"], "json-rpc");
    assert!(view["lastBlockNumber"].is_null());
    assert!(view["currentStaked"].is_null());
    assert!(view.get("debug").is_none());
}

#[tokio::test]
async fn refresh_balance_fills_chain_fields() {
    let app = app(staked(), Mode::Production);
    let (status, view) = send_json(
        &app,
        "POST",
        &format!("/wallets/{WALLET}/balance/refresh"),
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["lastBlockNumber"], 10_500_000);
    assert_eq!(view["nativeBalance"], 42.99);
    assert_eq!(view["status"]["refreshing"], false);
    assert_eq!(view["status"]["message"], "Complete");
    assert!(view["currentStaked"].is_null());
}

#[tokio::test]
async fn refresh_pool_fills_pool_metrics() {
    let app = app(staked(), Mode::Production);
    send(&app, "POST", &format!("/wallets/{WALLET}/balance/refresh"), Body::empty()).await;
    let (status, view) = send_json(
        &app,
        "POST",
        &format!("/wallets/{WALLET}/pool/refresh"),
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["currentStaked"], 2.0);
    assert_eq!(view["initialStaked"], 1.0);
    assert_eq!(view["tokenIncrement"], 100.0);
    assert_eq!(view["currentPoolValue"], 1.72);
    // the balance refresh is kept
    assert_eq!(view["lastBlockNumber"], 10_500_000);
}

#[tokio::test]
async fn pool_failure_is_bad_gateway_and_resets_status() {
    let app = app(None, Mode::Production);
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/wallets/{WALLET}/pool/refresh"),
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "contract call error: execution reverted");

    let (_, view) = send_json(&app, "GET", &format!("/wallets/{WALLET}"), Body::empty()).await;
    assert_eq!(view["status"]["refreshing"], false);
    assert!(view["currentStaked"].is_null());

    let (_, bytes) = send(&app, "GET", &format!("/wallets/{WALLET}/text"), Body::empty()).await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("Status: contract call error: execution reverted"));
}

#[tokio::test]
async fn invalid_address_is_rejected() {
    let app = app(staked(), Mode::Production);
    let (status, body) = send_json(&app, "GET", "/wallets/not-an-address", Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid address: not-an-address");
}

#[tokio::test]
async fn last_transaction_links_to_explorer() {
    let app = app(staked(), Mode::Production);
    let hash = format!("0x{}", "42".repeat(32));
    let (status, view) = send_json(
        &app,
        "PUT",
        &format!("/wallets/{WALLET}/last-tx"),
        Body::from(format!(r#"{{"hash":"{hash}"}}"#)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        view["lastTransactionUrl"],
        format!("https://cronoscan.com/tx/{hash}")
    );
}

#[tokio::test]
async fn text_view_and_debug_mode() {
    let app = app(staked(), Mode::Debug);
    send(&app, "POST", &format!("/wallets/{WALLET}/pool/refresh"), Body::empty()).await;

    let (status, bytes) = send(&app, "GET", &format!("/wallets/{WALLET}/text"), Body::empty()).await;
    let text = String::from_utf8(bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with("Welcome\n"));
    assert!(text.contains("Last block number: Not connected"));
    assert!(text.contains("User's Pool current % increment: 100%"));
    assert!(text.contains("Debug info: {"));

    let (_, view) = send_json(&app, "GET", &format!("/wallets/{WALLET}"), Body::empty()).await;
    assert_eq!(view["debug"]["connected"], true);
    assert_eq!(view["debug"]["currentStaked"], 2.0);
}
