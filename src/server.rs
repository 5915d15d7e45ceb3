// src/server.rs
use crate::dashboard::{Dashboard, DashboardError};
use crate::view::WelcomeView;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use ethers::types::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug)]
pub enum ApiError {
    InvalidAddress(String),
    Dashboard(DashboardError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError::Dashboard(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::InvalidAddress(address) => {
                (StatusCode::BAD_REQUEST, format!("invalid address: {address}"))
            }
            ApiError::Dashboard(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LastTransaction {
    pub hash: TxHash,
}

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/wallets/{address}", get(welcome))
        .route("/wallets/{address}/text", get(welcome_text))
        .route("/wallets/{address}/pool/refresh", post(refresh_pool_balance))
        .route("/wallets/{address}/balance/refresh", post(refresh_query_results))
        .route("/wallets/{address}/last-tx", put(record_transaction))
        .with_state(dashboard)
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse::<Address>()
        .map_err(|_| ApiError::InvalidAddress(raw.to_string()))
}

async fn welcome(
    State(dashboard): State<Arc<Dashboard>>,
    Path(address): Path<String>,
) -> Result<Json<WelcomeView>, ApiError> {
    let address = parse_address(&address)?;
    Ok(Json(dashboard.view(address)))
}

async fn welcome_text(
    State(dashboard): State<Arc<Dashboard>>,
    Path(address): Path<String>,
) -> Result<String, ApiError> {
    let address = parse_address(&address)?;
    Ok(dashboard.view(address).to_string())
}

async fn refresh_pool_balance(
    State(dashboard): State<Arc<Dashboard>>,
    Path(address): Path<String>,
) -> Result<Json<WelcomeView>, ApiError> {
    let address = parse_address(&address)?;
    dashboard.refresh_pool_balance(address).await?;
    Ok(Json(dashboard.view(address)))
}

async fn refresh_query_results(
    State(dashboard): State<Arc<Dashboard>>,
    Path(address): Path<String>,
) -> Result<Json<WelcomeView>, ApiError> {
    let address = parse_address(&address)?;
    dashboard.refresh_query_results(address).await?;
    Ok(Json(dashboard.view(address)))
}

async fn record_transaction(
    State(dashboard): State<Arc<Dashboard>>,
    Path(address): Path<String>,
    Json(body): Json<LastTransaction>,
) -> Result<Json<WelcomeView>, ApiError> {
    let address = parse_address(&address)?;
    dashboard.record_transaction(address, body.hash);
    Ok(Json(dashboard.view(address)))
}
