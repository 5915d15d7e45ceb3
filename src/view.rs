// src/view.rs
use crate::config::{DashboardSettings, Mode};
use crate::dashboard::{QueryResults, RefreshStatus, Session};
use crate::utils::explorer_tx_url;
use ethers::types::Address;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

const NOT_CONNECTED: &str = "Not connected";

/// Identity of the wallet the dashboard is shown for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub address: Address,
    pub chain_id: u64,
    pub provider_name: String,
}

/// Everything the Welcome page shows for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeView {
    pub address: Address,
    pub chain_id: u64,
    pub wallet_provider: String,
    pub last_block_number: Option<u64>,
    pub native_balance: Option<f64>,
    pub initial_staked: Option<f64>,
    pub current_staked: Option<f64>,
    pub token_increment: Option<f64>,
    pub current_pool_value: Option<f64>,
    pub last_transaction_url: Option<String>,
    pub status: RefreshStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl WelcomeView {
    pub fn new(wallet: &WalletInfo, session: &Session, settings: &DashboardSettings) -> Self {
        let results = &session.results;
        let last_transaction_url = results
            .last_tx_hash
            .map(|hash| explorer_tx_url(&settings.block_explorer_url, &format!("{hash:?}")));
        let debug = match settings.mode {
            Mode::Debug => Some(debug_info(wallet, results)),
            Mode::Production => None,
        };

        Self {
            address: wallet.address,
            chain_id: wallet.chain_id,
            wallet_provider: wallet.provider_name.clone(),
            last_block_number: results.last_block_number,
            native_balance: results.native_balance,
            initial_staked: results.initial_staked,
            current_staked: results.current_staked,
            token_increment: results.token_increment,
            current_pool_value: results.current_pool_value,
            last_transaction_url,
            status: session.status.clone(),
            debug,
        }
    }
}

fn debug_info(wallet: &WalletInfo, results: &QueryResults) -> Value {
    let mut info = json!({
        "walletProviderName": wallet.provider_name,
        "address": wallet.address,
        "chainId": wallet.chain_id,
        "connected": true,
    });
    if let (Some(info), Ok(Value::Object(fields))) =
        (info.as_object_mut(), serde_json::to_value(results))
    {
        info.extend(fields);
    }
    info
}

fn or_blank(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl fmt::Display for WelcomeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Welcome")?;
        writeln!(f, "User's address: {:?}", self.address)?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        writeln!(f, "Wallet provider: {}", self.wallet_provider)?;
        match self.last_block_number {
            Some(block) => writeln!(f, "Last block number: {block}")?,
            None => writeln!(f, "Last block number: {NOT_CONNECTED}")?,
        }
        writeln!(f, "User's native balance: {}", or_blank(self.native_balance))?;
        writeln!(f, "User's Pool initial staked value: {}", or_blank(self.initial_staked))?;
        writeln!(f, "User's Pool current staked value: {}", or_blank(self.current_staked))?;
        writeln!(f, "User's Pool current % increment: {}%", or_blank(self.token_increment))?;
        writeln!(f, "User's Pool current value: {}", or_blank(self.current_pool_value))?;
        if let Some(url) = &self.last_transaction_url {
            writeln!(f, "Last transaction: {url}")?;
        }
        if !self.status.message.is_empty() {
            writeln!(f, "Status: {}", self.status.message)?;
        }
        if let Some(debug) = &self.debug {
            writeln!(f, "Debug info: {debug}")?;
        }
        Ok(())
    }
}
