// src/config.rs
use crate::dashboard::DEFAULT_MAX_WALLETS;
use crate::metrics::DEFAULT_POOL_VALUE_RATE;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_POOL_ID: u64 = 15;
pub const DEFAULT_BLOCK_EXPLORER_URL: &str = "https://cronoscan.com/";
pub const DEFAULT_WALLET_PROVIDER_NAME: &str = "json-rpc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Debug,
}

/// What the dashboard needs to query and present a staking position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    pub pool_id: U256,
    /// Pool value per staked token.
    pub pool_value_rate: f64,
    /// Base URL of the block explorer, ending with a slash.
    pub block_explorer_url: String,
    pub wallet_provider_name: String,
    pub mode: Mode,
    /// Wallets whose sessions are kept in memory at once.
    pub max_wallets: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            pool_id: U256::from(DEFAULT_POOL_ID),
            pool_value_rate: DEFAULT_POOL_VALUE_RATE,
            block_explorer_url: DEFAULT_BLOCK_EXPLORER_URL.to_string(),
            wallet_provider_name: DEFAULT_WALLET_PROVIDER_NAME.to_string(),
            mode: Mode::Production,
            max_wallets: DEFAULT_MAX_WALLETS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub pool_address: Address,
    pub multicall_address: Option<Address>,
    pub bind_address: SocketAddr,
    pub dashboard: DashboardSettings,
}

impl Config {
    /// Reads the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let rpc_url = required("RPC_URL")?;
        let pool_address = parse_var("POOL_ADDRESS", &required("POOL_ADDRESS")?)?;
        let multicall_address = lookup("MULTICALL_ADDRESS")
            .map(|value| parse_var::<Address>("MULTICALL_ADDRESS", &value))
            .transpose()?;
        let bind_address = parse_var(
            "BIND_ADDRESS",
            &lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        )?;

        let defaults = DashboardSettings::default();
        let pool_id = match lookup("POOL_ID") {
            Some(value) => U256::from(parse_var::<u64>("POOL_ID", &value)?),
            None => defaults.pool_id,
        };
        let pool_value_rate = match lookup("POOL_VALUE_RATE") {
            Some(value) => {
                let rate: f64 = parse_var("POOL_VALUE_RATE", &value)?;
                if !rate.is_finite() || rate < 0.0 {
                    return Err(ConfigError::Invalid {
                        name: "POOL_VALUE_RATE",
                        value,
                        reason: "must be a finite non-negative number".to_string(),
                    });
                }
                rate
            }
            None => defaults.pool_value_rate,
        };
        let max_wallets = match lookup("MAX_WALLETS") {
            Some(value) => {
                let max: usize = parse_var("MAX_WALLETS", &value)?;
                if max == 0 {
                    return Err(ConfigError::Invalid {
                        name: "MAX_WALLETS",
                        value,
                        reason: "must be at least 1".to_string(),
                    });
                }
                max
            }
            None => defaults.max_wallets,
        };
        let mode = match lookup("DASHBOARD_MODE").as_deref() {
            None | Some("production") => Mode::Production,
            Some("debug") => Mode::Debug,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "DASHBOARD_MODE",
                    value: other.to_string(),
                    reason: "expected `production` or `debug`".to_string(),
                });
            }
        };

        Ok(Self {
            rpc_url,
            pool_address,
            multicall_address,
            bind_address,
            dashboard: DashboardSettings {
                pool_id,
                pool_value_rate,
                block_explorer_url: lookup("BLOCK_EXPLORER_URL")
                    .unwrap_or(defaults.block_explorer_url),
                wallet_provider_name: lookup("WALLET_PROVIDER_NAME")
                    .unwrap_or(defaults.wallet_provider_name),
                mode,
                max_wallets,
            },
        })
    }
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const POOL: &str = "0x7bd7d0e7d2f1eb3bd29f0f2f0e8f5c1b5d4f2a11";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config =
            Config::from_lookup(lookup(&[("RPC_URL", "http://localhost:8545"), ("POOL_ADDRESS", POOL)]))
                .unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.pool_address, POOL.parse::<Address>().unwrap());
        assert_eq!(config.multicall_address, None);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS.parse().unwrap());
        assert_eq!(config.dashboard, DashboardSettings::default());
        assert_eq!(config.dashboard.pool_id, U256::from(15u64));
        assert_eq!(config.dashboard.pool_value_rate, 0.86);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("RPC_URL", "http://node"),
            ("POOL_ADDRESS", POOL),
            ("POOL_ID", "3"),
            ("POOL_VALUE_RATE", "1.25"),
            ("MULTICALL_ADDRESS", "0xcA11bde05977b3631167028862bE2a173976CA11"),
            ("BLOCK_EXPLORER_URL", "https://explorer.example/"),
            ("WALLET_PROVIDER_NAME", "defiwallet"),
            ("DASHBOARD_MODE", "debug"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("MAX_WALLETS", "50"),
        ]))
        .unwrap();

        assert_eq!(config.dashboard.pool_id, U256::from(3u64));
        assert_eq!(config.dashboard.pool_value_rate, 1.25);
        assert!(config.multicall_address.is_some());
        assert_eq!(config.dashboard.block_explorer_url, "https://explorer.example/");
        assert_eq!(config.dashboard.wallet_provider_name, "defiwallet");
        assert_eq!(config.dashboard.mode, Mode::Debug);
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.dashboard.max_wallets, 50);
    }

    #[test]
    fn missing_and_invalid_values_fail() {
        assert_eq!(
            Config::from_lookup(lookup(&[("POOL_ADDRESS", POOL)])).unwrap_err(),
            ConfigError::Missing("RPC_URL")
        );

        let err = Config::from_lookup(lookup(&[
            ("RPC_URL", "http://node"),
            ("POOL_ADDRESS", POOL),
            ("POOL_ID", "fifteen"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "POOL_ID", .. }));

        let err = Config::from_lookup(lookup(&[
            ("RPC_URL", "http://node"),
            ("POOL_ADDRESS", POOL),
            ("DASHBOARD_MODE", "verbose"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DASHBOARD_MODE", .. }));

        let err = Config::from_lookup(lookup(&[
            ("RPC_URL", "http://node"),
            ("POOL_ADDRESS", POOL),
            ("POOL_VALUE_RATE", "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "POOL_VALUE_RATE", .. }));

        let err = Config::from_lookup(lookup(&[
            ("RPC_URL", "http://node"),
            ("POOL_ADDRESS", POOL),
            ("MAX_WALLETS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_WALLETS", .. }));
    }
}
