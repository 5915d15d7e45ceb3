// src/dashboard.rs
//! Query results of the Welcome dashboard and the two refresh actions that
//! fill them.
//!
//! A [`QueryResults`] record is never edited in place: each successful
//! refresh builds a new record from the previous one and stores it, so
//! concurrent refreshes for the same wallet resolve as last write wins.

use crate::chain::{ChainError, ChainReader, StakingPoolReader};
use crate::config::DashboardSettings;
use crate::metrics;
use crate::utils::{UnitsError, to_display_amount};
use crate::view::{WalletInfo, WelcomeView};
use ethers::types::{Address, TxHash};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const STATUS_COMPLETE: &str = "Complete";
pub const STATUS_QUERYING_POOL: &str = "Querying staking pool...";
pub const STATUS_QUERYING_CHAIN: &str = "Querying chain data...";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// Wallets kept in memory before the least recently written one is dropped.
pub const DEFAULT_MAX_WALLETS: usize = 10_000;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Units(#[from] UnitsError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResults {
    pub last_block_number: Option<u64>,
    /// Native currency balance, display units.
    pub native_balance: Option<f64>,
    pub current_staked: Option<f64>,
    pub initial_staked: Option<f64>,
    /// Percentage, `None` until known or when nothing was deposited.
    pub token_increment: Option<f64>,
    pub current_pool_value: Option<f64>,
    pub last_tx_hash: Option<TxHash>,
}

impl QueryResults {
    pub fn with_chain(self, snapshot: ChainSnapshot) -> Self {
        Self {
            last_block_number: Some(snapshot.last_block_number),
            native_balance: Some(snapshot.native_balance),
            ..self
        }
    }

    pub fn with_pool(self, snapshot: PoolSnapshot) -> Self {
        Self {
            current_staked: Some(snapshot.current_staked),
            initial_staked: Some(snapshot.initial_staked),
            token_increment: snapshot.token_increment,
            current_pool_value: Some(snapshot.current_pool_value),
            ..self
        }
    }

    pub fn with_last_tx(self, tx_hash: TxHash) -> Self {
        Self {
            last_tx_hash: Some(tx_hash),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSnapshot {
    pub last_block_number: u64,
    pub native_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSnapshot {
    pub current_staked: f64,
    pub initial_staked: f64,
    pub current_pool_value: f64,
    pub token_increment: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStatus {
    pub refreshing: bool,
    pub message: String,
}

impl RefreshStatus {
    pub fn busy(message: &str) -> Self {
        Self {
            refreshing: true,
            message: message.to_string(),
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self {
            refreshing: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub results: QueryResults,
    pub status: RefreshStatus,
}

/// Block number and native balance of `address`.
pub async fn query_chain(
    chain: &dyn ChainReader,
    address: Address,
) -> Result<ChainSnapshot, DashboardError> {
    let last_block_number = chain.last_block_number().await?;
    let balance = chain.native_balance(address).await?;
    Ok(ChainSnapshot {
        last_block_number,
        native_balance: to_display_amount(balance)?,
    })
}

/// Staked position of `address` in the configured pool, with derived metrics.
pub async fn query_pool(
    pool: &dyn StakingPoolReader,
    settings: &DashboardSettings,
    address: Address,
) -> Result<PoolSnapshot, DashboardError> {
    let position = pool.staked_position(settings.pool_id, address).await?;
    let current_staked = to_display_amount(position.current)?;
    let initial_staked = to_display_amount(position.initial)?;
    Ok(PoolSnapshot {
        current_staked,
        initial_staked,
        current_pool_value: metrics::pool_value(current_staked, settings.pool_value_rate),
        token_increment: metrics::token_increment(current_staked, initial_staked),
    })
}

#[derive(Debug, Default)]
struct Entry {
    session: Session,
    last_write: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<Address, Entry>,
    clock: u64,
}

impl Sessions {
    /// Session of `address` for writing. Makes room first when `address` is
    /// new and the map is full.
    fn touch(&mut self, address: Address, capacity: usize) -> &mut Session {
        self.clock += 1;
        if !self.entries.contains_key(&address) && self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_write)
                .map(|(address, _)| *address);
            if let Some(oldest) = oldest {
                debug!(evicted = ?oldest, "dropping least recently refreshed wallet");
                self.entries.remove(&oldest);
            }
        }

        let entry = self.entries.entry(address).or_default();
        entry.last_write = self.clock;
        &mut entry.session
    }
}

/// Per-wallet sessions, bounded to `capacity` wallets. The least recently
/// written wallet is evicted first.
#[derive(Debug)]
pub struct DashboardStore {
    sessions: RwLock<Sessions>,
    capacity: usize,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_WALLETS)
    }
}

impl DashboardStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.read(|sessions| sessions.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn session(&self, address: Address) -> Session {
        self.read(|sessions| {
            sessions
                .entries
                .get(&address)
                .map(|entry| entry.session.clone())
                .unwrap_or_default()
        })
    }

    pub fn set_status(&self, address: Address, status: RefreshStatus) {
        self.modify(address, |session| session.status = status);
    }

    /// Replaces the results of `address` with `update(previous)`. The status
    /// is replaced in the same write when given, and left alone otherwise.
    pub fn replace_results(
        &self,
        address: Address,
        status: Option<RefreshStatus>,
        update: impl FnOnce(QueryResults) -> QueryResults,
    ) -> Session {
        self.modify(address, |session| {
            let previous = std::mem::take(&mut session.results);
            session.results = update(previous);
            if let Some(status) = status {
                session.status = status;
            }
            session.clone()
        })
    }

    /// Marks `address` as refreshing until the returned guard is finished or
    /// dropped.
    fn begin(&self, address: Address, message: &str) -> InFlight<'_> {
        self.set_status(address, RefreshStatus::busy(message));
        InFlight {
            store: self,
            address,
            finished: false,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Sessions) -> T) -> T {
        f(&self.sessions.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn modify<T>(&self, address: Address, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        f(sessions.touch(address, self.capacity))
    }
}

/// A refresh in progress. Dropping it unfinished, e.g. when the client goes
/// away mid-request, resets the status to [`STATUS_CANCELLED`].
struct InFlight<'a> {
    store: &'a DashboardStore,
    address: Address,
    finished: bool,
}

impl InFlight<'_> {
    fn complete(mut self, update: impl FnOnce(QueryResults) -> QueryResults) -> Session {
        self.finished = true;
        self.store.replace_results(
            self.address,
            Some(RefreshStatus::done(STATUS_COMPLETE)),
            update,
        )
    }

    fn fail(mut self, error: &DashboardError) {
        self.finished = true;
        warn!(address = ?self.address, %error, "refresh failed");
        self.store
            .set_status(self.address, RefreshStatus::done(error.to_string()));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(address = ?self.address, "refresh cancelled");
            self.store
                .set_status(self.address, RefreshStatus::done(STATUS_CANCELLED));
        }
    }
}

/// The Welcome dashboard: readers, settings and per-wallet state.
pub struct Dashboard {
    chain: Arc<dyn ChainReader>,
    pool: Arc<dyn StakingPoolReader>,
    settings: DashboardSettings,
    chain_id: u64,
    store: DashboardStore,
}

impl Dashboard {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        pool: Arc<dyn StakingPoolReader>,
        settings: DashboardSettings,
        chain_id: u64,
    ) -> Self {
        let store = DashboardStore::with_capacity(settings.max_wallets);
        Self {
            chain,
            pool,
            settings,
            chain_id,
            store,
        }
    }

    /// "Refresh Balance of Pool".
    pub async fn refresh_pool_balance(&self, address: Address) -> Result<Session, DashboardError> {
        let in_flight = self.store.begin(address, STATUS_QUERYING_POOL);

        match query_pool(self.pool.as_ref(), &self.settings, address).await {
            Ok(snapshot) => {
                info!(?address, current_staked = snapshot.current_staked, "pool position refreshed");
                Ok(in_flight.complete(|results| results.with_pool(snapshot)))
            }
            Err(e) => {
                in_flight.fail(&e);
                Err(e)
            }
        }
    }

    /// "Refresh Balance": last block number and native balance.
    pub async fn refresh_query_results(&self, address: Address) -> Result<Session, DashboardError> {
        let in_flight = self.store.begin(address, STATUS_QUERYING_CHAIN);

        match query_chain(self.chain.as_ref(), address).await {
            Ok(snapshot) => {
                info!(?address, block = snapshot.last_block_number, "chain data refreshed");
                Ok(in_flight.complete(|results| results.with_chain(snapshot)))
            }
            Err(e) => {
                in_flight.fail(&e);
                Err(e)
            }
        }
    }

    /// Remembers the last transaction sent from `address` so the view can
    /// link to it. The refresh status is not touched.
    pub fn record_transaction(&self, address: Address, tx_hash: TxHash) -> Session {
        self.store
            .replace_results(address, None, |results| results.with_last_tx(tx_hash))
    }

    pub fn view(&self, address: Address) -> WelcomeView {
        let wallet = WalletInfo {
            address,
            chain_id: self.chain_id,
            provider_name: self.settings.wallet_provider_name.clone(),
        };
        WelcomeView::new(&wallet, &self.store.session(address), &self.settings)
    }
}
