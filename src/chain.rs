// src/chain.rs
//! Read-only queries against the JSON-RPC node and the staking pool contract.
//!
//! Every call is a single request: no retry, no local timeout. Failures are
//! returned to the caller as [`ChainError`].

use crate::AutoPool;
use async_trait::async_trait;
use ethers::contract::Multicall;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("provider error: {0}")]
    Provider(#[source] BoxError),
    #[error("contract call error: {0}")]
    Contract(#[source] BoxError),
    #[error("multicall error: {0}")]
    Multicall(#[source] BoxError),
}

/// Raw staked position of a user in one pool, in token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakedPosition {
    /// `stakedWantTokens(pid, user)`
    pub current: U256,
    /// `userInfo(pid, user).totalDeposit`
    pub initial: U256,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    async fn last_block_number(&self) -> Result<u64, ChainError>;

    /// Native currency balance in its smallest unit.
    async fn native_balance(&self, address: Address) -> Result<U256, ChainError>;
}

#[async_trait]
pub trait StakingPoolReader: Send + Sync {
    async fn staked_position(
        &self,
        pool_id: U256,
        user: Address,
    ) -> Result<StakedPosition, ChainError>;
}

/// [`ChainReader`] over any ethers middleware.
pub struct RpcChain<M> {
    client: Arc<M>,
}

impl<M: Middleware> RpcChain<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for RpcChain<M> {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let id = self
            .client
            .get_chainid()
            .await
            .map_err(|e| ChainError::Provider(Box::new(e)))?;
        Ok(id.low_u64())
    }

    async fn last_block_number(&self) -> Result<u64, ChainError> {
        let block = self
            .client
            .get_block_number()
            .await
            .map_err(|e| ChainError::Provider(Box::new(e)))?;
        Ok(block.as_u64())
    }

    async fn native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.client
            .get_balance(address, None)
            .await
            .map_err(|e| ChainError::Provider(Box::new(e)))
    }
}

/// [`StakingPoolReader`] over the `AutoPool` contract binding.
///
/// With a Multicall3 address both reads go out in one `eth_call` and come
/// from the same block. Without one they are two separate calls and the pair
/// can be inconsistent if the position changes in between.
pub struct AutoPoolReader<M> {
    pool: AutoPool<M>,
    multicall_address: Option<Address>,
}

impl<M: Middleware + 'static> AutoPoolReader<M> {
    pub fn new(address: Address, client: Arc<M>, multicall_address: Option<Address>) -> Self {
        Self {
            pool: AutoPool::new(address, client),
            multicall_address,
        }
    }

    async fn batched_position(
        &self,
        pool_id: U256,
        user: Address,
        multicall_address: Address,
    ) -> Result<StakedPosition, ChainError> {
        let mut multicall = Multicall::new(self.pool.client().clone(), Some(multicall_address))
            .await
            .map_err(|e| ChainError::Multicall(Box::new(e)))?;

        multicall.add_call(self.pool.staked_want_tokens(pool_id, user), false);
        multicall.add_call(self.pool.user_info(pool_id, user), false);

        let (current, (_shares, total_deposit)): (U256, (U256, U256)) = multicall
            .call()
            .await
            .map_err(|e| ChainError::Multicall(Box::new(e)))?;

        Ok(StakedPosition {
            current,
            initial: total_deposit,
        })
    }

    async fn sequential_position(
        &self,
        pool_id: U256,
        user: Address,
    ) -> Result<StakedPosition, ChainError> {
        let current = self
            .pool
            .staked_want_tokens(pool_id, user)
            .call()
            .await
            .map_err(|e| ChainError::Contract(Box::new(e)))?;
        let (_shares, total_deposit) = self
            .pool
            .user_info(pool_id, user)
            .call()
            .await
            .map_err(|e| ChainError::Contract(Box::new(e)))?;

        Ok(StakedPosition {
            current,
            initial: total_deposit,
        })
    }
}

#[async_trait]
impl<M: Middleware + 'static> StakingPoolReader for AutoPoolReader<M> {
    async fn staked_position(
        &self,
        pool_id: U256,
        user: Address,
    ) -> Result<StakedPosition, ChainError> {
        debug!(%pool_id, ?user, batched = self.multicall_address.is_some(), "reading staked position");
        match self.multicall_address {
            Some(multicall_address) => self.batched_position(pool_id, user, multicall_address).await,
            None => self.sequential_position(pool_id, user).await,
        }
    }
}
