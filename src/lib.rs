// src/lib.rs
use ethers::contract::abigen;

abigen!(AutoPool, r#"[
    function stakedWantTokens(uint256 _pid, address _user) external view returns (uint256)
    function userInfo(uint256 _pid, address _user) external view returns (uint256 shares, uint256 totalDeposit)
]"#);

pub mod chain;
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod server;
pub mod utils;
pub mod view;
