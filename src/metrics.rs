// src/metrics.rs
//! Metrics derived from a formatted staked position.

/// Default conversion rate from staked tokens to pool value. A fixed
/// constant, not a price feed.
pub const DEFAULT_POOL_VALUE_RATE: f64 = 0.86;

/// Current value of the pool position: `current_staked * rate`.
pub fn pool_value(current_staked: f64, rate: f64) -> f64 {
    current_staked * rate
}

/// Percentage change from the initial deposit to the current stake.
///
/// Returns `None` when nothing was deposited, the increment is undefined.
pub fn token_increment(current_staked: f64, initial_staked: f64) -> Option<f64> {
    if initial_staked == 0.0 {
        return None;
    }
    Some((current_staked - initial_staked) / initial_staked * 100.0)
}
