// src/utils.rs
use ethers::types::U256;
use thiserror::Error;

/// Decimals of the staked token and of the chain's native currency.
pub const TOKEN_DECIMALS: u32 = 18;
/// Decimals kept for display after truncation.
pub const DISPLAY_DECIMALS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("negative amount: {0}")]
    Negative(String),
    #[error("invalid amount {input:?}: {reason}")]
    Invalid { input: String, reason: String },
    #[error("amount {value} does not fit in {bits} bits")]
    Overflow { value: U256, bits: usize },
}

/// Parses a non-negative integer given in base 10 or as `0x`-prefixed hex.
pub fn parse_u256(s: &str) -> Result<U256, UnitsError> {
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    if s.starts_with('-') {
        return Err(UnitsError::Negative(s.to_string()));
    }

    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) if digits.is_empty() => return Err(UnitsError::Empty),
        Some(digits) => U256::from_str_radix(digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(s).map_err(|e| e.to_string()),
    };

    parsed.map_err(|reason| UnitsError::Invalid {
        input: s.to_string(),
        reason,
    })
}

/// Divisor that drops every decimal below display precision.
pub fn display_divisor() -> U256 {
    U256::exp10((TOKEN_DECIMALS - DISPLAY_DECIMALS) as usize)
}

/// Converts a token amount in smallest units to a display number with two
/// decimals, truncating (never rounding) the dropped precision.
pub fn to_display_amount(value: U256) -> Result<f64, UnitsError> {
    let bucket = value / display_divisor();
    if bucket.bits() > 128 {
        return Err(UnitsError::Overflow { value, bits: 128 });
    }
    Ok(bucket.as_u128() as f64 / 10f64.powi(DISPLAY_DECIMALS as i32))
}

/// `parse_u256` followed by `to_display_amount`.
pub fn parse_token_amount(s: &str) -> Result<f64, UnitsError> {
    to_display_amount(parse_u256(s)?)
}

/// Parses a plain integer such as a block number, without decimal scaling.
pub fn parse_integer(s: &str) -> Result<u64, UnitsError> {
    let value = parse_u256(s)?;
    if value.bits() > 64 {
        return Err(UnitsError::Overflow { value, bits: 64 });
    }
    Ok(value.as_u64())
}

/// Block explorer link for a transaction. Plain concatenation, the base URL
/// is expected to end with a slash.
pub fn explorer_tx_url(base_url: &str, tx_hash: &str) -> String {
    format!("{base_url}tx/{tx_hash}")
}
