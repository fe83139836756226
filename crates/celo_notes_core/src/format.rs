//! Display formatting for addresses, balances and timestamps.
//!
//! # Invariants
//! - Formatting is pure and never fails; unrepresentable input degrades to a
//!   readable fallback instead of panicking.

use chrono::DateTime;
use ethers::types::U256;

/// Decimal places of CELO and the Celo stable tokens.
pub const CELO_DECIMALS: u32 = 18;

const ADDRESS_PREFIX_CHARS: usize = 5;
const ADDRESS_SUFFIX_CHARS: usize = 4;
/// Largest power of ten that fits in `U256`.
const MAX_DECIMALS: u32 = 77;

/// Shortens an address to its first 5 and last 4 characters.
///
/// `"0xABCDEF1234567890"` becomes `"0xABC...7890"`. Values too short to
/// shorten are returned unchanged.
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= ADDRESS_PREFIX_CHARS + ADDRESS_SUFFIX_CHARS {
        return address.to_string();
    }
    let prefix: String = chars[..ADDRESS_PREFIX_CHARS].iter().collect();
    let suffix: String = chars[chars.len() - ADDRESS_SUFFIX_CHARS..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Formats base units as a decimal amount with `places` fraction digits.
///
/// Rounds half-up, e.g. `2_500_000_000_000_000_000` with 18 decimals and 2
/// places is `"2.50"`. `decimals` and `places` are capped at 77.
pub fn format_units_fixed(amount: U256, decimals: u32, places: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let places = places.min(MAX_DECIMALS);
    if places >= decimals {
        let whole = amount / U256::exp10(decimals as usize);
        let fraction = amount % U256::exp10(decimals as usize);
        let padding = "0".repeat((places - decimals) as usize);
        if decimals == 0 {
            return if places == 0 {
                whole.to_string()
            } else {
                format!("{whole}.{padding}")
            };
        }
        return format!(
            "{whole}.{fraction:0>width$}{padding}",
            fraction = fraction.to_string(),
            width = decimals as usize
        );
    }

    let step = U256::exp10((decimals - places) as usize);
    let half = step / 2;
    let scaled = amount.checked_add(half).unwrap_or(U256::MAX) / step;
    if places == 0 {
        return scaled.to_string();
    }

    let unit = U256::exp10(places as usize);
    let whole = scaled / unit;
    let fraction = scaled % unit;
    format!(
        "{whole}.{fraction:0>width$}",
        fraction = fraction.to_string(),
        width = places as usize
    )
}

/// Formats a CELO balance with two decimal places.
pub fn format_balance(amount: U256) -> String {
    format_units_fixed(amount, CELO_DECIMALS, 2)
}

/// Formats epoch seconds as `HH:MM:SS` in UTC.
pub fn format_last_modified(epoch_seconds: u64) -> String {
    i64::try_from(epoch_seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|moment| moment.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
