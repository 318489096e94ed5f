//! Total supply resolution.
//!
//! The number of tokens to fetch comes either from an explicit override or from
//! one external lookup. A failed lookup is fatal: no default is substituted and
//! no token request is issued.

use crate::error::{Error, Result};

/// External source of a collection's total supply
#[async_trait::async_trait]
pub trait SupplySource: Send + Sync {
    /// Raw supply value as returned by the remote side (decimal or `0x` hex)
    async fn total_supply(&self, address: &str) -> Result<String>;
}

/// External source of a collection's human-readable name
#[async_trait::async_trait]
pub trait CollectionNameSource: Send + Sync {
    /// Collection name, or `None` when the remote side does not know one
    async fn collection_name(&self, address: &str) -> Result<Option<String>>;
}

/// Resolve how many tokens to fetch.
///
/// A positive `override_count` is returned unchanged, without consulting
/// `source` and without checking it against the real supply. Otherwise the
/// supply is read once from `source` and parsed as a non-negative integer.
pub async fn resolve_supply(
    source: &dyn SupplySource,
    address: &str,
    override_count: Option<u64>,
) -> Result<u64> {
    if let Some(count) = override_count.filter(|c| *c > 0) {
        tracing::debug!(address, count, "Using supply override");
        return Ok(count);
    }

    let raw = source.total_supply(address).await.map_err(|e| {
        tracing::error!(address, error = %e, "Total supply lookup failed");
        Error::SupplyUnavailable {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;

    let count = parse_supply(&raw).ok_or_else(|| {
        tracing::error!(address, raw = %raw, "Total supply is not a valid count");
        Error::SupplyUnavailable {
            address: address.to_string(),
            reason: format!("non-numeric supply value {raw:?}"),
        }
    })?;

    tracing::debug!(address, count, "Resolved total supply");
    Ok(count)
}

/// Parse a supply value returned by a contract call.
///
/// Accepts decimal (`"10000"`) and `0x`-prefixed hex (`"0x2710"`, including the
/// 32-byte padded form of an ABI-encoded `uint256`). Values that do not fit in a
/// `u64` are rejected.
pub fn parse_supply(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let digits = hex.trim_start_matches('0');
        if digits.is_empty() {
            return Some(0);
        }
        if digits.len() > 16 {
            return None;
        }
        return u64::from_str_radix(digits, 16).ok();
    }
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
