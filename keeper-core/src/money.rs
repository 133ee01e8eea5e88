//! Monetary amounts are `rust_decimal::Decimal`, persisted with exactly two places.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a ledger amount such as `-50.00`, `200` or `1,250.5`.
///
/// The result is rounded to cents (half away from zero).
pub fn parse_amount(s: &str) -> Result<Decimal, String> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err("amount is empty".to_string());
    }
    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|e| e.to_string())?;
    Ok(round_cents(value))
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal rendering used by every ledger file
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}
