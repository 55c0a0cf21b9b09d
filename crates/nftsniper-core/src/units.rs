//! Price unit conversion between decimal coin amounts and integer base units.
//!
//! Everything past the input edge works in the chain's smallest unit as
//! `U256`; decimals exist only while parsing caller-supplied values.

use crate::error::PriceError;
use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Decimal places of the native currency
pub const NATIVE_DECIMALS: u32 = 18;

/// Convert a decimal coin amount into integer base units.
///
/// Fractional digits beyond `decimals` are truncated; negative amounts are
/// rejected.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, PriceError> {
    if amount.is_sign_negative() {
        return Err(PriceError::Negative);
    }

    let scale = 10u64
        .checked_pow(decimals)
        .ok_or(PriceError::Unrepresentable)?;
    let scaled = amount
        .checked_mul(Decimal::from(scale))
        .ok_or(PriceError::Unrepresentable)?;

    let whole = scaled.trunc();
    let units = whole.to_u128().ok_or(PriceError::Unrepresentable)?;
    Ok(U256::from(units))
}

/// Parse a base-unit amount from an upstream decimal string.
///
/// Marketplace prices arrive as strings like `"12000000000000000000.000000"`;
/// only the integer part is meaningful, so anything after a decimal point is
/// dropped.
pub fn parse_base_units(raw: &str) -> Result<U256, PriceError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(PriceError::Negative);
    }

    let integer_part = trimmed.split('.').next().unwrap_or_default();
    if integer_part.is_empty() || !integer_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PriceError::Unparseable(raw.to_string()));
    }

    U256::from_str_radix(integer_part, 10).map_err(|_| PriceError::Unparseable(raw.to_string()))
}
