// Fixed-point price helpers
//
// Prices inside pools and oracles are quote units per base unit scaled by
// PRICE_SCALE. Human prices are whole-token prices (e.g. 500 USDC per META)
// and only exist at the display boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::errors::AmmError;

/// Fixed-point scale for every stored price (1e12)
pub const PRICE_SCALE: u128 = 1_000_000_000_000;

/// Largest price a pool can report: u64::MAX quote units per base unit
pub const MAX_PRICE: u128 = u64::MAX as u128 * PRICE_SCALE;

/// Basis point denominator
pub const MAX_BPS: u16 = 10_000;

/// Power of ten between the two mints' decimals
fn decimal_scalar(base_decimals: u8, quote_decimals: u8) -> Result<Decimal, AmmError> {
    let diff = (quote_decimals as i32 - base_decimals as i32).unsigned_abs();
    let scalar = 10u64.checked_pow(diff).ok_or(AmmError::DecimalScaleError)?;
    Ok(Decimal::from(scalar))
}

/// Convert a human price into the pool's 1e12-scaled representation.
///
/// # Arguments
/// * `human_price` - Quote tokens per whole base token
/// * `base_decimals` / `quote_decimals` - Mint decimals
///
/// # Returns
/// * Scaled price, truncated toward zero
pub fn get_amm_price(
    human_price: Decimal,
    base_decimals: u8,
    quote_decimals: u8,
) -> Result<u128, AmmError> {
    if human_price.is_sign_negative() {
        return Err(AmmError::DecimalScaleError);
    }

    let scale = Decimal::from_u128(PRICE_SCALE).ok_or(AmmError::DecimalScaleError)?;
    let scaled = human_price.checked_mul(scale).ok_or(AmmError::DecimalScaleError)?;
    let scalar = decimal_scalar(base_decimals, quote_decimals)?;

    let adjusted = if quote_decimals > base_decimals {
        scaled.checked_mul(scalar)
    } else {
        scaled.checked_div(scalar)
    }
    .ok_or(AmmError::DecimalScaleError)?;

    adjusted.trunc().to_u128().ok_or(AmmError::DecimalScaleError)
}

/// Inverse of [`get_amm_price`]
pub fn get_human_price(
    amm_price: u128,
    base_decimals: u8,
    quote_decimals: u8,
) -> Result<Decimal, AmmError> {
    let price = Decimal::from_u128(amm_price).ok_or(AmmError::DecimalScaleError)?;
    let scale = Decimal::from_u128(PRICE_SCALE).ok_or(AmmError::DecimalScaleError)?;
    let unscaled = price.checked_div(scale).ok_or(AmmError::DecimalScaleError)?;
    let scalar = decimal_scalar(base_decimals, quote_decimals)?;

    let human = if quote_decimals > base_decimals {
        unscaled.checked_div(scalar)
    } else {
        unscaled.checked_mul(scalar)
    }
    .ok_or(AmmError::DecimalScaleError)?;

    Ok(human.normalize())
}

/// Spot price of a pool from its reserves, capped at MAX_PRICE.
/// Returns None while either side is empty.
pub fn price_from_reserves(base_amount: u64, quote_amount: u64) -> Option<u128> {
    if base_amount == 0 || quote_amount == 0 {
        return None;
    }
    // quote_amount * 1e12 fits in u128 for any u64 quote_amount
    let price = quote_amount as u128 * PRICE_SCALE / base_amount as u128;
    Some(price.min(MAX_PRICE))
}

/// Whole-token amount to smallest units, e.g. 1.5 with 6 decimals → 1_500_000
pub fn to_base_units(ui_amount: Decimal, decimals: u8) -> Result<u64, AmmError> {
    if ui_amount.is_sign_negative() {
        return Err(AmmError::DecimalScaleError);
    }
    let scalar = decimal_scalar(0, decimals)?;
    ui_amount
        .checked_mul(scalar)
        .ok_or(AmmError::DecimalScaleError)?
        .trunc()
        .to_u64()
        .ok_or(AmmError::DecimalScaleError)
}

/// Smallest units to whole tokens
pub fn to_ui_amount(amount: u64, decimals: u8) -> Result<Decimal, AmmError> {
    let scalar = decimal_scalar(0, decimals)?;
    Decimal::from(amount)
        .checked_div(scalar)
        .map(|d| d.normalize())
        .ok_or(AmmError::DecimalScaleError)
}

/// Lower an expected amount by a slippage tolerance, rounding down
pub fn subtract_slippage(amount: u64, slippage_bps: u16) -> u64 {
    let bps = slippage_bps.min(MAX_BPS) as u128;
    (amount as u128 * (MAX_BPS as u128 - bps) / MAX_BPS as u128) as u64
}
