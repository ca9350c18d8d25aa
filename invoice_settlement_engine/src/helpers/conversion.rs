use isp_common::{Satoshis, SatoshisConversionError};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Stable-asset amounts are always recorded to the cent.
pub const STABLE_DECIMALS: u32 = 2;

#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("The exchange rate must be positive, but was {0}")]
    InvalidRate(Decimal),
    #[error("The amount must be positive, but was {0}")]
    InvalidAmount(Decimal),
    #[error("{0}")]
    Overflow(#[from] SatoshisConversionError),
    #[error("{amount} at a rate of {rate} is out of range")]
    OutOfRange { amount: Satoshis, rate: Decimal },
}

/// The stable-asset value of `amount` at `rate`: `round(amount × rate, 2)`, with halves rounded away from zero.
///
/// The multiplication is done in exact decimal arithmetic, so the result never carries binary floating-point error.
pub fn stable_amount(amount: Satoshis, rate: Decimal) -> Result<Decimal, ConversionError> {
    amount
        .to_coins()
        .checked_mul(rate)
        .map(|v| v.round_dp_with_strategy(STABLE_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(ConversionError::OutOfRange { amount, rate })
}

/// How much of the settlement asset must be paid for `fiat` at `rate`, rounded to the nearest satoshi.
pub fn asset_amount_for_fiat(fiat: Decimal, rate: Decimal) -> Result<Satoshis, ConversionError> {
    if rate <= Decimal::ZERO {
        return Err(ConversionError::InvalidRate(rate));
    }
    if fiat <= Decimal::ZERO {
        return Err(ConversionError::InvalidAmount(fiat));
    }
    let coins = fiat.checked_div(rate).ok_or(ConversionError::InvalidRate(rate))?;
    Ok(Satoshis::from_coins(coins)?)
}
