use thiserror::Error;

use crate::traits::PriceQuote;

#[derive(Debug, Clone, Error)]
pub enum PriceOracleError {
    #[error("No price is available for {currency}. {reason}")]
    PriceUnavailable { currency: String, reason: String },
}

impl PriceOracleError {
    pub fn unavailable<S: Into<String>>(currency: &str, reason: S) -> Self {
        Self::PriceUnavailable { currency: currency.to_string(), reason: reason.into() }
    }
}

/// A source of exchange rates for the settlement asset. Queries have no side effects and are not retried internally.
#[allow(async_fn_in_trait)]
pub trait PriceOracle {
    async fn quote(&self, currency: &str) -> Result<PriceQuote, PriceOracleError>;
}
