use std::{str::FromStr, sync::Arc};

use invoice_settlement_engine::{traits::PriceQuote, PriceOracle, PriceOracleError};
use log::*;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::PriceFeedConfig;

/// Price oracle backed by the CoinGecko `simple/price` endpoint.
#[derive(Clone)]
pub struct CoinGeckoOracle {
    config: PriceFeedConfig,
    client: Arc<Client>,
}

impl CoinGeckoOracle {
    pub fn new(config: PriceFeedConfig) -> Result<Self, PriceOracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PriceOracleError::unavailable("*", format!("Could not create the HTTP client. {e}")))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self) -> String {
        format!("{}/simple/price", self.config.url)
    }
}

impl PriceOracle for CoinGeckoOracle {
    async fn quote(&self, currency: &str) -> Result<PriceQuote, PriceOracleError> {
        let vs_currency = currency.to_lowercase();
        trace!("🔌️ Requesting {} price in {vs_currency}", self.config.asset_id);
        let response = self
            .client
            .get(self.url())
            .query(&[("ids", self.config.asset_id.as_str()), ("vs_currencies", vs_currency.as_str())])
            .send()
            .await
            .map_err(|e| PriceOracleError::unavailable(currency, e.to_string()))?;
        if !response.status().is_success() {
            let reason = format!("The price feed responded with {}", response.status());
            return Err(PriceOracleError::unavailable(currency, reason));
        }
        let body =
            response.json::<Value>().await.map_err(|e| PriceOracleError::unavailable(currency, e.to_string()))?;
        let rate = parse_price(&body, &self.config.asset_id, &vs_currency)
            .map_err(|reason| PriceOracleError::unavailable(currency, reason))?;
        debug!("🔌️ {} is trading at {rate} {vs_currency}", self.config.asset_id);
        Ok(PriceQuote::new(currency, rate))
    }
}

/// Extracts `body[asset][currency]` as an exact decimal.
///
/// The number is read from its JSON text, so no precision is lost to floating point.
pub fn parse_price(body: &Value, asset: &str, currency: &str) -> Result<Decimal, String> {
    let value = body
        .get(asset)
        .and_then(|prices| prices.get(currency))
        .ok_or_else(|| format!("The response has no {currency} price for {asset}"))?;
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        v => return Err(format!("{v} is not a price")),
    };
    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| format!("{text} is not a valid price. {e}"))?;
    if rate <= Decimal::ZERO {
        return Err(format!("{rate} is not a usable price"));
    }
    Ok(rate.normalize())
}
