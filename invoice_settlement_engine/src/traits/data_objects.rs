use chrono::{DateTime, Utc};
use isp_common::{Satoshis, Secret};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A freshly generated receiving address and the credential that can spend from it.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub address: String,
    pub credential: Secret<String>,
}

/// A transaction touching a watched address, as reported by the wallet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressTransaction {
    pub tx_hash: String,
    /// Zero while the transaction is still in the mempool
    #[serde(default)]
    pub confirmations: u32,
    /// The amount received at the address, if the wallet service reports it
    #[serde(default)]
    pub received: Option<Satoshis>,
}

impl AddressTransaction {
    pub fn new<S: Into<String>>(tx_hash: S) -> Self {
        Self { tx_hash: tx_hash.into(), confirmations: 0, received: None }
    }

    pub fn with_confirmations(mut self, confirmations: u32) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn with_received(mut self, received: Satoshis) -> Self {
        self.received = Some(received);
        self
    }
}

/// An unspent output at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableOutput {
    pub tx_hash: String,
    pub tx_pos: u32,
    pub value: Satoshis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub currency: String,
    /// Units of `currency` per whole coin
    pub rate: Decimal,
    pub as_of: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new<S: Into<String>>(currency: S, rate: Decimal) -> Self {
        Self { currency: currency.into(), rate, as_of: Utc::now() }
    }
}
