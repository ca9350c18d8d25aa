use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use isp_common::{Satoshis, Secret};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------       InvoiceId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    /// Generates a fresh, unguessable invoice id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for InvoiceId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for InvoiceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InvoiceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------     InvoiceStatus     ---------------------------------------------------------
/// The lifecycle state of an invoice.
///
/// The only legal transitions are `Pending -> Confirmed -> Settled` and `Pending -> Expired`. `Settled` and `Expired`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// The invoice has been issued and no payment has been observed yet.
    Pending,
    /// A payment has been observed at the receiving address. Funds still need to be swept and converted.
    Confirmed,
    /// Funds have been swept and converted, and a settlement record exists.
    Settled,
    /// The price lock lapsed before any payment was observed.
    Expired,
}

impl InvoiceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Expired)
    }

    /// Open invoices are the ones the polling monitor still has to look at.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Settled => "settled",
            Self::Expired => "expired",
        }
    }
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "settled" => Ok(Self::Settled),
            "expired" => Ok(Self::Expired),
            s => Err(ConversionError::new("invoice status", s)),
        }
    }
}

//--------------------------------------       PriceLock       ---------------------------------------------------------
/// The exchange rate captured when the invoice was issued, and the deadline by which payment must arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLock {
    /// Fiat units per whole coin
    pub rate: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl PriceLock {
    pub fn new(rate: Decimal, valid_for: Duration) -> Self {
        Self { rate, expires_at: Utc::now() + valid_for }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

//--------------------------------------        Invoice        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub merchant_id: String,
    pub receiving_address: String,
    /// Present until the funds have been swept, after which it is cleared.
    #[serde(skip)]
    pub spending_credential: Option<Secret<String>>,
    pub amount_asset: Satoshis,
    pub amount_fiat: Decimal,
    pub currency: String,
    pub price_lock: PriceLock,
    pub status: InvoiceStatus,
    /// The detected payment transaction while `confirmed`; the sweep transaction once `settled`.
    pub settlement_tx_hash: Option<String>,
    /// Written as soon as a sweep has been broadcast, so that a retry never sweeps twice.
    pub sweep_tx_hash: Option<String>,
    #[serde(skip)]
    pub claim_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_claimed_at(&self, now: DateTime<Utc>) -> bool {
        self.claim_expires_at.map(|t| t > now).unwrap_or(false)
    }
}

//--------------------------------------       NewInvoice      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: InvoiceId,
    pub merchant_id: String,
    pub receiving_address: String,
    pub spending_credential: Secret<String>,
    pub amount_asset: Satoshis,
    pub amount_fiat: Decimal,
    pub currency: String,
    pub price_lock: PriceLock,
    pub created_at: DateTime<Utc>,
}

impl NewInvoice {
    pub fn new(
        merchant_id: String,
        receiving_address: String,
        spending_credential: Secret<String>,
        amount_asset: Satoshis,
        amount_fiat: Decimal,
        currency: String,
        price_lock: PriceLock,
    ) -> Self {
        Self {
            id: InvoiceId::random(),
            merchant_id,
            receiving_address,
            spending_credential,
            amount_asset,
            amount_fiat,
            currency,
            price_lock,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: InvoiceId) -> Self {
        self.id = id;
        self
    }
}

//--------------------------------------    SettlementStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

impl FromStr for SettlementStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError::new("settlement status", s)),
        }
    }
}

//--------------------------------------       Settlement      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub id: i64,
    pub invoice_id: InvoiceId,
    pub asset_amount: Satoshis,
    pub stable_amount: Decimal,
    pub currency: String,
    /// The oracle rate used for the conversion
    pub rate: Decimal,
    pub status: SettlementStatus,
    pub tx_hash: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub invoice_id: InvoiceId,
    pub asset_amount: Satoshis,
    pub stable_amount: Decimal,
    pub currency: String,
    pub rate: Decimal,
    pub status: SettlementStatus,
    pub tx_hash: String,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewSettlement {
    pub fn completed(
        invoice_id: InvoiceId,
        asset_amount: Satoshis,
        stable_amount: Decimal,
        currency: String,
        rate: Decimal,
        tx_hash: String,
    ) -> Self {
        Self {
            invoice_id,
            asset_amount,
            stable_amount,
            currency,
            rate,
            status: SettlementStatus::Completed,
            tx_hash,
            completed_at: Some(Utc::now()),
        }
    }
}

//--------------------------------------        LogType        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Payment,
    Settlement,
    Refund,
    Info,
    Error,
    Recovery,
}

impl Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Payment => "payment",
            Self::Settlement => "settlement",
            Self::Refund => "refund",
            Self::Info => "info",
            Self::Error => "error",
            Self::Recovery => "recovery",
        };
        f.write_str(s)
    }
}

impl FromStr for LogType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "settlement" => Ok(Self::Settlement),
            "refund" => Ok(Self::Refund),
            "info" => Ok(Self::Info),
            "error" => Ok(Self::Error),
            "recovery" => Ok(Self::Recovery),
            s => Err(ConversionError::new("log type", s)),
        }
    }
}

//--------------------------------------        LogEntry       ---------------------------------------------------------
/// A row in the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub log_type: LogType,
    pub details: String,
    pub invoice_id: Option<InvoiceId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub log_type: LogType,
    pub details: String,
    pub invoice_id: Option<InvoiceId>,
}

impl NewLogEntry {
    pub fn new<S: Into<String>>(log_type: LogType, details: S) -> Self {
        Self { log_type, details: details.into(), invoice_id: None }
    }

    pub fn for_invoice(mut self, id: &InvoiceId) -> Self {
        self.invoice_id = Some(id.clone());
        self
    }

    pub fn info<S: Into<String>>(details: S) -> Self {
        Self::new(LogType::Info, details)
    }

    pub fn error<S: Into<String>>(details: S) -> Self {
        Self::new(LogType::Error, details)
    }
}
