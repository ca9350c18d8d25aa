use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db_types::{Invoice, InvoiceStatus, LogEntry, Settlement};

/// A merchant's request for a new invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub merchant_id: String,
    pub amount_fiat: Decimal,
    pub currency: String,
}

impl InvoiceRequest {
    pub fn new<S: Into<String>>(merchant_id: S, amount_fiat: Decimal, currency: S) -> Self {
        Self { merchant_id: merchant_id.into(), amount_fiat, currency: currency.into() }
    }
}

/// An invoice together with its settlement (if it has one) and its audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetails {
    pub invoice: Invoice,
    pub settlement: Option<Settlement>,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceStatusView {
    pub status: InvoiceStatus,
    pub settlement_tx_hash: Option<String>,
}

impl From<&Invoice> for InvoiceStatusView {
    fn from(invoice: &Invoice) -> Self {
        Self { status: invoice.status, settlement_tx_hash: invoice.settlement_tx_hash.clone() }
    }
}
