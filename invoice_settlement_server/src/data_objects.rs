use invoice_settlement_engine::db_types::{Invoice, InvoiceId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STUCK_THRESHOLD_MINS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StuckInvoicesParams {
    /// Only invoices that have not changed for at least this many minutes are returned
    pub older_than_mins: Option<i64>,
}

impl StuckInvoicesParams {
    pub fn threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.older_than_mins.unwrap_or(DEFAULT_STUCK_THRESHOLD_MINS).max(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub invoice_id: InvoiceId,
    pub sweep_tx_hash: Option<String>,
}

impl From<&Invoice> for RecoveryResult {
    fn from(invoice: &Invoice) -> Self {
        Self { invoice_id: invoice.id.clone(), sweep_tx_hash: invoice.sweep_tx_hash.clone() }
    }
}
