use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Invoice, InvoiceId, LogEntry, Settlement};

#[derive(Debug, Clone, Error)]
pub enum InvoiceQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Stored data could not be decoded: {0}")]
    DataError(String),
}

impl From<sqlx::Error> for InvoiceQueryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::DataError(e.to_string()),
            _ => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Read-only queries over invoices, settlements and the audit trail.
#[allow(async_fn_in_trait)]
pub trait InvoiceManagement {
    async fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceQueryError>;

    async fn fetch_invoice_by_address(&self, address: &str) -> Result<Option<Invoice>, InvoiceQueryError>;

    /// All invoices the polling monitor still needs to look at, i.e. those that are `pending` or `confirmed`, oldest
    /// first.
    async fn fetch_open_invoices(&self) -> Result<Vec<Invoice>, InvoiceQueryError>;

    /// Confirmed invoices that have not changed since `older_than`. These are the invoices whose settlement keeps
    /// failing and that an operator should look at.
    async fn fetch_stuck_invoices(&self, older_than: DateTime<Utc>) -> Result<Vec<Invoice>, InvoiceQueryError>;

    async fn fetch_settlement_for_invoice(&self, id: &InvoiceId) -> Result<Option<Settlement>, InvoiceQueryError>;

    /// The audit trail for an invoice, in the order the entries were written.
    async fn fetch_logs_for_invoice(&self, id: &InvoiceId) -> Result<Vec<LogEntry>, InvoiceQueryError>;

    async fn fetch_recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, InvoiceQueryError>;
}
