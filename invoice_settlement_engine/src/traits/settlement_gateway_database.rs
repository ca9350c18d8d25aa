use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Invoice, InvoiceId, InvoiceStatus, LogEntry, NewInvoice, NewLogEntry, NewSettlement, Settlement},
    traits::{InvoiceManagement, InvoiceQueryError},
};

#[derive(Debug, Clone, Error)]
pub enum SettlementGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invoice {0} already exists")]
    InvoiceAlreadyExists(InvoiceId),
    #[error("Invoice {0} does not exist")]
    InvoiceNotFound(InvoiceId),
    #[error("Invoice {id} was expected to be {expected}, but it is {actual}")]
    StatusConflict { id: InvoiceId, expected: InvoiceStatus, actual: InvoiceStatus },
    #[error("Invoice {0} is claimed by another settlement run")]
    ClaimConflict(InvoiceId),
    #[error("A sweep has already been recorded for invoice {0}")]
    SweepAlreadyRecorded(InvoiceId),
    #[error("A settlement already exists for invoice {0}")]
    SettlementAlreadyExists(InvoiceId),
    #[error("{0}")]
    QueryError(#[from] InvoiceQueryError),
}

impl From<sqlx::Error> for SettlementGatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Every write the settlement pipeline makes goes through this trait.
///
/// Implementations must guarantee single-winner semantics: status changes only succeed when the stored status matches
/// the expected one, and only one settlement claim can be live for an invoice at any time.
#[allow(async_fn_in_trait)]
pub trait SettlementGatewayDatabase: Clone + InvoiceManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new invoice with status `pending`.
    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, SettlementGatewayError>;

    /// Moves the invoice from `pending` to `confirmed`, recording `payment_tx_hash` as the tentative settlement hash.
    /// A `payment` entry is added to the audit log in the same transaction.
    async fn mark_invoice_confirmed(
        &self,
        id: &InvoiceId,
        payment_tx_hash: &str,
    ) -> Result<Invoice, SettlementGatewayError>;

    /// Moves the invoice from `pending` to `expired`, with an `info` entry in the audit log.
    async fn mark_invoice_expired(&self, id: &InvoiceId) -> Result<Invoice, SettlementGatewayError>;

    /// Atomically acquires the right to move funds for this invoice for the duration of `lease`.
    ///
    /// Fails with [`SettlementGatewayError::StatusConflict`] if the invoice is not in the `expected` state and with
    /// [`SettlementGatewayError::ClaimConflict`] if someone else holds a live claim.
    async fn claim_invoice(
        &self,
        id: &InvoiceId,
        expected: InvoiceStatus,
        lease: Duration,
    ) -> Result<Invoice, SettlementGatewayError>;

    async fn release_claim(&self, id: &InvoiceId) -> Result<(), SettlementGatewayError>;

    /// Records that a sweep has been broadcast for the invoice. This can only be done once per invoice.
    async fn record_sweep(
        &self,
        id: &InvoiceId,
        sweep_tx_hash: &str,
        log: NewLogEntry,
    ) -> Result<Invoice, SettlementGatewayError>;

    /// In a single atomic transaction:
    /// * stores the settlement record,
    /// * moves the invoice from `confirmed` to `settled`, setting its settlement hash to the sweep transaction,
    /// * clears the spending credential and the settlement claim,
    /// * appends `log` to the audit trail.
    ///
    /// Either all of this happens or none of it does.
    async fn complete_settlement(
        &self,
        settlement: NewSettlement,
        log: NewLogEntry,
    ) -> Result<(Invoice, Settlement), SettlementGatewayError>;

    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, SettlementGatewayError>;

    async fn close(&mut self) -> Result<(), SettlementGatewayError> {
        Ok(())
    }
}
