use std::fmt::Debug;

use chrono::{Duration, Utc};

use crate::{
    db_types::{Invoice, InvoiceId, LogEntry},
    isp_api::invoice_objects::{InvoiceDetails, InvoiceStatusView},
    traits::{InvoiceManagement, InvoiceQueryError},
};

/// Read-only access to invoices, their settlements and audit trails.
pub struct InvoiceQueryApi<B> {
    db: B,
}

impl<B> Debug for InvoiceQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InvoiceQueryApi")
    }
}

impl<B> InvoiceQueryApi<B>
where B: InvoiceManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceQueryError> {
        self.db.fetch_invoice(id).await
    }

    pub async fn invoice_details(&self, id: &InvoiceId) -> Result<Option<InvoiceDetails>, InvoiceQueryError> {
        let Some(invoice) = self.db.fetch_invoice(id).await? else {
            return Ok(None);
        };
        let settlement = self.db.fetch_settlement_for_invoice(id).await?;
        let logs = self.db.fetch_logs_for_invoice(id).await?;
        Ok(Some(InvoiceDetails { invoice, settlement, logs }))
    }

    pub async fn invoice_status(&self, id: &InvoiceId) -> Result<Option<InvoiceStatusView>, InvoiceQueryError> {
        let invoice = self.db.fetch_invoice(id).await?;
        Ok(invoice.as_ref().map(InvoiceStatusView::from))
    }

    pub async fn open_invoices(&self) -> Result<Vec<Invoice>, InvoiceQueryError> {
        self.db.fetch_open_invoices().await
    }

    /// Confirmed invoices that have not made progress for at least `threshold`.
    pub async fn stuck_invoices(&self, threshold: Duration) -> Result<Vec<Invoice>, InvoiceQueryError> {
        self.db.fetch_stuck_invoices(Utc::now() - threshold).await
    }

    pub async fn logs(&self, id: &InvoiceId) -> Result<Vec<LogEntry>, InvoiceQueryError> {
        self.db.fetch_logs_for_invoice(id).await
    }
}
