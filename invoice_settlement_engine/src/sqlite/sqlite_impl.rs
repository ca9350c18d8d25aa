//! `SqliteDatabase` is the SQLite backend of the invoice settlement engine.
//!
//! It implements [`SettlementGatewayDatabase`] and [`InvoiceManagement`] on top of the query functions in [`super::db`],
//! wrapping multi-step writes in transactions.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{audit_log, db_url, invoices, new_pool, settlements};
use crate::{
    db_types::{
        Invoice,
        InvoiceId,
        InvoiceStatus,
        LogEntry,
        LogType,
        NewInvoice,
        NewLogEntry,
        NewSettlement,
        Settlement,
    },
    traits::{InvoiceManagement, InvoiceQueryError, SettlementGatewayDatabase, SettlementGatewayError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `ISP_DATABASE_URL`, or the default location if it is not set.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Works out why a compare-and-swap update on `id` matched no rows.
    async fn explain_missed_update(
        &self,
        id: &InvoiceId,
        expected: InvoiceStatus,
        conn: &mut SqliteConnection,
    ) -> SettlementGatewayError {
        match invoices::fetch_invoice(id, conn).await {
            Ok(None) => SettlementGatewayError::InvoiceNotFound(id.clone()),
            Ok(Some(invoice)) if invoice.status != expected => {
                SettlementGatewayError::StatusConflict { id: id.clone(), expected, actual: invoice.status }
            },
            Ok(Some(_)) => SettlementGatewayError::ClaimConflict(id.clone()),
            Err(e) => e.into(),
        }
    }

    async fn transition(
        &self,
        id: &InvoiceId,
        from: InvoiceStatus,
        to: InvoiceStatus,
        tx_hash: Option<&str>,
        log: NewLogEntry,
    ) -> Result<Invoice, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let Some(invoice) = invoices::transition_status(id, from, to, tx_hash, &mut tx).await? else {
            let err = self.explain_missed_update(id, from, &mut tx).await;
            debug!("🗃️ Invoice {id} was not moved from {from} to {to}. {err}");
            return Err(err);
        };
        audit_log::append(log, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Invoice {id} moved from {from} to {to}");
        Ok(invoice)
    }
}

impl InvoiceManagement for SqliteDatabase {
    async fn fetch_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::fetch_invoice(id, &mut conn).await?;
        Ok(invoice)
    }

    async fn fetch_invoice_by_address(&self, address: &str) -> Result<Option<Invoice>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let invoice = invoices::fetch_invoice_by_address(address, &mut conn).await?;
        Ok(invoice)
    }

    async fn fetch_open_invoices(&self) -> Result<Vec<Invoice>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let invoices = invoices::fetch_open_invoices(&mut conn).await?;
        Ok(invoices)
    }

    async fn fetch_stuck_invoices(&self, older_than: DateTime<Utc>) -> Result<Vec<Invoice>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let invoices = invoices::fetch_stuck_invoices(older_than, &mut conn).await?;
        Ok(invoices)
    }

    async fn fetch_settlement_for_invoice(&self, id: &InvoiceId) -> Result<Option<Settlement>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let settlement = settlements::fetch_settlement_for_invoice(id, &mut conn).await?;
        Ok(settlement)
    }

    async fn fetch_logs_for_invoice(&self, id: &InvoiceId) -> Result<Vec<LogEntry>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit_log::fetch_logs_for_invoice(id, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, InvoiceQueryError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit_log::fetch_recent_logs(limit, &mut conn).await?;
        Ok(entries)
    }
}

impl SettlementGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        invoices::insert_invoice(invoice, &mut conn).await
    }

    async fn mark_invoice_confirmed(
        &self,
        id: &InvoiceId,
        payment_tx_hash: &str,
    ) -> Result<Invoice, SettlementGatewayError> {
        let log = NewLogEntry::new(LogType::Payment, format!("Payment detected in transaction {payment_tx_hash}"))
            .for_invoice(id);
        self.transition(id, InvoiceStatus::Pending, InvoiceStatus::Confirmed, Some(payment_tx_hash), log).await
    }

    async fn mark_invoice_expired(&self, id: &InvoiceId) -> Result<Invoice, SettlementGatewayError> {
        let log = NewLogEntry::info("Price lock lapsed without payment. Invoice expired.").for_invoice(id);
        self.transition(id, InvoiceStatus::Pending, InvoiceStatus::Expired, None, log).await
    }

    async fn claim_invoice(
        &self,
        id: &InvoiceId,
        expected: InvoiceStatus,
        lease: Duration,
    ) -> Result<Invoice, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let until = Utc::now() + lease;
        match invoices::try_claim(id, expected, until, &mut conn).await? {
            Some(invoice) => {
                debug!("🗃️ Claimed invoice {id} until {until}");
                Ok(invoice)
            },
            None => Err(self.explain_missed_update(id, expected, &mut conn).await),
        }
    }

    async fn release_claim(&self, id: &InvoiceId) -> Result<(), SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        invoices::release_claim(id, &mut conn).await?;
        trace!("🗃️ Released claim on invoice {id}");
        Ok(())
    }

    async fn record_sweep(
        &self,
        id: &InvoiceId,
        sweep_tx_hash: &str,
        log: NewLogEntry,
    ) -> Result<Invoice, SettlementGatewayError> {
        let mut tx = self.pool.begin().await?;
        let invoice = match invoices::record_sweep(id, sweep_tx_hash, &mut tx).await? {
            Some(invoice) => invoice,
            None => {
                return match invoices::fetch_invoice(id, &mut tx).await? {
                    Some(_) => Err(SettlementGatewayError::SweepAlreadyRecorded(id.clone())),
                    None => Err(SettlementGatewayError::InvoiceNotFound(id.clone())),
                };
            },
        };
        audit_log::append(log, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Sweep {sweep_tx_hash} recorded for invoice {id}");
        Ok(invoice)
    }

    async fn complete_settlement(
        &self,
        settlement: NewSettlement,
        log: NewLogEntry,
    ) -> Result<(Invoice, Settlement), SettlementGatewayError> {
        let id = settlement.invoice_id.clone();
        let mut tx = self.pool.begin().await?;
        let Some(invoice) = invoices::mark_settled(&id, &settlement.tx_hash, &mut tx).await? else {
            return Err(self.explain_missed_update(&id, InvoiceStatus::Confirmed, &mut tx).await);
        };
        let settlement = settlements::insert_settlement(settlement, &mut tx).await?;
        audit_log::append(log, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Invoice {id} settled with settlement #{}", settlement.id);
        Ok((invoice, settlement))
    }

    async fn append_log(&self, entry: NewLogEntry) -> Result<LogEntry, SettlementGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let entry = audit_log::append(entry, &mut conn).await?;
        Ok(entry)
    }

    async fn close(&mut self) -> Result<(), SettlementGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
