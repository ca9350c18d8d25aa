use chrono::{DateTime, Utc};
use isp_common::{Satoshis, Secret};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use super::{decimal_column, parsed_column};
use crate::{
    db_types::{Invoice, InvoiceId, InvoiceStatus, NewInvoice, PriceLock},
    traits::SettlementGatewayError,
};

impl<'r> FromRow<'r, SqliteRow> for Invoice {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let credential: Option<String> = row.try_get("spending_credential")?;
        let claim: Option<i64> = row.try_get("claim_expires_at")?;
        let amount_asset: i64 = row.try_get("amount_asset")?;
        Ok(Self {
            id: InvoiceId(row.try_get("id")?),
            merchant_id: row.try_get("merchant_id")?,
            receiving_address: row.try_get("receiving_address")?,
            spending_credential: credential.map(Secret::new),
            amount_asset: Satoshis::from(amount_asset),
            amount_fiat: decimal_column(row, "amount_fiat")?,
            currency: row.try_get("currency")?,
            price_lock: PriceLock { rate: decimal_column(row, "lock_rate")?, expires_at: row.try_get("lock_expires_at")? },
            status: parsed_column(row, "status")?,
            settlement_tx_hash: row.try_get("settlement_tx_hash")?,
            sweep_tx_hash: row.try_get("sweep_tx_hash")?,
            claim_expires_at: claim.and_then(|secs| DateTime::from_timestamp(secs, 0)),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Inserts a new invoice with status `pending`. This is not atomic. Embed the call in a transaction if it needs to be.
pub async fn insert_invoice(invoice: NewInvoice, conn: &mut SqliteConnection) -> Result<Invoice, SettlementGatewayError> {
    let id = invoice.id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO invoices (
                id,
                merchant_id,
                receiving_address,
                spending_credential,
                amount_asset,
                amount_fiat,
                currency,
                lock_rate,
                lock_expires_at,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10, $10)
            RETURNING *;
        "#,
    )
    .bind(invoice.id.as_str())
    .bind(invoice.merchant_id)
    .bind(invoice.receiving_address)
    .bind(invoice.spending_credential.into_inner())
    .bind(invoice.amount_asset.value())
    .bind(invoice.amount_fiat.to_string())
    .bind(invoice.currency)
    .bind(invoice.price_lock.rate.to_string())
    .bind(invoice.price_lock.expires_at)
    .bind(invoice.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(invoice) => {
            debug!("🗃️ Invoice {id} inserted");
            Ok(invoice)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(SettlementGatewayError::InvoiceAlreadyExists(id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_invoice(id: &InvoiceId, conn: &mut SqliteConnection) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as("SELECT * FROM invoices WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(invoice)
}

pub async fn fetch_invoice_by_address(
    address: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as("SELECT * FROM invoices WHERE receiving_address = $1")
        .bind(address)
        .fetch_optional(conn)
        .await?;
    Ok(invoice)
}

/// Invoices that are `pending` or `confirmed`, oldest first.
pub async fn fetch_open_invoices(conn: &mut SqliteConnection) -> Result<Vec<Invoice>, sqlx::Error> {
    let invoices = sqlx::query_as(
        "SELECT * FROM invoices WHERE status IN ('pending', 'confirmed') ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(invoices)
}

pub async fn fetch_stuck_invoices(
    older_than: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Invoice>, sqlx::Error> {
    let invoices =
        sqlx::query_as("SELECT * FROM invoices WHERE status = 'confirmed' AND updated_at < $1 ORDER BY updated_at ASC")
            .bind(older_than)
            .fetch_all(conn)
            .await?;
    Ok(invoices)
}

/// Compare-and-swap status change. The update only happens if the invoice is currently in the `from` state.
///
/// `tx_hash`, if given, replaces the settlement hash. Returns `None` if the invoice was not in the `from` state (or does
/// not exist).
pub async fn transition_status(
    id: &InvoiceId,
    from: InvoiceStatus,
    to: InvoiceStatus,
    tx_hash: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as(
        r#"
        UPDATE invoices SET
            status = $1,
            settlement_tx_hash = COALESCE($2, settlement_tx_hash),
            updated_at = $3
        WHERE id = $4 AND status = $5
        RETURNING *;
        "#,
    )
    .bind(to.as_str())
    .bind(tx_hash)
    .bind(Utc::now())
    .bind(id.as_str())
    .bind(from.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ CAS {from} -> {to} for invoice {id}: {}", if invoice.is_some() { "won" } else { "lost" });
    Ok(invoice)
}

/// Marks a confirmed invoice as settled by `sweep_tx_hash`. The spending credential and any claim are cleared in the
/// same statement.
pub async fn mark_settled(
    id: &InvoiceId,
    sweep_tx_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as(
        r#"
        UPDATE invoices SET
            status = 'settled',
            settlement_tx_hash = $1,
            sweep_tx_hash = $1,
            spending_credential = NULL,
            claim_expires_at = NULL,
            updated_at = $2
        WHERE id = $3 AND status = 'confirmed'
        RETURNING *;
        "#,
    )
    .bind(sweep_tx_hash)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(invoice)
}

/// Takes out a claim on the invoice until `until`, provided it is in the `expected` state and nobody else holds a live
/// claim. Returns `None` if either condition fails.
pub async fn try_claim(
    id: &InvoiceId,
    expected: InvoiceStatus,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let now = Utc::now().timestamp();
    let invoice = sqlx::query_as(
        r#"
        UPDATE invoices SET claim_expires_at = $1
        WHERE id = $2 AND status = $3 AND (claim_expires_at IS NULL OR claim_expires_at <= $4)
        RETURNING *;
        "#,
    )
    .bind(until.timestamp())
    .bind(id.as_str())
    .bind(expected.as_str())
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(invoice)
}

pub async fn release_claim(id: &InvoiceId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE invoices SET claim_expires_at = NULL WHERE id = $1").bind(id.as_str()).execute(conn).await?;
    Ok(())
}

/// Stores the sweep transaction for the invoice and drops the now-spent credential. Returns `None` if a sweep has
/// already been recorded.
pub async fn record_sweep(
    id: &InvoiceId,
    sweep_tx_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice = sqlx::query_as(
        r#"
        UPDATE invoices SET sweep_tx_hash = $1, spending_credential = NULL, updated_at = $2
        WHERE id = $3 AND sweep_tx_hash IS NULL
        RETURNING *;
        "#,
    )
    .bind(sweep_tx_hash)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(invoice)
}
