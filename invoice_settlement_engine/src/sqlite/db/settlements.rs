use isp_common::Satoshis;
use log::debug;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use super::{decimal_column, parsed_column};
use crate::{
    db_types::{InvoiceId, NewSettlement, Settlement},
    traits::SettlementGatewayError,
};

impl<'r> FromRow<'r, SqliteRow> for Settlement {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let asset_amount: i64 = row.try_get("asset_amount")?;
        Ok(Self {
            id: row.try_get("id")?,
            invoice_id: InvoiceId(row.try_get("invoice_id")?),
            asset_amount: Satoshis::from(asset_amount),
            stable_amount: decimal_column(row, "stable_amount")?,
            currency: row.try_get("currency")?,
            rate: decimal_column(row, "rate")?,
            status: parsed_column(row, "status")?,
            tx_hash: row.try_get("tx_hash")?,
            completed_at: row.try_get("completed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Inserts a settlement record. There can only ever be one settlement per invoice.
pub async fn insert_settlement(
    settlement: NewSettlement,
    conn: &mut SqliteConnection,
) -> Result<Settlement, SettlementGatewayError> {
    let invoice_id = settlement.invoice_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO settlements (
                invoice_id,
                asset_amount,
                stable_amount,
                currency,
                rate,
                status,
                tx_hash,
                completed_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(settlement.invoice_id.as_str())
    .bind(settlement.asset_amount.value())
    .bind(settlement.stable_amount.to_string())
    .bind(settlement.currency)
    .bind(settlement.rate.to_string())
    .bind(settlement.status.to_string())
    .bind(settlement.tx_hash)
    .bind(settlement.completed_at)
    .bind(chrono::Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(settlement) => {
            debug!("🗃️ Settlement for invoice {invoice_id} inserted");
            Ok(settlement)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(SettlementGatewayError::SettlementAlreadyExists(invoice_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_settlement_for_invoice(
    id: &InvoiceId,
    conn: &mut SqliteConnection,
) -> Result<Option<Settlement>, sqlx::Error> {
    let settlement = sqlx::query_as("SELECT * FROM settlements WHERE invoice_id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(settlement)
}
