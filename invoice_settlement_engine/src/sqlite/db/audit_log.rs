use chrono::Utc;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use super::parsed_column;
use crate::db_types::{InvoiceId, LogEntry, NewLogEntry};

impl<'r> FromRow<'r, SqliteRow> for LogEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let invoice_id: Option<String> = row.try_get("invoice_id")?;
        Ok(Self {
            id: row.try_get("id")?,
            log_type: parsed_column(row, "log_type")?,
            details: row.try_get("details")?,
            invoice_id: invoice_id.map(InvoiceId),
            created_at: row.try_get("created_at")?,
        })
    }
}

pub async fn append(entry: NewLogEntry, conn: &mut SqliteConnection) -> Result<LogEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        "INSERT INTO audit_log (log_type, details, invoice_id, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(entry.log_type.to_string())
    .bind(entry.details)
    .bind(entry.invoice_id.map(|id| id.0))
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn fetch_logs_for_invoice(id: &InvoiceId, conn: &mut SqliteConnection) -> Result<Vec<LogEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM audit_log WHERE invoice_id = $1 ORDER BY id ASC")
        .bind(id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

pub async fn fetch_recent_logs(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<LogEntry>, sqlx::Error> {
    let entries =
        sqlx::query_as("SELECT * FROM audit_log ORDER BY id DESC LIMIT $1").bind(limit).fetch_all(conn).await?;
    Ok(entries)
}
