//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and call
//! through to the functions without any other changes.
//!
//! Decimal amounts are stored as TEXT and claim leases as unix seconds. All other timestamps are written by the engine
//! (never by SQLite defaults) so that they share one format and compare correctly.
use std::{env, str::FromStr};

use log::info;
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
    Error as SqlxError,
    Row,
    SqlitePool,
};

pub mod audit_log;
pub mod invoices;
pub mod settlements;

const SQLITE_DB_URL: &str = "sqlite://data/invoice_store.db";

pub fn db_url() -> String {
    let result = env::var("ISP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ ISP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options =
        SqliteConnectOptions::from_str(url)?.create_if_missing(true).journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, SqlxError> {
    let value: String = row.try_get(column)?;
    Decimal::from_str(&value)
        .map_err(|e| SqlxError::ColumnDecode { index: column.to_string(), source: Box::new(e) })
}

pub(crate) fn parsed_column<T>(row: &SqliteRow, column: &str) -> Result<T, SqlxError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.try_get(column)?;
    value.parse::<T>().map_err(|e| SqlxError::ColumnDecode { index: column.to_string(), source: Box::new(e) })
}
