//! Invoice Settlement Engine
//!
//! The engine accepts cryptocurrency payments against merchant invoices. Each invoice gets its own receiving address
//! and a time-boxed price lock. Once a payment is seen at the address, the funds are swept to a custodial exchange
//! wallet, converted to a stable asset, and the result is recorded.
//!
//! The library is divided into these sections:
//! 1. Storage. The [`traits`] module defines what a backend must provide; [`SqliteDatabase`] is the SQLite backend.
//!    All status changes are compare-and-swap updates, so concurrent runs can never move an invoice twice.
//! 2. Collaborators. [`WalletCapability`] and [`PriceOracle`] are the seams to the outside world. The engine never
//!    talks to a blockchain or price feed directly.
//! 3. The pipeline API ([`mod@isp_api`]): invoice creation, the polling monitor, the settlement engine, and queries.
//!
//! The engine also emits events at every lifecycle transition. See [`events`] for how to hook into them.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod isp_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use isp_api::{
    detection::DetectionPolicy,
    errors::{InvoiceFlowError, MonitorError, SettlementError},
    invoice_flow_api::InvoiceFlowApi,
    invoice_objects,
    invoice_query_api::InvoiceQueryApi,
    monitor_api::{InvoiceMonitor, MonitorOptions},
    monitor_objects::{FailedInvoice, TickReport},
    settlement_api::{SettlementApi, SettlementOptions},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    InvoiceManagement,
    InvoiceQueryError,
    PriceOracle,
    PriceOracleError,
    SettlementGatewayDatabase,
    SettlementGatewayError,
    WalletCapability,
    WalletError,
};
