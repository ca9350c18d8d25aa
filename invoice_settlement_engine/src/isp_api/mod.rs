//! # Invoice settlement pipeline API
//!
//! The `isp_api` module exposes the programmatic API of the settlement pipeline. Each API is created by supplying a
//! database backend and, where funds or prices are involved, a wallet and a price oracle.
//!
//! * [`settlement_api`] sweeps and converts the funds of paid invoices, and recovers late payments to expired ones.
//! * [`monitor_api`] is the polling monitor that drives invoices through their lifecycle.
//! * [`invoice_flow_api`] issues new invoices.
//! * [`invoice_query_api`] provides read-only access to invoices and their history.
//!
//! ```rust,ignore
//! use invoice_settlement_engine::{InvoiceMonitor, MonitorOptions, SettlementApi, SettlementOptions, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let settlement = SettlementApi::new(db, wallet, oracle, SettlementOptions::new(exchange), producers);
//! let monitor = InvoiceMonitor::new(settlement, MonitorOptions::default());
//! let report = monitor.tick().await?;
//! ```
pub mod detection;
pub mod errors;
pub mod invoice_flow_api;
pub mod invoice_objects;
pub mod invoice_query_api;
pub mod monitor_api;
pub mod monitor_objects;
pub mod settlement_api;
