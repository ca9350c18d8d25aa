//! # Invoice settlement server
//! Runs the settlement pipeline as a service. It is responsible for:
//! * Running the polling monitor in the background, so that paid invoices are swept and settled without operator
//!   involvement.
//! * Connecting the engine to the outside world: a signing wallet daemon, a price feed, and an optional notification
//!   webhook.
//! * Exposing a small operational HTTP API.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /api/monitor/tick`: run one monitor pass now and return its report.
//! * `POST /api/invoices`: create an invoice.
//! * `GET /api/invoices/{id}`: an invoice with its settlement and audit trail.
//! * `GET /api/invoices/{id}/status`: just the status and settlement transaction.
//! * `POST /api/invoices/{id}/recover`: sweep funds that arrived after an invoice expired.
//! * `GET /api/invoices/stuck`: confirmed invoices that have stopped making progress.
//!
//! There is no authentication. The server is meant to run on a private network.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod monitor_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
