//! #  Storage and collaborator contracts.
//!
//! This module provides the interfaces that the settlement pipeline is written against. Nothing in the pipeline knows
//! which database, wallet or price feed it is talking to.
//!
//! ## Traits
//! * [`SettlementGatewayDatabase`] defines every write the pipeline makes. All status changes are compare-and-swap
//!   updates, and completing a settlement is a single atomic transaction.
//! * [`InvoiceManagement`] provides read-only queries over invoices, settlements and the audit log.
//! * [`WalletCapability`] creates receiving addresses, reports address history and sweeps funds.
//! * [`PriceOracle`] quotes the current exchange rate of the settlement asset.
mod data_objects;
mod invoice_management;
mod price_oracle;
mod settlement_gateway_database;
mod wallet_capability;

pub use data_objects::{AddressTransaction, NewAddress, PriceQuote, SpendableOutput};
pub use invoice_management::{InvoiceManagement, InvoiceQueryError};
pub use price_oracle::{PriceOracle, PriceOracleError};
pub use settlement_gateway_database::{SettlementGatewayDatabase, SettlementGatewayError};
pub use wallet_capability::{WalletCapability, WalletError};
