use thiserror::Error;

use crate::{
    db_types::{InvoiceId, InvoiceStatus},
    helpers::ConversionError,
    traits::{InvoiceQueryError, PriceOracleError, SettlementGatewayError, WalletError},
};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Invoice {id} is not ready for settlement. Its status is {status}")]
    NotReadyForSettlement { id: InvoiceId, status: InvoiceStatus },
    #[error("Invoice {0} is already being settled")]
    SettlementInProgress(InvoiceId),
    #[error("Invoice {0} does not exist")]
    InvoiceNotFound(InvoiceId),
    #[error("Funds for invoice {id} cannot be recovered. {reason}")]
    NotRecoverable { id: InvoiceId, reason: String },
    #[error("There is nothing to sweep")]
    NothingToSweep,
    #[error("The spending credential for invoice {0} is not available")]
    MissingCredential(InvoiceId),
    #[error("Wallet error. {0}")]
    WalletError(WalletError),
    #[error("{0}")]
    PriceUnavailable(String),
    #[error("Sweep {tx_hash} for invoice {id} was broadcast, but could not be recorded. {reason}")]
    SweepNotRecorded { id: InvoiceId, tx_hash: String, reason: String },
    #[error("{0}")]
    StoreError(#[from] SettlementGatewayError),
}

impl SettlementError {
    /// Rejections are refusals to start: nothing was attempted, so nothing is logged to the audit trail.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotReadyForSettlement { .. }
                | Self::SettlementInProgress(_)
                | Self::InvoiceNotFound(_)
                | Self::NotRecoverable { .. }
        )
    }

    /// Maps a failed claim onto the engine's rejection variants.
    pub(crate) fn from_claim_error(e: SettlementGatewayError) -> Self {
        match e {
            SettlementGatewayError::StatusConflict { id, actual, .. } => {
                Self::NotReadyForSettlement { id, status: actual }
            },
            SettlementGatewayError::ClaimConflict(id) => Self::SettlementInProgress(id),
            SettlementGatewayError::InvoiceNotFound(id) => Self::InvoiceNotFound(id),
            e => Self::StoreError(e),
        }
    }
}

impl From<WalletError> for SettlementError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::NoFundsAvailable => Self::NothingToSweep,
            e => Self::WalletError(e),
        }
    }
}

impl From<PriceOracleError> for SettlementError {
    fn from(e: PriceOracleError) -> Self {
        Self::PriceUnavailable(e.to_string())
    }
}

impl From<ConversionError> for SettlementError {
    fn from(e: ConversionError) -> Self {
        Self::PriceUnavailable(format!("The quoted price cannot be used. {e}"))
    }
}

impl From<InvoiceQueryError> for SettlementError {
    fn from(e: InvoiceQueryError) -> Self {
        Self::StoreError(e.into())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MonitorError {
    #[error("Could not load the open invoices. {0}")]
    QueryError(#[from] InvoiceQueryError),
}

#[derive(Debug, Clone, Error)]
pub enum InvoiceFlowError {
    #[error("Invalid invoice amount. {0}")]
    InvalidAmount(String),
    #[error("{0}")]
    PriceUnavailable(String),
    #[error("Wallet error. {0}")]
    WalletError(#[from] WalletError),
    #[error("{0}")]
    StoreError(#[from] SettlementGatewayError),
}

impl From<PriceOracleError> for InvoiceFlowError {
    fn from(e: PriceOracleError) -> Self {
        Self::PriceUnavailable(e.to_string())
    }
}

impl From<ConversionError> for InvoiceFlowError {
    fn from(e: ConversionError) -> Self {
        Self::InvalidAmount(e.to_string())
    }
}
