use isp_common::Secret;
use thiserror::Error;

use crate::{
    helpers::SweepPlanError,
    traits::{AddressTransaction, NewAddress},
};

#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("There are no spendable outputs at the address")]
    NoFundsAvailable,
    #[error("The wallet service could not be reached. {0}")]
    Unreachable(String),
    #[error("The wallet service sent a response that could not be understood. {0}")]
    InvalidResponse(String),
    #[error("The transaction was rejected. {0}")]
    Rejected(String),
    #[error("The sweep transaction could not be built. {0}")]
    FeeEstimation(String),
}

impl From<SweepPlanError> for WalletError {
    fn from(e: SweepPlanError) -> Self {
        match e {
            SweepPlanError::NoSpendableOutputs => Self::NoFundsAvailable,
            e => Self::FeeEstimation(e.to_string()),
        }
    }
}

/// Everything the pipeline needs from a wallet. Implementations hold no per-invoice state.
#[allow(async_fn_in_trait)]
pub trait WalletCapability {
    /// Generates a fresh receiving address. Addresses are never reused.
    async fn new_address(&self) -> Result<NewAddress, WalletError>;

    /// All transactions that touch `address`, oldest first.
    async fn history(&self, address: &str) -> Result<Vec<AddressTransaction>, WalletError>;

    /// Spends every output controlled by `credential` to `destination`, less the network fee, and broadcasts the
    /// transaction. Returns the transaction id.
    ///
    /// Fails with [`WalletError::NoFundsAvailable`] when there is nothing to spend.
    async fn sweep(&self, credential: &Secret<String>, destination: &str) -> Result<String, WalletError>;
}
