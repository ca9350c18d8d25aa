//! Fee estimation for sweep transactions.
//!
//! A sweep spends every P2PKH output at an address to a single destination output. The fee is a flat per-byte rate
//! applied to a size estimate; there is no fee market logic.
use isp_common::Satoshis;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::SpendableOutput;

/// Version, locktime and the input/output counts
pub const TX_OVERHEAD_BYTES: u64 = 10;
/// A signed P2PKH input
pub const INPUT_BYTES: u64 = 148;
/// A P2PKH output
pub const OUTPUT_BYTES: u64 = 34;
/// Outputs smaller than this will not be relayed
pub const DUST_LIMIT: Satoshis = Satoshis::from_const(546);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepPlanError {
    #[error("There are no spendable outputs to sweep")]
    NoSpendableOutputs,
    #[error("The fee of {fee} would consume the entire balance of {total}")]
    InsufficientForFee { total: Satoshis, fee: Satoshis },
    #[error("After fees only {0} would be sent, which is below the dust limit")]
    BelowDustLimit(Satoshis),
}

/// Fee rate in millisatoshis per byte, so that fractional sat/byte rates stay in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate(u64);

impl FeeRate {
    pub fn from_millisats_per_byte(rate: u64) -> Self {
        Self(rate)
    }

    pub fn millisats_per_byte(&self) -> u64 {
        self.0
    }

    /// `floor(bytes × rate)`
    pub fn fee_for_bytes(&self, bytes: u64) -> Satoshis {
        let fee = bytes.saturating_mul(self.0) / 1000;
        Satoshis::try_from(fee).unwrap_or(Satoshis::from(i64::MAX))
    }
}

impl Default for FeeRate {
    /// 1.1 sat/byte
    fn default() -> Self {
        Self(1100)
    }
}

pub fn estimate_sweep_bytes(inputs: usize) -> u64 {
    TX_OVERHEAD_BYTES + INPUT_BYTES * inputs as u64 + OUTPUT_BYTES
}

/// Everything a signer needs to build a sweep: the inputs to spend and the single output to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepPlan {
    pub inputs: Vec<SpendableOutput>,
    pub destination: String,
    pub total_in: Satoshis,
    pub fee: Satoshis,
    pub send_amount: Satoshis,
}

impl SweepPlan {
    pub fn new(inputs: Vec<SpendableOutput>, destination: &str, fee_rate: FeeRate) -> Result<Self, SweepPlanError> {
        if inputs.is_empty() {
            return Err(SweepPlanError::NoSpendableOutputs);
        }
        let total_in = inputs.iter().map(|o| o.value).sum::<Satoshis>();
        let fee = fee_rate.fee_for_bytes(estimate_sweep_bytes(inputs.len()));
        if fee >= total_in {
            return Err(SweepPlanError::InsufficientForFee { total: total_in, fee });
        }
        let send_amount = total_in - fee;
        if send_amount < DUST_LIMIT {
            return Err(SweepPlanError::BelowDustLimit(send_amount));
        }
        Ok(Self { inputs, destination: destination.to_string(), total_in, fee, send_amount })
    }
}
