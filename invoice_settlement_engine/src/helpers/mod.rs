mod conversion;
mod sweep_plan;

pub use conversion::{asset_amount_for_fiat, stable_amount, ConversionError, STABLE_DECIMALS};
pub use sweep_plan::{
    estimate_sweep_bytes,
    FeeRate,
    SweepPlan,
    SweepPlanError,
    DUST_LIMIT,
    INPUT_BYTES,
    OUTPUT_BYTES,
    TX_OVERHEAD_BYTES,
};
