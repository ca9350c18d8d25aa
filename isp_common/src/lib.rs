mod satoshis;

pub mod helpers;
pub mod op;
mod secret;

pub use satoshis::{Satoshis, SatoshisConversionError, ASSET_CODE, SATOSHIS_PER_COIN};
pub use secret::Secret;
