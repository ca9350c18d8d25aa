use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const ASSET_CODE: &str = "BCH";
pub const SATOSHIS_PER_COIN: i64 = 100_000_000;
const COIN_DECIMALS: u32 = 8;

//--------------------------------------      Satoshis       ---------------------------------------------------------
/// An amount of the settlement asset, in indivisible base units.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Satoshis(i64);

op!(binary Satoshis, Add, add);
op!(binary Satoshis, Sub, sub);
op!(inplace Satoshis, SubAssign, sub_assign);
op!(unary Satoshis, Neg, neg);

impl Mul<i64> for Satoshis {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Satoshis {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in satoshis: {0}")]
pub struct SatoshisConversionError(String);

impl From<i64> for Satoshis {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Satoshis {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Satoshis {}

impl TryFrom<u64> for Satoshis {
    type Error = SatoshisConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(SatoshisConversionError(format!("Value {value} is too large to convert to Satoshis")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Satoshis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() < 10_000 {
            write!(f, "{} sat", self.0)
        } else {
            write!(f, "{:.8} {ASSET_CODE}", self.to_coins())
        }
    }
}

impl Satoshis {
    pub const fn from_const(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_coins_i64(coins: i64) -> Self {
        Self(coins * SATOSHIS_PER_COIN)
    }

    /// Converts a whole-coin decimal amount to satoshis, rounding half away from zero at the eighth decimal place.
    pub fn from_coins(coins: Decimal) -> Result<Self, SatoshisConversionError> {
        coins
            .round_dp_with_strategy(COIN_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(SATOSHIS_PER_COIN))
            .and_then(|sats| sats.to_i64())
            .map(Self)
            .ok_or_else(|| SatoshisConversionError(coins.to_string()))
    }

    pub fn to_coins(&self) -> Decimal {
        Decimal::new(self.0, COIN_DECIMALS)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
