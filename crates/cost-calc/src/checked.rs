//! 溢位檢查的 Decimal 運算
//!
//! 溢位回傳 [`CostError::Overflow`]，只讓該工藝計算失敗。

use cost_core::{CostError, Result};
use rust_decimal::Decimal;

pub(crate) fn mul(
    left: Decimal,
    right: Decimal,
    context: impl FnOnce() -> String,
) -> Result<Decimal> {
    left.checked_mul(right)
        .ok_or_else(|| CostError::overflow(context()))
}

pub(crate) fn div(
    left: Decimal,
    right: Decimal,
    context: impl FnOnce() -> String,
) -> Result<Decimal> {
    left.checked_div(right)
        .ok_or_else(|| CostError::overflow(context()))
}

pub(crate) fn add(
    left: Decimal,
    right: Decimal,
    context: impl FnOnce() -> String,
) -> Result<Decimal> {
    left.checked_add(right)
        .ok_or_else(|| CostError::overflow(context()))
}
