//! Pricing arithmetic
//!
//! Shared minor-unit helpers used by promotion calculations and cart
//! repricing: percentage application, amount scaling, and proportional
//! splitting of an aggregate discount.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::MoneyError;
use thiserror::Error;

/// Errors specific to pricing calculations.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Scaling a minor-unit amount overflowed the representable range.
    #[error("minor unit scaling overflowed or was not representable")]
    ScaleOverflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate a percentage of a minor-unit amount, rounding the midpoint away
/// from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows
/// or cannot be safely represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Scale a minor-unit amount by a decimal factor, rounding the midpoint away
/// from zero.
///
/// # Errors
///
/// Returns [`PricingError::ScaleOverflow`] if the scaled value overflows or
/// cannot be represented in minor units.
pub fn scale_minor(minor: i64, factor: Decimal) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::ScaleOverflow)?;

    factor
        .checked_mul(minor)
        .ok_or(PricingError::ScaleOverflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::ScaleOverflow)
}

/// The share of an aggregate discount owned by one member of a group,
/// proportional to its original price.
///
/// # Errors
///
/// Returns [`PricingError::ScaleOverflow`] if the ratio or the scaled share
/// cannot be represented.
pub fn proportional_share(
    discount_minor: i64,
    line_original_minor: i64,
    group_original_minor: i64,
) -> Result<i64, PricingError> {
    let line = Decimal::from_i64(line_original_minor).ok_or(PricingError::ScaleOverflow)?;
    let group = Decimal::from_i64(group_original_minor).ok_or(PricingError::ScaleOverflow)?;

    let ratio = line.checked_div(group).ok_or(PricingError::ScaleOverflow)?;

    scale_minor(discount_minor, ratio)
}
