//! Percentage Discount
//!
//! A percentage off each qualifying line (e.g., "10% off").

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::{
    cart::line::CartLine,
    pricing::{PricingError, percent_of_minor},
    promotions::PromotionError,
};

/// A percentage off each qualifying line.
#[derive(Debug, Copy, Clone)]
pub struct PercentageDiscount {
    percentage: Decimal,
    fraction: Percentage,
}

impl PercentageDiscount {
    /// Create a percentage discount rule from a percentage in `(0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::PercentageOutOfRange`] if the percentage is
    /// outside the allowed range.
    pub fn new(percentage: Decimal) -> Result<Self, PromotionError> {
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(PromotionError::PercentageOutOfRange {
                field: "discount_percentage",
                max: 100,
                value: percentage,
            });
        }

        Ok(Self {
            percentage,
            fraction: Percentage::from(percentage / Decimal::ONE_HUNDRED),
        })
    }

    /// Return the percentage as given, in `(0, 100]`.
    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    /// The discount for a qualifying line, in minor units.
    pub(crate) fn discount_for(&self, line: &CartLine<'_>) -> Result<i64, PricingError> {
        percent_of_minor(&self.fraction, line.original_price().to_minor_units())
    }
}
