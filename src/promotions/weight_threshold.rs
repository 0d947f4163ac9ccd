//! Weight Threshold
//!
//! A percentage off weight-sold lines whose weight reaches a threshold
//! (e.g., "buy 100g or more and get 30% off"). The threshold comparison is
//! inclusive.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::{
    cart::line::CartLine,
    pricing::{PricingError, percent_of_minor},
    promotions::PromotionError,
};

/// A percentage off weight-sold lines at or above a threshold weight.
#[derive(Debug, Copy, Clone)]
pub struct WeightThreshold {
    threshold_weight: Decimal,
    percentage: Decimal,
    fraction: Percentage,
}

impl WeightThreshold {
    /// Create a weight threshold rule from a positive threshold and a
    /// percentage in `(0, 99]`.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::NonPositiveThresholdWeight`] or
    /// [`PromotionError::PercentageOutOfRange`] on invalid input.
    pub fn new(threshold_weight: Decimal, percentage: Decimal) -> Result<Self, PromotionError> {
        if threshold_weight <= Decimal::ZERO {
            return Err(PromotionError::NonPositiveThresholdWeight(threshold_weight));
        }

        if percentage <= Decimal::ZERO || percentage > Decimal::from(99u32) {
            return Err(PromotionError::PercentageOutOfRange {
                field: "discount_percentage",
                max: 99,
                value: percentage,
            });
        }

        Ok(Self {
            threshold_weight,
            percentage,
            fraction: Percentage::from(percentage / Decimal::ONE_HUNDRED),
        })
    }

    /// Return the qualifying weight threshold.
    pub fn threshold_weight(&self) -> Decimal {
        self.threshold_weight
    }

    /// Return the percentage as given, in `(0, 99]`.
    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    /// The discount for a qualifying line, in minor units. Zero below the
    /// threshold.
    pub(crate) fn discount_for(&self, line: &CartLine<'_>) -> Result<i64, PricingError> {
        if line.weight() < self.threshold_weight {
            return Ok(0);
        }

        percent_of_minor(&self.fraction, line.original_price().to_minor_units())
    }
}
