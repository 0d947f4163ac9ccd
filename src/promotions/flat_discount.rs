//! Flat Discount
//!
//! A fixed amount off each qualifying line (e.g., "£20 off"), capped at the
//! line's original price.

use rusty_money::{Money, iso::Currency};

use crate::{cart::line::CartLine, promotions::PromotionError};

/// A fixed amount off each qualifying line.
#[derive(Debug, Copy, Clone)]
pub struct FlatDiscount<'a> {
    amount: Money<'a, Currency>,
}

impl<'a> FlatDiscount<'a> {
    /// Create a flat discount rule.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::NonPositiveDiscountAmount`] if the amount is
    /// zero or negative.
    pub fn new(amount: Money<'a, Currency>) -> Result<Self, PromotionError> {
        if amount.to_minor_units() <= 0 {
            return Err(PromotionError::NonPositiveDiscountAmount(
                amount.to_minor_units(),
            ));
        }

        Ok(Self { amount })
    }

    /// Return the discount amount.
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// The discount for a qualifying line, in minor units. Never exceeds the
    /// line's original price. Lines priced in a different currency than the
    /// discount amount get nothing.
    pub(crate) fn discount_for(&self, line: &CartLine<'a>) -> i64 {
        if self.amount.currency() != line.original_price().currency() {
            return 0;
        }

        self.amount
            .to_minor_units()
            .min(line.original_price().to_minor_units())
    }
}
