//! Buy X Get Y
//!
//! Buy X units, get Y units discounted (e.g., "buy 2 get 1 free", "buy 3 get
//! 1 at 50% off"). Priced over the whole group of qualifying quantity-sold
//! lines: units are pooled across lines and the discounted units are taken
//! from the cheapest lines first.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::{
    cart::line::CartLine,
    pricing::{PricingError, percent_of_minor, scale_minor},
    promotions::PromotionError,
};

/// Buy X units, get Y units discounted, across a group of quantity-sold
/// lines.
#[derive(Debug, Copy, Clone)]
pub struct BuyXGetY {
    buy_quantity: u32,
    get_quantity: u32,
    percentage: Decimal,
    fraction: Percentage,
}

impl BuyXGetY {
    /// Create a buy-X-get-Y rule; `get_discount_percentage` is the discount
    /// applied to each earned unit, in `(0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::NonPositiveQuantity`] or
    /// [`PromotionError::PercentageOutOfRange`] on invalid input.
    pub fn new(
        buy_quantity: u32,
        get_quantity: u32,
        get_discount_percentage: Decimal,
    ) -> Result<Self, PromotionError> {
        if buy_quantity == 0 {
            return Err(PromotionError::NonPositiveQuantity {
                field: "buy_quantity",
                value: buy_quantity,
            });
        }

        if get_quantity == 0 {
            return Err(PromotionError::NonPositiveQuantity {
                field: "get_quantity",
                value: get_quantity,
            });
        }

        if get_discount_percentage <= Decimal::ZERO
            || get_discount_percentage > Decimal::ONE_HUNDRED
        {
            return Err(PromotionError::PercentageOutOfRange {
                field: "get_discount_percentage",
                max: 100,
                value: get_discount_percentage,
            });
        }

        Ok(Self {
            buy_quantity,
            get_quantity,
            percentage: get_discount_percentage,
            fraction: Percentage::from(get_discount_percentage / Decimal::ONE_HUNDRED),
        })
    }

    /// Create a "buy X get Y free" rule: 100% off each earned unit.
    ///
    /// # Errors
    ///
    /// Returns [`PromotionError::NonPositiveQuantity`] if either quantity is
    /// zero.
    pub fn free(buy_quantity: u32, get_quantity: u32) -> Result<Self, PromotionError> {
        Self::new(buy_quantity, get_quantity, Decimal::ONE_HUNDRED)
    }

    /// Return the number of units that must be bought at full price.
    pub fn buy_quantity(&self) -> u32 {
        self.buy_quantity
    }

    /// Return the number of discounted units earned per set.
    pub fn get_quantity(&self) -> u32 {
        self.get_quantity
    }

    /// Return the discount applied to each earned unit, in `(0, 100]`.
    pub fn get_discount_percentage(&self) -> Decimal {
        self.percentage
    }

    /// The aggregate discount for a group of qualifying lines, in minor
    /// units.
    ///
    /// Units are pooled across the group. One set consumes `buy + get`
    /// units; a trailing partial set still earns discounted units once its
    /// paid-for portion is covered. Earned units are taken from the cheapest
    /// lines first (stable on price ties), which is the customer-favorable
    /// reading of the offer.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the minor-unit arithmetic overflows.
    pub(crate) fn group_discount(&self, lines: &[&CartLine<'_>]) -> Result<i64, PricingError> {
        if lines.is_empty() {
            return Ok(0);
        }

        let total_quantity: u64 = lines.iter().map(|line| line.quantity()).sum();

        // A lone full-price purchase never qualifies.
        let min_qualifying = u64::from(self.buy_quantity) + 1;
        if total_quantity < min_qualifying {
            return Ok(0);
        }

        let set_size = u64::from(self.buy_quantity) + u64::from(self.get_quantity);
        let complete_sets = total_quantity / set_size;
        let remainder = total_quantity % set_size;

        let partial_bonus = remainder
            .saturating_sub(u64::from(self.buy_quantity))
            .min(u64::from(self.get_quantity));

        let mut free_units = complete_sets * u64::from(self.get_quantity) + partial_bonus;

        let mut sorted: Vec<&CartLine<'_>> = lines.to_vec();
        sorted.sort_by_key(|line| line.item().price().to_minor_units());

        let mut discount = 0i64;

        for line in sorted {
            if free_units == 0 {
                break;
            }

            let taken = line.quantity().min(free_units);
            let unit_minor = line.item().price().to_minor_units();
            let taken_minor = scale_minor(unit_minor, Decimal::from(taken))?;

            discount = discount
                .checked_add(percent_of_minor(&self.fraction, taken_minor)?)
                .ok_or(PricingError::ScaleOverflow)?;

            free_units -= taken;
        }

        Ok(discount)
    }
}
