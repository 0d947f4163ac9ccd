//! Cart Lines
//!
//! One cart entry binding an item to an amount and its current pricing
//! state. The original price is computed once at construction; repricing
//! only ever moves the discounted price between zero and that value.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};

use crate::{
    cart::CartError,
    catalog::Item,
    pricing::scale_minor,
    promotions::PromotionKey,
};

/// One entry in a cart: an item, an amount, and the current pricing state.
///
/// The amount is a unit count for quantity-sold items and a mass for
/// weight-sold items. Invariant: `0 <= discounted_price <= original_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    item: &'a Item<'a>,
    amount: Decimal,
    original_price: Money<'a, Currency>,
    discounted_price: Money<'a, Currency>,
    applied_promotion: Option<PromotionKey>,
}

impl<'a> CartLine<'a> {
    /// Create a line for the given item and positive amount.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NonPositiveAmount`] if the amount is zero or
    /// negative, or a wrapped pricing error if the original price cannot be
    /// represented.
    pub(crate) fn new(item: &'a Item<'a>, amount: Decimal) -> Result<Self, CartError> {
        if amount <= Decimal::ZERO {
            return Err(CartError::NonPositiveAmount(amount));
        }

        let original_minor = scale_minor(item.price().to_minor_units(), amount)?;
        let original_price = Money::from_minor(original_minor, item.price().currency());

        Ok(Self {
            item,
            amount,
            original_price,
            discounted_price: original_price,
            applied_promotion: None,
        })
    }

    /// Return the item this line refers to.
    pub fn item(&self) -> &'a Item<'a> {
        self.item
    }

    /// Return the amount: a unit count or a mass, depending on the item's
    /// sale unit.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Return the price before any promotion.
    pub fn original_price(&self) -> &Money<'a, Currency> {
        &self.original_price
    }

    /// Return the price after the currently applied promotion, if any.
    pub fn discounted_price(&self) -> &Money<'a, Currency> {
        &self.discounted_price
    }

    /// Return the key of the currently applied promotion, if any.
    pub fn applied_promotion(&self) -> Option<PromotionKey> {
        self.applied_promotion
    }

    /// Whether a promotion is currently applied.
    pub fn has_promotion(&self) -> bool {
        self.applied_promotion.is_some()
    }

    /// The difference between the original and discounted prices.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_minor(
            self.original_price.to_minor_units() - self.discounted_price.to_minor_units(),
            self.original_price.currency(),
        )
    }

    /// The whole number of units on this line; zero for weight-sold items.
    /// Fractional amounts are truncated, so 2.5 units pool as 2 toward
    /// multibuy qualification.
    pub fn quantity(&self) -> u64 {
        if self.item.sold_by_quantity() {
            self.amount.to_u64().unwrap_or(0)
        } else {
            0
        }
    }

    /// The mass on this line; zero for quantity-sold items.
    pub fn weight(&self) -> Decimal {
        if self.item.sold_by_weight() {
            self.amount
        } else {
            Decimal::ZERO
        }
    }

    /// Record a promotion and its discount, clamping the discounted price at
    /// zero.
    pub(crate) fn apply_promotion(&mut self, promotion: PromotionKey, discount_minor: i64) {
        self.applied_promotion = Some(promotion);

        let discounted = (self.original_price.to_minor_units() - discount_minor).max(0);
        self.discounted_price = Money::from_minor(discounted, self.original_price.currency());
    }

    /// Clear any applied promotion and restore the original price.
    pub(crate) fn remove_promotion(&mut self) {
        self.applied_promotion = None;
        self.discounted_price = self.original_price;
    }
}
