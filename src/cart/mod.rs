//! Cart
//!
//! An ordered collection of cart lines bound to a promotion engine. Every
//! mutation triggers a full reprice through the engine, so aggregate totals
//! are always plain per-line sums with no cached state to go stale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    catalog::{Item, ItemKey},
    engine::PromotionEngine,
    pricing::PricingError,
    receipt::{Receipt, ReceiptLine},
};

pub mod line;

use line::CartLine;

/// Errors related to cart mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// A line was added with a zero or negative amount.
    #[error("amount must be a positive number, got {0}")]
    NonPositiveAmount(Decimal),

    /// An item's currency differs from the cart currency (item currency,
    /// cart currency).
    #[error("item has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// A line index was out of range.
    #[error("line {0} not found")]
    LineNotFound(usize),

    /// Wrapped pricing arithmetic error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A shopping cart.
///
/// Lines are kept in insertion order and duplicate items are not merged:
/// adding the same item twice yields two distinct lines. The promotion
/// engine is injected at construction and consulted on every mutation.
#[derive(Debug)]
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    engine: &'a PromotionEngine<'a>,
    currency: &'a Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart priced by the given engine.
    #[must_use]
    pub fn new(engine: &'a PromotionEngine<'a>, currency: &'a Currency) -> Self {
        Self {
            lines: Vec::new(),
            engine,
            currency,
        }
    }

    /// Add an item to the cart and reprice it, returning the new line's
    /// index.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the amount is not positive, the item's
    /// currency differs from the cart's, or repricing arithmetic overflows.
    pub fn add(
        &mut self,
        item: &'a Item<'a>,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<usize, CartError> {
        let item_currency = item.price().currency();

        if item_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                item_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        let line = CartLine::new(item, amount)?;
        self.lines.push(line);

        let engine = self.engine;
        engine.reprice(&mut self.lines, now)?;

        Ok(self.lines.len() - 1)
    }

    /// Remove every line holding the given item and reprice the remainder,
    /// returning the removed lines. A missing item is a no-op returning an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if repricing arithmetic overflows.
    pub fn remove(
        &mut self,
        item: ItemKey,
        now: DateTime<Utc>,
    ) -> Result<Vec<CartLine<'a>>, CartError> {
        let (removed, kept): (Vec<CartLine<'a>>, Vec<CartLine<'a>>) = self
            .lines
            .drain(..)
            .partition(|line| line.item().key() == item);

        self.lines = kept;

        if !removed.is_empty() {
            let engine = self.engine;
            engine.reprice(&mut self.lines, now)?;
        }

        Ok(removed)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Get a line by its index.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the index is out of range.
    pub fn line(&self, index: usize) -> Result<&CartLine<'a>, CartError> {
        self.lines.get(index).ok_or(CartError::LineNotFound(index))
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine<'a>> {
        self.lines.iter()
    }

    /// Return the number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Return the cart currency.
    #[must_use]
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Return the engine pricing this cart.
    #[must_use]
    pub fn engine(&self) -> &'a PromotionEngine<'a> {
        self.engine
    }

    /// The sum of every line's original price.
    pub fn total_original_price(&self) -> Money<'a, Currency> {
        let minor: i64 = self
            .lines
            .iter()
            .map(|line| line.original_price().to_minor_units())
            .sum();

        Money::from_minor(minor, self.currency)
    }

    /// The sum of every line's discounted price.
    pub fn total_discounted_price(&self) -> Money<'a, Currency> {
        let minor: i64 = self
            .lines
            .iter()
            .map(|line| line.discounted_price().to_minor_units())
            .sum();

        Money::from_minor(minor, self.currency)
    }

    /// The difference between the original and discounted totals.
    pub fn total_savings(&self) -> Money<'a, Currency> {
        Money::from_minor(
            self.total_original_price().to_minor_units()
                - self.total_discounted_price().to_minor_units(),
            self.currency,
        )
    }

    /// The summed amounts of the quantity-sold lines.
    pub fn item_count(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|line| line.item().sold_by_quantity())
            .map(CartLine::amount)
            .sum()
    }

    /// The summed amounts of the weight-sold lines.
    pub fn total_weight(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|line| line.item().sold_by_weight())
            .map(CartLine::amount)
            .sum()
    }

    /// Build a read-only pricing summary of the cart, resolving promotion
    /// names through the engine.
    pub fn receipt(&self) -> Receipt<'a> {
        let lines = self
            .lines
            .iter()
            .map(|line| ReceiptLine {
                item: line.item().key(),
                name: line.item().name().to_string(),
                amount: line.amount(),
                sale_unit: line.item().sale_unit(),
                original_price: *line.original_price(),
                discounted_price: *line.discounted_price(),
                promotion: line
                    .applied_promotion()
                    .and_then(|key| self.engine.promotion(key))
                    .map(|promotion| promotion.name().to_string()),
            })
            .collect();

        Receipt::new(
            lines,
            self.total_original_price(),
            self.total_discounted_price(),
        )
    }
}
