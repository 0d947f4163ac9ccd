//! Receipt
//!
//! A read-only pricing summary of a cart for presentation: one entry per
//! line plus the aggregate totals.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::catalog::{ItemKey, SaleUnit};

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine<'a> {
    /// Key of the purchased item.
    pub item: ItemKey,

    /// Item name.
    pub name: String,

    /// Amount purchased: a unit count or a mass, per the sale unit.
    pub amount: Decimal,

    /// How the amount is measured.
    pub sale_unit: SaleUnit,

    /// Line price before promotions.
    pub original_price: Money<'a, Currency>,

    /// Line price after the applied promotion, if any.
    pub discounted_price: Money<'a, Currency>,

    /// Name of the applied promotion, if any.
    pub promotion: Option<String>,
}

impl<'a> ReceiptLine<'a> {
    /// The difference between the original and discounted prices.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_minor(
            self.original_price.to_minor_units() - self.discounted_price.to_minor_units(),
            self.original_price.currency(),
        )
    }
}

/// Final pricing summary for a cart.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: Vec<ReceiptLine<'a>>,
    subtotal: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> Receipt<'a> {
    /// Create a receipt from per-line entries and totals.
    pub(crate) fn new(
        lines: Vec<ReceiptLine<'a>>,
        subtotal: Money<'a, Currency>,
        total: Money<'a, Currency>,
    ) -> Self {
        Self {
            lines,
            subtotal,
            total,
        }
    }

    /// Return the per-line entries in cart order.
    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// Total cost before any promotion applications.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Total amount payable after promotion applications.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// The savings made by the applied promotions.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_minor(
            self.subtotal.to_minor_units() - self.total.to_minor_units(),
            self.subtotal.currency(),
        )
    }

    /// Whether the receipt holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use rusty_money::iso::GBP;

    use super::*;

    #[test]
    fn savings_is_subtotal_minus_total() {
        let receipt = Receipt::new(
            Vec::new(),
            Money::from_minor(1000, GBP),
            Money::from_minor(750, GBP),
        );

        assert_eq!(receipt.savings(), Money::from_minor(250, GBP));
        assert!(receipt.is_empty());
    }

    #[test]
    fn line_savings_reflects_the_applied_discount() {
        let line = ReceiptLine {
            item: ItemKey::default(),
            name: "Widget".to_string(),
            amount: dec!(1),
            sale_unit: SaleUnit::Quantity,
            original_price: Money::from_minor(500, GBP),
            discounted_price: Money::from_minor(300, GBP),
            promotion: Some("Money off".to_string()),
        };

        assert_eq!(line.savings(), Money::from_minor(200, GBP));
    }
}
