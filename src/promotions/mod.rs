//! Promotions
//!
//! A promotion binds a schedule and a target filter to one of a closed set of
//! discount rules. Keeping the rule set a sum type makes "every kind must
//! price itself" a compile-time obligation rather than a runtime contract.

use chrono::{DateTime, Utc};
use slotmap::new_key_type;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    cart::line::CartLine,
    catalog::{CategoryKey, Item, ItemKey},
    pricing::PricingError,
};

pub mod buy_x_get_y;
pub mod flat_discount;
pub mod percentage_discount;
pub mod weight_threshold;

use buy_x_get_y::BuyXGetY;
use flat_discount::FlatDiscount;
use percentage_discount::PercentageDiscount;
use rust_decimal::Decimal;
use weight_threshold::WeightThreshold;

new_key_type! {
    /// Promotion Key
    pub struct PromotionKey;
}

/// Errors raised while constructing a promotion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// A fixed discount amount was zero or negative.
    #[error("discount_amount must be a positive amount, got {0} minor units")]
    NonPositiveDiscountAmount(i64),

    /// A quantity field was zero.
    #[error("{field} must be a positive integer, got {value}")]
    NonPositiveQuantity {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u32,
    },

    /// A percentage field fell outside its allowed range.
    #[error("{field} must be greater than 0 and at most {max}, got {value}")]
    PercentageOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Upper bound of the allowed range.
        max: u32,
        /// The rejected value.
        value: Decimal,
    },

    /// A threshold weight was zero or negative.
    #[error("threshold_weight must be a positive amount, got {0}")]
    NonPositiveThresholdWeight(Decimal),
}

/// The time window in which a promotion is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Create a schedule; `None` for `ends_at` leaves it open-ended.
    #[must_use]
    pub fn new(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Self {
        Self { starts_at, ends_at }
    }

    /// Return the start of the window.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Return the optional end of the window.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    /// Whether the window covers the given instant. Both bounds are
    /// inclusive.
    pub fn active(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at && self.ends_at.is_none_or(|end| now <= end)
    }
}

/// The filter restricting which items a promotion can affect.
///
/// An empty key set matches every item; variant-specific sale-unit gating
/// still applies on top of the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Match items by their own key.
    Items(SmallVec<[ItemKey; 5]>),

    /// Match items through their category membership.
    Categories(SmallVec<[CategoryKey; 5]>),
}

impl Target {
    /// A target matching every item.
    #[must_use]
    pub fn any_item() -> Self {
        Target::Items(SmallVec::new())
    }

    /// A target matching the given item keys.
    pub fn items(keys: &[ItemKey]) -> Self {
        Target::Items(keys.iter().copied().collect())
    }

    /// A target matching items in any of the given categories.
    pub fn categories(keys: &[CategoryKey]) -> Self {
        Target::Categories(keys.iter().copied().collect())
    }

    /// Whether this target matches the given item.
    pub fn matches(&self, item: &Item<'_>) -> bool {
        match self {
            Target::Items(keys) => keys.is_empty() || keys.contains(&item.key()),
            Target::Categories(keys) => {
                keys.is_empty() || item.categories().iter().any(|key| keys.contains(key))
            }
        }
    }

    /// Identity of this target for grouping equivalent targets, independent
    /// of key ordering.
    pub(crate) fn group_key(&self) -> TargetGroupKey {
        match self {
            Target::Items(keys) => {
                let mut keys: Vec<ItemKey> = keys.iter().copied().collect();
                keys.sort_unstable();
                TargetGroupKey::Items(keys)
            }
            Target::Categories(keys) => {
                let mut keys: Vec<CategoryKey> = keys.iter().copied().collect();
                keys.sort_unstable();
                TargetGroupKey::Categories(keys)
            }
        }
    }
}

/// Sorted-key identity of a [`Target`], used to group promotions that address
/// the same audience.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TargetGroupKey {
    Items(Vec<ItemKey>),
    Categories(Vec<CategoryKey>),
}

/// The concrete rule a promotion applies.
#[derive(Debug, Clone)]
pub enum PromotionKind<'a> {
    /// Fixed amount off each targeted line, capped at the line's price.
    FlatDiscount(FlatDiscount<'a>),

    /// Percentage off each targeted line.
    PercentageDiscount(PercentageDiscount),

    /// Buy X units, get Y units discounted, priced over a group of
    /// quantity-sold lines.
    BuyXGetY(BuyXGetY),

    /// Percentage off weight-sold lines at or above a threshold weight.
    WeightThreshold(WeightThreshold),
}

/// A named, scheduled, targeted promotional rule.
///
/// Immutable once created; identity is the key.
#[derive(Debug, Clone)]
pub struct Promotion<'a> {
    key: PromotionKey,
    name: String,
    schedule: Schedule,
    target: Target,
    kind: PromotionKind<'a>,
}

impl<'a> Promotion<'a> {
    /// Create a promotion from an already-validated kind.
    pub fn new(
        key: PromotionKey,
        name: impl Into<String>,
        schedule: Schedule,
        target: Target,
        kind: PromotionKind<'a>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            schedule,
            target,
            kind,
        }
    }

    /// Return the promotion key.
    pub fn key(&self) -> PromotionKey {
        self.key
    }

    /// Return the promotion name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Return the target filter.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Return the rule this promotion applies.
    pub fn kind(&self) -> &PromotionKind<'a> {
        &self.kind
    }

    /// Whether the promotion is priced over a group of lines rather than
    /// line by line.
    pub fn is_buy_x_get_y(&self) -> bool {
        matches!(self.kind, PromotionKind::BuyXGetY(_))
    }

    /// Whether the promotion is active at the given instant.
    pub fn active(&self, now: DateTime<Utc>) -> bool {
        self.schedule.active(now)
    }

    /// Whether this promotion may affect the given item at the given
    /// instant: active and target match.
    pub fn applicable_to_item(&self, item: &Item<'_>, now: DateTime<Utc>) -> bool {
        self.active(now) && self.target.matches(item)
    }

    /// Whether this promotion can affect the given cart line, including the
    /// variant's sale-unit gating.
    pub fn can_apply_to(&self, line: &CartLine<'a>, now: DateTime<Utc>) -> bool {
        if !self.applicable_to_item(line.item(), now) {
            return false;
        }

        match &self.kind {
            PromotionKind::FlatDiscount(_) | PromotionKind::PercentageDiscount(_) => true,
            PromotionKind::BuyXGetY(_) => line.item().sold_by_quantity(),
            PromotionKind::WeightThreshold(_) => line.item().sold_by_weight(),
        }
    }

    /// The discount this promotion grants a single line, in minor units.
    /// Zero when the line does not qualify.
    ///
    /// Group-priced kinds ([`PromotionKind::BuyXGetY`]) have no per-line
    /// value and return zero here; use [`Promotion::group_discount`].
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the minor-unit arithmetic overflows.
    pub fn line_discount(&self, line: &CartLine<'a>, now: DateTime<Utc>) -> Result<i64, PricingError> {
        if !self.can_apply_to(line, now) {
            return Ok(0);
        }

        match &self.kind {
            PromotionKind::FlatDiscount(flat) => Ok(flat.discount_for(line)),
            PromotionKind::PercentageDiscount(percentage) => percentage.discount_for(line),
            PromotionKind::WeightThreshold(threshold) => threshold.discount_for(line),
            PromotionKind::BuyXGetY(_) => Ok(0),
        }
    }

    /// The aggregate discount this promotion grants a group of lines, in
    /// minor units. Lines the promotion cannot apply to are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the minor-unit arithmetic overflows.
    pub fn group_discount(
        &self,
        lines: &[&CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<i64, PricingError> {
        match &self.kind {
            PromotionKind::BuyXGetY(rule) => {
                let applicable: Vec<&CartLine<'a>> = lines
                    .iter()
                    .copied()
                    .filter(|line| self.can_apply_to(line, now))
                    .collect();

                rule.group_discount(&applicable)
            }
            _ => {
                let mut total = 0i64;

                for line in lines {
                    total = total
                        .checked_add(self.line_discount(line, now)?)
                        .ok_or(PricingError::ScaleOverflow)?;
                }

                Ok(total)
            }
        }
    }
}
