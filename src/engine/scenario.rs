//! Scenarios
//!
//! A scenario is one complete, mutually exclusive way of assigning
//! promotions to cart lines, scored by its total savings. The kind drives
//! how the winning scenario's discounts are written back to the lines:
//! group-priced scenarios split each aggregate discount proportionally by
//! original price, the individual scenario recomputes each line directly.

use smallvec::SmallVec;

use crate::promotions::PromotionKey;

/// How a scenario was generated and how its assignments are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// No promotions applied; every line at its original price.
    Baseline,

    /// A single buy-X-get-Y promotion across all its applicable lines.
    BuyXGetY,

    /// The best individual (per-line) promotion for each distinct item.
    Individual,

    /// The best buy-X-get-Y promotion per distinct target, combined.
    CombinedBuyXGetY,
}

/// One (promotion, participating lines, discount) entry within a scenario.
///
/// Lines are addressed by index into the cart's line list at generation
/// time; scenarios are scratch data discarded after application.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) promotion: PromotionKey,
    pub(crate) lines: SmallVec<[usize; 10]>,
    pub(crate) discount_minor: i64,
}

impl Assignment {
    /// Return the assigned promotion's key.
    pub fn promotion(&self) -> PromotionKey {
        self.promotion
    }

    /// Return the indexes of the participating lines.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Return the discount this assignment contributes, in minor units.
    pub fn discount_minor(&self) -> i64 {
        self.discount_minor
    }
}

/// One complete way of assigning promotions to cart lines.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub(crate) kind: ScenarioKind,
    pub(crate) assignments: Vec<Assignment>,
    pub(crate) total_savings_minor: i64,
}

impl Scenario {
    /// The always-present scenario with no promotions and zero savings.
    pub(crate) fn baseline() -> Self {
        Self {
            kind: ScenarioKind::Baseline,
            assignments: Vec::new(),
            total_savings_minor: 0,
        }
    }

    /// Return the scenario kind.
    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    /// Return the scenario's assignments.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Return the scenario's total savings, in minor units.
    pub fn total_savings_minor(&self) -> i64 {
        self.total_savings_minor
    }
}
