//! Promotion Engine
//!
//! Owns the promotion set and, on every cart mutation, searches the
//! candidate allocation scenarios for the one that maximises the customer's
//! total savings, then writes the winner back onto the lines.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    cart::line::CartLine,
    catalog::ItemKey,
    pricing::{PricingError, proportional_share},
    promotions::{Promotion, PromotionKey, TargetGroupKey},
};

pub mod scenario;

use scenario::{Assignment, Scenario, ScenarioKind};

/// The engine holding the promotion set and the scenario search.
///
/// Promotions are kept in insertion order with identity by key; everything
/// else is scratch data computed per reprice call and discarded.
#[derive(Debug, Default)]
pub struct PromotionEngine<'a> {
    promotions: Vec<Promotion<'a>>,
}

impl<'a> PromotionEngine<'a> {
    /// Create an engine with no promotions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a promotion. Adding a key that is already present is a
    /// no-op.
    pub fn add(&mut self, promotion: Promotion<'a>) {
        if self
            .promotions
            .iter()
            .all(|existing| existing.key() != promotion.key())
        {
            self.promotions.push(promotion);
        }
    }

    /// Remove the promotion with the given key, if present.
    pub fn remove(&mut self, key: PromotionKey) {
        self.promotions.retain(|promotion| promotion.key() != key);
    }

    /// Look up a promotion by key.
    pub fn promotion(&self, key: PromotionKey) -> Option<&Promotion<'a>> {
        self.promotions
            .iter()
            .find(|promotion| promotion.key() == key)
    }

    /// Return every registered promotion in insertion order.
    pub fn promotions(&self) -> &[Promotion<'a>] {
        &self.promotions
    }

    /// Return the promotions active at the given instant, in insertion
    /// order.
    pub fn active_promotions(&self, now: DateTime<Utc>) -> Vec<&Promotion<'a>> {
        self.promotions
            .iter()
            .filter(|promotion| promotion.active(now))
            .collect()
    }

    /// Return the number of registered promotions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Whether no promotions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// Re-run the scenario search over the given lines and apply the
    /// winner.
    ///
    /// Every line's prior allocation is cleared first. The winning scenario
    /// is the one with the strictly greatest total savings, ties going to
    /// the earliest generated; it is applied only if its savings are
    /// strictly positive, so degenerate input (no lines, no active
    /// promotions) simply leaves every line at its original price.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] only if minor-unit arithmetic overflows;
    /// valid carts and promotions always reprice.
    pub fn reprice(
        &self,
        lines: &mut [CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        if lines.is_empty() {
            return Ok(());
        }

        for line in &mut *lines {
            line.remove_promotion();
        }

        let scenarios = self.build_scenarios(lines, now)?;

        let mut winner: Option<&Scenario> = None;

        for scenario in &scenarios {
            if winner.is_none_or(|best| scenario.total_savings_minor > best.total_savings_minor) {
                winner = Some(scenario);
            }
        }

        if let Some(winner) = winner {
            debug!(
                kind = ?winner.kind,
                savings_minor = winner.total_savings_minor,
                candidates = scenarios.len(),
                "selected pricing scenario"
            );

            if winner.total_savings_minor > 0 {
                self.apply_scenario(lines, winner, now)?;
            }
        }

        Ok(())
    }

    /// Generate the candidate scenarios for the given lines.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if minor-unit arithmetic overflows.
    pub fn build_scenarios(
        &self,
        lines: &[CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<Vec<Scenario>, PricingError> {
        let mut scenarios = vec![Scenario::baseline()];

        let buy_x_get_y: Vec<&Promotion<'a>> = self
            .active_promotions(now)
            .into_iter()
            .filter(|promotion| promotion.is_buy_x_get_y())
            .collect();

        for &promotion in &buy_x_get_y {
            let scenario = Self::buy_x_get_y_scenario(promotion, lines, now)?;

            if scenario.total_savings_minor > 0 {
                scenarios.push(scenario);
            }
        }

        let individual = self.individual_scenario(lines, now)?;

        if individual.total_savings_minor > 0 {
            scenarios.push(individual);
        }

        if buy_x_get_y.len() > 1 {
            let combined = Self::combined_buy_x_get_y_scenario(&buy_x_get_y, lines, now)?;

            if combined.total_savings_minor > 0 {
                scenarios.push(combined);
            }
        }

        Ok(scenarios)
    }

    /// One buy-X-get-Y promotion applied to all its applicable lines.
    fn buy_x_get_y_scenario(
        promotion: &Promotion<'a>,
        lines: &[CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<Scenario, PricingError> {
        let (indexes, group) = Self::applicable_lines(promotion, lines, now);
        let discount = promotion.group_discount(&group, now)?;

        Ok(Scenario {
            kind: ScenarioKind::BuyXGetY,
            assignments: vec![Assignment {
                promotion: promotion.key(),
                lines: indexes,
                discount_minor: discount,
            }],
            total_savings_minor: discount,
        })
    }

    /// The best non-group promotion for each group of lines sharing an item,
    /// summed into one scenario.
    fn individual_scenario(
        &self,
        lines: &[CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<Scenario, PricingError> {
        // Group lines by item identity, preserving first-seen order.
        let mut order: Vec<ItemKey> = Vec::new();
        let mut groups: FxHashMap<ItemKey, SmallVec<[usize; 10]>> = FxHashMap::default();

        for (index, line) in lines.iter().enumerate() {
            let key = line.item().key();

            if !groups.contains_key(&key) {
                order.push(key);
            }

            groups.entry(key).or_default().push(index);
        }

        let candidates: Vec<&Promotion<'a>> = self
            .active_promotions(now)
            .into_iter()
            .filter(|promotion| !promotion.is_buy_x_get_y())
            .collect();

        let mut assignments = Vec::new();
        let mut total = 0i64;

        for item in order {
            let Some(indexes) = groups.remove(&item) else {
                continue;
            };

            let group: Vec<&CartLine<'a>> = lines
                .iter()
                .enumerate()
                .filter(|(index, _)| indexes.contains(index))
                .map(|(_, line)| line)
                .collect();

            let mut best: Option<(&Promotion<'a>, i64)> = None;

            for &promotion in &candidates {
                if !group.iter().any(|line| promotion.can_apply_to(line, now)) {
                    continue;
                }

                let mut discount = 0i64;

                for line in &group {
                    discount = discount
                        .checked_add(promotion.line_discount(line, now)?)
                        .ok_or(PricingError::ScaleOverflow)?;
                }

                // Strictly greater keeps the earliest-registered promotion on
                // ties and ignores zero-value candidates.
                if discount > best.map_or(0, |(_, value)| value) {
                    best = Some((promotion, discount));
                }
            }

            if let Some((promotion, discount)) = best {
                assignments.push(Assignment {
                    promotion: promotion.key(),
                    lines: indexes,
                    discount_minor: discount,
                });

                total = total
                    .checked_add(discount)
                    .ok_or(PricingError::ScaleOverflow)?;
            }
        }

        Ok(Scenario {
            kind: ScenarioKind::Individual,
            assignments,
            total_savings_minor: total,
        })
    }

    /// The best buy-X-get-Y promotion per distinct target, combined into one
    /// scenario.
    ///
    /// Lines matched by more than one distinct target key participate in --
    /// and are discounted under -- each of them independently; nothing
    /// deduplicates overlapping targets.
    fn combined_buy_x_get_y_scenario(
        promotions: &[&Promotion<'a>],
        lines: &[CartLine<'a>],
        now: DateTime<Utc>,
    ) -> Result<Scenario, PricingError> {
        let mut order: Vec<TargetGroupKey> = Vec::new();
        let mut kept: FxHashMap<TargetGroupKey, Assignment> = FxHashMap::default();

        for &promotion in promotions {
            let (indexes, group) = Self::applicable_lines(promotion, lines, now);

            if group.is_empty() {
                continue;
            }

            let discount = promotion.group_discount(&group, now)?;

            if discount <= 0 {
                continue;
            }

            let key = promotion.target().group_key();
            let replace = kept
                .get(&key)
                .is_none_or(|existing| existing.discount_minor < discount);

            if replace {
                if !kept.contains_key(&key) {
                    order.push(key.clone());
                }

                kept.insert(
                    key,
                    Assignment {
                        promotion: promotion.key(),
                        lines: indexes,
                        discount_minor: discount,
                    },
                );
            }
        }

        let mut assignments = Vec::new();
        let mut total = 0i64;

        for key in &order {
            if let Some(assignment) = kept.remove(key) {
                total = total
                    .checked_add(assignment.discount_minor)
                    .ok_or(PricingError::ScaleOverflow)?;

                assignments.push(assignment);
            }
        }

        Ok(Scenario {
            kind: ScenarioKind::CombinedBuyXGetY,
            assignments,
            total_savings_minor: total,
        })
    }

    /// Indexes and references of the lines a promotion can apply to.
    fn applicable_lines<'b>(
        promotion: &Promotion<'a>,
        lines: &'b [CartLine<'a>],
        now: DateTime<Utc>,
    ) -> (SmallVec<[usize; 10]>, Vec<&'b CartLine<'a>>) {
        let mut indexes = SmallVec::new();
        let mut group = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if promotion.can_apply_to(line, now) {
                indexes.push(index);
                group.push(line);
            }
        }

        (indexes, group)
    }

    /// Write the winning scenario's discounts back onto the lines.
    fn apply_scenario(
        &self,
        lines: &mut [CartLine<'a>],
        scenario: &Scenario,
        now: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        match scenario.kind {
            ScenarioKind::Baseline => Ok(()),
            ScenarioKind::BuyXGetY | ScenarioKind::CombinedBuyXGetY => {
                for assignment in &scenario.assignments {
                    Self::apply_proportional(lines, assignment)?;
                }

                Ok(())
            }
            ScenarioKind::Individual => {
                for assignment in &scenario.assignments {
                    self.apply_individual(lines, assignment, now)?;
                }

                Ok(())
            }
        }
    }

    /// Distribute an aggregate discount across the assignment's lines
    /// proportionally by original price.
    fn apply_proportional(
        lines: &mut [CartLine<'a>],
        assignment: &Assignment,
    ) -> Result<(), PricingError> {
        let group_original: i64 = lines
            .iter()
            .enumerate()
            .filter(|(index, _)| assignment.lines.contains(index))
            .map(|(_, line)| line.original_price().to_minor_units())
            .sum();

        if group_original <= 0 {
            return Ok(());
        }

        for (index, line) in lines.iter_mut().enumerate() {
            if !assignment.lines.contains(&index) {
                continue;
            }

            let share = proportional_share(
                assignment.discount_minor,
                line.original_price().to_minor_units(),
                group_original,
            )?;

            line.apply_promotion(assignment.promotion, share);
        }

        Ok(())
    }

    /// Recompute and apply each line's own discount directly.
    fn apply_individual(
        &self,
        lines: &mut [CartLine<'a>],
        assignment: &Assignment,
        now: DateTime<Utc>,
    ) -> Result<(), PricingError> {
        let Some(promotion) = self.promotion(assignment.promotion) else {
            return Ok(());
        };

        for (index, line) in lines.iter_mut().enumerate() {
            if !assignment.lines.contains(&index) {
                continue;
            }

            if !promotion.can_apply_to(line, now) {
                continue;
            }

            let discount = promotion.line_discount(line, now)?;

            if discount > 0 {
                line.apply_promotion(assignment.promotion, discount);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;
    use rusty_money::{Money, iso::USD};
    use slotmap::SlotMap;
    use smallvec::SmallVec;
    use testresult::TestResult;

    use crate::{
        catalog::{Catalog, SaleUnit},
        promotions::{
            PromotionKind, Schedule, Target, buy_x_get_y::BuyXGetY,
            percentage_discount::PercentageDiscount,
        },
    };

    use super::*;

    struct Fixture {
        catalog: Catalog<'static>,
        widget: ItemKey,
        keys: SlotMap<PromotionKey, ()>,
        now: DateTime<Utc>,
    }

    fn fixture() -> TestResult<Fixture> {
        let mut catalog = Catalog::new();

        let widget = catalog.add_item(
            "Widget",
            Money::from_minor(5_000, USD),
            SaleUnit::Quantity,
            SmallVec::new(),
            None,
        )?;

        Ok(Fixture {
            catalog,
            widget,
            keys: SlotMap::with_key(),
            now: Utc::now(),
        })
    }

    fn percent_off(
        fixture: &mut Fixture,
        name: &str,
        percentage: rust_decimal::Decimal,
    ) -> TestResult<Promotion<'static>> {
        Ok(Promotion::new(
            fixture.keys.insert(()),
            name,
            Schedule::new(fixture.now - TimeDelta::hours(1), None),
            Target::any_item(),
            PromotionKind::PercentageDiscount(PercentageDiscount::new(percentage)?),
        ))
    }

    #[test]
    fn add_is_a_no_op_for_duplicate_keys() -> TestResult {
        let mut fixture = fixture()?;
        let promotion = percent_off(&mut fixture, "Ten percent", dec!(10))?;

        let mut engine = PromotionEngine::new();
        engine.add(promotion.clone());
        engine.add(promotion);

        assert_eq!(engine.len(), 1);

        Ok(())
    }

    #[test]
    fn remove_drops_the_promotion() -> TestResult {
        let mut fixture = fixture()?;
        let promotion = percent_off(&mut fixture, "Ten percent", dec!(10))?;
        let key = promotion.key();

        let mut engine = PromotionEngine::new();
        engine.add(promotion);
        engine.remove(key);

        assert!(engine.is_empty());
        assert!(engine.promotion(key).is_none());

        Ok(())
    }

    #[test]
    fn active_promotions_filters_by_schedule() -> TestResult {
        let mut fixture = fixture()?;
        let now = fixture.now;

        let live = percent_off(&mut fixture, "Live", dec!(10))?;
        let upcoming = Promotion::new(
            fixture.keys.insert(()),
            "Upcoming",
            Schedule::new(now + TimeDelta::days(1), None),
            Target::any_item(),
            PromotionKind::PercentageDiscount(PercentageDiscount::new(dec!(50))?),
        );

        let mut engine = PromotionEngine::new();
        engine.add(live);
        engine.add(upcoming);

        let active = engine.active_promotions(now);

        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|p| p.name()), Some("Live"));

        Ok(())
    }

    #[test]
    fn reprice_on_empty_lines_is_a_no_op() -> TestResult {
        let mut fixture = fixture()?;
        let promotion = percent_off(&mut fixture, "Ten percent", dec!(10))?;

        let mut engine = PromotionEngine::new();
        engine.add(promotion);

        let mut lines: Vec<CartLine<'_>> = Vec::new();
        engine.reprice(&mut lines, fixture.now)?;

        Ok(())
    }

    #[test]
    fn reprice_without_winning_scenario_leaves_full_price() -> TestResult {
        let fixture = fixture()?;
        let engine = PromotionEngine::new();

        let item = fixture.catalog.item(fixture.widget).ok_or("missing item")?;
        let mut lines = vec![CartLine::new(item, dec!(2))?];

        engine.reprice(&mut lines, fixture.now)?;

        let line = lines.first().ok_or("missing line")?;
        assert!(!line.has_promotion());
        assert_eq!(line.discounted_price(), line.original_price());

        Ok(())
    }

    #[test]
    fn reprice_clears_stale_allocations() -> TestResult {
        let mut fixture = fixture()?;
        let promotion = percent_off(&mut fixture, "Ten percent", dec!(10))?;
        let key = promotion.key();

        let mut engine = PromotionEngine::new();
        engine.add(promotion);

        let item = fixture.catalog.item(fixture.widget).ok_or("missing item")?;
        let mut lines = vec![CartLine::new(item, dec!(1))?];

        engine.reprice(&mut lines, fixture.now)?;
        assert_eq!(
            lines.first().and_then(CartLine::applied_promotion),
            Some(key)
        );

        // With the promotion gone, a fresh reprice must drop the allocation.
        engine.remove(key);
        engine.reprice(&mut lines, fixture.now)?;

        let line = lines.first().ok_or("missing line")?;
        assert!(!line.has_promotion());
        assert_eq!(line.discounted_price(), line.original_price());

        Ok(())
    }

    #[test]
    fn buy_x_get_y_discount_is_split_proportionally() -> TestResult {
        let mut fixture = fixture()?;

        let gadget = fixture.catalog.add_item(
            "Gadget",
            Money::from_minor(3_000, USD),
            SaleUnit::Quantity,
            SmallVec::new(),
            None,
        )?;

        let promotion = Promotion::new(
            fixture.keys.insert(()),
            "Buy 2 Get 1 Free",
            Schedule::new(fixture.now - TimeDelta::hours(1), None),
            Target::any_item(),
            PromotionKind::BuyXGetY(BuyXGetY::free(2, 1)?),
        );
        let key = promotion.key();

        let mut engine = PromotionEngine::new();
        engine.add(promotion);

        let widget = fixture.catalog.item(fixture.widget).ok_or("missing item")?;
        let gadget = fixture.catalog.item(gadget).ok_or("missing item")?;

        // $100 + $30 pooled over three units; the free unit is the $30 one.
        let mut lines = vec![CartLine::new(widget, dec!(2))?, CartLine::new(gadget, dec!(1))?];

        engine.reprice(&mut lines, fixture.now)?;

        // $30 split by original price: $100/$130 and $30/$130.
        let widget_line = lines.first().ok_or("missing line")?;
        let gadget_line = lines.get(1).ok_or("missing line")?;

        assert_eq!(widget_line.applied_promotion(), Some(key));
        assert_eq!(gadget_line.applied_promotion(), Some(key));
        assert_eq!(widget_line.savings(), Money::from_minor(2_308, USD));
        assert_eq!(gadget_line.savings(), Money::from_minor(692, USD));

        Ok(())
    }
}
