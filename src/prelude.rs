//! Trellis prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, line::CartLine},
    catalog::{
        Brand, BrandKey, Catalog, CatalogError, Category, CategoryKey, Item, ItemKey, SaleUnit,
    },
    engine::{
        PromotionEngine,
        scenario::{Assignment, Scenario, ScenarioKind},
    },
    pricing::PricingError,
    promotions::{
        Promotion, PromotionError, PromotionKey, PromotionKind, Schedule, Target,
        buy_x_get_y::BuyXGetY, flat_discount::FlatDiscount,
        percentage_discount::PercentageDiscount, weight_threshold::WeightThreshold,
    },
    receipt::{Receipt, ReceiptLine},
};
