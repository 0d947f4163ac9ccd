//! Catalog
//!
//! Keyed registries for the descriptors the pricing engine consumes: items,
//! the categories they belong to, and their brands. The catalog is a
//! read-only lookup capability from the engine's point of view; callers
//! resolve keys here before adding items to a cart.

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

new_key_type! {
    /// Item Key
    pub struct ItemKey;
}

new_key_type! {
    /// Category Key
    pub struct CategoryKey;
}

new_key_type! {
    /// Brand Key
    pub struct BrandKey;
}

/// Errors raised while registering catalog entries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An item was registered with a zero or negative unit price.
    #[error("price must be a positive amount, got {0} minor units")]
    NonPositivePrice(i64),
}

/// Whether an item's amount is measured in discrete units or mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleUnit {
    /// Sold by mass; a cart line's amount is a weight.
    Weight,

    /// Sold by discrete units; a cart line's amount is a unit count.
    Quantity,
}

/// A brand items can be associated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    key: BrandKey,
    name: String,
}

impl Brand {
    /// Return the brand key.
    pub fn key(&self) -> BrandKey {
        self.key
    }

    /// Return the brand name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A category items can belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    key: CategoryKey,
    name: String,
}

impl Category {
    /// Return the category key.
    pub fn key(&self) -> CategoryKey {
        self.key
    }

    /// Return the category name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An item that can be sold by weight or by quantity.
///
/// Items are immutable once registered and identity-equal by key; carts and
/// promotions reference them, the catalog owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<'a> {
    key: ItemKey,
    name: String,
    price: Money<'a, Currency>,
    sale_unit: SaleUnit,
    categories: SmallVec<[CategoryKey; 5]>,
    brand: Option<BrandKey>,
}

impl<'a> Item<'a> {
    /// Return the item key.
    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// Return the item name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the unit price: per item when sold by quantity, per unit of
    /// mass when sold by weight.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Return how amounts of this item are measured.
    pub fn sale_unit(&self) -> SaleUnit {
        self.sale_unit
    }

    /// Return the keys of the categories this item belongs to.
    pub fn categories(&self) -> &[CategoryKey] {
        &self.categories
    }

    /// Return the optional brand key.
    pub fn brand(&self) -> Option<BrandKey> {
        self.brand
    }

    /// Whether this item is sold by mass.
    pub fn sold_by_weight(&self) -> bool {
        self.sale_unit == SaleUnit::Weight
    }

    /// Whether this item is sold by discrete units.
    pub fn sold_by_quantity(&self) -> bool {
        self.sale_unit == SaleUnit::Quantity
    }
}

/// Catalog
///
/// Simple keyed stores for brands, categories and items. Keys are minted on
/// insertion and are the only identity the rest of the crate uses.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    brands: SlotMap<BrandKey, Brand>,
    categories: SlotMap<CategoryKey, Category>,
    items: SlotMap<ItemKey, Item<'a>>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a brand and return its key.
    pub fn add_brand(&mut self, name: impl Into<String>) -> BrandKey {
        self.brands.insert_with_key(|key| Brand {
            key,
            name: name.into(),
        })
    }

    /// Look up a brand by key.
    pub fn brand(&self, key: BrandKey) -> Option<&Brand> {
        self.brands.get(key)
    }

    /// Register a category and return its key.
    pub fn add_category(&mut self, name: impl Into<String>) -> CategoryKey {
        self.categories.insert_with_key(|key| Category {
            key,
            name: name.into(),
        })
    }

    /// Look up a category by key.
    pub fn category(&self, key: CategoryKey) -> Option<&Category> {
        self.categories.get(key)
    }

    /// Register an item and return its key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NonPositivePrice`] if the unit price is zero
    /// or negative.
    pub fn add_item(
        &mut self,
        name: impl Into<String>,
        price: Money<'a, Currency>,
        sale_unit: SaleUnit,
        categories: SmallVec<[CategoryKey; 5]>,
        brand: Option<BrandKey>,
    ) -> Result<ItemKey, CatalogError> {
        if price.to_minor_units() <= 0 {
            return Err(CatalogError::NonPositivePrice(price.to_minor_units()));
        }

        Ok(self.items.insert_with_key(|key| Item {
            key,
            name: name.into(),
            price,
            sale_unit,
            categories,
            brand,
        }))
    }

    /// Look up an item by key.
    pub fn item(&self, key: ItemKey) -> Option<&Item<'a>> {
        self.items.get(key)
    }

    /// Return the number of registered items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
