//! Products

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::ids::ProductId;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Errors raised by catalog updates.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A product with the same identifier is already in the catalog.
    #[error("Product {0} already exists")]
    DuplicateProduct(ProductId),

    /// A product's currency differs from the catalog currency (product, product currency, catalog currency).
    #[error("Product {0} has currency {1}, but catalog has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),

    /// No product with this identifier exists.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    pub description: String,

    /// Product category (e.g. "SDP Kits")
    pub category: String,

    /// Bullet-point specifications
    pub specifications: Vec<String>,

    /// Current catalog price
    pub price: Money<'a, Currency>,

    /// Units on hand
    pub stock: u32,

    /// Whether the product can be added to a cart
    pub in_stock: bool,

    /// Whether the product is highlighted in the storefront
    pub featured: bool,
}

impl<'a> Product<'a> {
    /// Create a product with the given price and stock level; availability follows stock.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Money<'a, Currency>,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            specifications: Vec::new(),
            price,
            stock,
            in_stock: stock > 0,
            featured: false,
        }
    }
}

/// Ordering applied to catalog query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    /// Alphabetical by name.
    #[default]
    Name,

    /// Cheapest first.
    PriceLowToHigh,

    /// Most expensive first.
    PriceHighToLow,

    /// Largest stock first.
    Stock,
}

/// Catalog filter; every populated field must match.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Only products in this category.
    pub category: Option<String>,

    /// Exclude products that are out of stock.
    pub in_stock_only: bool,

    /// Case-insensitive match against name or description.
    pub search: Option<String>,

    /// Result ordering.
    pub sort: ProductSort,
}

impl ProductQuery {
    fn matches(&self, product: &Product<'_>, needle: Option<&str>) -> bool {
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| product.category == category);

        let matches_stock = !self.in_stock_only || product.in_stock;

        let matches_search = needle.is_none_or(|needle| {
            product.name.to_lowercase().contains(needle)
                || product.description.to_lowercase().contains(needle)
        });

        matches_category && matches_stock && matches_search
    }
}

/// Product catalog
#[derive(Debug)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
    ids: FxHashMap<ProductId, ProductKey>,
    currency: &'static Currency,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog priced in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            products: SlotMap::with_key(),
            ids: FxHashMap::default(),
            currency,
        }
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateProduct`]: the identifier is already taken.
    /// - [`CatalogError::CurrencyMismatch`]: the product is priced in another currency.
    pub fn insert(&mut self, product: Product<'a>) -> Result<ProductKey, CatalogError> {
        if self.ids.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }

        self.ensure_currency(&product.id, &product.price)?;

        let id = product.id.clone();
        let key = self.products.insert(product);

        self.ids.insert(id, key);

        Ok(key)
    }

    /// Get a product by key.
    pub fn get(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Resolve a product identifier to its key.
    pub fn key_of(&self, id: &ProductId) -> Option<ProductKey> {
        self.ids.get(id).copied()
    }

    /// Get a product by identifier.
    pub fn by_id(&self, id: &ProductId) -> Option<&Product<'a>> {
        self.key_of(id).and_then(|key| self.products.get(key))
    }

    /// Change a product's catalog price. Existing orders are unaffected.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ProductNotFound`]: no such product.
    /// - [`CatalogError::CurrencyMismatch`]: the new price is in another currency.
    pub fn set_price(
        &mut self,
        id: &ProductId,
        price: Money<'a, Currency>,
    ) -> Result<(), CatalogError> {
        self.ensure_currency(id, &price)?;

        let product = self.product_mut(id)?;

        product.price = price;

        Ok(())
    }

    /// Set a product's stock level; a product with no stock is no longer in stock.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if there is no such product.
    pub fn set_stock(&mut self, id: &ProductId, stock: u32) -> Result<(), CatalogError> {
        let product = self.product_mut(id)?;

        product.stock = stock;
        product.in_stock = stock > 0;

        Ok(())
    }

    /// Distinct categories, alphabetically.
    pub fn categories(&self) -> Vec<&str> {
        self.products
            .values()
            .map(|product| product.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Products matching the query, in the requested order.
    pub fn query(&self, query: &ProductQuery) -> Vec<&Product<'a>> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let mut products: Vec<&Product<'a>> = self
            .products
            .values()
            .filter(|product| query.matches(product, needle.as_deref()))
            .collect();

        match query.sort {
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::PriceLowToHigh => {
                products.sort_by_key(|product| product.price.to_minor_units());
            }
            ProductSort::PriceHighToLow => {
                products.sort_by_key(|product| std::cmp::Reverse(product.price.to_minor_units()));
            }
            ProductSort::Stock => {
                products.sort_by_key(|product| std::cmp::Reverse(product.stock));
            }
        }

        products
    }

    /// Iterate over the products in the catalog.
    pub fn iter(&self) -> impl Iterator<Item = (ProductKey, &Product<'a>)> {
        self.products.iter()
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Get the currency of the catalog.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn product_mut(&mut self, id: &ProductId) -> Result<&mut Product<'a>, CatalogError> {
        self.ids
            .get(id)
            .and_then(|key| self.products.get_mut(*key))
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    fn ensure_currency(
        &self,
        id: &ProductId,
        price: &Money<'a, Currency>,
    ) -> Result<(), CatalogError> {
        let currency = price.currency();

        if currency == self.currency {
            Ok(())
        } else {
            Err(CatalogError::CurrencyMismatch(
                id.clone(),
                currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ))
        }
    }
}
