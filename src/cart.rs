//! Cart
//!
//! Lines reference catalog products by key, so the subtotal always reflects current
//! catalog prices. [`Cart::snapshot`] freezes those prices into order lines.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    ids::ProductId,
    orders::OrderLine,
    pricing::{PricingError, total_price},
    products::{Catalog, Product, ProductKey},
};

/// Errors related to cart updates or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Additions must be for at least one unit.
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The product is not in the catalog.
    #[error("Unknown product")]
    UnknownProduct(ProductKey),

    /// The product can't currently be ordered.
    #[error("Product {0} is out of stock")]
    OutOfStock(ProductId),

    /// The line quantity would overflow.
    #[error("Quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    /// Error calculating line or cart totals.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A product and the number of units wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    product: ProductKey,
    quantity: u32,
}

impl CartLine {
    /// Product on this line
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Units wanted; always at least 1
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Cart
#[derive(Debug, Default, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product, merging with any existing line.
    ///
    /// Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::UnknownProduct`]: the product is not in the catalog.
    /// - [`CartError::OutOfStock`]: the product is not in stock.
    /// - [`CartError::QuantityOverflow`]: the merged quantity does not fit.
    pub fn add_item(
        &mut self,
        catalog: &Catalog<'_>,
        product: ProductKey,
        quantity: u32,
    ) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let details = catalog
            .get(product)
            .ok_or(CartError::UnknownProduct(product))?;

        if !details.in_stock {
            return Err(CartError::OutOfStock(details.id.clone()));
        }

        let quantity = match self.line_mut(product) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| CartError::QuantityOverflow(details.id.clone()))?;

                line.quantity
            }
            None => {
                self.lines.push(CartLine { product, quantity });

                quantity
            }
        };

        debug!(product_id = %details.id, quantity, "cart line updated");

        Ok(quantity)
    }

    /// Set a line's quantity exactly; zero removes the line.
    ///
    /// Returns `false` if the product has no line in the cart.
    pub fn update_quantity(&mut self, product: ProductKey, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_item(product).is_some();
        }

        match self.line_mut(product) {
            Some(line) => {
                line.quantity = quantity;

                true
            }
            None => false,
        }
    }

    /// Remove a product's line, returning it if there was one.
    pub fn remove_item(&mut self, product: ProductKey) -> Option<CartLine> {
        let idx = self.lines.iter().position(|line| line.product == product)?;

        Some(self.lines.remove(idx))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of current catalog price × quantity over all lines.
    ///
    /// # Errors
    ///
    /// - [`CartError::UnknownProduct`]: a line's product has left the catalog.
    /// - [`CartError::Pricing`]: money arithmetic overflowed or currencies differ.
    pub fn subtotal<'a>(&self, catalog: &Catalog<'a>) -> Result<Money<'a, Currency>, CartError> {
        let lines = self
            .lines
            .iter()
            .map(|line| Ok((lookup(catalog, line.product)?.price, line.quantity)))
            .collect::<Result<Vec<_>, CartError>>()?;

        Ok(total_price(lines, catalog.currency())?)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Quantity of a product in the cart, if it has a line.
    pub fn quantity_of(&self, product: ProductKey) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.product == product)
            .map(CartLine::quantity)
    }

    /// Freeze the current lines and catalog prices into order lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`] if a line's product has left the catalog.
    pub fn snapshot<'a>(&self, catalog: &Catalog<'a>) -> Result<Vec<OrderLine<'a>>, CartError> {
        self.lines
            .iter()
            .map(|line| {
                let product = lookup(catalog, line.product)?;

                Ok(OrderLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    /// Iterate over the lines in the order they were first added.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, product: ProductKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product == product)
    }
}

fn lookup<'c, 'a>(
    catalog: &'c Catalog<'a>,
    product: ProductKey,
) -> Result<&'c Product<'a>, CartError> {
    catalog
        .get(product)
        .ok_or(CartError::UnknownProduct(product))
}
