//! Order Fixtures

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, products::parse_money},
    ids::{OrderId, ProductId, PurchaserId},
    orders::{
        OrderLine, OrderParts, OrderStatus, PaymentMethod, PaymentStatus, PurchaserSnapshot,
        TrackingUpdate,
    },
    pricing::PricingBreakdown,
    products::Catalog,
    purchasers::{Address, Directory},
};

/// Wrapper for orders in YAML
#[derive(Debug, Deserialize)]
pub struct OrdersFixture {
    /// Orders, oldest first
    pub orders: Vec<OrderFixture>,
}

/// A line of an order fixture
#[derive(Debug, Deserialize)]
pub struct OrderLineFixture {
    /// Catalog product identifier
    pub product: String,

    /// Units ordered
    pub quantity: u32,

    /// Price paid per unit; defaults to the current catalog price
    #[serde(default)]
    pub unit_price: Option<String>,
}

/// Order fixture from YAML
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Order identifier (e.g. `ORD-2024-001`)
    pub id: String,

    /// Purchaser identifier
    pub purchaser: String,

    /// Ordered lines
    pub lines: Vec<OrderLineFixture>,

    /// Sum of line totals (e.g. "829.93 USD")
    pub subtotal: String,

    /// Tax charged
    pub tax: String,

    /// Shipping charged
    pub shipping: String,

    /// Amount payable
    pub total: String,

    /// Fulfilment status
    pub status: OrderStatus,

    /// Payment status
    pub payment_status: PaymentStatus,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Shipping address; defaults to the purchaser's address
    #[serde(default)]
    pub shipping_address: Option<Address>,

    /// When the order was placed
    pub ordered_at: Timestamp,

    /// When the order should arrive
    pub estimated_delivery: Timestamp,

    /// History, oldest first
    pub tracking: Vec<TrackingUpdate>,
}

impl OrderFixture {
    /// Resolve products and purchaser. The ledger checks the recorded totals on restore.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::ProductNotFound`] / [`FixtureError::PurchaserNotFound`]: unknown references.
    /// - Price parsing errors from [`parse_money`].
    pub fn try_into_parts<'a>(
        self,
        catalog: &Catalog<'a>,
        directory: &Directory,
    ) -> Result<OrderParts<'a>, FixtureError> {
        let currency = catalog.currency();

        let purchaser = directory
            .get(&PurchaserId::new(self.purchaser.as_str()))
            .ok_or_else(|| FixtureError::PurchaserNotFound(self.purchaser.clone()))?;

        let lines = self
            .lines
            .into_iter()
            .map(|line| {
                let product = catalog
                    .by_id(&ProductId::new(line.product.as_str()))
                    .ok_or_else(|| FixtureError::ProductNotFound(line.product.clone()))?;

                let unit_price = match &line.unit_price {
                    Some(price) => parse_money(price, currency)?,
                    None => product.price,
                };

                Ok(OrderLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    unit_price,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        let pricing = PricingBreakdown {
            subtotal: parse_money(&self.subtotal, currency)?,
            tax: parse_money(&self.tax, currency)?,
            shipping: parse_money(&self.shipping, currency)?,
            total: parse_money(&self.total, currency)?,
        };

        Ok(OrderParts {
            id: OrderId::new(self.id),
            purchaser: PurchaserSnapshot {
                id: purchaser.id.clone(),
                name: purchaser.name.clone(),
                email: purchaser.email.clone(),
            },
            lines,
            pricing,
            shipping_address: self
                .shipping_address
                .unwrap_or_else(|| purchaser.address.clone()),
            payment_method: self.payment_method,
            ordered_at: self.ordered_at,
            estimated_delivery: self.estimated_delivery,
            status: self.status,
            payment_status: self.payment_status,
            tracking: self.tracking,
        })
    }
}
