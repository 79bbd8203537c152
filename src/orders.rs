//! Orders
//!
//! An [`Order`] freezes the cart it was created from. Pricing fields are set once at
//! creation; only the order status, payment status and tracking history change afterwards,
//! and only through the [`Ledger`](crate::ledger::Ledger).

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::{OrderId, ProductId, PurchaserId},
    pricing::{PricingBreakdown, PricingError, line_total},
    purchasers::Address,
};

/// Description of the tracking entry every new order starts with.
pub const ORDER_RECEIVED_DESCRIPTION: &str = "Order received and being processed";

/// Errors parsing lifecycle values from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Not one of the order statuses.
    #[error("Unknown order status: {0}")]
    OrderStatus(String),

    /// Not one of the payment statuses.
    #[error("Unknown payment status: {0}")]
    PaymentStatus(String),

    /// Not one of the payment methods.
    #[error("Unknown payment method: {0}")]
    PaymentMethod(String),
}

/// Fulfilment status of an order.
///
/// Administrators may move an order between any two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Received, not yet picked.
    Pending,

    /// Being picked and packed.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the purchaser.
    Delivered,

    /// Will not be fulfilled.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Lowercase name, as used in tracking descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the order still needs work (pending or processing).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::OrderStatus(s.to_string()))
    }
}

/// Payment status of an order, independent of its fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,

    /// Paid in full.
    Paid,

    /// Payment attempt failed.
    Failed,
}

impl PaymentStatus {
    /// Every payment status.
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::PaymentStatus(s.to_string()))
    }
}

/// How the purchaser chose to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Charged at checkout.
    CreditCard,

    /// Invoiced after delivery.
    PayLater,

    /// Billed against an institutional purchase order.
    PurchaseOrder,
}

impl PaymentMethod {
    /// Every payment method.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::PayLater,
        PaymentMethod::PurchaseOrder,
    ];

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::PayLater => "Pay Later",
            PaymentMethod::PurchaseOrder => "Purchase Order",
        }
    }

    /// Kebab-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit-card",
            PaymentMethod::PayLater => "pay-later",
            PaymentMethod::PurchaseOrder => "purchase-order",
        }
    }

    /// Payment status a new order starts with: card payments are taken at checkout.
    #[must_use]
    pub const fn initial_payment_status(self) -> PaymentStatus {
        match self {
            PaymentMethod::CreditCard => PaymentStatus::Paid,
            PaymentMethod::PayLater | PaymentMethod::PurchaseOrder => PaymentStatus::Pending,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        PaymentMethod::ALL
            .into_iter()
            .find(|method| {
                method.as_str().eq_ignore_ascii_case(s) || method.label().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| ParseError::PaymentMethod(s.to_string()))
    }
}

/// A timestamped status event in an order's history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackingUpdate {
    /// Status the order moved to
    pub status: OrderStatus,

    /// Human readable description
    pub description: String,

    /// When the update was recorded
    pub timestamp: Timestamp,

    /// Where the update happened, if known
    #[serde(default)]
    pub location: Option<String>,
}

impl TrackingUpdate {
    /// Create a tracking update with no location.
    pub fn new(status: OrderStatus, description: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            status,
            description: description.into(),
            timestamp,
            location: None,
        }
    }

    /// Attach a location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A cart line frozen into an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine<'a> {
    /// Product the line was created from
    pub product_id: ProductId,

    /// Product name at the time of purchase
    pub name: String,

    /// Unit price at the time of purchase
    pub unit_price: Money<'a, Currency>,

    /// Units ordered
    pub quantity: u32,
}

impl<'a> OrderLine<'a> {
    /// `unit_price × quantity`
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit in minor units.
    pub fn total(&self) -> Result<Money<'a, Currency>, PricingError> {
        line_total(self.unit_price, self.quantity)
    }
}

/// Who placed an order, copied from the directory at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaserSnapshot {
    /// Purchaser identifier
    pub id: PurchaserId,

    /// Name at the time of purchase
    pub name: String,

    /// Email at the time of purchase
    pub email: String,
}

/// Everything needed to rebuild an order, e.g. from fixtures.
#[derive(Debug, Clone)]
pub struct OrderParts<'a> {
    /// Order identifier
    pub id: OrderId,

    /// Who placed the order
    pub purchaser: PurchaserSnapshot,

    /// Frozen lines
    pub lines: Vec<OrderLine<'a>>,

    /// Frozen pricing
    pub pricing: PricingBreakdown<'a>,

    /// Where the order ships
    pub shipping_address: Address,

    /// How the order is paid for
    pub payment_method: PaymentMethod,

    /// When the order was placed
    pub ordered_at: Timestamp,

    /// When the order should arrive
    pub estimated_delivery: Timestamp,

    /// Current fulfilment status
    pub status: OrderStatus,

    /// Current payment status
    pub payment_status: PaymentStatus,

    /// History, oldest first; must not be empty
    pub tracking: Vec<TrackingUpdate>,
}

/// Order
#[derive(Debug, Clone)]
pub struct Order<'a> {
    id: OrderId,
    purchaser: PurchaserSnapshot,
    lines: Vec<OrderLine<'a>>,
    pricing: PricingBreakdown<'a>,
    shipping_address: Address,
    payment_method: PaymentMethod,
    ordered_at: Timestamp,
    estimated_delivery: Timestamp,
    status: OrderStatus,
    payment_status: PaymentStatus,
    tracking: SmallVec<[TrackingUpdate; 4]>,
}

impl<'a> Order<'a> {
    /// A freshly placed order: pending, with a single "received" tracking entry.
    #[expect(
        clippy::too_many_arguments,
        reason = "every argument is a distinct frozen order field."
    )]
    pub(crate) fn place(
        id: OrderId,
        purchaser: PurchaserSnapshot,
        lines: Vec<OrderLine<'a>>,
        pricing: PricingBreakdown<'a>,
        shipping_address: Address,
        payment_method: PaymentMethod,
        ordered_at: Timestamp,
        estimated_delivery: Timestamp,
    ) -> Self {
        let mut tracking = SmallVec::new();

        tracking.push(TrackingUpdate::new(
            OrderStatus::Pending,
            ORDER_RECEIVED_DESCRIPTION,
            ordered_at,
        ));

        Self {
            id,
            purchaser,
            lines,
            pricing,
            shipping_address,
            payment_method,
            ordered_at,
            estimated_delivery,
            status: OrderStatus::Pending,
            payment_status: payment_method.initial_payment_status(),
            tracking,
        }
    }

    /// Rebuild an order from its parts, or `None` if the tracking history is empty.
    pub(crate) fn from_parts(parts: OrderParts<'a>) -> Option<Self> {
        if parts.tracking.is_empty() {
            return None;
        }

        let mut tracking: SmallVec<[TrackingUpdate; 4]> = parts.tracking.into_iter().collect();

        tracking.sort_by_key(|update| update.timestamp);

        Some(Self {
            id: parts.id,
            purchaser: parts.purchaser,
            lines: parts.lines,
            pricing: parts.pricing,
            shipping_address: parts.shipping_address,
            payment_method: parts.payment_method,
            ordered_at: parts.ordered_at,
            estimated_delivery: parts.estimated_delivery,
            status: parts.status,
            payment_status: parts.payment_status,
            tracking,
        })
    }

    /// Move to `status`, recording a tracking update no earlier than the previous one.
    pub(crate) fn transition(&mut self, status: OrderStatus, at: Timestamp) -> TrackingUpdate {
        let at = self
            .tracking
            .last()
            .map_or(at, |last| at.max(last.timestamp));

        let update = TrackingUpdate::new(status, format!("Order status updated to {status}"), at);

        self.status = status;
        self.tracking.push(update.clone());

        update
    }

    pub(crate) fn set_payment_status(&mut self, payment_status: PaymentStatus) {
        self.payment_status = payment_status;
    }

    /// Order identifier
    #[must_use]
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Who placed the order
    #[must_use]
    pub fn purchaser(&self) -> &PurchaserSnapshot {
        &self.purchaser
    }

    /// Frozen lines, in cart order
    #[must_use]
    pub fn lines(&self) -> &[OrderLine<'a>] {
        &self.lines
    }

    /// Total units across all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Frozen pricing
    #[must_use]
    pub fn pricing(&self) -> &PricingBreakdown<'a> {
        &self.pricing
    }

    /// Sum of line totals at the time of purchase
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.pricing.subtotal
    }

    /// Tax charged
    #[must_use]
    pub fn tax(&self) -> Money<'a, Currency> {
        self.pricing.tax
    }

    /// Shipping charged
    #[must_use]
    pub fn shipping(&self) -> Money<'a, Currency> {
        self.pricing.shipping
    }

    /// Amount payable
    #[must_use]
    pub fn total(&self) -> Money<'a, Currency> {
        self.pricing.total
    }

    /// Where the order ships
    #[must_use]
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    /// How the order is paid for
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// When the order was placed
    #[must_use]
    pub fn ordered_at(&self) -> Timestamp {
        self.ordered_at
    }

    /// When the order should arrive
    #[must_use]
    pub fn estimated_delivery(&self) -> Timestamp {
        self.estimated_delivery
    }

    /// Current fulfilment status
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Current payment status
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Tracking history, oldest first; never empty
    #[must_use]
    pub fn tracking(&self) -> &[TrackingUpdate] {
        &self.tracking
    }
}
