//! Order Ledger
//!
//! The ledger owns every order. Orders are kept oldest first internally and every query
//! returns them most-recent-first.

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{Span, info, warn};

use crate::{
    ids::{OrderId, PurchaserId},
    orders::{
        Order, OrderLine, OrderParts, OrderStatus, PaymentMethod, PaymentStatus, PurchaserSnapshot,
    },
    pricing::{PricingBreakdown, PricingConfig, PricingError, total_price},
    purchasers::{Address, Purchaser},
};

pub mod analytics;
mod order_ids;

pub use analytics::{Analytics, PurchaserSummary};
pub use order_ids::OrderIdGenerator;

use order_ids::SEQUENCE_MODULUS;

/// Default time between placing an order and its estimated delivery (5 days).
pub const DEFAULT_DELIVERY_LEAD_TIME: SignedDuration = SignedDuration::from_hours(5 * 24);

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No order with this identifier exists.
    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// Orders need at least one line.
    #[error("Cannot create an order from an empty cart")]
    EmptyCartCheckout,

    /// An order with this identifier already exists.
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),

    /// A restored order had no tracking history.
    #[error("Order {0} has no tracking history")]
    MissingTracking(OrderId),

    /// A restored order's lines or totals are inconsistent.
    #[error("Invalid order {0}: {1}")]
    InvalidOrder(OrderId, String),

    /// A restored order is priced in a different currency to the ledger.
    #[error("Order {0} is priced in {1}, expected {2}")]
    CurrencyMismatch(OrderId, String, String),

    /// Error pricing the order lines.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Delivery estimate fell outside the supported time range.
    #[error(transparent)]
    Time(#[from] jiff::Error),
}

/// Pricing and fulfilment rules applied to new orders.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig<'a> {
    /// Tax and shipping rules
    pub pricing: PricingConfig<'a>,

    /// Time from placing an order to its estimated delivery
    pub delivery_lead_time: SignedDuration,
}

impl Default for LedgerConfig<'static> {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            delivery_lead_time: DEFAULT_DELIVERY_LEAD_TIME,
        }
    }
}

/// Administrative order filter; populated fields are combined with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only orders with this fulfilment status.
    pub status: Option<OrderStatus>,

    /// Only orders with this payment status.
    pub payment_status: Option<PaymentStatus>,
}

impl OrderFilter {
    /// Whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order<'_>) -> bool {
        self.status.is_none_or(|status| order.status() == status)
            && self
                .payment_status
                .is_none_or(|payment_status| order.payment_status() == payment_status)
    }
}

/// Ledger
#[derive(Debug)]
pub struct Ledger<'a> {
    config: LedgerConfig<'a>,
    orders: Vec<Order<'a>>,
    index: FxHashMap<OrderId, usize>,
    ids: OrderIdGenerator,
}

impl<'a> Ledger<'a> {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(config: LedgerConfig<'a>) -> Self {
        Self {
            config,
            orders: Vec::new(),
            index: FxHashMap::default(),
            ids: OrderIdGenerator::default(),
        }
    }

    /// Rules applied to new orders.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig<'a> {
        &self.config
    }

    /// Currency every order in the ledger is priced in.
    #[must_use]
    pub fn currency(&self) -> &'a Currency {
        self.config.pricing.shipping_cost.currency()
    }

    /// Price a set of order lines without creating an order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyCartCheckout`]: there are no lines.
    /// - [`LedgerError::Pricing`]: a line is in another currency or arithmetic overflowed.
    pub fn quote(&self, lines: &[OrderLine<'a>]) -> Result<PricingBreakdown<'a>, LedgerError> {
        if lines.is_empty() {
            return Err(LedgerError::EmptyCartCheckout);
        }

        let subtotal = total_price(
            lines.iter().map(|line| (line.unit_price, line.quantity)),
            self.currency(),
        )?;

        Ok(self.config.pricing.derive(subtotal)?)
    }

    /// Create a pending order from frozen cart lines.
    ///
    /// The payment status follows the payment method and the order is seeded with a single
    /// "received" tracking update. Nothing is stored if an error is returned.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyCartCheckout`]: there are no lines.
    /// - [`LedgerError::Pricing`]: the lines could not be priced.
    /// - [`LedgerError::Time`]: the delivery estimate is out of range.
    #[tracing::instrument(
        name = "ledger.create_order",
        skip(self, purchaser, lines, shipping_address),
        fields(
            purchaser_id = %purchaser.id,
            line_count = lines.len(),
            order_id = tracing::field::Empty
        ),
        err
    )]
    pub fn create_order(
        &mut self,
        purchaser: &Purchaser,
        lines: Vec<OrderLine<'a>>,
        shipping_address: Address,
        payment_method: PaymentMethod,
    ) -> Result<&Order<'a>, LedgerError> {
        let pricing = self.quote(&lines)?;

        let ordered_at = Timestamp::now();
        let estimated_delivery = ordered_at.checked_add(self.config.delivery_lead_time)?;
        let id = self.next_id(ordered_at)?;

        Span::current().record("order_id", tracing::field::display(&id));

        let order = Order::place(
            id,
            PurchaserSnapshot {
                id: purchaser.id.clone(),
                name: purchaser.name.clone(),
                email: purchaser.email.clone(),
            },
            lines,
            pricing,
            shipping_address,
            payment_method,
            ordered_at,
            estimated_delivery,
        );

        info!(
            order_id = %order.id(),
            total = %order.total(),
            payment_status = %order.payment_status(),
            "created order"
        );

        self.push(order)
    }

    /// Store an existing order, e.g. one loaded from fixtures, as the most recent order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateOrder`]: the identifier is already taken.
    /// - [`LedgerError::CurrencyMismatch`]: a price is not in the ledger's currency.
    /// - [`LedgerError::InvalidOrder`]: there are no lines, a line has no units, or the
    ///   subtotal or total don't add up.
    /// - [`LedgerError::MissingTracking`]: the order has no tracking history.
    pub fn restore(&mut self, parts: OrderParts<'a>) -> Result<&Order<'a>, LedgerError> {
        if self.index.contains_key(&parts.id) {
            return Err(LedgerError::DuplicateOrder(parts.id));
        }

        self.check_restored(&parts)?;

        let id = parts.id.clone();
        let order = Order::from_parts(parts).ok_or(LedgerError::MissingTracking(id))?;

        self.push(order)
    }

    /// Move an order to any status, appending a tracking update.
    ///
    /// Repeating the same call appends another update.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if there is no such order.
    #[tracing::instrument(name = "ledger.set_status", skip(self), fields(order_id = %id))]
    pub fn set_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<&Order<'a>, LedgerError> {
        let order = self.order_mut(id)?;
        let previous = order.status();

        let update = order.transition(status, Timestamp::now());

        info!(
            order_id = %id,
            %previous,
            %status,
            timestamp = %update.timestamp,
            "order status updated"
        );

        Ok(&*order)
    }

    /// Change an order's payment status. The tracking history is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if there is no such order.
    #[tracing::instrument(name = "ledger.set_payment_status", skip(self), fields(order_id = %id))]
    pub fn set_payment_status(
        &mut self,
        id: &OrderId,
        payment_status: PaymentStatus,
    ) -> Result<&Order<'a>, LedgerError> {
        let order = self.order_mut(id)?;

        order.set_payment_status(payment_status);

        info!(order_id = %id, %payment_status, "payment status updated");

        Ok(&*order)
    }

    /// Get an order by identifier.
    pub fn get(&self, id: &OrderId) -> Option<&Order<'a>> {
        self.index.get(id).and_then(|idx| self.orders.get(*idx))
    }

    /// A purchaser's orders, most recent first.
    pub fn by_purchaser(&self, purchaser: &PurchaserId) -> Vec<&Order<'a>> {
        self.iter()
            .filter(|order| &order.purchaser().id == purchaser)
            .collect()
    }

    /// Orders passing the filter, most recent first.
    pub fn list(&self, filter: &OrderFilter) -> Vec<&Order<'a>> {
        self.iter().filter(|order| filter.matches(order)).collect()
    }

    /// Iterate over all orders, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Order<'a>> {
        self.orders.iter().rev()
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// First free identifier, moving to the next millisecond once every sequence number of
    /// the current one is taken.
    fn next_id(&mut self, mut now: Timestamp) -> Result<OrderId, LedgerError> {
        loop {
            for _ in 0..SEQUENCE_MODULUS {
                let id = self.ids.generate(now);

                if !self.index.contains_key(&id) {
                    return Ok(id);
                }
            }

            now = now.checked_add(SignedDuration::from_millis(1))?;
        }
    }

    fn check_restored(&self, parts: &OrderParts<'a>) -> Result<(), LedgerError> {
        let currency = self.currency();
        let invalid = |reason: String| LedgerError::InvalidOrder(parts.id.clone(), reason);

        if parts.lines.is_empty() {
            return Err(invalid("no lines".to_string()));
        }

        if let Some(line) = parts.lines.iter().find(|line| line.quantity == 0) {
            return Err(invalid(format!("line {} has no units", line.product_id)));
        }

        let pricing = &parts.pricing;

        let foreign = parts
            .lines
            .iter()
            .map(|line| line.unit_price)
            .chain([pricing.subtotal, pricing.tax, pricing.shipping, pricing.total])
            .find(|amount| amount.currency() != currency);

        if let Some(amount) = foreign {
            return Err(LedgerError::CurrencyMismatch(
                parts.id.clone(),
                amount.currency().iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ));
        }

        let line_sum = total_price(
            parts.lines.iter().map(|line| (line.unit_price, line.quantity)),
            currency,
        )?;

        if line_sum != pricing.subtotal {
            return Err(invalid(format!(
                "subtotal {} != sum of lines {line_sum}",
                pricing.subtotal
            )));
        }

        let expected_total = total_price(
            [pricing.subtotal, pricing.tax, pricing.shipping].map(|amount| (amount, 1)),
            currency,
        )?;

        if expected_total != pricing.total {
            return Err(invalid(format!(
                "total {} != subtotal + tax + shipping {expected_total}",
                pricing.total
            )));
        }

        Ok(())
    }

    fn push(&mut self, order: Order<'a>) -> Result<&Order<'a>, LedgerError> {
        let id = order.id().clone();

        self.index.insert(id.clone(), self.orders.len());
        self.orders.push(order);

        self.orders.last().ok_or(LedgerError::NotFound(id))
    }

    fn order_mut(&mut self, id: &OrderId) -> Result<&mut Order<'a>, LedgerError> {
        self.index
            .get(id)
            .and_then(|idx| self.orders.get_mut(*idx))
            .ok_or_else(|| {
                warn!(order_id = %id, "order not found");

                LedgerError::NotFound(id.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{GBP, USD},
    };
    use testresult::TestResult;

    use crate::{
        ids::ProductId,
        orders::{ORDER_RECEIVED_DESCRIPTION, TrackingUpdate},
    };

    use super::*;

    fn purchaser(id: &str) -> Purchaser {
        Purchaser::new(id, "Dr. Sarah Johnson", format!("{id}@cityhospital.com"), Address::default())
    }

    fn line(product: &str, price_minor: i64, quantity: u32) -> OrderLine<'static> {
        OrderLine {
            product_id: ProductId::new(product),
            name: product.to_uppercase(),
            unit_price: Money::from_minor(price_minor, USD),
            quantity,
        }
    }

    fn place(
        ledger: &mut Ledger<'static>,
        purchaser_id: &str,
        method: PaymentMethod,
    ) -> Result<OrderId, LedgerError> {
        let order = ledger.create_order(
            &purchaser(purchaser_id),
            vec![line("sdp-001", 100_00, 3)],
            Address::default(),
            method,
        )?;

        Ok(order.id().clone())
    }

    #[test]
    fn create_order_prices_and_seeds_order() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let order = ledger.create_order(
            &purchaser("user-001"),
            vec![line("sdp-001", 100_00, 2), line("sdp-002", 50_00, 2)],
            Address::default(),
            PaymentMethod::CreditCard,
        )?;

        assert_eq!(order.subtotal(), Money::from_minor(300_00, USD));
        assert_eq!(order.tax(), Money::from_minor(24_00, USD));
        assert_eq!(order.shipping(), Money::from_minor(25_00, USD));
        assert_eq!(order.total(), Money::from_minor(349_00, USD));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.purchaser().id, PurchaserId::new("user-001"));

        let seeded: Vec<(OrderStatus, &str)> = order
            .tracking()
            .iter()
            .map(|update| (update.status, update.description.as_str()))
            .collect();

        assert_eq!(seeded, vec![(OrderStatus::Pending, ORDER_RECEIVED_DESCRIPTION)]);
        assert_eq!(
            order.estimated_delivery(),
            order.ordered_at().checked_add(DEFAULT_DELIVERY_LEAD_TIME)?
        );

        Ok(())
    }

    #[test]
    fn pay_later_orders_start_unpaid() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let id = place(&mut ledger, "user-001", PaymentMethod::PayLater)?;

        assert_eq!(
            ledger.get(&id).map(Order::payment_status),
            Some(PaymentStatus::Pending)
        );

        Ok(())
    }

    #[test]
    fn create_order_with_no_lines_stores_nothing() {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let result = ledger.create_order(
            &purchaser("user-001"),
            Vec::new(),
            Address::default(),
            PaymentMethod::CreditCard,
        );

        assert!(
            matches!(result, Err(LedgerError::EmptyCartCheckout)),
            "expected EmptyCartCheckout, got {result:?}"
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn create_order_in_foreign_currency_stores_nothing() {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let foreign = OrderLine {
            unit_price: Money::from_minor(100, GBP),
            ..line("sdp-001", 0, 1)
        };

        let result = ledger.create_order(
            &purchaser("user-001"),
            vec![foreign],
            Address::default(),
            PaymentMethod::CreditCard,
        );

        assert!(
            matches!(result, Err(LedgerError::Pricing(PricingError::Money(_)))),
            "expected currency mismatch, got {result:?}"
        );
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn order_ids_are_unique() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let first = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;
        let second = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;
        let third = place(&mut ledger, "user-002", PaymentMethod::CreditCard)?;

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
        assert_eq!(ledger.len(), 3);

        Ok(())
    }

    #[test]
    fn set_status_appends_tracking_each_call() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let id = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;

        ledger.set_status(&id, OrderStatus::Processing)?;
        ledger.set_status(&id, OrderStatus::Shipped)?;
        let order = ledger.set_status(&id, OrderStatus::Shipped)?;

        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.tracking().len(), 4);

        let last = order.tracking().last().ok_or("expected tracking")?;

        assert_eq!(last.description, "Order status updated to shipped");

        let timestamps: Vec<Timestamp> = order.tracking().iter().map(|u| u.timestamp).collect();

        assert!(timestamps.is_sorted(), "out of order: {timestamps:?}");

        Ok(())
    }

    #[test]
    fn any_status_may_follow_any_other() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let id = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;

        ledger.set_status(&id, OrderStatus::Delivered)?;
        ledger.set_status(&id, OrderStatus::Pending)?;
        let order = ledger.set_status(&id, OrderStatus::Cancelled)?;

        assert_eq!(order.status(), OrderStatus::Cancelled);

        Ok(())
    }

    #[test]
    fn set_status_does_not_reprice() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let id = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;

        let before = ledger.get(&id).map(|order| *order.pricing());

        ledger.set_status(&id, OrderStatus::Cancelled)?;

        assert_eq!(ledger.get(&id).map(|order| *order.pricing()), before);

        Ok(())
    }

    #[test]
    fn set_status_unknown_order_is_not_found() {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let result = ledger.set_status(&OrderId::new("ORD-404"), OrderStatus::Shipped);

        assert!(
            matches!(&result, Err(LedgerError::NotFound(id)) if id.as_str() == "ORD-404"),
            "expected NotFound, got {result:?}"
        );
    }

    #[test]
    fn set_payment_status_leaves_tracking_alone() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let id = place(&mut ledger, "user-001", PaymentMethod::PayLater)?;

        ledger.set_status(&id, OrderStatus::Delivered)?;
        let order = ledger.set_payment_status(&id, PaymentStatus::Failed)?;

        assert_eq!(order.payment_status(), PaymentStatus::Failed);
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.tracking().len(), 2);

        Ok(())
    }

    #[test]
    fn set_payment_status_unknown_order_is_not_found() {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let result = ledger.set_payment_status(&OrderId::new("ORD-404"), PaymentStatus::Paid);

        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn by_purchaser_returns_only_their_orders_most_recent_first() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let a1 = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;
        let _b1 = place(&mut ledger, "user-002", PaymentMethod::CreditCard)?;
        let a2 = place(&mut ledger, "user-001", PaymentMethod::PayLater)?;

        let ids: Vec<&OrderId> = ledger
            .by_purchaser(&PurchaserId::new("user-001"))
            .into_iter()
            .map(Order::id)
            .collect();

        assert_eq!(ids, vec![&a2, &a1]);
        assert!(ledger.by_purchaser(&PurchaserId::new("user-404")).is_empty());

        Ok(())
    }

    #[test]
    fn list_combines_filters_with_and() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let paid_pending = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;
        let unpaid_pending = place(&mut ledger, "user-001", PaymentMethod::PayLater)?;
        let paid_shipped = place(&mut ledger, "user-002", PaymentMethod::CreditCard)?;

        ledger.set_status(&paid_shipped, OrderStatus::Shipped)?;

        let ids = |filter: OrderFilter| -> Vec<OrderId> {
            ledger.list(&filter).into_iter().map(|o| o.id().clone()).collect()
        };

        assert_eq!(ids(OrderFilter::default()).len(), 3);

        assert_eq!(
            ids(OrderFilter {
                status: Some(OrderStatus::Pending),
                payment_status: None,
            }),
            vec![unpaid_pending.clone(), paid_pending.clone()]
        );

        assert_eq!(
            ids(OrderFilter {
                status: Some(OrderStatus::Pending),
                payment_status: Some(PaymentStatus::Paid),
            }),
            vec![paid_pending]
        );

        assert_eq!(
            ids(OrderFilter {
                status: None,
                payment_status: Some(PaymentStatus::Pending),
            }),
            vec![unpaid_pending]
        );

        Ok(())
    }

    fn restorable(ledger: &Ledger<'static>) -> Result<OrderParts<'static>, LedgerError> {
        let at = Timestamp::UNIX_EPOCH;

        Ok(OrderParts {
            id: OrderId::new("ORD-2024-001"),
            purchaser: PurchaserSnapshot {
                id: PurchaserId::new("user-001"),
                name: "Dr. Sarah Johnson".to_string(),
                email: "sarah.johnson@cityhospital.com".to_string(),
            },
            lines: vec![line("sdp-001", 100_00, 1)],
            pricing: ledger.quote(&[line("sdp-001", 100_00, 1)])?,
            shipping_address: Address::default(),
            payment_method: PaymentMethod::PurchaseOrder,
            ordered_at: at,
            estimated_delivery: at,
            status: OrderStatus::Shipped,
            payment_status: PaymentStatus::Paid,
            tracking: vec![
                TrackingUpdate::new(OrderStatus::Pending, ORDER_RECEIVED_DESCRIPTION, at),
                TrackingUpdate::new(OrderStatus::Shipped, "Package shipped via FedEx", at)
                    .with_location("New York Distribution Center"),
            ],
        })
    }

    #[test]
    fn restore_keeps_history_and_rejects_duplicates() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let parts = restorable(&ledger)?;

        let restored = ledger.restore(parts.clone())?;

        assert_eq!(restored.tracking().len(), 2);
        assert_eq!(restored.status(), OrderStatus::Shipped);

        let duplicate = ledger.restore(parts);

        assert!(matches!(duplicate, Err(LedgerError::DuplicateOrder(_))));
        assert_eq!(ledger.len(), 1);

        Ok(())
    }

    #[test]
    fn restore_rejects_totals_that_dont_add_up() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let mut parts = restorable(&ledger)?;

        parts.pricing.total = Money::from_minor(1, USD);

        let result = ledger.restore(parts.clone());

        assert!(
            matches!(&result, Err(LedgerError::InvalidOrder(id, _)) if id.as_str() == "ORD-2024-001"),
            "expected InvalidOrder, got {result:?}"
        );

        parts.pricing = restorable(&ledger)?.pricing;
        parts.pricing.subtotal = Money::from_minor(99_00, USD);

        assert!(matches!(ledger.restore(parts), Err(LedgerError::InvalidOrder(_, _))));
        assert!(ledger.is_empty());

        Ok(())
    }

    #[test]
    fn restore_rejects_orders_without_units() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        let no_lines = OrderParts {
            lines: Vec::new(),
            ..restorable(&ledger)?
        };

        assert!(matches!(ledger.restore(no_lines), Err(LedgerError::InvalidOrder(_, _))));

        let empty_line = OrderParts {
            lines: vec![line("sdp-001", 100_00, 1), line("sdp-002", 50_00, 0)],
            ..restorable(&ledger)?
        };

        assert!(matches!(ledger.restore(empty_line), Err(LedgerError::InvalidOrder(_, _))));
        assert!(ledger.is_empty());

        Ok(())
    }

    #[test]
    fn restore_rejects_foreign_currency_and_keeps_analytics_working() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());

        place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;

        let mut parts = restorable(&ledger)?;
        let pound = |minor| Money::from_minor(minor, GBP);

        parts.lines = vec![OrderLine {
            unit_price: pound(100_00),
            ..line("sdp-001", 0, 1)
        }];
        parts.pricing = PricingBreakdown {
            subtotal: pound(100_00),
            tax: pound(8_00),
            shipping: pound(25_00),
            total: pound(133_00),
        };

        let result = ledger.restore(parts);

        assert!(
            matches!(&result, Err(LedgerError::CurrencyMismatch(_, found, expected)) if found == "GBP" && expected == "USD"),
            "expected CurrencyMismatch, got {result:?}"
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.analytics()?.revenue, Money::from_minor(349_00, USD));

        Ok(())
    }

    #[test]
    fn status_updates_run_under_a_subscriber() -> TestResult {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || -> TestResult {
            let mut ledger = Ledger::new(LedgerConfig::default());
            let id = place(&mut ledger, "user-001", PaymentMethod::CreditCard)?;

            let order = ledger.set_status(&id, OrderStatus::Shipped)?;

            assert_eq!(order.status(), OrderStatus::Shipped);

            let order = ledger.set_payment_status(&id, PaymentStatus::Failed)?;

            assert_eq!(order.payment_status(), PaymentStatus::Failed);
            assert!(matches!(
                ledger.set_status(&OrderId::new("ORD-missing"), OrderStatus::Shipped),
                Err(LedgerError::NotFound(_))
            ));

            Ok(())
        })
    }

    #[test]
    fn next_id_moves_on_when_a_millisecond_is_full() -> TestResult {
        let mut ledger = Ledger::new(LedgerConfig::default());
        let now = Timestamp::from_millisecond(1_700_000_000_000)?;

        for sequence in 0..SEQUENCE_MODULUS {
            ledger
                .index
                .insert(OrderId::new(format!("ORD-1700000000000-{sequence:04}")), 0);
        }

        let id = ledger.next_id(now)?;

        assert!(
            id.as_str().starts_with("ORD-1700000000001-"),
            "unexpected id {id}"
        );

        Ok(())
    }
}
