//! Ledger analytics

use rusty_money::{Money, iso::Currency};

use crate::{
    ids::PurchaserId,
    orders::{Order, OrderStatus, PaymentStatus},
    pricing::PricingError,
};

use super::{Ledger, LedgerError};

/// Store-wide order figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics<'a> {
    /// Number of orders in the ledger
    pub total_orders: usize,

    /// Orders still awaiting payment
    pub pending_payments: usize,

    /// Sum of final totals of paid orders
    pub revenue: Money<'a, Currency>,

    /// Order count per status, in [`OrderStatus::ALL`] order
    pub orders_by_status: [(OrderStatus, usize); 5],
}

impl Analytics<'_> {
    /// Number of orders currently in `status`.
    #[must_use]
    pub fn count(&self, status: OrderStatus) -> usize {
        self.orders_by_status
            .iter()
            .find_map(|(s, count)| (*s == status).then_some(*count))
            .unwrap_or_default()
    }
}

/// A purchaser's dashboard figures.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaserSummary<'a> {
    /// Orders placed
    pub order_count: usize,

    /// Sum of final totals across all orders
    pub total_spent: Money<'a, Currency>,

    /// Orders pending or processing
    pub active_orders: usize,

    /// Orders delivered
    pub delivered_orders: usize,
}

impl<'a> Ledger<'a> {
    /// Store-wide figures.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Pricing`] if an order is in a different currency or the
    /// revenue overflows.
    pub fn analytics(&self) -> Result<Analytics<'a>, LedgerError> {
        let revenue = sum_totals(
            self.iter()
                .filter(|order| order.payment_status() == PaymentStatus::Paid),
            self.currency(),
        )?;

        let orders_by_status = OrderStatus::ALL.map(|status| {
            let count = self.iter().filter(|order| order.status() == status).count();

            (status, count)
        });

        Ok(Analytics {
            total_orders: self.len(),
            pending_payments: self
                .iter()
                .filter(|order| order.payment_status() == PaymentStatus::Pending)
                .count(),
            revenue,
            orders_by_status,
        })
    }

    /// Figures for one purchaser. A purchaser with no orders gets zeros.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Pricing`] if an order is in a different currency or the
    /// total overflows.
    pub fn purchaser_summary(
        &self,
        purchaser: &PurchaserId,
    ) -> Result<PurchaserSummary<'a>, LedgerError> {
        let orders = self.by_purchaser(purchaser);

        Ok(PurchaserSummary {
            order_count: orders.len(),
            total_spent: sum_totals(orders.iter().copied(), self.currency())?,
            active_orders: orders.iter().filter(|o| o.status().is_active()).count(),
            delivered_orders: orders
                .iter()
                .filter(|o| o.status() == OrderStatus::Delivered)
                .count(),
        })
    }
}

fn sum_totals<'a, 'o>(
    orders: impl IntoIterator<Item = &'o Order<'a>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError>
where
    'a: 'o,
{
    orders
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, order| {
            Ok(acc.add(order.total())?)
        })
}
