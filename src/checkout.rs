//! Checkout
//!
//! Turns a cart into an order. A checkout either fully succeeds, leaving a new order in the
//! ledger and an empty cart, or fails leaving both untouched.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cart::{Cart, CartError},
    ledger::{Ledger, LedgerError},
    orders::{Order, PaymentMethod},
    products::Catalog,
    purchasers::{Address, Purchaser},
};

/// Default simulated payment authorization time.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_secs(2);

/// Errors raised while authorizing payment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The payment provider refused the charge.
    #[error("Payment declined: {0}")]
    Declined(String),
}

/// Errors raised while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("Sign in to place an order")]
    UnauthenticatedCheckout,

    /// The cart has no lines.
    #[error("Cannot check out an empty cart")]
    EmptyCartCheckout,

    /// The cart could not be frozen into order lines.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The ledger rejected the order.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Payment was not authorized.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Authorizes payment for an order before it is created.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorize `amount_minor` (in the ledger currency's minor units) via `method`.
    async fn authorize(&self, method: PaymentMethod, amount_minor: i64)
    -> Result<(), PaymentError>;
}

/// Payment gateway that waits for a fixed delay and then approves every charge.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPayment {
    delay: Duration,
}

impl SimulatedPayment {
    /// Approve charges after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Time each authorization takes.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedPayment {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_DELAY)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPayment {
    async fn authorize(
        &self,
        method: PaymentMethod,
        amount_minor: i64,
    ) -> Result<(), PaymentError> {
        debug!(%method, amount_minor, delay_ms = self.delay.as_millis(), "authorizing payment");

        tokio::time::sleep(self.delay).await;

        Ok(())
    }
}

/// What the purchaser submitted at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'p> {
    /// Signed-in purchaser, if any
    pub purchaser: Option<&'p Purchaser>,

    /// How the order will be paid for
    pub payment_method: PaymentMethod,

    /// Where to ship; defaults to the purchaser's address
    pub shipping_address: Option<Address>,
}

impl<'p> CheckoutRequest<'p> {
    /// A request from a signed-in purchaser shipping to their own address.
    #[must_use]
    pub fn new(purchaser: &'p Purchaser, payment_method: PaymentMethod) -> Self {
        Self {
            purchaser: Some(purchaser),
            payment_method,
            shipping_address: None,
        }
    }

    /// Ship somewhere other than the purchaser's address.
    #[must_use]
    pub fn ship_to(mut self, address: Address) -> Self {
        self.shipping_address = Some(address);
        self
    }
}

/// Checkout flow backed by a payment gateway.
#[derive(Debug)]
pub struct Checkout<G> {
    gateway: G,
}

impl<G: PaymentGateway> Checkout<G> {
    /// Create a checkout using `gateway` to authorize payments.
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Place an order for the cart's contents.
    ///
    /// The cart is priced at current catalog prices, payment is authorized for the final
    /// total, then the order is created and the cart cleared.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::UnauthenticatedCheckout`]: the request has no purchaser.
    /// - [`CheckoutError::EmptyCartCheckout`]: the cart is empty.
    /// - [`CheckoutError::Cart`]: a cart product has left the catalog.
    /// - [`CheckoutError::Payment`]: the gateway refused the charge.
    /// - [`CheckoutError::Ledger`]: the order could not be priced or created.
    #[tracing::instrument(
        name = "checkout",
        skip_all,
        fields(payment_method = %request.payment_method, lines = cart.len()),
        err
    )]
    pub async fn checkout<'l, 'a>(
        &self,
        ledger: &'l mut Ledger<'a>,
        catalog: &Catalog<'a>,
        cart: &mut Cart,
        request: CheckoutRequest<'_>,
    ) -> Result<&'l Order<'a>, CheckoutError> {
        let purchaser = request
            .purchaser
            .ok_or(CheckoutError::UnauthenticatedCheckout)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCartCheckout);
        }

        let lines = cart.snapshot(catalog)?;
        let quote = ledger.quote(&lines)?;

        self.gateway
            .authorize(request.payment_method, quote.total.to_minor_units())
            .await?;

        let shipping_address = request
            .shipping_address
            .unwrap_or_else(|| purchaser.address.clone());

        let order = ledger.create_order(
            purchaser,
            lines,
            shipping_address,
            request.payment_method,
        )?;

        cart.clear();

        info!(order_id = %order.id(), purchaser_id = %purchaser.id, "checkout complete");

        Ok(order)
    }
}
