//! End-to-end checkout against the default fixture set.
//!
//! The default set seeds six products, three purchasers and three orders. Two of those orders
//! are paid (921.32 + 1055.95 = 1977.27 USD of revenue) and one is awaiting payment.
//!
//! Carts checked out here:
//!
//! 1. 2 x `sdp-001` (299.99) + 1 x `acc-001` (45.99)
//!    - Subtotal: 645.97, over the 500.00 threshold so shipping is free
//!    - Tax: 8% of 645.97 = 51.6776 -> 51.68
//!    - Total: 697.65
//!
//! 2. 1 x `sdp-002` (199.99)
//!    - Tax: 15.9992 -> 16.00
//!    - Shipping: 25.00
//!    - Total: 240.99

use std::time::Duration;

use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use kitledger::{checkout::MockPaymentGateway, prelude::*};

fn store() -> TestResult<Store<'static>> {
    Ok(Fixture::from_set("default")?.into_store(LedgerConfig::default())?)
}

fn fill_cart(store: &Store<'static>, items: &[(&str, u32)]) -> TestResult<Cart> {
    let mut cart = Cart::new();

    for (id, quantity) in items {
        let key = store
            .catalog
            .key_of(&ProductId::new(*id))
            .ok_or("product missing from fixtures")?;

        cart.add_item(&store.catalog, key, *quantity)?;
    }

    Ok(cart)
}

#[tokio::test]
async fn card_checkout_is_paid_and_shows_in_analytics() -> TestResult {
    let mut store = store()?;
    let mut cart = fill_cart(&store, &[("sdp-001", 2), ("acc-001", 1)])?;

    let purchaser = store
        .directory
        .find_by_email("sarah.johnson@cityhospital.com")
        .ok_or("purchaser missing from fixtures")?;

    let checkout = Checkout::new(SimulatedPayment::new(Duration::ZERO));

    let order = checkout
        .checkout(
            &mut store.ledger,
            &store.catalog,
            &mut cart,
            CheckoutRequest::new(purchaser, PaymentMethod::CreditCard),
        )
        .await?;

    assert_eq!(order.subtotal(), Money::from_minor(645_97, USD));
    assert_eq!(order.tax(), Money::from_minor(51_68, USD));
    assert!(order.shipping().is_zero(), "orders over the threshold ship free");
    assert_eq!(order.total(), Money::from_minor(697_65, USD));
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.payment_status(), PaymentStatus::Paid);
    assert_eq!(order.tracking().len(), 1);
    assert_eq!(order.shipping_address(), &purchaser.address);

    let id = order.id().clone();

    assert!(cart.is_empty(), "cart is cleared after checkout");
    assert_eq!(store.ledger.len(), 4);
    assert_eq!(store.ledger.iter().next().map(|order| order.id()), Some(&id));

    let analytics = store.ledger.analytics()?;

    assert_eq!(analytics.total_orders, 4);
    assert_eq!(analytics.pending_payments, 1);
    assert_eq!(analytics.revenue, Money::from_minor(2674_92, USD));
    assert_eq!(analytics.count(OrderStatus::Pending), 1);

    let summary = store.ledger.purchaser_summary(&purchaser.id)?;

    assert_eq!(summary.order_count, 2);
    assert_eq!(summary.total_spent, Money::from_minor(1618_97, USD));
    assert_eq!(summary.active_orders, 1);
    assert_eq!(summary.delivered_orders, 1);

    Ok(())
}

#[tokio::test]
async fn pay_later_checkout_charges_shipping_and_stays_pending() -> TestResult {
    let mut store = store()?;
    let mut cart = fill_cart(&store, &[("sdp-002", 1)])?;

    let purchaser = store
        .directory
        .find_by_email("mchen@bloodbank.org")
        .ok_or("purchaser missing from fixtures")?;

    let mut gateway = MockPaymentGateway::new();

    gateway
        .expect_authorize()
        .withf(|method, amount| *method == PaymentMethod::PayLater && *amount == 240_99)
        .times(1)
        .returning(|_, _| Ok(()));

    let order = Checkout::new(gateway)
        .checkout(
            &mut store.ledger,
            &store.catalog,
            &mut cart,
            CheckoutRequest::new(purchaser, PaymentMethod::PayLater),
        )
        .await?;

    assert_eq!(order.shipping(), Money::from_minor(25_00, USD));
    assert_eq!(order.total(), Money::from_minor(240_99, USD));
    assert_eq!(order.payment_status(), PaymentStatus::Pending);

    let pending = store.ledger.list(&OrderFilter {
        status: None,
        payment_status: Some(PaymentStatus::Pending),
    });

    assert_eq!(pending.len(), 2);

    Ok(())
}

#[tokio::test]
async fn anonymous_checkout_is_rejected() -> TestResult {
    let mut store = store()?;
    let mut cart = fill_cart(&store, &[("sdp-003", 1)])?;

    let mut gateway = MockPaymentGateway::new();

    gateway.expect_authorize().never();

    let result = Checkout::new(gateway)
        .checkout(
            &mut store.ledger,
            &store.catalog,
            &mut cart,
            CheckoutRequest {
                purchaser: None,
                payment_method: PaymentMethod::CreditCard,
                shipping_address: None,
            },
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::UnauthenticatedCheckout)));
    assert_eq!(cart.len(), 1, "cart survives a rejected checkout");
    assert_eq!(store.ledger.len(), 3);

    Ok(())
}

#[test]
fn out_of_stock_products_cannot_be_added() -> TestResult {
    let store = store()?;

    let key = store
        .catalog
        .key_of(&ProductId::new("acc-002"))
        .ok_or("product missing from fixtures")?;

    let mut cart = Cart::new();

    assert!(matches!(
        cart.add_item(&store.catalog, key, 1),
        Err(CartError::OutOfStock(id)) if id.as_str() == "acc-002"
    ));
    assert!(cart.is_empty());

    Ok(())
}

#[tokio::test]
async fn invoice_for_new_order_lists_every_line() -> TestResult {
    let mut store = store()?;
    let mut cart = fill_cart(&store, &[("sdp-001", 2), ("acc-001", 1)])?;

    let purchaser = store
        .directory
        .find_by_email("emily.rodriguez@metrohealth.com")
        .ok_or("purchaser missing from fixtures")?;

    let order = Checkout::new(SimulatedPayment::new(Duration::ZERO))
        .checkout(
            &mut store.ledger,
            &store.catalog,
            &mut cart,
            CheckoutRequest::new(purchaser, PaymentMethod::PurchaseOrder),
        )
        .await?;

    let mut out = Vec::new();

    Invoice::from_order(order).write_to(&mut out)?;

    let invoice = String::from_utf8(out)?;

    assert!(invoice.contains(order.id().as_str()), "invoice names the order");
    assert!(invoice.contains("sdp-001"), "invoice lists the kit");
    assert!(invoice.contains("acc-001"), "invoice lists the accessory");
    assert!(invoice.contains("697.65"), "invoice shows the total");
    assert!(invoice.contains("Free"), "free shipping is spelled out");

    Ok(())
}
