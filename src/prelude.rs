//! Kitledger prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine},
    checkout::{
        Checkout, CheckoutError, CheckoutRequest, PaymentError, PaymentGateway, SimulatedPayment,
    },
    fixtures::{Fixture, FixtureError, Store},
    ids::{OrderId, ProductId, PurchaserId},
    invoice::{Invoice, InvoiceError},
    ledger::{Analytics, Ledger, LedgerConfig, LedgerError, OrderFilter, PurchaserSummary},
    orders::{
        Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, PurchaserSnapshot,
        TrackingUpdate,
    },
    pricing::{PricingBreakdown, PricingConfig, PricingError},
    products::{Catalog, CatalogError, Product, ProductKey, ProductQuery, ProductSort},
    purchasers::{Address, Directory, DirectoryError, Purchaser},
};
