//! Kitledger
//!
//! Kitledger is the order ledger behind a storefront for medical collection kits: a cart
//! aggregator, a pricing deriver for tax and shipping, and an order ledger that tracks each
//! order's fulfilment and payment lifecycle.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod fixtures;
pub mod ids;
pub mod invoice;
pub mod ledger;
pub mod observability;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod purchasers;
