//! Fixtures
//!
//! YAML seed data for the catalog, purchaser directory and order ledger, laid out as
//! `{base}/{products,purchasers,orders}/{set}.yml`.

use std::{fs, path::PathBuf};

use rusty_money::MoneyError;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    ledger::{Ledger, LedgerConfig, LedgerError},
    orders::OrderParts,
    pricing::PricingError,
    products::{Catalog, CatalogError, Product},
    purchasers::{Directory, DirectoryError, Purchaser},
};

pub mod orders;
pub mod products;
pub mod purchasers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between fixtures or configuration
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Purchaser not found
    #[error("Purchaser not found: {0}")]
    PurchaserNotFound(String),

    /// Orders were loaded before any products
    #[error("No products loaded yet; currency unknown")]
    NoProducts,

    /// Catalog rejected a product
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Directory rejected a purchaser
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Ledger rejected an order
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Error summing order lines
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapper for money errors
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Everything a storefront session needs, seeded from fixtures.
#[derive(Debug)]
pub struct Store<'a> {
    /// Products for sale
    pub catalog: Catalog<'a>,

    /// Registered purchasers
    pub directory: Directory,

    /// Orders placed so far
    pub ledger: Ledger<'a>,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Catalog, created when the first products are loaded
    catalog: Option<Catalog<'a>>,

    directory: Directory,

    /// Orders to restore into a ledger, oldest first
    orders: Vec<OrderParts<'a>>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: None,
            directory: Directory::new(),
            orders: Vec::new(),
        }
    }

    /// Load products from a YAML fixture file. The first product fixes the catalog currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is invalid, an id is
    /// duplicated or products are priced in different currencies.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: products::ProductsFixture = self.read("products", name)?;

        for product_fixture in fixture.products {
            let (_minor_units, currency) = products::parse_price(&product_fixture.price)?;

            let catalog = self
                .catalog
                .get_or_insert_with(|| Catalog::new(currency));

            catalog.insert(Product::try_from(product_fixture)?)?;
        }

        debug!(
            set = name,
            products = self.catalog.as_ref().map_or(0, Catalog::len),
            "loaded product fixtures"
        );

        Ok(self)
    }

    /// Load purchasers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an id or email is duplicated.
    pub fn load_purchasers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: purchasers::PurchasersFixture = self.read("purchasers", name)?;

        for purchaser_fixture in fixture.purchasers {
            self.directory.insert(Purchaser::from(purchaser_fixture))?;
        }

        debug!(set = name, purchasers = self.directory.len(), "loaded purchaser fixtures");

        Ok(self)
    }

    /// Load orders from a YAML fixture file. Products and purchasers must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, no products are loaded, or an
    /// order references an unknown product or purchaser.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: orders::OrdersFixture = self.read("orders", name)?;
        let catalog = self.catalog.as_ref().ok_or(FixtureError::NoProducts)?;

        for order_fixture in fixture.orders {
            self.orders
                .push(order_fixture.try_into_parts(catalog, &self.directory)?);
        }

        debug!(set = name, orders = self.orders.len(), "loaded order fixtures");

        Ok(self)
    }

    /// Load a complete fixture set (products, purchasers and orders with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_products(name)?
            .load_purchasers(name)?
            .load_orders(name)?;

        Ok(fixture)
    }

    /// Loaded catalog
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoProducts`] if no products have been loaded yet.
    pub fn catalog(&self) -> Result<&Catalog<'a>, FixtureError> {
        self.catalog.as_ref().ok_or(FixtureError::NoProducts)
    }

    /// Loaded purchasers
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Loaded orders, oldest first
    pub fn orders(&self) -> &[OrderParts<'a>] {
        &self.orders
    }

    /// Build a ledger holding the loaded orders.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::CurrencyMismatch`]: `config` prices in a different currency to the catalog.
    /// - [`FixtureError::Ledger`]: duplicate order ids or empty tracking histories.
    pub fn ledger(&self, config: LedgerConfig<'a>) -> Result<Ledger<'a>, FixtureError> {
        let currency = self.catalog()?.currency();
        let mut ledger = Ledger::new(config);

        if ledger.currency() != currency {
            return Err(FixtureError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                ledger.currency().iso_alpha_code.to_string(),
            ));
        }

        for parts in &self.orders {
            ledger.restore(parts.clone())?;
        }

        Ok(ledger)
    }

    /// Consume the fixture into a seeded [`Store`].
    ///
    /// # Errors
    ///
    /// Returns an error if no products were loaded or the ledger can't be built.
    pub fn into_store(self, config: LedgerConfig<'a>) -> Result<Store<'a>, FixtureError> {
        let ledger = self.ledger(config)?;

        Ok(Store {
            catalog: self.catalog.ok_or(FixtureError::NoProducts)?,
            directory: self.directory,
            ledger,
        })
    }

    fn read<T: DeserializeOwned>(&self, category: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
