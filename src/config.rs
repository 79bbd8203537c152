//! Storefront and logging configuration

use std::{path::PathBuf, time::Duration};

use clap::Args;
use decimal_percentage::Percentage;
use jiff::SignedDuration;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{
    ledger::LedgerConfig,
    pricing::{PricingConfig, minor_units_of},
};

/// Errors turning command line or environment settings into store rules.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Not an ISO currency code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// An amount can't be expressed in the store currency.
    #[error("Invalid {0} amount: {1}")]
    InvalidAmount(&'static str, Decimal),

    /// Tax rates are fractions between 0 and 1.
    #[error("Tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),
}

/// Store pricing, fulfilment and seed data settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// ISO currency code every price is in
    #[arg(long, env = "STORE_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Sales tax as a fraction of the subtotal
    #[arg(long, env = "STORE_TAX_RATE", default_value = "0.08")]
    pub tax_rate: Decimal,

    /// Flat shipping charge below the free-shipping threshold
    #[arg(long, env = "STORE_SHIPPING_COST", default_value = "25.00")]
    pub shipping_cost: Decimal,

    /// Subtotal at or above which shipping is free
    #[arg(long, env = "STORE_FREE_SHIPPING_THRESHOLD", default_value = "500.00")]
    pub free_shipping_threshold: Decimal,

    /// Days from ordering to estimated delivery
    #[arg(long, env = "STORE_DELIVERY_LEAD_TIME_DAYS", default_value_t = 5)]
    pub delivery_lead_time_days: u16,

    /// Simulated payment authorization time in milliseconds
    #[arg(long, env = "STORE_PAYMENT_DELAY_MS", default_value_t = 2_000)]
    pub payment_delay_ms: u64,

    /// Directory holding the fixture sets
    #[arg(long, env = "STORE_FIXTURES_PATH", default_value = "./fixtures")]
    pub fixtures_path: PathBuf,

    /// Fixture set to seed the store with
    #[arg(short = 'f', long, env = "STORE_FIXTURE_SET", default_value = "default")]
    pub fixture_set: String,
}

impl StoreConfig {
    /// Currency named by [`StoreConfig::currency`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code isn't an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(self.currency.trim())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Tax and shipping rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the currency is unknown, the tax rate is outside `0..=1`, or an
    /// amount has more decimal places than the currency allows.
    pub fn pricing(&self) -> Result<PricingConfig<'static>, ConfigError> {
        let currency = self.currency()?;

        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            return Err(ConfigError::InvalidTaxRate(self.tax_rate));
        }

        let amount = |name: &'static str, value: Decimal| {
            minor_units_of(value, currency)
                .filter(|minor| *minor >= 0)
                .map(|minor| Money::from_minor(minor, currency))
                .ok_or(ConfigError::InvalidAmount(name, value))
        };

        Ok(PricingConfig {
            tax_rate: Percentage::from(self.tax_rate),
            shipping_cost: amount("shipping cost", self.shipping_cost)?,
            free_shipping_threshold: amount(
                "free shipping threshold",
                self.free_shipping_threshold,
            )?,
        })
    }

    /// Rules applied to new orders.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StoreConfig::pricing`].
    pub fn ledger_config(&self) -> Result<LedgerConfig<'static>, ConfigError> {
        Ok(LedgerConfig {
            pricing: self.pricing()?,
            delivery_lead_time: SignedDuration::from_hours(
                i64::from(self.delivery_lead_time_days) * 24,
            ),
        })
    }

    /// Simulated payment authorization time.
    #[must_use]
    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment_delay_ms)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
