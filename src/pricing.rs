//! Pricing
//!
//! Derives tax, shipping and the final total from a subtotal. All amounts are
//! handled in currency minor units; tax is rounded half away from zero.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// Default sales tax rate (8%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Default flat shipping cost in minor units.
pub const DEFAULT_SHIPPING_COST_MINOR: i64 = 25_00;

/// Default subtotal, in minor units, at which shipping becomes free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD_MINOR: i64 = 500_00;

/// Errors that can occur while pricing a cart or order.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Percentage or quantity arithmetic overflowed.
    #[error("pricing arithmetic overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Tax and shipping rules.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig<'a> {
    /// Fraction of the subtotal charged as tax.
    pub tax_rate: Percentage,

    /// Flat shipping charge below the free-shipping threshold.
    pub shipping_cost: Money<'a, Currency>,

    /// Subtotals at or above this amount ship free.
    pub free_shipping_threshold: Money<'a, Currency>,
}

impl Default for PricingConfig<'static> {
    fn default() -> Self {
        Self::with_currency(iso::USD)
    }
}

impl<'a> PricingConfig<'a> {
    /// Default rules expressed in the given currency.
    #[must_use]
    pub fn with_currency(currency: &'a Currency) -> Self {
        Self {
            tax_rate: Percentage::from(DEFAULT_TAX_RATE),
            shipping_cost: Money::from_minor(DEFAULT_SHIPPING_COST_MINOR, currency),
            free_shipping_threshold: Money::from_minor(
                DEFAULT_FREE_SHIPPING_THRESHOLD_MINOR,
                currency,
            ),
        }
    }

    /// Derive tax, shipping and the final total for a subtotal.
    ///
    /// # Errors
    ///
    /// - [`PricingError::Overflow`]: the tax could not be represented in minor units.
    /// - [`PricingError::Money`]: the subtotal is in a different currency to the shipping rules.
    pub fn derive(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<PricingBreakdown<'a>, PricingError> {
        let currency = subtotal.currency();
        let subtotal_minor = subtotal.to_minor_units();

        let tax = Money::from_minor(percent_of_minor(&self.tax_rate, subtotal_minor)?, currency);

        let shipping = if subtotal_minor >= self.free_shipping_threshold.to_minor_units() {
            Money::from_minor(0, currency)
        } else {
            self.shipping_cost
        };

        let total = subtotal.add(tax)?.add(shipping)?;

        Ok(PricingBreakdown {
            subtotal,
            tax,
            shipping,
            total,
        })
    }
}

/// Result of pricing a subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingBreakdown<'a> {
    /// Sum of line totals
    pub subtotal: Money<'a, Currency>,

    /// Tax charged on the subtotal
    pub tax: Money<'a, Currency>,

    /// Shipping charge
    pub shipping: Money<'a, Currency>,

    /// `subtotal + tax + shipping`
    pub total: Money<'a, Currency>,
}

/// Price of `quantity` units at `unit_price`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the result does not fit in minor units.
pub fn line_total<'a>(
    unit_price: Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = unit_price
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit_price.currency()))
}

/// Sums `(unit price, quantity)` pairs into a single amount, starting from zero in `currency`.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total overflowed.
/// - [`PricingError::Money`]: a line is priced in a different currency.
pub fn total_price<'a>(
    lines: impl IntoIterator<Item = (Money<'a, Currency>, u32)>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    lines
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, (price, quantity)| {
            Ok(acc.add(line_total(price, quantity)?)?)
        })
}

/// Convert a major-unit amount (e.g. `25.00`) to minor units of `currency`.
///
/// Returns `None` if the amount has more decimal places than the currency allows or
/// doesn't fit in an `i64`.
pub fn minor_units_of(amount: Decimal, currency: &Currency) -> Option<i64> {
    amount
        .checked_mul(Decimal::from(10_i64.checked_pow(currency.exponent)?))
        .filter(|minor| minor.fract().is_zero())
        .and_then(|minor| minor.to_i64())
}

/// Apply a percentage to an amount in minor units, rounding half away from zero.
fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::Overflow)?;

    ((*percent) * Decimal::ONE) // Percentage doesn't expose the inner Decimal
        .checked_mul(minor)
        .ok_or(PricingError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}
