//! Product Fixtures

use std::str::FromStr;

use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;

use crate::{fixtures::FixtureError, pricing::minor_units_of, products::Product};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Products, in catalog order
    pub products: Vec<ProductFixture>,
}

/// Product fixture from YAML
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Catalog identifier (e.g. `sdp-001`)
    pub id: String,

    /// Product name
    pub name: String,

    /// Price with currency (e.g. "299.99 USD")
    pub price: String,

    /// Catalog category
    pub category: String,

    /// Units available
    pub stock: u32,

    /// Marketing description
    #[serde(default)]
    pub description: String,

    /// Specification bullet points
    #[serde(default)]
    pub specifications: Vec<String>,

    /// Shown on the featured shelf
    #[serde(default)]
    pub featured: bool,
}

impl TryFrom<ProductFixture> for Product<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&fixture.price)?;

        let mut product = Product::new(
            fixture.id,
            fixture.name,
            fixture.category,
            Money::from_minor(minor_units, currency),
            fixture.stock,
        );

        product.description = fixture.description;
        product.specifications = fixture.specifications;
        product.featured = fixture.featured;

        Ok(product)
    }
}

/// Parse a price string such as "299.99 USD" into minor units and currency.
///
/// # Errors
///
/// - [`FixtureError::InvalidPrice`]: the amount is malformed or has too many decimal places.
/// - [`FixtureError::UnknownCurrency`]: the currency code isn't an ISO currency.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    };

    let currency =
        iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    let minor = Decimal::from_str(amount)
        .ok()
        .and_then(|amount| minor_units_of(amount, currency))
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor, currency))
}

/// Parse a price string and check it is in `currency`.
///
/// # Errors
///
/// Returns the errors of [`parse_price`], or [`FixtureError::CurrencyMismatch`].
pub fn parse_money<'a>(
    s: &str,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, FixtureError> {
    let (minor, found) = parse_price(s)?;

    if found != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            found.iso_alpha_code.to_string(),
        ));
    }

    Ok(Money::from_minor(minor, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{JPY, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        assert_eq!(parse_price("299.99 USD")?, (299_99, USD));
        assert_eq!(parse_price("25 USD")?, (25_00, USD));
        assert_eq!(parse_price("1500 JPY")?, (1500, JPY));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_input() {
        for input in ["299.99", "USD", "abc USD", "1.999 USD", "1.00 USD extra"] {
            assert!(
                matches!(parse_price(input), Err(FixtureError::InvalidPrice(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("1.00 XYZ"),
            Err(FixtureError::UnknownCurrency(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn parse_money_checks_currency() -> TestResult {
        assert_eq!(parse_money("1.50 USD", USD)?, Money::from_minor(150, USD));
        assert!(matches!(
            parse_money("1.50 GBP", USD),
            Err(FixtureError::CurrencyMismatch(_, _))
        ));

        Ok(())
    }

    #[test]
    fn product_fixture_converts_to_product() -> TestResult {
        let fixture: ProductFixture = serde_norway::from_str(
            "id: acc-002\nname: Apheresis Tubing Set\nprice: 89.99 USD\ncategory: Accessories\nstock: 0\n",
        )?;

        let product = Product::try_from(fixture)?;

        assert_eq!(product.id.as_str(), "acc-002");
        assert_eq!(product.price, Money::from_minor(89_99, USD));
        assert!(!product.in_stock);
        assert!(product.specifications.is_empty());

        Ok(())
    }
}
