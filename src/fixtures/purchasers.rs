//! Purchaser Fixtures

use jiff::civil::Date;
use serde::Deserialize;

use crate::purchasers::{Address, Purchaser};

/// Wrapper for purchasers in YAML
#[derive(Debug, Deserialize)]
pub struct PurchasersFixture {
    /// Purchasers, in registration order
    pub purchasers: Vec<PurchaserFixture>,
}

/// Purchaser fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PurchaserFixture {
    /// Purchaser identifier (e.g. `user-001`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Sign-in email
    pub email: String,

    /// Contact phone number
    #[serde(default)]
    pub phone: String,

    /// Default shipping address
    pub address: Address,

    /// Registration date (e.g. `2023-01-15`)
    #[serde(default)]
    pub registration_date: Option<Date>,
}

impl From<PurchaserFixture> for Purchaser {
    fn from(fixture: PurchaserFixture) -> Self {
        let mut purchaser = Purchaser::new(fixture.id, fixture.name, fixture.email, fixture.address);

        purchaser.phone = fixture.phone;
        purchaser.registration_date = fixture.registration_date;

        purchaser
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn purchaser_fixture_accepts_camel_case_zip() -> TestResult {
        let fixture: PurchaserFixture = serde_norway::from_str(
            "id: user-002
name: Michael Chen
email: mchen@bloodbank.org
address:
  street: 456 Healthcare Blvd
  city: Los Angeles
  state: CA
  zipCode: '90210'
  country: USA
registration_date: 2023-02-20
",
        )?;

        let purchaser = Purchaser::from(fixture);

        assert_eq!(purchaser.address.zip_code, "90210");
        assert_eq!(purchaser.registration_date, Some(Date::new(2023, 2, 20)?));
        assert!(purchaser.phone.is_empty());

        Ok(())
    }
}
