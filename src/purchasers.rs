//! Purchasers

use std::fmt;

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::ids::PurchaserId;

/// Errors raised by directory updates.
#[derive(Debug, Error, PartialEq)]
pub enum DirectoryError {
    /// A purchaser with the same identifier is already registered.
    #[error("Purchaser {0} already exists")]
    DuplicatePurchaser(PurchaserId),

    /// Another purchaser already uses this email address.
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),
}

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Address {
    /// Street line
    pub street: String,

    /// City
    pub city: String,

    /// State or region
    pub state: String,

    /// ZIP or postal code
    #[serde(alias = "zipCode")]
    pub zip_code: String,

    /// Country
    pub country: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.zip_code, self.country
        )
    }
}

/// Purchaser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchaser {
    /// Purchaser identifier
    pub id: PurchaserId,

    /// Display name
    pub name: String,

    /// Contact email, also used to sign in
    pub email: String,

    /// Contact phone number
    pub phone: String,

    /// Default shipping address
    pub address: Address,

    /// Date the purchaser registered
    pub registration_date: Option<Date>,
}

impl Purchaser {
    /// Create a purchaser with no phone number or registration date.
    pub fn new(
        id: impl Into<PurchaserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            address,
            registration_date: None,
        }
    }
}

/// Purchaser directory
#[derive(Debug, Default)]
pub struct Directory {
    purchasers: Vec<Purchaser>,
    ids: FxHashMap<PurchaserId, usize>,
}

impl Directory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a purchaser.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::DuplicatePurchaser`]: the identifier is already registered.
    /// - [`DirectoryError::DuplicateEmail`]: the email is already registered (case-insensitive).
    pub fn insert(&mut self, purchaser: Purchaser) -> Result<(), DirectoryError> {
        if self.ids.contains_key(&purchaser.id) {
            return Err(DirectoryError::DuplicatePurchaser(purchaser.id));
        }

        if self.find_by_email(&purchaser.email).is_some() {
            return Err(DirectoryError::DuplicateEmail(purchaser.email));
        }

        self.ids.insert(purchaser.id.clone(), self.purchasers.len());
        self.purchasers.push(purchaser);

        Ok(())
    }

    /// Get a purchaser by identifier.
    pub fn get(&self, id: &PurchaserId) -> Option<&Purchaser> {
        self.ids.get(id).and_then(|idx| self.purchasers.get(*idx))
    }

    /// Resolve the purchaser signing in with this email address.
    pub fn find_by_email(&self, email: &str) -> Option<&Purchaser> {
        let email = email.trim();

        self.purchasers
            .iter()
            .find(|purchaser| purchaser.email.eq_ignore_ascii_case(email))
    }

    /// Iterate over purchasers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Purchaser> {
        self.purchasers.iter()
    }

    /// Number of registered purchasers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.purchasers.len()
    }

    /// Check if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.purchasers.is_empty()
    }
}
