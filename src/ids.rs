//! Identifiers
//!
//! String-backed newtypes so product, purchaser and order identifiers can't be mixed up.

use std::fmt;

use serde::Deserialize;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Catalog product identifier (e.g. `sdp-001`).
    ProductId
);

define_id!(
    /// Purchaser identifier (e.g. `user-001`).
    PurchaserId
);

define_id!(
    /// Order identifier (e.g. `ORD-2024-001`).
    OrderId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_as_str_and_display_match() {
        let id = ProductId::new("sdp-001");

        assert_eq!(id.as_str(), "sdp-001");
        assert_eq!(id.to_string(), "sdp-001");
    }

    #[test]
    fn ids_from_str_and_string_are_equal() {
        let a: OrderId = "ORD-1".into();
        let b = OrderId::from(String::from("ORD-1"));

        assert_eq!(a, b);
        assert_ne!(a, OrderId::new("ORD-2"));
    }

    #[test]
    fn ids_deserialize_from_plain_strings() -> testresult::TestResult {
        let id: PurchaserId = serde_norway::from_str("user-001")?;

        assert_eq!(id, PurchaserId::new("user-001"));

        Ok(())
    }
}
