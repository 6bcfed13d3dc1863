//! Unique identifiers for tracked entities
//!
//! Each entity type has its own id newtype to prevent mixing up different
//! kinds of identifiers. Ids are opaque strings minted by the caller (the
//! shell uses UUIDs); the core only compares them.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Card
    CardId
);
string_id!(
    /// Unique identifier for a Benefit within a card
    BenefitId
);
string_id!(
    /// Unique identifier for a MinimumSpend within a card
    MinimumSpendId
);
string_id!(
    /// Unique identifier for a usage justification entry
    JustificationId
);
