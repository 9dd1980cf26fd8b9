//! Typed arena keys.
//!
//! Each key wraps the [`ObjectToken`] issued when its entity was built, so
//! persisted and not-yet-persisted objects are addressed the same way.

use serde::{Deserialize, Serialize};

use stockflow_core::ObjectToken;

macro_rules! impl_key {
    ($t:ident, $label:literal) => {
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $t(ObjectToken);

        impl $t {
            /// Issue a fresh key.
            pub fn new() -> Self {
                Self(ObjectToken::next())
            }

            pub fn token(&self) -> ObjectToken {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}{}", $label, self.0)
            }
        }
    };
}

impl_key!(SubjectKey, "subject");
impl_key!(UnitKey, "unit");
impl_key!(AssignmentKey, "assignment");
impl_key!(SaleKey, "sale");
impl_key!(SaleItemKey, "item");
