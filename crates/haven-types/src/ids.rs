//! Type-safe identifier wrappers.
//!
//! Static content (abilities, recipes, spawn points, zones, staff, story
//! events) is keyed by human-readable string ids that appear verbatim in
//! content files and snapshots. Customers are transient and numbered.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of a creature ability (e.g. `burrow_fetch`).
    AbilityId
}

define_id! {
    /// Identifier of a recipe (e.g. `honey_cake`).
    RecipeId
}

define_id! {
    /// Identifier of a resource spawn point (e.g. `cg_herb_1`).
    SpawnPointId
}

define_id! {
    /// Identifier of an inventory item kind (e.g. `garden_herb`).
    ItemId
}

define_id! {
    /// Identifier of an explorable zone (e.g. `forest_depths`).
    ZoneId
}

define_id! {
    /// Identifier of a staff member (e.g. `melody`).
    StaffId
}

define_id! {
    /// Identifier of a narrative event.
    EventId
}

define_id! {
    /// Identifier of a seasonal festival (e.g. `lantern_festival`).
    FestivalId
}

define_id! {
    /// Identifier of an achievement (e.g. `cafe_grand_opening`).
    AchievementId
}

/// Sequential identifier of a customer within a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "customer-{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_serialize_transparently() {
        let id = RecipeId::new("honey_cake");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"honey_cake\"");
        assert_eq!(id.to_string(), "honey_cake");
    }

    #[test]
    fn distinct_id_types_compare_by_text() {
        assert_eq!(ZoneId::from("meadow_fields"), ZoneId::new("meadow_fields"));
        assert!(AbilityId::from("a") < AbilityId::from("b"));
    }
}
