//! Stable newtype identifiers for domain entities.
//!
//! Plain `String` ids are easy to mix up at call sites (an `EquipmentId`
//! passed where a `SpecialistId` is expected compiles silently). These
//! newtypes close that hole while staying transparent enough to build
//! from a `&str` or `String` without ceremony.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

id_type!(ActivityId);
id_type!(SpecialistId);
id_type!(EquipmentId);
id_type!(TravelPeriodId);
