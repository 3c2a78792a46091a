//! Opaque accession identifiers (spec §3).
//!
//! Each is an upper-case ASCII string matching a fixed prefix-plus-digits
//! pattern. A value that fails the pattern is treated as a parse failure for
//! that record only — never a process-wide panic — so construction goes
//! through `TryFrom<String>` rather than an infallible wrapper.

use crate::error::ReconcileError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! accession_id {
    ($name:ident, $prefix:literal, $digits:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            fn is_valid(s: &str) -> bool {
                s.len() == $prefix.len() + $digits
                    && s.starts_with($prefix)
                    && s[$prefix.len()..].bytes().all(|b| b.is_ascii_digit())
            }
        }

        impl TryFrom<String> for $name {
            type Error = ReconcileError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                if Self::is_valid(&value) {
                    Ok(Self(value))
                } else {
                    Err(ReconcileError::SchemaFailure {
                        message: format!(
                            concat!(stringify!($name), " '{}' does not match ", $prefix, "+{}d"),
                            value, $digits
                        ),
                    })
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ReconcileError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

accession_id!(DacId, "EGAC", 11);
accession_id!(DatasetId, "EGAD", 11);
accession_id!(UserAccessionId, "EGAW", 11);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_ids() {
        assert!(DatasetId::try_from("EGAD00000000001".to_string()).is_ok());
        assert!(DacId::try_from("EGAC00000000001".to_string()).is_ok());
        assert!(UserAccessionId::try_from("EGAW00000000001".to_string()).is_ok());
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(DatasetId::try_from("EGAC00000000001".to_string()).is_err());
    }

    #[test]
    fn rejects_wrong_digit_count() {
        assert!(DatasetId::try_from("EGAD0000000001".to_string()).is_err());
        assert!(DatasetId::try_from("EGAD000000000011".to_string()).is_err());
    }

    #[test]
    fn rejects_non_digit_suffix() {
        assert!(DatasetId::try_from("EGAD0000000000X".to_string()).is_err());
    }

    proptest::proptest! {
        /// Any 11-digit suffix glued onto the fixed prefix round-trips
        /// through `TryFrom`/`Display` back to the same string, for all
        /// three accession id kinds.
        #[test]
        fn well_formed_ids_round_trip(digits in "[0-9]{11}") {
            let dataset = format!("EGAD{digits}");
            let dac = format!("EGAC{digits}");
            let user = format!("EGAW{digits}");

            let parsed = DatasetId::try_from(dataset.clone()).unwrap();
            prop_assert_eq!(parsed.to_string(), dataset);

            let parsed = DacId::try_from(dac.clone()).unwrap();
            prop_assert_eq!(parsed.to_string(), dac);

            let parsed = UserAccessionId::try_from(user.clone()).unwrap();
            prop_assert_eq!(parsed.to_string(), user);
        }

        /// A suffix that isn't exactly 11 ASCII digits is always rejected,
        /// regardless of prefix.
        #[test]
        fn malformed_suffix_is_always_rejected(suffix in "[^0-9]{1,20}") {
            prop_assert!(DatasetId::try_from(format!("EGAD{suffix}")).is_err());
        }
    }
}
