//! Newtype wrappers around [`uuid::Uuid`] for client-generated identifiers.
//!
//! Entity ids are assigned by the remote system and live in
//! `drivesync-entity`; the ids here are minted locally and never sent
//! over the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a locally minted newtype ID around `Uuid`.
macro_rules! define_local_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Mint a new identifier. Version 7 keeps ids ordered by creation.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Leading eight hex digits, for compact log lines.
            pub fn short(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_local_id!(
    /// Unique identifier for a submitted mutation descriptor.
    MutationId
);

define_local_id!(
    /// Unique identifier for a published domain event.
    EventId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_ids_are_unique() {
        let first = MutationId::new();
        let second = MutationId::new();
        assert_ne!(first, second);
    }

    #[test]
    fn test_short_form() {
        let id: MutationId = "0190b6a2-7c1d-7000-8000-000000000000"
            .parse()
            .expect("should parse");
        assert_eq!(id.short(), "0190b6a2");
    }
}
