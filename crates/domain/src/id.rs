//! UUID-backed identifiers for devices and entities.
//!
//! Frames are rediscovered on every start, so ids are normally derived from
//! the vendor key with `stable`: the same frame maps to the same device and
//! entity across restarts. A builder without an explicit id falls back to a
//! random one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident => $namespace:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Random id, for objects without a vendor key.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Id derived from `(integration, key)`; always the same for the
            /// same pair.
            #[must_use]
            pub fn stable(integration: &str, key: &str) -> Self {
                let name = format!("{}/{integration}/{key}", $namespace);
                Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::try_parse(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`Device`](crate::device::Device).
    DeviceId => "meural:device"
);

uuid_id!(
    /// Identifier of an [`Entity`](crate::entity::Entity).
    EntityId => "meural:entity"
);
