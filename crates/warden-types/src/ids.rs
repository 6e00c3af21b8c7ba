//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Players are identified by the stable UUID the game server assigns to
//! their account. The control plane treats the value as opaque beyond
//! equality, ordering, and formatting.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Length of the canonical `8-4-4-4-12` text form.
const HYPHENATED_LEN: usize = 36;

/// A player identity string was not a hyphenated UUID.
#[derive(Debug, thiserror::Error)]
pub enum IdParseError {
    /// Not the `8-4-4-4-12` form (simple, braced, `urn:`, or padded input).
    #[error("expected a hyphenated UUID")]
    NotHyphenated,

    /// Right shape, bad content.
    #[error(transparent)]
    Invalid(#[from] uuid::Error),
}

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Derive a stable identifier from a name (UUID v5).
            ///
            /// The same name always yields the same identifier, which lets
            /// scripted players keep their notes and history across restarts.
            pub fn from_name(name: &str) -> Self {
                Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            /// Accepts only the hyphenated form, in either case.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != HYPHENATED_LEN {
                    return Err(IdParseError::NotHyphenated);
                }
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable unique identifier for a player account.
    PlayerId
}
