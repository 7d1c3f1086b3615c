//! String identifiers for states and events.
//!
//! Both identifiers are thin newtypes over `Cow<'static, str>` so they can be
//! declared as `const` values (see [`state_ids!`](crate::state_ids)) and
//! cloned cheaply when borrowed from a literal.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Create an identifier from a static string without allocating.
            pub const fn from_static(id: &'static str) -> Self {
                Self(Cow::Borrowed(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&*self.0, f)
            }
        }

        impl From<&'static str> for $name {
            fn from(id: &'static str) -> Self {
                Self::from_static(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Cow::Owned(id))
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }
    };
}

string_id! {
    /// Unique identifier of a state within a [`Definition`](crate::core::Definition).
    StateId
}

string_id! {
    /// Identifier of an event type.
    EventId
}

/// Event attached to the context of entries that no user event drove
/// (machine start, forced state assignment).
pub const ENTRY_EVENT: EventId = EventId::from_static("_entry");

/// Event attached to the context of exit callbacks.
pub const EXIT_EVENT: EventId = EventId::from_static("_exit");

/// Event attached to the context of timer pre-fire actions.
pub const TIMEOUT_EVENT: EventId = EventId::from_static("_timeout");

impl EventId {
    /// Whether this id belongs to the engine's internal bookkeeping events.
    pub fn is_reserved(&self) -> bool {
        *self == ENTRY_EVENT || *self == EXIT_EVENT || *self == TIMEOUT_EVENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn ids_compare_with_str() {
        let id = StateId::from("parked");
        assert_eq!(id, "parked");
        assert_ne!(id, "driving");
    }

    #[test]
    fn static_and_owned_ids_are_equal() {
        let borrowed = StateId::from_static("idle");
        let owned = StateId::from(String::from("idle"));
        assert_eq!(borrowed, owned);
    }

    #[test]
    fn ids_look_up_by_str() {
        let mut map = HashMap::new();
        map.insert(StateId::from("idle"), 1);
        assert_eq!(map.get("idle"), Some(&1));
    }

    #[test]
    fn reserved_events_are_detected() {
        assert!(ENTRY_EVENT.is_reserved());
        assert!(EXIT_EVENT.is_reserved());
        assert!(TIMEOUT_EVENT.is_reserved());
        assert!(!EventId::from("timeout").is_reserved());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&StateId::from("drive")).unwrap();
        assert_eq!(json, "\"drive\"");
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, "drive");
    }
}
