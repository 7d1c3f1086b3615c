//! Macros for declaring identifier constants.

/// Declare `const` [`StateId`](crate::core::StateId)s.
///
/// # Example
///
/// ```
/// use hfsm::state_ids;
///
/// state_ids! {
///     pub PARKED = "parked";
///     pub DRIVING = "driving";
/// }
///
/// assert_eq!(PARKED.as_str(), "parked");
/// ```
#[macro_export]
macro_rules! state_ids {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $value:literal;)*) => {
        $(
            $(#[$meta])*
            $vis const $name: $crate::core::StateId = $crate::core::StateId::from_static($value);
        )*
    };
}

/// Declare `const` [`EventId`](crate::core::EventId)s.
///
/// # Example
///
/// ```
/// use hfsm::event_ids;
///
/// event_ids! {
///     RIDE = "ride";
/// }
///
/// assert_eq!(RIDE.as_str(), "ride");
/// ```
#[macro_export]
macro_rules! event_ids {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $value:literal;)*) => {
        $(
            $(#[$meta])*
            $vis const $name: $crate::core::EventId = $crate::core::EventId::from_static($value);
        )*
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{EventId, StateId};

    state_ids! {
        IDLE = "idle";
        /// Documented ids keep their attributes.
        pub(crate) BUSY = "busy";
    }

    event_ids! {
        START = "start";
    }

    #[test]
    fn declared_ids_are_usable_constants() {
        assert_eq!(IDLE, StateId::from("idle"));
        assert_eq!(BUSY.as_str(), "busy");
        assert_eq!(START, EventId::from("start"));
        assert!(!START.is_reserved());
    }
}
