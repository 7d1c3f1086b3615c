//! Events carried through the dispatch queue.

use super::ids::EventId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased event payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An event id plus an optional payload.
///
/// Payloads are shared, so cloning an event (for example when a timer is
/// restarted) never copies the payload itself.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Event;
///
/// let event = Event::with_payload("speed", 42u32);
/// assert_eq!(event.id(), "speed");
/// assert_eq!(event.payload::<u32>(), Some(&42));
/// assert_eq!(event.payload::<String>(), None);
/// ```
#[derive(Clone)]
pub struct Event {
    id: EventId,
    payload: Option<Payload>,
}

impl Event {
    pub fn new(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            payload: None,
        }
    }

    pub fn with_payload<T>(id: impl Into<EventId>, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            id: id.into(),
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Borrow the payload as `T`, if present and of that type.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl From<EventId> for Event {
    fn from(id: EventId) -> Self {
        Self::new(id)
    }
}

impl From<&'static str> for Event {
    fn from(id: &'static str) -> Self {
        Self::new(id)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Reading {
        celsius: i32,
    }

    #[test]
    fn payload_downcasts_to_original_type() {
        let event = Event::with_payload("reading", Reading { celsius: 21 });
        assert_eq!(event.payload::<Reading>(), Some(&Reading { celsius: 21 }));
    }

    #[test]
    fn payload_of_wrong_type_is_none() {
        let event = Event::with_payload("reading", 7u8);
        assert!(event.payload::<Reading>().is_none());
    }

    #[test]
    fn plain_event_has_no_payload() {
        let event = Event::new("tick");
        assert!(!event.has_payload());
        assert!(event.payload::<u8>().is_none());
    }

    #[test]
    fn clones_share_payload() {
        let event = Event::with_payload("reading", Reading { celsius: 3 });
        let copy = event.clone();
        let a = event.payload::<Reading>().unwrap() as *const Reading;
        let b = copy.payload::<Reading>().unwrap() as *const Reading;
        assert_eq!(a, b);
    }
}
