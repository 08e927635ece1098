//! Event values and their cancellation state

use std::any::Any;
use std::fmt::Debug;

/// Cancellation flag and reason carried by every event
///
/// Once set, the flag cannot be cleared; the first reason given is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventState {
    canceled: bool,
    reason: Option<String>,
}

impl EventState {
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Mark as canceled, keeping the first reason seen
    pub fn cancel(&mut self, reason: Option<String>) {
        if self.reason.is_none() {
            self.reason = reason;
        }
        self.canceled = true;
    }
}

/// A value raised on the [`EventBus`](crate::EventBus)
///
/// Implement with [`impl_event!`](crate::impl_event) for structs that hold an
/// `EventState` field named `state`.
pub trait Event: Any + Send + Debug {
    fn state(&self) -> &EventState;
    fn state_mut(&mut self) -> &mut EventState;

    /// Whether a handler has canceled this occurrence
    fn is_canceled(&self) -> bool {
        self.state().is_canceled()
    }

    /// Cancel without a reason
    fn cancel(&mut self) {
        self.state_mut().cancel(None);
    }

    /// Cancel with a human-readable reason
    fn cancel_with(&mut self, reason: impl Into<String>)
    where
        Self: Sized,
    {
        self.state_mut().cancel(Some(reason.into()));
    }

    fn cancellation_reason(&self) -> Option<&str> {
        self.state().reason()
    }
}

/// Implement [`Event`] for a struct with a `state: EventState` field
///
/// # Example
/// ```rust
/// use hookwire_events::{impl_event, Event, EventState};
///
/// #[derive(Debug, Default)]
/// struct ServerTick {
///     state: EventState,
/// }
///
/// impl_event!(ServerTick);
///
/// let mut tick = ServerTick::default();
/// tick.cancel_with("paused");
/// assert!(tick.is_canceled());
/// ```
#[macro_export]
macro_rules! impl_event {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $ty {
                fn state(&self) -> &$crate::EventState {
                    &self.state
                }

                fn state_mut(&mut self) -> &mut $crate::EventState {
                    &mut self.state
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct TestEvent {
        state: EventState,
    }

    impl_event!(TestEvent);

    #[test]
    fn test_cancel_keeps_first_reason() {
        let mut evt = TestEvent::default();
        assert!(!evt.is_canceled());

        evt.cancel_with("first");
        evt.cancel_with("second");
        assert!(evt.is_canceled());
        assert_eq!(evt.cancellation_reason(), Some("first"));
    }

    #[test]
    fn test_reason_added_after_plain_cancel() {
        let mut evt = TestEvent::default();
        evt.cancel();
        assert_eq!(evt.cancellation_reason(), None);

        evt.cancel_with("late");
        assert_eq!(evt.cancellation_reason(), Some("late"));
    }
}
