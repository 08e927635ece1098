//! The event bus

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::Event;

/// Handler execution priority
///
/// Higher priorities run first. Handlers with equal priority run in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventPriority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

/// Identifies one registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

type ErasedHandler = dyn Fn(&mut dyn Any) + Send + Sync;

struct HandlerEntry {
    id: HandlerId,
    owner: String,
    priority: EventPriority,
    handler: Box<ErasedHandler>,
}

/// Synchronous, priority-ordered, cancelable event bus
///
/// Handlers are keyed by the concrete event type. Raising runs every handler
/// for that type on the calling thread, even after one of them cancels; the
/// caller decides what cancellation suppresses.
pub struct EventBus {
    handlers: RwLock<HashMap<TypeId, Vec<Arc<HandlerEntry>>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        tracing::debug!("Creating event bus");
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler for events of type `E`
    ///
    /// # Arguments
    /// * `owner` - Name of the registering unit, used for batch removal and diagnostics
    /// * `priority` - Execution priority
    /// * `handler` - Callback receiving the event mutably
    ///
    /// # Returns
    /// An id that can be passed to [`EventBus::deregister`]
    pub fn register<E, F>(&self, owner: &str, priority: EventPriority, handler: F) -> HandlerId
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(HandlerEntry {
            id,
            owner: owner.to_string(),
            priority,
            handler: Box::new(move |evt: &mut dyn Any| {
                if let Some(evt) = evt.downcast_mut::<E>() {
                    handler(evt);
                }
            }),
        });

        let mut handlers = self.handlers.write();
        let list = handlers.entry(TypeId::of::<E>()).or_default();
        // Stable: after every handler of equal or higher priority
        let at = list.partition_point(|existing| existing.priority >= priority);
        list.insert(at, entry);

        tracing::debug!(
            "Registered {:?} handler for {} owned by {}",
            priority,
            type_name::<E>(),
            owner
        );
        id
    }

    /// Remove one handler
    ///
    /// # Returns
    /// `true` if the handler was registered
    pub fn deregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|entry| entry.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Remove every handler registered by `owner`
    ///
    /// # Returns
    /// The number of handlers removed
    pub fn deregister_owner(&self, owner: &str) -> usize {
        let mut handlers = self.handlers.write();
        let mut removed = 0;
        for list in handlers.values_mut() {
            let before = list.len();
            list.retain(|entry| entry.owner != owner);
            removed += before - list.len();
        }
        handlers.retain(|_, list| !list.is_empty());

        tracing::debug!("Deregistered {} handlers owned by {}", removed, owner);
        removed
    }

    /// Number of handlers registered for `E`
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, |list| list.len())
    }

    /// Raise an event
    ///
    /// Handlers run in priority order against a snapshot taken before the
    /// first one is invoked, so handlers may register, deregister, or raise
    /// further events without deadlocking.
    pub fn raise<E: Event>(&self, event: &mut E) {
        let snapshot = match self.handlers.read().get(&TypeId::of::<E>()) {
            Some(list) => list.clone(),
            None => return,
        };

        tracing::trace!("Raising {} to {} handlers", type_name::<E>(), snapshot.len());

        for entry in snapshot {
            let was_canceled = event.is_canceled();
            (entry.handler)(event as &mut dyn Any);

            if !was_canceled && event.is_canceled() {
                tracing::debug!(
                    "{} canceled by {}: {}",
                    type_name::<E>(),
                    entry.owner,
                    event.cancellation_reason().unwrap_or("no reason given")
                );
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        f.debug_struct("EventBus")
            .field("event_types", &handlers.len())
            .field("handlers", &handlers.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
