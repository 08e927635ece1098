//! Construction context handed to factories

use std::sync::Arc;

use hookwire_events::EventBus;

use crate::error::Result;
use crate::registry::ServiceRegistry;

/// What a factory can see while its implementation is built
pub struct ExtensionContext<'a> {
    registry: &'a ServiceRegistry,
    name: &'a str,
}

impl<'a> ExtensionContext<'a> {
    pub(crate) fn new(registry: &'a ServiceRegistry, name: &'a str) -> Self {
        Self { registry, name }
    }

    /// Declared name of the implementation being built
    pub fn name(&self) -> &str {
        self.name
    }

    /// Resolve a dependency
    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
        self.registry.get::<I>()
    }

    /// The shared event bus
    pub fn events(&self) -> Result<Arc<EventBus>> {
        self.registry.get::<EventBus>()
    }

    /// A span attributing log output to this extension
    ///
    /// Store it and enter it in hooks and handlers.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("extension", name = %self.name)
    }
}
