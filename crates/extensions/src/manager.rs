//! # Extension Manager
//!
//! Loads modules, binds their capabilities and builds their plugins.
//!
//! ## Lifecycle
//!
//! 1. [`ExtensionManager::bind_constant`] for host-owned services
//! 2. [`ExtensionManager::load`] for each module (accumulates, no side effects)
//! 3. [`ExtensionManager::initialize`] binds and builds everything loaded so far
//! 4. [`ExtensionManager::shutdown`] (or drop) disposes everything once

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use hookwire_events::EventBus;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ExtensionError, Result};
use crate::module::{downcast_plugin, Extension, ExtensionInfo, ExtensionModule, ModuleBuilder, PendingPlugin};
use crate::registry::{ServiceRegistry, Shared};

/// What to do when two plugins declare the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail initialization before anything is built
    #[default]
    Error,
    /// Keep the plugin constructed last
    Overwrite,
}

struct PluginEntry {
    info: ExtensionInfo,
    instance: Shared,
    handle: Arc<dyn Extension>,
}

/// Orders discovery, binding and construction of extensions
pub struct ExtensionManager {
    registry: ServiceRegistry,
    events: Arc<EventBus>,
    pending: Mutex<Vec<PendingPlugin>>,
    plugins: DashMap<String, PluginEntry>,
    duplicate_policy: DuplicatePolicy,
    shut_down: AtomicBool,
}

impl ExtensionManager {
    /// Create a manager around a shared event bus
    ///
    /// The bus is bound as a constant so every extension can request it.
    pub fn new(events: Arc<EventBus>) -> Self {
        let registry = ServiceRegistry::new();
        registry.bind_constant::<EventBus>(events.clone());

        debug!("Creating extension manager");
        Self {
            registry,
            events,
            pending: Mutex::new(Vec::new()),
            plugins: DashMap::new(),
            duplicate_policy: DuplicatePolicy::default(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Bind a host-owned instance
    pub fn bind_constant<I: ?Sized + Send + Sync + 'static>(&self, value: Arc<I>) {
        self.registry.bind_constant(value);
    }

    /// Accumulate a module's declarations
    ///
    /// # Errors
    /// [`ExtensionError::Precondition`] if the module or any of its
    /// declarations is unnamed; nothing from the module is kept in that case.
    pub fn load(&self, module: &dyn ExtensionModule) -> Result<()> {
        if module.name().is_empty() {
            return Err(ExtensionError::Precondition("module has no name".into()));
        }

        let mut builder = ModuleBuilder::new(module.version());
        module.register(&mut builder);

        if let Some(error) = builder.errors.first() {
            return Err(ExtensionError::Precondition(format!("module {}: {}", module.name(), error)));
        }

        info!(
            "Loaded module {} v{}: {} interfaces, {} candidates, {} plugins",
            module.name(),
            module.version(),
            builder.interfaces.len(),
            builder.candidates.len(),
            builder.plugins.len()
        );

        for decl in builder.interfaces {
            self.registry.declare(decl);
        }
        for candidate in builder.candidates {
            self.registry.declare_pending(candidate);
        }
        self.pending.lock().extend(builder.plugins);
        Ok(())
    }

    /// Bind everything loaded so far and build its plugins
    ///
    /// Plugins are built in the order they were loaded. Calling this again
    /// only processes modules loaded since the previous call.
    pub fn initialize(&self) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock());
        self.check_plugins(&pending)?;

        self.registry.resolve_all()?;

        for plugin in &pending {
            self.registry.bind(plugin.id, plugin.binding());
        }

        for plugin in pending {
            let instance = self.registry.resolve_id(plugin.id, plugin.type_name)?;
            let handle = (plugin.handle)(&instance).ok_or_else(|| ExtensionError::Unbound {
                interface: plugin.type_name.to_string(),
            })?;

            info!(
                "Initialized plugin {} v{} by {}",
                plugin.info.name,
                plugin.info.version,
                if plugin.info.author.is_empty() { "unknown" } else { plugin.info.author.as_str() }
            );

            let name = plugin.info.name.clone();
            let entry = PluginEntry { info: plugin.info, instance, handle };
            if self.plugins.insert(name.clone(), entry).is_some() {
                warn!("Plugin name {} was already taken; keeping the newest", name);
            }
        }
        Ok(())
    }

    fn check_plugins(&self, pending: &[PendingPlugin]) -> Result<()> {
        let mut types = HashSet::new();
        for plugin in pending {
            if !types.insert(plugin.id) || self.registry.is_bound_id(plugin.id) {
                return Err(ExtensionError::Precondition(format!(
                    "plugin type {} is declared more than once",
                    plugin.type_name
                )));
            }
        }

        if self.duplicate_policy == DuplicatePolicy::Error {
            let mut names = HashSet::new();
            for plugin in pending {
                let name = plugin.info.name.as_str();
                if !names.insert(name) || self.plugins.contains_key(name) {
                    return Err(ExtensionError::DuplicateName { name: name.to_string() });
                }
            }
        }
        Ok(())
    }

    /// Resolve a bound capability
    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
        self.registry.get::<I>()
    }

    /// Look up a plugin by name and type
    pub fn plugin<P: Extension>(&self, name: &str) -> Option<Arc<P>> {
        self.plugins.get(name).and_then(|entry| downcast_plugin::<P>(&entry.instance))
    }

    /// Look up a plugin by name
    pub fn plugin_handle(&self, name: &str) -> Option<Arc<dyn Extension>> {
        self.plugins.get(name).map(|entry| entry.handle.clone())
    }

    /// Metadata of every plugin, sorted by name
    pub fn plugins(&self) -> Vec<ExtensionInfo> {
        let mut infos: Vec<ExtensionInfo> = self.plugins.iter().map(|entry| entry.info.clone()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Dispose every plugin and singleton once
    ///
    /// Later calls do nothing.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let disposed = self.registry.dispose_all();
        self.plugins.clear();
        self.pending.lock().clear();
        info!("Extension manager shut down ({} instances disposed)", disposed);
    }
}

impl Drop for ExtensionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
