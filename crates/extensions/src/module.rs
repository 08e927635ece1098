//! Loadable modules and the units they declare

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use crate::context::ExtensionContext;
use crate::registry::{
    Binding, BindingPriority, Candidate, InterfaceDecl, PendingCandidate, Produced, ServiceScope, Shared,
};

/// Lifecycle shared by every registry-built implementation and plugin
pub trait Extension: Send + Sync + 'static {
    /// Release hooks and handlers installed at construction
    ///
    /// Called once at shutdown. Implementations should tolerate a second call.
    fn dispose(&self) {}
}

/// Metadata describing a loaded plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    pub author: String,
    /// Version of the module the plugin was loaded from
    pub version: String,
}

type PluginFactory<P> = dyn Fn(&ExtensionContext<'_>) -> anyhow::Result<Arc<P>> + Send + Sync;

/// A plugin unit of type `P`
///
/// Plugins are bound as their own singleton capability, so other plugins may
/// request them with [`ExtensionContext::get`].
pub struct PluginDescriptor<P> {
    name: String,
    author: String,
    factory: Arc<PluginFactory<P>>,
}

impl<P: Extension> PluginDescriptor<P> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ExtensionContext<'_>) -> anyhow::Result<Arc<P>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            author: String::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    fn into_pending(self, version: &str) -> PendingPlugin {
        let factory = self.factory;
        let produce = move |ctx: &ExtensionContext<'_>| -> anyhow::Result<Produced> {
            let instance = factory(ctx)?;
            let lifecycle: Arc<dyn Extension> = instance.clone();
            Ok(Produced {
                value: Arc::new(instance),
                lifecycle: Some(lifecycle),
            })
        };

        PendingPlugin {
            info: ExtensionInfo {
                name: self.name,
                author: self.author,
                version: version.to_string(),
            },
            id: TypeId::of::<P>(),
            type_name: type_name::<P>(),
            factory: Arc::new(produce),
            handle: |shared| {
                shared
                    .downcast_ref::<Arc<P>>()
                    .map(|plugin| plugin.clone() as Arc<dyn Extension>)
            },
        }
    }
}

pub(crate) struct PendingPlugin {
    pub(crate) info: ExtensionInfo,
    pub(crate) id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) factory: Arc<crate::registry::Factory>,
    pub(crate) handle: fn(&Shared) -> Option<Arc<dyn Extension>>,
}

impl PendingPlugin {
    pub(crate) fn binding(&self) -> Binding {
        Binding {
            interface: self.type_name,
            name: self.info.name.clone(),
            author: self.info.author.clone(),
            priority: BindingPriority::NORMAL,
            scope: ServiceScope::Singleton,
            depends_on: Vec::new(),
            factory: self.factory.clone(),
        }
    }
}

/// A unit of loading: one crate's worth of interfaces, candidates and plugins
///
/// Modules declare everything explicitly through the [`ModuleBuilder`].
pub trait ExtensionModule {
    /// Module name, must not be empty
    fn name(&self) -> &str;

    /// Version reported for every plugin the module declares
    fn version(&self) -> &str {
        "0.0.0"
    }

    fn register(&self, builder: &mut ModuleBuilder);
}

/// Accumulates declarations from one module
///
/// Nothing reaches the registry until the whole module has registered
/// successfully.
pub struct ModuleBuilder {
    version: String,
    pub(crate) interfaces: Vec<InterfaceDecl>,
    pub(crate) candidates: Vec<PendingCandidate>,
    pub(crate) plugins: Vec<PendingPlugin>,
    pub(crate) errors: Vec<String>,
}

impl ModuleBuilder {
    pub(crate) fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            interfaces: Vec::new(),
            candidates: Vec::new(),
            plugins: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Declare a capability interface
    pub fn declare_interface<I: ?Sized + 'static>(&mut self, scope: ServiceScope) -> &mut Self {
        self.interfaces.push(InterfaceDecl::of::<I>(scope));
        self
    }

    /// Declare a candidate implementation
    pub fn declare_candidate<I: ?Sized + Send + Sync + 'static>(&mut self, candidate: Candidate<I>) -> &mut Self {
        if candidate.name().is_empty() {
            self.errors.push(format!("candidate for {} has no name", type_name::<I>()));
        }
        self.candidates.push(candidate.into_pending());
        self
    }

    /// Declare a plugin unit
    pub fn declare_plugin<P: Extension>(&mut self, plugin: PluginDescriptor<P>) -> &mut Self {
        if plugin.name.is_empty() {
            self.errors.push(format!("plugin {} has no name", type_name::<P>()));
        }
        let pending = plugin.into_pending(&self.version);
        self.plugins.push(pending);
        self
    }
}

/// Read a plugin instance back out of its registry slot
pub(crate) fn downcast_plugin<P: Any + Send + Sync>(shared: &Shared) -> Option<Arc<P>> {
    shared.downcast_ref::<Arc<P>>().cloned()
}
