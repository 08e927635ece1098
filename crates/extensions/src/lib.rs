//! Hookwire Extensions - Service registry and extension lifecycle
//!
//! Modules declare capability interfaces, competing candidate
//! implementations and plugin units through a [`ModuleBuilder`]. The
//! [`ExtensionManager`] binds each interface to its highest priority
//! candidate, builds singletons and plugins in dependency order, and disposes
//! them all at shutdown.

mod context;
mod error;
mod manager;
mod module;
mod registry;

pub use context::ExtensionContext;
pub use error::{ExtensionError, Result as ExtensionResult};
pub use manager::{DuplicatePolicy, ExtensionManager};
pub use module::{Extension, ExtensionInfo, ExtensionModule, ModuleBuilder, PluginDescriptor};
pub use registry::{BindingInfo, BindingPriority, Candidate, ServiceRegistry, ServiceScope};
