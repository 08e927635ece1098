//! # Service Registry
//!
//! Maps capability interfaces (usually `dyn Trait` types) to one winning
//! implementation. Candidates are declared up front, the highest priority
//! one is bound when [`ServiceRegistry::resolve_all`] runs, and singletons
//! are built eagerly in dependency order.

use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::context::ExtensionContext;
use crate::error::{ExtensionError, Result};
use crate::module::Extension;

/// Type-erased `Arc<I>` for some interface `I`
pub(crate) type Shared = Arc<dyn Any + Send + Sync>;

/// What a factory hands back to the registry
pub(crate) struct Produced {
    pub(crate) value: Shared,
    pub(crate) lifecycle: Option<Arc<dyn Extension>>,
}

pub(crate) type Factory = dyn Fn(&ExtensionContext<'_>) -> anyhow::Result<Produced> + Send + Sync;

/// Lifetime of a bound implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceScope {
    /// Built once, eagerly, when the interface is bound
    Singleton,
    /// Built anew on every request
    Transient,
}

/// Candidate priority; higher wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BindingPriority(pub i32);

impl BindingPriority {
    pub const LOWEST: Self = Self(-200);
    pub const LOW: Self = Self(-100);
    pub const NORMAL: Self = Self(0);
    pub const HIGH: Self = Self(100);
    pub const HIGHEST: Self = Self(200);
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Dependency {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

/// One implementation competing for interface `I`
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use hookwire_extensions::{BindingPriority, Candidate, Extension};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Extension for English {}
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let candidate = Candidate::<dyn Greeter>::new(
///     "english",
///     |_ctx| Ok(Arc::new(English)),
///     |english| english as Arc<dyn Greeter>,
/// )
/// .priority(BindingPriority::HIGH);
/// assert_eq!(candidate.name(), "english");
/// ```
pub struct Candidate<I: ?Sized> {
    name: String,
    author: String,
    priority: BindingPriority,
    implementation: &'static str,
    depends_on: Vec<Dependency>,
    factory: Arc<Factory>,
    _interface: PhantomData<fn() -> Arc<I>>,
}

impl<I: ?Sized + Send + Sync + 'static> Candidate<I> {
    /// Create a candidate
    ///
    /// # Arguments
    /// * `name` - Declared name of the implementation
    /// * `factory` - Builds the implementation, pulling dependencies from the context
    /// * `upcast` - Converts the concrete `Arc<T>` into `Arc<I>`
    pub fn new<T, F>(name: impl Into<String>, factory: F, upcast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Extension,
        F: Fn(&ExtensionContext<'_>) -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
    {
        let factory = move |ctx: &ExtensionContext<'_>| -> anyhow::Result<Produced> {
            let instance = factory(ctx)?;
            let lifecycle: Arc<dyn Extension> = instance.clone();
            Ok(Produced {
                value: Arc::new(upcast(instance)),
                lifecycle: Some(lifecycle),
            })
        };

        Self {
            name: name.into(),
            author: String::new(),
            priority: BindingPriority::NORMAL,
            implementation: type_name::<T>(),
            depends_on: Vec::new(),
            factory: Arc::new(factory),
            _interface: PhantomData,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn priority(mut self, priority: BindingPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Declare that the factory requests `D`
    ///
    /// Declared dependencies order eager singleton construction and let
    /// cycles be reported before anything is built.
    pub fn depends_on<D: ?Sized + 'static>(mut self) -> Self {
        self.depends_on.push(Dependency { id: TypeId::of::<D>(), name: type_name::<D>() });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_pending(self) -> PendingCandidate {
        PendingCandidate {
            interface: TypeId::of::<I>(),
            interface_name: type_name::<I>(),
            name: self.name,
            author: self.author,
            priority: self.priority,
            implementation: self.implementation,
            depends_on: self.depends_on,
            factory: self.factory,
        }
    }
}

pub(crate) struct PendingCandidate {
    pub(crate) interface: TypeId,
    pub(crate) interface_name: &'static str,
    pub(crate) name: String,
    pub(crate) author: String,
    pub(crate) priority: BindingPriority,
    pub(crate) implementation: &'static str,
    pub(crate) depends_on: Vec<Dependency>,
    pub(crate) factory: Arc<Factory>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct InterfaceDecl {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) scope: ServiceScope,
}

impl InterfaceDecl {
    pub(crate) fn of<I: ?Sized + 'static>(scope: ServiceScope) -> Self {
        Self { id: TypeId::of::<I>(), name: type_name::<I>(), scope }
    }
}

pub(crate) struct Binding {
    pub(crate) interface: &'static str,
    pub(crate) name: String,
    pub(crate) author: String,
    pub(crate) priority: BindingPriority,
    pub(crate) scope: ServiceScope,
    pub(crate) depends_on: Vec<Dependency>,
    pub(crate) factory: Arc<Factory>,
}

/// Public view of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub interface: String,
    pub name: String,
    pub author: String,
    pub priority: BindingPriority,
    pub scope: ServiceScope,
}

#[derive(Default)]
struct Pending {
    interfaces: Vec<InterfaceDecl>,
    candidates: Vec<PendingCandidate>,
}

/// Priority-resolving dependency registry
pub struct ServiceRegistry {
    pending: Mutex<Pending>,
    bindings: RwLock<HashMap<TypeId, Arc<Binding>>>,
    instances: RwLock<HashMap<TypeId, Shared>>,
    /// Bindings being built, per thread
    constructing: Mutex<Vec<(ThreadId, TypeId, String)>>,
    /// Constructed singletons in construction order
    lifecycles: Mutex<Vec<(String, Arc<dyn Extension>)>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        debug!("Creating service registry");
        Self {
            pending: Mutex::new(Pending::default()),
            bindings: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            constructing: Mutex::new(Vec::new()),
            lifecycles: Mutex::new(Vec::new()),
        }
    }

    /// Declare a capability interface
    ///
    /// Declaring the same interface again is a no-op; the first scope wins.
    pub fn declare_interface<I: ?Sized + 'static>(&self, scope: ServiceScope) {
        self.declare(InterfaceDecl::of::<I>(scope));
    }

    pub(crate) fn declare(&self, decl: InterfaceDecl) {
        let mut pending = self.pending.lock();
        if let Some(existing) = pending.interfaces.iter().find(|d| d.id == decl.id) {
            if existing.scope != decl.scope {
                warn!(
                    "{} already declared as {:?}, ignoring {:?}",
                    decl.name, existing.scope, decl.scope
                );
            }
            return;
        }
        debug!("Declared interface {} ({:?})", decl.name, decl.scope);
        pending.interfaces.push(decl);
    }

    /// Declare a candidate implementation for `I`
    pub fn declare_candidate<I: ?Sized + Send + Sync + 'static>(&self, candidate: Candidate<I>) {
        self.declare_pending(candidate.into_pending());
    }

    pub(crate) fn declare_pending(&self, candidate: PendingCandidate) {
        debug!(
            "Declared candidate {} for {} at priority {}",
            candidate.name, candidate.interface_name, candidate.priority.0
        );
        self.pending.lock().candidates.push(candidate);
    }

    /// Bind `I` to an existing instance
    ///
    /// Constants are owned by the caller and are never disposed by the
    /// registry.
    pub fn bind_constant<I: ?Sized + Send + Sync + 'static>(&self, value: Arc<I>) {
        let shared: Shared = Arc::new(value);
        if self.instances.write().insert(TypeId::of::<I>(), shared).is_some() {
            warn!("Replaced constant binding for {}", type_name::<I>());
        } else {
            debug!("Bound constant {}", type_name::<I>());
        }
    }

    pub(crate) fn bind(&self, id: TypeId, binding: Binding) {
        let deps: Vec<&str> = binding.depends_on.iter().map(|d| d.name).collect();
        debug!(
            "Bound {} to {} ({:?}), depends on [{}]",
            binding.interface,
            binding.name,
            binding.scope,
            deps.join(", ")
        );
        self.bindings.write().insert(id, Arc::new(binding));
    }

    /// Whether `I` has a binding or a constant
    pub fn is_bound<I: ?Sized + 'static>(&self) -> bool {
        self.is_bound_id(TypeId::of::<I>())
    }

    pub(crate) fn is_bound_id(&self, id: TypeId) -> bool {
        self.instances.read().contains_key(&id) || self.bindings.read().contains_key(&id)
    }

    /// Describe the binding that won for `I`
    pub fn binding_info<I: ?Sized + 'static>(&self) -> Option<BindingInfo> {
        self.bindings.read().get(&TypeId::of::<I>()).map(|b| BindingInfo {
            interface: b.interface.to_string(),
            name: b.name.clone(),
            author: b.author.clone(),
            priority: b.priority,
            scope: b.scope,
        })
    }

    /// Bind every declared interface to its highest priority candidate
    ///
    /// Ties go to the candidate declared first. Interfaces without candidates
    /// stay unbound. Singletons are then built in dependency order. Pending
    /// declarations are consumed, so calling this again only processes what
    /// was declared since.
    ///
    /// # Returns
    /// The number of interfaces bound by this call
    pub fn resolve_all(&self) -> Result<usize> {
        let Pending { interfaces, candidates } = std::mem::take(&mut *self.pending.lock());

        let mut selected: Vec<(TypeId, Binding)> = Vec::new();
        for decl in &interfaces {
            let competing: Vec<&PendingCandidate> =
                candidates.iter().filter(|c| c.interface == decl.id).collect();

            if self.is_bound_id(decl.id) {
                if !competing.is_empty() {
                    warn!(
                        "{} is already bound; ignoring {} new candidates",
                        decl.name,
                        competing.len()
                    );
                }
                continue;
            }

            let mut best: Option<&PendingCandidate> = None;
            for candidate in competing {
                match best {
                    Some(current) if candidate.priority <= current.priority => {
                        debug!(
                            "Candidate {} for {} lost to {}",
                            candidate.name, decl.name, current.name
                        );
                    }
                    _ => best = Some(candidate),
                }
            }

            let Some(winner) = best else {
                debug!("{} has no candidates and stays unbound", decl.name);
                continue;
            };

            info!(
                "Binding {} to {} ({}) by {}",
                decl.name,
                winner.name,
                winner.implementation,
                if winner.author.is_empty() { "unknown" } else { winner.author.as_str() }
            );
            selected.push((
                decl.id,
                Binding {
                    interface: decl.name,
                    name: winner.name.clone(),
                    author: winner.author.clone(),
                    priority: winner.priority,
                    scope: decl.scope,
                    depends_on: winner.depends_on.clone(),
                    factory: winner.factory.clone(),
                },
            ));
        }

        for candidate in &candidates {
            if !interfaces.iter().any(|d| d.id == candidate.interface) {
                warn!(
                    "Candidate {} targets undeclared interface {}",
                    candidate.name, candidate.interface_name
                );
            }
        }

        let order = construction_order(&selected)?;

        let mut singletons = Vec::new();
        let bound = selected.len();
        for (id, binding) in selected {
            if binding.scope == ServiceScope::Singleton {
                singletons.push((id, binding.interface));
            }
            self.bind(id, binding);
        }

        for index in order {
            let (id, interface) = singletons[index];
            self.resolve_id(id, interface)?;
        }

        Ok(bound)
    }

    /// Look up the implementation bound to `I`
    ///
    /// Singletons are returned as-is (and built on first request if needed),
    /// transients are built on every call.
    pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
        let shared = self.resolve_id(TypeId::of::<I>(), type_name::<I>())?;
        shared
            .downcast_ref::<Arc<I>>()
            .cloned()
            .ok_or_else(|| ExtensionError::Unbound { interface: type_name::<I>().to_string() })
    }

    pub(crate) fn resolve_id(&self, id: TypeId, interface: &str) -> Result<Shared> {
        if let Some(instance) = self.instances.read().get(&id) {
            return Ok(instance.clone());
        }

        let binding = self
            .bindings
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ExtensionError::Unbound { interface: interface.to_string() })?;
        self.construct(id, &binding)
    }

    fn construct(&self, id: TypeId, binding: &Binding) -> Result<Shared> {
        let _guard = self.enter(id, &binding.name)?;

        let ctx = ExtensionContext::new(self, &binding.name);
        let produced = (binding.factory)(&ctx)
            .map_err(|e| ExtensionError::from_factory(&binding.name, e))?;

        if binding.scope == ServiceScope::Transient {
            return Ok(produced.value);
        }

        {
            let mut instances = self.instances.write();
            if let Some(existing) = instances.get(&id) {
                // Built concurrently by another thread
                if let Some(lifecycle) = produced.lifecycle {
                    lifecycle.dispose();
                }
                return Ok(existing.clone());
            }
            instances.insert(id, produced.value.clone());
        }

        if let Some(lifecycle) = produced.lifecycle {
            self.lifecycles.lock().push((binding.name.clone(), lifecycle));
        }
        debug!("Constructed singleton {} for {}", binding.name, binding.interface);
        Ok(produced.value)
    }

    fn enter(&self, id: TypeId, name: &str) -> Result<ConstructionGuard<'_>> {
        let thread = thread::current().id();
        let mut stack = self.constructing.lock();

        if stack.iter().any(|(t, i, _)| *t == thread && *i == id) {
            let mut path: Vec<String> = stack
                .iter()
                .filter(|(t, _, _)| *t == thread)
                .skip_while(|(_, i, _)| *i != id)
                .map(|(_, _, n)| n.clone())
                .collect();
            path.push(name.to_string());
            return Err(ExtensionError::DependencyCycle { path });
        }

        stack.push((thread, id, name.to_string()));
        Ok(ConstructionGuard { registry: self, thread })
    }

    /// Dispose every constructed singleton in reverse construction order
    ///
    /// Bindings and instances are dropped afterwards.
    ///
    /// # Returns
    /// The number of instances disposed
    pub fn dispose_all(&self) -> usize {
        let lifecycles = std::mem::take(&mut *self.lifecycles.lock());
        let count = lifecycles.len();
        for (name, lifecycle) in lifecycles.into_iter().rev() {
            debug!("Disposing {}", name);
            lifecycle.dispose();
        }

        self.instances.write().clear();
        self.bindings.write().clear();
        count
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct ConstructionGuard<'a> {
    registry: &'a ServiceRegistry,
    thread: ThreadId,
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        let mut stack = self.registry.constructing.lock();
        if let Some(pos) = stack.iter().rposition(|(t, _, _)| *t == self.thread) {
            stack.remove(pos);
        }
    }
}

/// Topologically order the singleton bindings among `selected`
///
/// Returns indices into the singleton subset of `selected`, in the order
/// they are declared. Only dependencies on other singletons in the same
/// batch constrain the order.
fn construction_order(selected: &[(TypeId, Binding)]) -> Result<Vec<usize>> {
    let singletons: Vec<&(TypeId, Binding)> = selected
        .iter()
        .filter(|(_, b)| b.scope == ServiceScope::Singleton)
        .collect();
    let index: HashMap<TypeId, usize> =
        singletons.iter().enumerate().map(|(i, (id, _))| (*id, i)).collect();

    let deps: Vec<Vec<usize>> = singletons
        .iter()
        .map(|(_, b)| b.depends_on.iter().filter_map(|d| index.get(&d.id).copied()).collect())
        .collect();

    let mut waiting: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); singletons.len()];
    for (node, node_deps) in deps.iter().enumerate() {
        for &dep in node_deps {
            dependents[dep].push(node);
        }
    }

    let mut ready: VecDeque<usize> = (0..singletons.len()).filter(|&i| waiting[i] == 0).collect();
    let mut order = Vec::with_capacity(singletons.len());
    while let Some(node) = ready.pop_front() {
        order.push(node);
        for &dependent in &dependents[node] {
            waiting[dependent] -= 1;
            if waiting[dependent] == 0 {
                ready.push_back(dependent);
            }
        }
    }

    if order.len() == singletons.len() {
        return Ok(order);
    }

    // Every node still waiting has a waiting dependency, so walking them loops
    let Some(start) = (0..singletons.len()).find(|&i| waiting[i] > 0) else {
        return Ok(order);
    };
    let mut walk = vec![start];
    let mut current = start;
    loop {
        let Some(next) = deps[current].iter().copied().find(|&d| waiting[d] > 0) else {
            break;
        };
        if let Some(pos) = walk.iter().position(|&n| n == next) {
            walk.drain(..pos);
            walk.push(next);
            break;
        }
        walk.push(next);
        current = next;
    }

    let path = walk.iter().map(|&i| singletons[i].1.name.clone()).collect();
    Err(ExtensionError::DependencyCycle { path })
}
