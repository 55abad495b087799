// registry/src/registry.rs

//! The `Registry` handle and its resolution algorithm.

use crate::config::RegistryConfig;
use crate::construct::Construct;
use crate::core::{identity_cast, Cast, Entry, ResolutionGuard, Shared, Slot, Store, TypeKey};
use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::graph::DependencyGraph;
use crate::registration::Registration;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A single-threaded dependency registry.
///
/// `Registry` is a cheap handle: clones share the same registrations. A
/// fresh registry already contains itself, so constructors and factories can
/// depend on it.
///
/// Every service is a singleton. A constructor or factory runs on the first
/// resolution only, and its result replaces the registration in place.
///
/// The registry uses `Rc` and `RefCell` internally and is therefore neither
/// `Send` nor `Sync`. Callers that need to share one across threads must
/// wrap access in their own lock.
#[derive(Clone)]
pub struct Registry {
  store: Rc<RefCell<Store>>,
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.store.try_borrow() {
      Ok(store) => f
        .debug_struct("Registry")
        .field("entries", &store.entries.keys().collect::<Vec<_>>())
        .field("config", &store.config)
        .finish(),
      Err(_) => f.write_str("Registry(<busy>)"),
    }
  }
}

impl Registry {
  /// Creates a registry with the default configuration.
  pub fn new() -> Self {
    Self::with_config(RegistryConfig::default())
  }

  pub fn with_config(config: RegistryConfig) -> Self {
    let mut store = Store::new(config);
    let mut casts: HashMap<TypeKey, Cast> = HashMap::new();
    casts.insert(TypeKey::of::<Registry>(), identity_cast::<Registry>());
    store.entries.insert(
      TypeKey::of::<Registry>(),
      Entry {
        slot: Slot::Registry,
        casts,
      },
    );
    Self {
      store: Rc::new(RefCell::new(store)),
    }
  }

  /// `true` if both handles refer to the same registry.
  pub fn ptr_eq(&self, other: &Registry) -> bool {
    Rc::ptr_eq(&self.store, &other.store)
  }

  pub fn config(&self) -> RegistryConfig {
    self.store.borrow().config.clone()
  }

  // --- Registration ---

  /// Registers `T`, replacing any previous registration of `T` in its
  /// original position.
  ///
  /// `T` may be an abstraction such as `dyn Trait`, see
  /// [`Registration::with_abstract_factory`]. Fails if the registration
  /// carries both a factory and an instance.
  pub fn register<T: ?Sized + 'static>(&self, registration: Registration<T>) -> Result<()> {
    registration.check()?;
    self.insert(TypeKey::of::<T>(), registration.into_entry());
    Ok(())
  }

  /// Registers `T` to be built by its own constructor.
  pub fn register_type<T: Construct>(&self) {
    self.insert(TypeKey::of::<T>(), Registration::<T>::new().into_entry());
  }

  /// Registers `T` to be produced by `factory` on first resolution.
  pub fn register_factory<T, F, Args>(&self, factory: F)
  where
    T: 'static,
    F: Factory<Args, Output = T>,
  {
    self.insert(TypeKey::of::<T>(), Registration::with_factory(factory).into_entry());
  }

  /// Registers a ready-made `T`.
  pub fn register_instance<T: 'static>(&self, instance: T) {
    self.insert(TypeKey::of::<T>(), Registration::with_instance(instance).into_entry());
  }

  /// Registers the abstraction `I` itself, produced by `factory`.
  ///
  /// Resolving `I` then uses this entry even when implementations of `I`
  /// are registered later.
  pub fn register_abstract_factory<I, F, Args>(&self, factory: F)
  where
    I: ?Sized + 'static,
    F: Factory<Args, Output = Rc<I>>,
  {
    self.insert(TypeKey::of::<I>(), Registration::<I>::with_abstract_factory(factory).into_entry());
  }

  /// Registers the abstraction `I` itself, served as `instance`.
  pub fn register_abstract_instance<I: ?Sized + 'static>(&self, instance: Rc<I>) {
    self.insert(TypeKey::of::<I>(), Registration::<I>::with_abstract_instance(instance).into_entry());
  }

  fn insert(&self, key: TypeKey, entry: Entry) {
    let kind = entry.kind();
    let mut store = self.store.borrow_mut();
    let replaced = store.entries.insert(key, entry).is_some();
    store.validated = false;
    tracing::debug!(service = key.name(), kind = kind.as_str(), replaced, "registered service");
  }

  // --- Introspection ---

  pub fn contains<T: ?Sized + 'static>(&self) -> bool {
    self.store.borrow().entries.contains_key(&TypeKey::of::<T>())
  }

  /// Number of registrations, the registry's own entry included.
  pub fn len(&self) -> usize {
    self.store.borrow().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.store.borrow().entries.is_empty()
  }

  /// Registered identities in registration order.
  pub fn registered(&self) -> Vec<TypeKey> {
    self.store.borrow().entries.keys().copied().collect()
  }

  // --- Resolution ---

  /// Resolves `T`, constructing it and its dependencies on first use.
  ///
  /// Lookup order:
  ///
  /// 1. the exact registration of `T`;
  /// 2. otherwise, scanning registrations from newest to oldest, the first
  ///    one declared to implement `T`.
  ///
  /// A failed construction leaves `T` registered as before. Dependencies
  /// that were already built during the attempt stay resolved.
  pub fn resolve<T: ?Sized + 'static>(&self) -> Result<Rc<T>> {
    let target = TypeKey::of::<T>();
    self.validate_if_configured()?;

    let (owner, cast) = self.lookup(target)?;
    self.serve::<T>(owner, target, &cast)
  }

  /// Resolves every registration that implements `T`, in registration order.
  ///
  /// Returns an empty list when nothing matches.
  pub fn resolve_all_implementations<T: ?Sized + 'static>(&self) -> Result<Vec<Rc<T>>> {
    let target = TypeKey::of::<T>();
    self.validate_if_configured()?;

    let candidates: Vec<(TypeKey, Cast)> = self
      .store
      .borrow()
      .entries
      .iter()
      .filter_map(|(key, entry)| entry.casts.get(&target).map(|cast| (*key, Rc::clone(cast))))
      .collect();

    candidates
      .into_iter()
      .map(|(owner, cast)| self.serve::<T>(owner, target, &cast))
      .collect()
  }

  /// Finds the entry serving `target` and the cast that serves it.
  fn lookup(&self, target: TypeKey) -> Result<(TypeKey, Cast)> {
    let store = self.store.borrow();
    let owner = store.provider_of(&target).ok_or(Error::NotRegistered {
      type_name: target.name(),
    })?;
    if owner != target {
      tracing::trace!(requested = target.name(), provider = owner.name(), "using implementation");
    }
    store
      .entries
      .get(&owner)
      .and_then(|entry| entry.casts.get(&target))
      .map(|cast| (owner, Rc::clone(cast)))
      .ok_or(Error::Incompatible {
        registered: owner.name(),
        requested: target.name(),
      })
  }

  fn serve<T: ?Sized + 'static>(&self, owner: TypeKey, target: TypeKey, cast: &Cast) -> Result<Rc<T>> {
    let shared = self.resolve_entry(owner)?;
    cast(shared)
      .and_then(|service| service.downcast::<Rc<T>>().ok())
      .map(|service| *service)
      .ok_or(Error::Incompatible {
        registered: owner.name(),
        requested: target.name(),
      })
  }

  /// Produces the value of the entry registered under `owner`, building it
  /// on first use.
  fn resolve_entry(&self, owner: TypeKey) -> Result<Shared> {
    let strategy = {
      let mut borrowed = self.store.borrow_mut();
      let store = &mut *borrowed;
      let Some(entry) = store.entries.get_mut(&owner) else {
        return Err(Error::NotRegistered {
          type_name: owner.name(),
        });
      };
      let strategy = match &entry.slot {
        Slot::Instance(shared) => {
          tracing::trace!(service = owner.name(), "resolved cached instance");
          return Ok(Rc::clone(shared));
        }
        Slot::Registry => return Ok(Rc::new(self.clone()) as Shared),
        Slot::Resolving(_) => return Err(store.reentry_error(owner)),
        Slot::Pending(strategy) => Rc::clone(strategy),
      };
      entry.slot = Slot::Resolving(Rc::clone(&strategy));
      store.resolving.push(owner);
      strategy
    };

    let guard = ResolutionGuard::new(&self.store, owner, Rc::clone(&strategy));
    let span = tracing::debug_span!("construct", service = owner.name(), kind = strategy.kind().as_str());
    let _enter = span.enter();

    match strategy.run(self) {
      Ok(shared) => {
        guard.commit(Rc::clone(&shared));
        tracing::debug!("constructed service");
        Ok(shared)
      }
      Err(e) => {
        tracing::debug!(error = %e, "construction failed");
        Err(e)
      }
    }
  }

  // --- Validation ---

  /// Builds the static dependency graph without constructing anything.
  ///
  /// Self-constructed entries point at the registrations that would serve
  /// their declared dependencies. Factories and instances have no edges.
  /// A dependency nothing can serve adds no edge.
  pub fn dependency_graph(&self) -> DependencyGraph {
    let store = self.store.borrow();
    let mut graph = DependencyGraph::new();
    for (key, entry) in &store.entries {
      graph.add_node(*key, entry.kind());
    }
    for (key, entry) in &store.entries {
      for dependency in entry.dependencies().unwrap_or_default() {
        if let Some(provider) = store.provider_of(&dependency) {
          graph.add_dependency(*key, provider);
        }
      }
    }
    graph
  }

  /// Checks the registrations for dependency cycles.
  ///
  /// Pure and static: no constructor or factory runs, so it is safe to call
  /// on a registry whose resolution would never terminate.
  pub fn validate(&self) -> Result<()> {
    let graph = self.dependency_graph();
    if let Some(cycle) = graph.find_cycle() {
      let path: Vec<&'static str> = cycle.iter().map(TypeKey::name).collect();
      tracing::debug!(cycle = %path.join(" -> "), "validation failed");
      return Err(Error::CyclicDependency { path });
    }
    self.store.borrow_mut().validated = true;
    tracing::debug!(services = graph.len(), "validation passed");
    Ok(())
  }

  fn validate_if_configured(&self) -> Result<()> {
    let needed = {
      let store = self.store.borrow();
      store.config.validate_on_resolve && !store.validated && store.resolving.is_empty()
    };
    if needed {
      self.validate()?;
    }
    Ok(())
  }
}
