// registry/src/core.rs

//! Core data structures shared by the registry, its builders and the graph.

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::registry::Registry;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A resolved service, type-erased. The inner value is the registered type,
/// or an `Rc<I>` for entries registered under an abstraction `I`.
pub(crate) type Shared = Rc<dyn Any>;

/// Turns a resolved service into a `Box<Rc<I>>` for one served identity `I`.
pub(crate) type Cast = Rc<dyn Fn(Shared) -> Option<Box<dyn Any>>>;

/// The identity under which a service is registered and requested.
///
/// Equality and hashing use the [`TypeId`] only. The type name is carried
/// along for error messages, logs and graph output.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  /// The identity of `T`. Unsized types are accepted, so `dyn Trait`
  /// identifies an abstraction.
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// How a registration produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
  /// Built from the type's own constructor, dependencies injected.
  Construct,
  /// Produced by a user factory.
  Factory,
  /// A ready value, either registered as such or already resolved.
  Instance,
}

impl EntryKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      EntryKind::Construct => "construct",
      EntryKind::Factory => "factory",
      EntryKind::Instance => "instance",
    }
  }
}

impl fmt::Display for EntryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A pending way of producing a service.
pub(crate) enum Strategy {
  Construct {
    dependencies: fn() -> Vec<TypeKey>,
    build: fn(&Registry) -> Result<Shared>,
  },
  Factory(Box<dyn Fn(&Registry) -> Result<Shared>>),
}

impl Strategy {
  pub(crate) fn kind(&self) -> EntryKind {
    match self {
      Strategy::Construct { .. } => EntryKind::Construct,
      Strategy::Factory(_) => EntryKind::Factory,
    }
  }

  pub(crate) fn run(&self, registry: &Registry) -> Result<Shared> {
    match self {
      Strategy::Construct { build, .. } => build(registry),
      Strategy::Factory(factory) => factory(registry),
    }
  }
}

pub(crate) enum Slot {
  Pending(Rc<Strategy>),
  /// Taken by a resolution currently running on the call stack.
  Resolving(Rc<Strategy>),
  Instance(Shared),
  /// The registry's own handle. Produced on demand instead of being stored,
  /// since a stored handle would keep the registry alive forever.
  Registry,
}

pub(crate) struct Entry {
  pub(crate) slot: Slot,
  /// Every identity this entry can be served as, its own included.
  pub(crate) casts: HashMap<TypeKey, Cast>,
}

impl Entry {
  pub(crate) fn satisfies(&self, key: &TypeKey) -> bool {
    self.casts.contains_key(key)
  }

  pub(crate) fn kind(&self) -> EntryKind {
    match &self.slot {
      Slot::Pending(strategy) | Slot::Resolving(strategy) => strategy.kind(),
      Slot::Instance(_) | Slot::Registry => EntryKind::Instance,
    }
  }

  /// Declared constructor dependencies. Factories are opaque and instances
  /// have none, so both report `None`.
  pub(crate) fn dependencies(&self) -> Option<Vec<TypeKey>> {
    match &self.slot {
      Slot::Pending(strategy) | Slot::Resolving(strategy) => match &**strategy {
        Strategy::Construct { dependencies, .. } => Some(dependencies()),
        Strategy::Factory(_) => None,
      },
      Slot::Instance(_) | Slot::Registry => None,
    }
  }
}

/// The concrete `T` behind a resolved service, whether it was stored as is
/// or wrapped by an abstraction-keyed registration of `T`.
fn concrete<T: 'static>(shared: Shared) -> Option<Rc<T>> {
  match shared.downcast::<T>() {
    Ok(service) => Some(service),
    Err(shared) => shared.downcast::<Rc<T>>().ok().map(|outer| Rc::clone(&*outer)),
  }
}

/// Identity cast: serves a `T` entry as `Rc<T>`.
pub(crate) fn identity_cast<T: 'static>() -> Cast {
  Rc::new(|shared: Shared| concrete::<T>(shared).map(|service| Box::new(service) as Box<dyn Any>))
}

/// Identity cast for an entry keyed by `I` itself, which stores an `Rc<I>`.
pub(crate) fn abstraction_cast<I: ?Sized + 'static>() -> Cast {
  Rc::new(|shared: Shared| {
    shared
      .downcast::<Rc<I>>()
      .ok()
      .map(|outer| Box::new(Rc::clone(&*outer)) as Box<dyn Any>)
  })
}

/// Serves a `T` entry as `Rc<I>` through a user supplied upcast.
pub(crate) fn upcast<T, I, F>(upcast: F) -> Cast
where
  T: 'static,
  I: ?Sized + 'static,
  F: Fn(Rc<T>) -> Rc<I> + 'static,
{
  Rc::new(move |shared: Shared| concrete::<T>(shared).map(|service| Box::new(upcast(service)) as Box<dyn Any>))
}

/// The mutable state behind a [`Registry`] handle.
pub(crate) struct Store {
  pub(crate) entries: IndexMap<TypeKey, Entry>,
  /// Keys whose construction is in progress, outermost first.
  pub(crate) resolving: Vec<TypeKey>,
  /// Cleared by every registration, set by a successful validation.
  pub(crate) validated: bool,
  pub(crate) config: RegistryConfig,
}

impl Store {
  pub(crate) fn new(config: RegistryConfig) -> Self {
    Self {
      entries: IndexMap::new(),
      resolving: Vec::new(),
      validated: false,
      config,
    }
  }

  /// The entry `resolve` would use for `key`: the exact registration, else
  /// the most recently registered entry that satisfies it.
  pub(crate) fn provider_of(&self, key: &TypeKey) -> Option<TypeKey> {
    if self.entries.contains_key(key) {
      return Some(*key);
    }
    if !self.config.polymorphic_fallback {
      return None;
    }
    self
      .entries
      .iter()
      .rev()
      .find(|(_, entry)| entry.satisfies(key))
      .map(|(owner, _)| *owner)
  }

  /// The error for re-entering `key` while it is still being constructed.
  pub(crate) fn reentry_error(&self, key: TypeKey) -> Error {
    let start = self
      .resolving
      .iter()
      .position(|pending| *pending == key)
      .unwrap_or(0);
    let mut path: Vec<&'static str> = self.resolving[start..].iter().map(TypeKey::name).collect();
    path.push(key.name());
    Error::CyclicDependency { path }
  }
}

/// An RAII guard around one construction.
///
/// Created once an entry has been switched to `Resolving`. On drop it pops
/// the key off the resolution stack and settles the entry: the committed
/// instance replaces it, or, if nothing was committed, the pending strategy
/// is put back so a later attempt can retry.
pub(crate) struct ResolutionGuard<'a> {
  store: &'a RefCell<Store>,
  key: TypeKey,
  strategy: Rc<Strategy>,
  instance: Option<Shared>,
}

impl<'a> ResolutionGuard<'a> {
  pub(crate) fn new(store: &'a RefCell<Store>, key: TypeKey, strategy: Rc<Strategy>) -> Self {
    Self {
      store,
      key,
      strategy,
      instance: None,
    }
  }

  pub(crate) fn commit(mut self, instance: Shared) {
    self.instance = Some(instance);
  }
}

impl Drop for ResolutionGuard<'_> {
  fn drop(&mut self) {
    // Unwinding from a panic that happened while the store was borrowed
    // leaves it borrowed; there is nothing left to restore then.
    let Ok(mut store) = self.store.try_borrow_mut() else {
      return;
    };
    if let Some(position) = store.resolving.iter().rposition(|key| *key == self.key) {
      store.resolving.remove(position);
    }
    let Some(entry) = store.entries.get_mut(&self.key) else {
      return;
    };
    // The key may have been registered again while it was being built.
    // The newer registration wins.
    let still_ours = matches!(&entry.slot, Slot::Resolving(strategy) if Rc::ptr_eq(strategy, &self.strategy));
    if still_ours {
      entry.slot = match self.instance.take() {
        Some(instance) => Slot::Instance(instance),
        None => Slot::Pending(Rc::clone(&self.strategy)),
      };
    }
  }
}
