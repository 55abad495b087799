// registry/src/registration.rs

//! The registration builder.

use crate::construct::{construct_strategy, Construct};
use crate::core::{abstraction_cast, identity_cast, upcast, Cast, Entry, Shared, Slot, Strategy, TypeKey};
use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::registry::Registry;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

/// Describes how the registry should produce a `T`, and which abstractions
/// `T` may be served as.
///
/// A registration carries at most one of a factory or an instance. Supplying
/// both is accepted by the builder but rejected by
/// [`Registry::register`](crate::Registry::register).
///
/// ```
/// use fibre_registry::{Registration, Registry};
///
/// trait Greeter {
///   fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// let registry = Registry::new();
/// registry
///   .register(Registration::with_instance(English).implements::<dyn Greeter>(|it| it))
///   .unwrap();
///
/// let greeter = registry.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
pub struct Registration<T: ?Sized + 'static> {
  source: Source,
  /// Set once both a factory and an instance have been supplied.
  conflicting: bool,
  casts: HashMap<TypeKey, Cast>,
  _marker: PhantomData<fn(Rc<T>)>,
}

enum Source {
  Construct(Strategy),
  Factory(Strategy),
  Instance(Shared),
}

impl<T: Construct> Registration<T> {
  /// `T` will be built by its own constructor, dependencies injected.
  pub fn new() -> Self {
    Self::assemble(Source::Construct(construct_strategy::<T>()), identity_cast::<T>())
  }
}

impl<T: Construct> Default for Registration<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: 'static> Registration<T> {
  /// `T` will be produced by `factory` on first resolution.
  pub fn with_factory<F, Args>(factory: F) -> Self
  where
    F: Factory<Args, Output = T>,
  {
    Self::assemble(Source::Factory(erase_factory(factory)), identity_cast::<T>())
  }

  /// `T` is served as `instance`, never constructed.
  pub fn with_instance(instance: T) -> Self {
    Self::with_shared(Rc::new(instance))
  }

  /// Like [`with_instance`](Self::with_instance), keeping the caller's `Rc`.
  pub fn with_shared(instance: Rc<T>) -> Self {
    Self::assemble(Source::Instance(instance as Shared), identity_cast::<T>())
  }

  pub fn factory<F, Args>(self, factory: F) -> Self
  where
    F: Factory<Args, Output = T>,
  {
    self.replace_with_factory(erase_factory(factory))
  }

  pub fn instance(self, instance: T) -> Self {
    self.shared(Rc::new(instance))
  }

  pub fn shared(self, instance: Rc<T>) -> Self {
    self.replace_with_instance(instance as Shared)
  }

  /// Declares that `T` can be served as `I`.
  ///
  /// `upcast` is normally the identity closure `|it| it`, which coerces
  /// `Rc<T>` into `Rc<dyn Trait>`.
  pub fn implements<I: ?Sized + 'static>(mut self, upcast_fn: impl Fn(Rc<T>) -> Rc<I> + 'static) -> Self {
    self.casts.insert(TypeKey::of::<I>(), upcast::<T, I, _>(upcast_fn));
    self
  }
}

impl<I: ?Sized + 'static> Registration<I> {
  /// Registers the abstraction `I` itself, produced by `factory`.
  ///
  /// An entry keyed by `I` is an exact match for `I`, so it is preferred
  /// over every implementation registered before or after it.
  ///
  /// ```
  /// use fibre_registry::{Registration, Registry};
  /// use std::rc::Rc;
  ///
  /// trait Storage {
  ///   fn kind(&self) -> &'static str;
  /// }
  ///
  /// struct Memory;
  ///
  /// impl Storage for Memory {
  ///   fn kind(&self) -> &'static str {
  ///     "memory"
  ///   }
  /// }
  ///
  /// let registry = Registry::new();
  /// registry
  ///   .register(Registration::<dyn Storage>::with_abstract_factory(|| Rc::new(Memory) as Rc<dyn Storage>))
  ///   .unwrap();
  ///
  /// assert_eq!(registry.resolve::<dyn Storage>().unwrap().kind(), "memory");
  /// ```
  pub fn with_abstract_factory<F, Args>(factory: F) -> Self
  where
    F: Factory<Args, Output = Rc<I>>,
  {
    Self::assemble(Source::Factory(erase_factory(factory)), abstraction_cast::<I>())
  }

  /// Registers the abstraction `I` itself, served as `instance`.
  pub fn with_abstract_instance(instance: Rc<I>) -> Self {
    Self::assemble(Source::Instance(Rc::new(instance) as Shared), abstraction_cast::<I>())
  }

  pub fn abstract_factory<F, Args>(self, factory: F) -> Self
  where
    F: Factory<Args, Output = Rc<I>>,
  {
    self.replace_with_factory(erase_factory(factory))
  }

  pub fn abstract_instance(self, instance: Rc<I>) -> Self {
    self.replace_with_instance(Rc::new(instance) as Shared)
  }

  fn assemble(source: Source, own_cast: Cast) -> Self {
    let mut casts = HashMap::new();
    casts.insert(TypeKey::of::<I>(), own_cast);
    Self {
      source,
      conflicting: false,
      casts,
      _marker: PhantomData,
    }
  }

  fn replace_with_factory(mut self, factory: Strategy) -> Self {
    self.conflicting |= matches!(self.source, Source::Instance(_));
    self.source = Source::Factory(factory);
    self
  }

  fn replace_with_instance(mut self, instance: Shared) -> Self {
    self.conflicting |= matches!(self.source, Source::Factory(_));
    self.source = Source::Instance(instance);
    self
  }

  /// Rejects a registration that carries both a factory and an instance.
  pub(crate) fn check(&self) -> Result<()> {
    if self.conflicting {
      return Err(Error::Configuration {
        type_name: std::any::type_name::<I>(),
        reason: "only one of factory or instance should be provided",
      });
    }
    Ok(())
  }

  pub(crate) fn into_entry(self) -> Entry {
    let slot = match self.source {
      Source::Construct(strategy) | Source::Factory(strategy) => Slot::Pending(Rc::new(strategy)),
      Source::Instance(instance) => Slot::Instance(instance),
    };
    Entry {
      slot,
      casts: self.casts,
    }
  }
}

fn erase_factory<F, Args, R>(factory: F) -> Strategy
where
  F: Factory<Args, Output = R>,
  R: 'static,
{
  Strategy::Factory(Box::new(move |registry: &Registry| {
    factory
      .call(registry)
      .map(|service| Rc::new(service) as Shared)
  }))
}
