// registry/src/construct.rs

//! Constructor injection: how a type declares and receives its dependencies.

use crate::core::{Shared, Strategy, TypeKey};
use crate::error::Result;
use crate::registry::Registry;
use std::rc::Rc;

/// A type the registry can build itself, injecting its constructor
/// parameters.
///
/// `Dependencies` is the ordered parameter list. Each element is either an
/// `Rc<T>` (resolves `T`, which may be a `dyn Trait`) or a [`Registry`]
/// handle.
///
/// # Example
///
/// ```
/// use fibre_registry::{Construct, Registry};
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Database;
///
/// struct UserService {
///   db: Rc<Database>,
/// }
///
/// fibre_registry::default_construct! { Database }
///
/// impl Construct for UserService {
///   type Dependencies = (Rc<Database>,);
///
///   fn construct((db,): Self::Dependencies) -> Self {
///     Self { db }
///   }
/// }
///
/// let registry = Registry::new();
/// registry.register_type::<Database>();
/// registry.register_type::<UserService>();
///
/// let users = registry.resolve::<UserService>().unwrap();
/// assert!(Rc::ptr_eq(&users.db, &registry.resolve::<Database>().unwrap()));
/// ```
pub trait Construct: Sized + 'static {
  type Dependencies: Dependencies;

  fn construct(dependencies: Self::Dependencies) -> Self;
}

/// A single constructor parameter.
pub trait Dependency: Sized {
  /// The identity requested for this parameter.
  fn key() -> TypeKey;

  fn fetch(registry: &Registry) -> Result<Self>;
}

impl<T: ?Sized + 'static> Dependency for Rc<T> {
  #[inline]
  fn key() -> TypeKey {
    TypeKey::of::<T>()
  }

  #[inline]
  fn fetch(registry: &Registry) -> Result<Self> {
    registry.resolve::<T>()
  }
}

impl Dependency for Registry {
  #[inline]
  fn key() -> TypeKey {
    TypeKey::of::<Registry>()
  }

  #[inline]
  fn fetch(registry: &Registry) -> Result<Self> {
    registry
      .resolve::<Registry>()
      .map(|handle| Registry::clone(&handle))
  }
}

/// An ordered list of constructor parameters.
pub trait Dependencies: Sized {
  /// The declared identities, without resolving anything.
  fn keys() -> Vec<TypeKey>;

  /// Resolves every parameter, left to right.
  fn fetch(registry: &Registry) -> Result<Self>;
}

impl Dependencies for () {
  #[inline]
  fn keys() -> Vec<TypeKey> {
    Vec::new()
  }

  #[inline]
  fn fetch(_: &Registry) -> Result<Self> {
    Ok(())
  }
}

macro_rules! define_dependencies {
  ($($T: ident),*) => {
    impl<$($T: Dependency),+> Dependencies for ($($T,)+) {
      #[inline]
      fn keys() -> Vec<TypeKey> {
        vec![$($T::key(),)*]
      }

      #[inline]
      #[allow(non_snake_case)]
      fn fetch(registry: &Registry) -> Result<Self> {
        let tuple = (
          $(
          $T::fetch(registry)?,
          )*
        );
        Ok(tuple)
      }
    }
  }
}

define_dependencies! { T1 }
define_dependencies! { T1, T2 }
define_dependencies! { T1, T2, T3 }
define_dependencies! { T1, T2, T3, T4 }
define_dependencies! { T1, T2, T3, T4, T5 }
define_dependencies! { T1, T2, T3, T4, T5, T6 }
define_dependencies! { T1, T2, T3, T4, T5, T6, T7 }
define_dependencies! { T1, T2, T3, T4, T5, T6, T7, T8 }

fn build<T: Construct>(registry: &Registry) -> Result<Shared> {
  let dependencies = <T::Dependencies as Dependencies>::fetch(registry)?;
  Ok(Rc::new(T::construct(dependencies)) as Shared)
}

pub(crate) fn construct_strategy<T: Construct>() -> Strategy {
  Strategy::Construct {
    dependencies: <T::Dependencies as Dependencies>::keys,
    build: build::<T>,
  }
}

/// Implements [`Construct`] with no dependencies for one or more
/// [`Default`] types.
///
/// ```
/// use fibre_registry::Registry;
///
/// #[derive(Default)]
/// struct Clock;
/// #[derive(Default)]
/// struct Settings;
///
/// fibre_registry::default_construct! {
///   Clock
///   Settings
/// }
///
/// let registry = Registry::new();
/// registry.register_type::<Clock>();
/// assert!(registry.resolve::<Clock>().is_ok());
/// ```
#[macro_export]
macro_rules! default_construct {
  ($($name:ident)*) => {
    $(impl $crate::Construct for $name {
      type Dependencies = ();

      #[inline]
      fn construct(_: ()) -> Self {
        <$name as ::std::default::Default>::default()
      }
    })*
  };
}
