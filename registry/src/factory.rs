// registry/src/factory.rs

//! Factory callables and their arity.

use crate::error::Result;
use crate::registry::Registry;

/// A callable that produces a service.
///
/// Implemented for two shapes, picked by the closure's signature:
///
/// - `Fn() -> T`, called with no arguments;
/// - `Fn(&Registry) -> Result<T>`, called with the registry so it can
///   resolve further dependencies itself.
pub trait Factory<Args>: 'static {
  /// The type of service produced
  type Output;

  fn call(&self, registry: &Registry) -> Result<Self::Output>;
}

impl<F, R> Factory<()> for F
where
  F: Fn() -> R + 'static,
{
  type Output = R;

  #[inline]
  fn call(&self, _: &Registry) -> Result<Self::Output> {
    Ok(self())
  }
}

impl<F, R> Factory<(Registry,)> for F
where
  F: Fn(&Registry) -> Result<R> + 'static,
{
  type Output = R;

  #[inline]
  fn call(&self, registry: &Registry) -> Result<Self::Output> {
    self(registry)
  }
}
