// registry/src/error.rs

use thiserror::Error;

/// The error type for every fallible registry operation.
#[derive(Debug, Error)]
pub enum Error {
  /// A registration was rejected before it reached the registry.
  #[error("Invalid registration for '{type_name}': {reason}")]
  Configuration {
    type_name: &'static str,
    reason: &'static str,
  },

  /// Neither an exact registration nor a compatible implementation exists.
  #[error("No registration found for '{type_name}'")]
  NotRegistered { type_name: &'static str },

  /// A registered value could not be served as the requested type.
  #[error("Registered service '{registered}' cannot be served as '{requested}'")]
  Incompatible {
    registered: &'static str,
    requested: &'static str,
  },

  /// A dependency chain leads back to a service already on that chain.
  #[error("Found cyclic dependency in registry: {}", path.join(" -> "))]
  CyclicDependency { path: Vec<&'static str> },

  #[error("Failed to parse registry configuration: {0}")]
  ConfigParse(String),
}

impl Error {
  /// `true` for errors raised while accepting a registration.
  pub fn is_configuration(&self) -> bool {
    matches!(self, Error::Configuration { .. } | Error::ConfigParse(_))
  }

  /// `true` when a requested service could not be produced.
  pub fn is_resolution(&self) -> bool {
    matches!(self, Error::NotRegistered { .. } | Error::Incompatible { .. })
  }

  pub fn is_cycle(&self) -> bool {
    matches!(self, Error::CyclicDependency { .. })
  }
}

/// A specialized `Result` type for `fibre_registry` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
