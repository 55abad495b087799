// registry/src/config.rs

//! Runtime options for a [`Registry`](crate::Registry).

#[cfg(feature = "serde")]
use crate::error::{Error, Result};

/// Options that change how a registry resolves and validates.
///
/// With the `serde` feature the struct can be loaded from configuration,
/// and missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
  feature = "serde",
  derive(serde::Serialize, serde::Deserialize),
  serde(default, deny_unknown_fields)
)]
pub struct RegistryConfig {
  /// Serve a request without an exact registration from the most recently
  /// registered entry that implements the requested abstraction.
  pub polymorphic_fallback: bool,
  /// Run [`Registry::validate`](crate::Registry::validate) before an
  /// outermost `resolve` whenever registrations changed since the last
  /// successful validation.
  pub validate_on_resolve: bool,
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      polymorphic_fallback: true,
      validate_on_resolve: false,
    }
  }
}

#[cfg(feature = "serde")]
impl RegistryConfig {
  /// Parses a YAML document such as:
  ///
  /// ```yaml
  /// polymorphic_fallback: true
  /// validate_on_resolve: true
  /// ```
  pub fn from_yaml(source: &str) -> Result<Self> {
    serde_yaml::from_str(source).map_err(|e| Error::ConfigParse(e.to_string()))
  }
}
