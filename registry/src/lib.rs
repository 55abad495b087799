//! # Fibre Registry
//!
//! A small, single-threaded dependency registry for Rust.
//!
//! Register types together with a way to build them, then ask for fully
//! constructed services. Dependencies are resolved recursively and injected
//! through constructors, every service is a singleton, and abstractions
//! (`dyn Trait`) are served by the most recently registered implementation.
//!
//! ## Core Concepts
//!
//! - **Registry**: the ordered store of registrations. It always contains
//!   itself, so factories and constructors can depend on it.
//! - **Registration**: one of three strategies per type. Self-construct
//!   ([`Construct`]), a [`Factory`], or a ready instance.
//! - **Resolution**: [`Registry::resolve`] builds a service on first use and
//!   caches it. [`Registry::resolve_all_implementations`] collects every
//!   implementation of an abstraction.
//! - **Validation**: [`Registry::validate`] checks the static dependency
//!   graph for cycles without constructing anything.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_registry::{Construct, Registration, Registry};
//! use std::rc::Rc;
//!
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!     message: Rc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         (*self.message).clone()
//!     }
//! }
//!
//! impl Construct for EnglishGreeter {
//!     type Dependencies = (Rc<String>,);
//!
//!     fn construct((message,): Self::Dependencies) -> Self {
//!         Self { message }
//!     }
//! }
//!
//! let registry = Registry::new();
//! registry.register_instance(String::from("Hello, World!"));
//! registry
//!     .register(Registration::<EnglishGreeter>::new().implements::<dyn Greeter>(|it| it))
//!     .unwrap();
//!
//! registry.validate().unwrap();
//!
//! // Nothing is registered under `dyn Greeter`, so the latest
//! // implementation is used.
//! let greeter = registry.resolve::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//! ```

mod config;
mod construct;
mod core;
mod error;
mod factory;
mod graph;
mod macros;
mod registration;
mod registry;

pub use config::RegistryConfig;
pub use construct::{Construct, Dependencies, Dependency};
pub use crate::core::{EntryKind, TypeKey};
pub use error::{Error, Result};
pub use factory::Factory;
pub use graph::DependencyGraph;
pub use registration::Registration;
pub use registry::Registry;
