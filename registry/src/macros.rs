// registry/src/macros.rs

//! Public macros for ergonomic service resolution.

/// Resolves a service from a registry, panicking if it cannot be produced.
///
/// Meant for call sites where a missing registration is a programming
/// error. Use [`Registry::resolve`](crate::Registry::resolve) to handle the
/// failure instead.
///
/// # Panics
///
/// Panics with the resolution error if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use fibre_registry::{resolve, Registry};
///
/// let registry = Registry::new();
/// registry.register_instance(String::from("hello"));
///
/// let message = resolve!(registry, String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use fibre_registry::{resolve, Registration, Registry};
///
/// trait Greeter { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let registry = Registry::new();
/// registry
///   .register(Registration::with_instance(EnglishGreeter).implements::<dyn Greeter>(|it| it))
///   .unwrap();
///
/// let greeter = resolve!(registry, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(registry, trait MyTrait)
    ($registry:expr, trait $trait_ident:ident) => {
        $registry
            .resolve::<dyn $trait_ident>()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required trait service {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    e
                )
            })
    };

    // Arm for resolving any other type: resolve!(registry, MyService)
    ($registry:expr, $type:ty) => {
        $registry
            .resolve::<$type>()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required service {}: {}",
                    std::any::type_name::<$type>(),
                    e
                )
            })
    };
}
