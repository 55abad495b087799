use fibre_registry::{Construct, Error, Registration, Registry};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

// --- Advanced Test Fixtures ---

#[derive(Default)]
struct DependencyA;

fibre_registry::default_construct! { DependencyA }

struct DependencyB {
  dependency_a: Rc<DependencyA>,
}

impl Construct for DependencyB {
  type Dependencies = (Rc<DependencyA>,);

  fn construct((dependency_a,): Self::Dependencies) -> Self {
    Self { dependency_a }
  }
}

struct DependencyC {
  dependency_a: Rc<DependencyA>,
}

struct MyClass {
  dependency_b: Rc<DependencyB>,
}

impl Construct for MyClass {
  type Dependencies = (Rc<DependencyB>,);

  fn construct((dependency_b,): Self::Dependencies) -> Self {
    Self { dependency_b }
  }
}

trait Plugin {
  fn name(&self) -> &'static str;
}

macro_rules! plugin {
  ($($name:ident)*) => {
    $(
      #[derive(Default)]
      struct $name;

      impl Plugin for $name {
        fn name(&self) -> &'static str {
          stringify!($name)
        }
      }

      fibre_registry::default_construct! { $name }
    )*
  };
}

plugin! { ImplementationOne ImplementationTwo ImplementationThree }

#[derive(Default)]
struct Unrelated;

fibre_registry::default_construct! { Unrelated }

fn register_plugin<T: Plugin + Construct>(registry: &Registry) {
  registry
    .register(Registration::<T>::new().implements::<dyn Plugin>(|it| it))
    .unwrap();
}

// --- Advanced Tests ---

#[test]
fn test_resolve_nested_dependencies() {
  let registry = Registry::new();
  registry.register_type::<DependencyA>();
  registry.register_type::<DependencyB>();
  registry.register_type::<MyClass>();
  registry.register_factory(|r: &Registry| -> fibre_registry::Result<DependencyC> {
    Ok(DependencyC {
      dependency_a: r.resolve::<DependencyA>()?,
    })
  });

  let obj = registry.resolve::<MyClass>().unwrap();
  let obj2 = registry.resolve::<DependencyC>().unwrap();

  // Both paths share the single DependencyA.
  assert!(Rc::ptr_eq(&obj2.dependency_a, &obj.dependency_b.dependency_a));
  assert!(Rc::ptr_eq(
    &obj.dependency_b.dependency_a,
    &registry.resolve::<DependencyA>().unwrap()
  ));
}

#[test]
fn test_resolve_all_implementations_in_registration_order() {
  let registry = Registry::new();
  register_plugin::<ImplementationOne>(&registry);
  register_plugin::<ImplementationTwo>(&registry);
  registry.register_type::<Unrelated>();
  register_plugin::<ImplementationThree>(&registry);

  let actual = registry.resolve_all_implementations::<dyn Plugin>().unwrap();

  let names: Vec<_> = actual.iter().map(|plugin| plugin.name()).collect();
  assert_eq!(
    names,
    vec!["ImplementationOne", "ImplementationTwo", "ImplementationThree"]
  );
}

#[test]
fn test_resolve_all_implementations_shares_singletons() {
  let registry = Registry::new();
  register_plugin::<ImplementationOne>(&registry);

  let all = registry.resolve_all_implementations::<dyn Plugin>().unwrap();
  let one = registry.resolve::<ImplementationOne>().unwrap();

  assert_eq!(all.len(), 1);
  assert!(std::ptr::eq(
    Rc::as_ptr(&all[0]) as *const u8,
    Rc::as_ptr(&one) as *const u8
  ));
}

#[test]
fn test_resolve_all_implementations_empty_when_none_match() {
  let registry = Registry::new();
  registry.register_type::<Unrelated>();

  let actual = registry.resolve_all_implementations::<dyn Plugin>().unwrap();

  assert!(actual.is_empty());
}

#[test]
fn test_latest_implementation_wins() {
  let registry = Registry::new();
  register_plugin::<ImplementationOne>(&registry);
  register_plugin::<ImplementationTwo>(&registry);

  assert_eq!(
    registry.resolve::<dyn Plugin>().unwrap().name(),
    "ImplementationTwo"
  );
}

#[test]
fn test_exact_registration_beats_implementations() {
  struct Config(&'static str);

  let registry = Registry::new();
  registry.register_instance(Config("exact"));
  registry
    .register(Registration::with_instance(Unrelated).implements::<Config>(|_| Rc::new(Config("derived"))))
    .unwrap();

  assert_eq!(registry.resolve::<Config>().unwrap().0, "exact");
}

#[test]
fn test_wrapped_trait_object_is_a_distinct_identity() {
  let registry = Registry::new();
  registry
    .register(Registration::<Rc<dyn Plugin>>::with_factory(|| {
      Rc::new(ImplementationOne) as Rc<dyn Plugin>
    }))
    .unwrap();
  register_plugin::<ImplementationTwo>(&registry);

  let wrapped = registry.resolve::<Rc<dyn Plugin>>().unwrap();
  assert_eq!(wrapped.name(), "ImplementationOne");
  assert_eq!(registry.resolve::<dyn Plugin>().unwrap().name(), "ImplementationTwo");
}

#[test]
fn test_reentrant_factory_reports_cycle() {
  struct Loop;

  let registry = Registry::new();
  registry.register_factory(|r: &Registry| -> fibre_registry::Result<Loop> {
    r.resolve::<Loop>()?;
    Ok(Loop)
  });

  let err = registry.resolve::<Loop>().err().unwrap();

  match err {
    Error::CyclicDependency { path } => assert_eq!(path.len(), 2),
    other => panic!("expected a cycle, got {other}"),
  }
  // The registration survives the failed attempt.
  assert!(registry.contains::<Loop>());
}

#[test]
fn test_failed_construction_is_retried() {
  struct Flaky;
  struct Needed;

  let attempts = Rc::new(Cell::new(0));
  let registry = Registry::new();
  let counter = Rc::clone(&attempts);
  registry.register_factory(move |r: &Registry| -> fibre_registry::Result<Flaky> {
    counter.set(counter.get() + 1);
    r.resolve::<Needed>()?;
    Ok(Flaky)
  });

  assert!(registry.resolve::<Flaky>().is_err());

  registry.register_instance(Needed);
  assert!(registry.resolve::<Flaky>().is_ok());
  assert!(registry.resolve::<Flaky>().is_ok());
  assert_eq!(attempts.get(), 2);
}

#[test]
fn test_resolved_sub_dependencies_survive_failure() {
  struct Missing;
  struct Top {
    _a: Rc<DependencyA>,
    _missing: Rc<Missing>,
  }

  impl Construct for Top {
    type Dependencies = (Rc<DependencyA>, Rc<Missing>);

    fn construct((a, missing): Self::Dependencies) -> Self {
      Self {
        _a: a,
        _missing: missing,
      }
    }
  }

  let registry = Registry::new();
  registry.register_factory(|| DependencyA);
  registry.register_type::<Top>();

  assert!(registry.resolve::<Top>().err().unwrap().is_resolution());

  let kinds: Vec<_> = registry
    .dependency_graph()
    .nodes()
    .map(|(key, kind)| (key.name(), kind.as_str()))
    .collect();
  assert_eq!(
    kinds,
    vec![
      (std::any::type_name::<Registry>(), "instance"),
      (std::any::type_name::<DependencyA>(), "instance"),
      (std::any::type_name::<Top>(), "construct"),
    ]
  );
}

#[test]
fn test_factory_overwriting_itself_keeps_new_registration() {
  #[derive(Debug, PartialEq)]
  struct Version(u32);

  let registry = Registry::new();
  registry.register_factory(|r: &Registry| -> fibre_registry::Result<Version> {
    r.register_instance(Version(2));
    Ok(Version(1))
  });

  assert_eq!(*registry.resolve::<Version>().unwrap(), Version(1));
  assert_eq!(*registry.resolve::<Version>().unwrap(), Version(2));
}

#[test]
fn test_clones_share_registrations() {
  let registry = Registry::new();
  let handle = registry.clone();
  handle.register_type::<DependencyA>();

  assert!(registry.contains::<DependencyA>());
  assert!(Rc::ptr_eq(
    &registry.resolve::<DependencyA>().unwrap(),
    &handle.resolve::<DependencyA>().unwrap()
  ));
}

#[test]
fn test_exact_abstraction_beats_later_implementations() {
  let registry = Registry::new();
  let preset: Rc<dyn Plugin> = Rc::new(ImplementationOne);
  registry.register_abstract_instance(Rc::clone(&preset));
  register_plugin::<ImplementationTwo>(&registry);
  register_plugin::<ImplementationThree>(&registry);

  let actual = registry.resolve::<dyn Plugin>().unwrap();

  assert!(registry.contains::<dyn Plugin>());
  assert_eq!(actual.name(), "ImplementationOne");
  assert!(Rc::ptr_eq(&actual, &preset));
}

#[test]
fn test_abstract_factory_runs_once_and_wins_over_implementations() {
  let calls = Rc::new(Cell::new(0));
  let registry = Registry::new();
  let counter = Rc::clone(&calls);
  registry.register_abstract_factory(move || {
    counter.set(counter.get() + 1);
    Rc::new(ImplementationTwo) as Rc<dyn Plugin>
  });
  register_plugin::<ImplementationThree>(&registry);

  let first = registry.resolve::<dyn Plugin>().unwrap();
  let second = registry.resolve::<dyn Plugin>().unwrap();

  assert_eq!(first.name(), "ImplementationTwo");
  assert!(Rc::ptr_eq(&first, &second));
  assert_eq!(calls.get(), 1);
}

#[test]
fn test_abstract_registration_with_factory_and_instance_is_rejected() {
  let registry = Registry::new();

  let err = registry
    .register(
      Registration::<dyn Plugin>::with_abstract_instance(Rc::new(ImplementationOne))
        .abstract_factory(|| Rc::new(ImplementationTwo) as Rc<dyn Plugin>),
    )
    .unwrap_err();

  assert!(err.is_configuration());
  assert!(!registry.contains::<dyn Plugin>());
}

#[test]
fn test_abstract_factory_receives_registry() {
  let registry = Registry::new();
  register_plugin::<ImplementationOne>(&registry);
  registry
    .register(Registration::<dyn Plugin>::with_abstract_factory(
      |r: &Registry| -> fibre_registry::Result<Rc<dyn Plugin>> {
        let one = r.resolve::<ImplementationOne>()?;
        Ok(one as Rc<dyn Plugin>)
      },
    ))
    .unwrap();
  register_plugin::<ImplementationTwo>(&registry);

  let actual = registry.resolve::<dyn Plugin>().unwrap();
  let one = registry.resolve::<ImplementationOne>().unwrap();

  assert!(std::ptr::eq(
    Rc::as_ptr(&actual) as *const u8,
    Rc::as_ptr(&one) as *const u8
  ));
}

#[test]
fn test_re_registered_older_implementation_keeps_its_place() {
  let registry = Registry::new();
  register_plugin::<ImplementationOne>(&registry);
  register_plugin::<ImplementationTwo>(&registry);
  // Overwriting ImplementationOne keeps it ahead of ImplementationTwo.
  register_plugin::<ImplementationOne>(&registry);

  assert_eq!(
    registry.resolve::<dyn Plugin>().unwrap().name(),
    "ImplementationTwo"
  );
  let names: Vec<_> = registry
    .resolve_all_implementations::<dyn Plugin>()
    .unwrap()
    .iter()
    .map(|plugin| plugin.name())
    .collect();
  assert_eq!(names, vec!["ImplementationOne", "ImplementationTwo"]);
}

#[test]
fn test_convenience_registrations_always_insert() {
  let registry = Registry::new();
  registry.register_type::<DependencyA>();
  registry.register_factory(|| Unrelated);
  registry.register_instance(String::from("value"));
  registry.register_abstract_instance(Rc::new(ImplementationOne) as Rc<dyn Plugin>);

  assert!(registry.contains::<DependencyA>());
  assert!(registry.contains::<Unrelated>());
  assert!(registry.contains::<String>());
  assert!(registry.contains::<dyn Plugin>());
  assert_eq!(registry.len(), 5);
}
