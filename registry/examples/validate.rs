use fibre_registry::{Construct, Registry};
use std::rc::Rc;

struct Orders {
  _billing: Rc<Billing>,
}

struct Billing {
  _orders: Rc<Orders>,
}

impl Construct for Orders {
  type Dependencies = (Rc<Billing>,);

  fn construct((billing,): Self::Dependencies) -> Self {
    Self { _billing: billing }
  }
}

impl Construct for Billing {
  type Dependencies = (Rc<Orders>,);

  fn construct((orders,): Self::Dependencies) -> Self {
    Self { _orders: orders }
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let registry = Registry::new();
  registry.register_type::<Orders>();
  registry.register_type::<Billing>();

  // Print the graph; pipe into `dot -Tsvg` to render it.
  println!("{}", registry.dependency_graph().to_dot());

  // Validation finds the cycle without constructing anything.
  match registry.validate() {
    Ok(()) => println!("registry is valid"),
    Err(e) => println!("validation failed: {}", e),
  }
}
