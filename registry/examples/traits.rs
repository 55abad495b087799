use fibre_registry::{Construct, Registration, Registry};
use std::rc::Rc;

// 1. Define the abstraction (the trait)
trait Logger {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
#[derive(Default)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

fibre_registry::default_construct! { ConsoleLogger }

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Rc<dyn Logger>,
}

impl Construct for ReportService {
  type Dependencies = (Rc<dyn Logger>,);

  fn construct((logger,): Self::Dependencies) -> Self {
    Self { logger }
  }
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> fibre_registry::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let registry = Registry::new();

  // --- Registration ---

  // ConsoleLogger is registered under its own type and declared to implement
  // `dyn Logger`. Nothing is registered under `dyn Logger` itself.
  registry.register(Registration::<ConsoleLogger>::new().implements::<dyn Logger>(|it| it))?;
  registry.register_type::<ReportService>();

  registry.validate()?;

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = registry.resolve::<ReportService>()?;

  println!("Using the service...");
  report_service.generate_report();

  Ok(())
}
