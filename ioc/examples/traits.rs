use fibre_beans::{resolve, Autowire, BeanType, Container, Dependency, TypeCatalog};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define two concrete implementations
#[derive(Default)]
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

#[derive(Default)]
struct AuditLogger;
impl Logger for AuditLogger {
  fn log(&self, message: &str) {
    println!("[AUDIT LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
  audit: Option<Arc<dyn Logger>>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    if let Some(audit) = &self.audit {
      audit.log("Report requested.");
    }
    self.logger.log("Finished report generation.");
  }
}

fn main() -> fibre_beans::Result<()> {
  // --- Type metadata ---
  // Both loggers declare that they can be served as `dyn Logger`, and both
  // carry a component marker so a scan registers them.
  let catalog = TypeCatalog::new()
    .with(
      BeanType::builder::<ConsoleLogger>("demo::logging::ConsoleLogger")
        .implements::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
        .default_constructor(ConsoleLogger::default)
        .component_named("console")
        .build(),
    )
    .with(
      BeanType::builder::<AuditLogger>("demo::logging::AuditLogger")
        .implements::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
        .default_constructor(AuditLogger::default)
        .component()
        .build(),
    )
    .with(
      // The constructor receives the logger by qualifier; the audit logger is
      // an autowired field, also by qualifier.
      BeanType::builder::<ReportService>("demo::ReportService")
        .injectable_constructor(
          [Dependency::of::<dyn Logger>().qualifier("console")],
          |args| {
            Ok(ReportService {
              logger: args.next()?,
              audit: None,
            })
          },
        )
        .autowired_field::<dyn Logger, _>(
          "audit",
          Autowire::optional().qualifier("auditLogger"),
          |service, logger| service.audit = Some(logger),
        )
        .component()
        .build(),
    );

  // --- Registration ---
  let container = Container::builder(catalog)
    .scan(["demo"])
    .build_refreshed()?;

  // --- Resolution and Usage ---
  println!("Registered beans: {:?}", container.list_definition_ids());
  let report_service = resolve!(container, "reportService", ReportService);
  report_service.generate_report();

  // A bean can also be resolved by a role it declares.
  let logger = resolve!(container, "auditLogger", trait Logger);
  logger.log("Resolved as a trait object.");

  Ok(())
}
