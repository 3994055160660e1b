#![allow(dead_code)]

use fibre_beans::{Autowire, BeanType, Container, Dependency, Scope, TypeCatalog};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

// Logs go through the test writer, so they only show for failing tests.
pub fn init_tracing() {
  TRACING.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
      .with_test_writer()
      .try_init();
  });
}

// --- Test Fixtures ---

pub trait Messenger: Send + Sync {
  fn send(&self, message: &str) -> String;
}

#[derive(Default)]
pub struct EmailMessenger;
impl Messenger for EmailMessenger {
  fn send(&self, message: &str) -> String {
    format!("email: {}", message)
  }
}

#[derive(Default)]
pub struct SmsMessenger;
impl Messenger for SmsMessenger {
  fn send(&self, message: &str) -> String {
    format!("sms: {}", message)
  }
}

/// Depends on a messenger through an injectable constructor with a qualifier.
pub struct AlertService {
  pub messenger: Arc<dyn Messenger>,
}

/// Depends on a messenger by type only.
pub struct Newsletter {
  pub messenger: Arc<dyn Messenger>,
}

#[derive(Default)]
pub struct ServiceA;

/// `service_a` is an autowired field, `messenger` an optional autowired setter.
#[derive(Default)]
pub struct ServiceB {
  pub service_a: Option<Arc<ServiceA>>,
  pub messenger: Option<Arc<dyn Messenger>>,
}

/// Receives `ServiceA` through its injectable constructor.
pub struct Gateway {
  pub service_a: Arc<ServiceA>,
}

/// An optional autowired field whose qualifier names "pager".
#[derive(Default)]
pub struct Dispatcher {
  pub messenger: Option<Arc<dyn Messenger>>,
}

/// Every instance takes the next value of a shared counter.
pub struct Notification {
  pub sequence: usize,
}

pub struct CycleA {
  pub b: Arc<CycleB>,
}

pub struct CycleB {
  pub a: Arc<CycleA>,
}

/// Properties of every scalar kind, plus a reference slot behind a setter.
#[derive(Default)]
pub struct Settings {
  pub name: String,
  pub retries: i32,
  pub timeout_ms: i64,
  pub ratio: f64,
  pub weight: f32,
  pub verbose: bool,
  pub port: i16,
  pub level: i8,
  pub grade: char,
  pub messenger: Option<Arc<dyn Messenger>>,
}

pub struct TwoInjectables;

pub struct NeedsArguments;

pub struct Failing;

/// The catalog used by most tests. `counter` backs [`Notification`].
pub fn catalog(counter: Arc<AtomicUsize>) -> TypeCatalog {
  TypeCatalog::new()
    .with(
      BeanType::builder::<EmailMessenger>("fixtures::EmailMessenger")
        .implements::<dyn Messenger, _>(|m| m as Arc<dyn Messenger>)
        .default_constructor(EmailMessenger::default)
        .component_named("email")
        .build(),
    )
    .with(
      BeanType::builder::<SmsMessenger>("fixtures::SmsMessenger")
        .implements::<dyn Messenger, _>(|m| m as Arc<dyn Messenger>)
        .default_constructor(SmsMessenger::default)
        .build(),
    )
    .with(
      BeanType::builder::<AlertService>("fixtures::AlertService")
        .injectable_constructor(
          [Dependency::of::<dyn Messenger>().qualifier("sms")],
          |args| {
            Ok(AlertService {
              messenger: args.next()?,
            })
          },
        )
        .build(),
    )
    .with(
      BeanType::builder::<Newsletter>("fixtures::Newsletter")
        .injectable_constructor([Dependency::of::<dyn Messenger>()], |args| {
          Ok(Newsletter {
            messenger: args.next()?,
          })
        })
        .build(),
    )
    .with(
      BeanType::builder::<ServiceA>("fixtures::ServiceA")
        .default_constructor(ServiceA::default)
        .component()
        .build(),
    )
    .with(
      BeanType::builder::<ServiceB>("fixtures::ServiceB")
        .default_constructor(ServiceB::default)
        .autowired_field::<ServiceA, _>("service_a", Autowire::required(), |b, a| {
          b.service_a = Some(a)
        })
        .autowired_setter::<dyn Messenger, _>("set_messenger", Autowire::optional(), |b, m| {
          b.messenger = Some(m)
        })
        .component()
        .build(),
    )
    .with(
      BeanType::builder::<Gateway>("fixtures::Gateway")
        .injectable_constructor([Dependency::of::<ServiceA>()], |args| {
          Ok(Gateway {
            service_a: args.next()?,
          })
        })
        .build(),
    )
    .with(
      BeanType::builder::<Dispatcher>("fixtures::Dispatcher")
        .default_constructor(Dispatcher::default)
        .autowired_field::<dyn Messenger, _>(
          "messenger",
          Autowire::optional().qualifier("pager"),
          |d, m| d.messenger = Some(m),
        )
        .build(),
    )
    .with(
      BeanType::builder::<Notification>("fixtures::Notification")
        .default_constructor(move || Notification {
          sequence: counter.fetch_add(1, Ordering::SeqCst) + 1,
        })
        .component_named("notif")
        .scope(Scope::Prototype)
        .build(),
    )
    .with(
      BeanType::builder::<CycleA>("fixtures::CycleA")
        .injectable_constructor([Dependency::of::<CycleB>()], |args| {
          Ok(CycleA { b: args.next()? })
        })
        .build(),
    )
    .with(
      BeanType::builder::<CycleB>("fixtures::CycleB")
        .injectable_constructor([Dependency::of::<CycleA>()], |args| {
          Ok(CycleB { a: args.next()? })
        })
        .build(),
    )
    .with(settings_type())
    .with(
      BeanType::builder::<TwoInjectables>("fixtures::TwoInjectables")
        .injectable_constructor([], |_| Ok(TwoInjectables))
        .injectable_constructor([Dependency::of::<ServiceA>()], |_| Ok(TwoInjectables))
        .build(),
    )
    .with(
      BeanType::builder::<NeedsArguments>("fixtures::NeedsArguments")
        .constructor([Dependency::of::<ServiceA>()], |_| Ok(NeedsArguments))
        .build(),
    )
    .with(
      BeanType::builder::<Failing>("fixtures::Failing")
        .constructor([], |args| Err(args.error("connection refused")))
        .build(),
    )
}

fn settings_type() -> BeanType {
  BeanType::builder::<Settings>("fixtures::Settings")
    .default_constructor(Settings::default)
    .property::<String, _>("name", |s, v| s.name = v)
    .property::<i32, _>("retries", |s, v| s.retries = v)
    .property::<i64, _>("timeout_ms", |s, v| s.timeout_ms = v)
    .property::<f64, _>("ratio", |s, v| s.ratio = v)
    .property::<f32, _>("weight", |s, v| s.weight = v)
    .property::<bool, _>("verbose", |s, v| s.verbose = v)
    .property::<i16, _>("port", |s, v| s.port = v)
    .property::<i8, _>("level", |s, v| s.level = v)
    .property::<char, _>("grade", |s, v| s.grade = v)
    // The setter is preferred over the field of the same property name.
    .property_setter::<String, _>("set_name", |s, v| s.name = format!("[{}]", v))
    .property_ref_setter::<dyn Messenger, _>("set_messenger", |s, m| s.messenger = Some(m))
    .build()
}

pub fn new_counter() -> Arc<AtomicUsize> {
  Arc::new(AtomicUsize::new(0))
}

/// A container over the fixture catalog with the given markup.
pub fn markup_container(counter: Arc<AtomicUsize>, markup: &str) -> Container {
  init_tracing();
  Container::builder(catalog(counter))
    .markup_text("test-markup", markup)
    .build()
}
