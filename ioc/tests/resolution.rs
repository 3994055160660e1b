mod common;

use common::*;
use fibre_beans::{BeanDefinition, Container, Error, PropertyBinding, Scope};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn container_with(definitions: Vec<BeanDefinition>) -> Container {
  init_tracing();
  let container = Container::new(catalog(new_counter()));
  for definition in definitions {
    container.register_bean_definition(definition).unwrap();
  }
  container
}

// --- Dependency lookup ---

#[test]
fn test_qualifier_takes_precedence_over_type_index() {
  // Arrange: "email" is registered last, so the index maps the role to it.
  let container = container_with(vec![
    BeanDefinition::new("sms", "fixtures::SmsMessenger"),
    BeanDefinition::new("email", "fixtures::EmailMessenger"),
    BeanDefinition::new("alerts", "fixtures::AlertService"),
    BeanDefinition::new("newsletter", "fixtures::Newsletter"),
  ]);
  container.refresh().unwrap();

  // Act
  let alerts = container.get_bean_as::<AlertService>("alerts").unwrap();
  let newsletter = container.get_bean_as::<Newsletter>("newsletter").unwrap();

  // Assert
  assert_eq!(alerts.messenger.send("hi"), "sms: hi");
  assert_eq!(newsletter.messenger.send("hi"), "email: hi");
}

#[test]
fn test_role_resolution_returns_the_singleton() {
  // Arrange
  let container = container_with(vec![BeanDefinition::new("email", "fixtures::EmailMessenger")]);
  container.refresh().unwrap();

  // Act
  let as_role = container.get_bean_as::<dyn Messenger>("email").unwrap();
  let as_concrete = container.get_bean_as::<EmailMessenger>("email").unwrap();

  // Assert
  assert_eq!(as_role.send("x"), "email: x");
  assert!(std::ptr::eq(
    Arc::as_ptr(&as_role) as *const u8,
    Arc::as_ptr(&as_concrete) as *const u8
  ));
}

#[test]
fn test_missing_qualified_bean_fails_creation() {
  // Arrange: AlertService asks for "sms", which is not registered.
  let container = container_with(vec![
    BeanDefinition::new("email", "fixtures::EmailMessenger"),
    BeanDefinition::new("alerts", "fixtures::AlertService"),
  ]);

  // Act
  let err = container.refresh().unwrap_err();

  // Assert
  assert!(matches!(err, Error::MissingDependency { ref id, .. } if id == "alerts"));
  assert!(err.is_creation());
  assert!(!container.is_ready());
  assert_eq!(container.singleton_count(), 0);
}

#[test]
fn test_optional_qualifier_naming_missing_bean_fails_creation() {
  // Arrange: Dispatcher's optional field asks for "pager"; only "sms" exists.
  let container = container_with(vec![
    BeanDefinition::new("sms", "fixtures::SmsMessenger"),
    BeanDefinition::new("dispatcher", "fixtures::Dispatcher"),
  ]);

  // Act
  let err = container.refresh().unwrap_err();

  // Assert
  match &err {
    Error::MissingDependency { id, target, dependency } => {
      assert_eq!(id, "dispatcher");
      assert!(target.contains("messenger"), "{}", target);
      assert!(dependency.contains("pager"), "{}", dependency);
    }
    other => panic!("unexpected error: {}", other),
  }
  assert!(err.is_creation());
  assert!(!container.is_ready());
}

#[test]
fn test_optional_qualifier_is_injected_when_registered() {
  let container = container_with(vec![
    BeanDefinition::new("pager", "fixtures::SmsMessenger"),
    BeanDefinition::new("dispatcher", "fixtures::Dispatcher"),
  ]);
  container.refresh().unwrap();

  let dispatcher = container.get_bean_as::<Dispatcher>("dispatcher").unwrap();
  assert_eq!(dispatcher.messenger.as_ref().unwrap().send("x"), "sms: x");
}

#[test]
fn test_missing_required_field_dependency() {
  // Arrange
  let container = container_with(vec![BeanDefinition::new("serviceB", "fixtures::ServiceB")]);

  // Act
  let err = container.get_bean("serviceB").unwrap_err();

  // Assert
  match err {
    Error::MissingDependency { id, target, .. } => {
      assert_eq!(id, "serviceB");
      assert!(target.contains("service_a"), "{}", target);
    }
    other => panic!("unexpected error: {}", other),
  }
}

#[test]
fn test_optional_setter_is_injected_when_available() {
  // Arrange
  let container = container_with(vec![
    BeanDefinition::new("serviceA", "fixtures::ServiceA"),
    BeanDefinition::new("serviceB", "fixtures::ServiceB"),
    BeanDefinition::new("sms", "fixtures::SmsMessenger"),
  ]);
  container.refresh().unwrap();

  // Act
  let service_b = container.get_bean_as::<ServiceB>("serviceB").unwrap();

  // Assert
  assert_eq!(service_b.messenger.as_ref().unwrap().send("x"), "sms: x");
}

#[test]
fn test_definition_registered_after_refresh_resolves_by_scan() {
  // Arrange: the type index was built without any messenger.
  let container = container_with(vec![BeanDefinition::new("newsletter", "fixtures::Newsletter")
    .with_scope(Scope::Prototype)]);
  container.refresh().unwrap();
  container
    .register_bean_definition(BeanDefinition::new("sms", "fixtures::SmsMessenger"))
    .unwrap();

  // Act
  let newsletter = container.get_bean_as::<Newsletter>("newsletter").unwrap();

  // Assert
  assert_eq!(newsletter.messenger.send("x"), "sms: x");
}

// --- Failures ---

#[test]
fn test_unknown_id_is_not_found() {
  let container = container_with(vec![]);
  assert!(matches!(
    container.get_bean("nope"),
    Err(Error::NotFound { ref id }) if id == "nope"
  ));
  assert!(!container.contains_bean("nope"));
}

#[test]
fn test_circular_dependency_is_detected_from_both_ends() {
  // Arrange
  let container = container_with(vec![
    BeanDefinition::new("a", "fixtures::CycleA"),
    BeanDefinition::new("b", "fixtures::CycleB"),
  ]);

  for start in ["a", "b"] {
    // Act
    let err = container.get_bean(start).unwrap_err();

    // Assert
    let chain = err.cycle_chain().expect("expected a circular dependency");
    assert!(chain.iter().any(|id| id == "a"));
    assert!(chain.iter().any(|id| id == "b"));
    assert_eq!(chain.first(), chain.last());
    assert!(err.to_string().contains(" -> "));
  }
  // The failed attempts leave nothing behind; another call fails the same way.
  assert!(matches!(
    container.get_bean("a"),
    Err(Error::CircularDependency { .. })
  ));
  assert_eq!(container.singleton_count(), 0);
}

#[test]
fn test_refresh_fails_on_cycle() {
  let container = container_with(vec![
    BeanDefinition::new("a", "fixtures::CycleA"),
    BeanDefinition::new("b", "fixtures::CycleB"),
  ]);
  let err = container.refresh().unwrap_err();
  assert_eq!(err.cycle_chain(), Some(&["a".to_string(), "b".to_string(), "a".to_string()][..]));
  assert!(!container.is_ready());
}

#[test]
fn test_type_mismatch() {
  // Arrange
  let container = container_with(vec![BeanDefinition::new("serviceA", "fixtures::ServiceA")]);

  // Act
  let Err(err) = container.get_bean_as::<dyn Messenger>("serviceA") else {
    panic!("serviceA should not be served as a messenger");
  };

  // Assert
  assert!(matches!(err, Error::TypeMismatch { ref actual, .. } if actual == "fixtures::ServiceA"));
  assert!(err.to_string().contains("is not of required type"));
}

#[test]
fn test_constructor_selection_errors() {
  let container = container_with(vec![
    BeanDefinition::new("serviceA", "fixtures::ServiceA"),
    BeanDefinition::new("two", "fixtures::TwoInjectables"),
    BeanDefinition::new("needs", "fixtures::NeedsArguments"),
  ]);

  assert!(matches!(
    container.get_bean("two"),
    Err(Error::AmbiguousConstructor { count: 2, .. })
  ));
  assert!(matches!(
    container.get_bean("needs"),
    Err(Error::NoUsableConstructor { .. })
  ));
}

#[test]
fn test_constructor_error_is_reported() {
  let container = container_with(vec![BeanDefinition::new("failing", "fixtures::Failing")]);
  let err = container.get_bean("failing").unwrap_err();
  assert!(matches!(
    err,
    Error::Instantiation { ref id, ref reason } if id == "failing" && reason == "connection refused"
  ));
  assert!(err.is_creation());
}

// --- Properties ---

fn settings(bindings: Vec<PropertyBinding>) -> BeanDefinition {
  bindings
    .into_iter()
    .fold(BeanDefinition::new("settings", "fixtures::Settings"), |d, b| {
      d.with_property(b)
    })
}

#[test]
fn test_literal_properties_are_coerced() {
  // Arrange
  let container = container_with(vec![settings(vec![
    PropertyBinding::literal("name", "primary"),
    PropertyBinding::literal("retries", "3"),
    PropertyBinding::literal("timeout_ms", " 30000 "),
    PropertyBinding::literal("ratio", "0.75"),
    PropertyBinding::literal("weight", "1.5"),
    PropertyBinding::literal("verbose", "TRUE"),
    PropertyBinding::literal("port", "8080"),
    PropertyBinding::literal("level", "-3"),
    PropertyBinding::literal("grade", "A+"),
  ])]);

  // Act
  let settings = container.get_bean_as::<Settings>("settings").unwrap();

  // Assert
  assert_eq!(settings.name, "[primary]");
  assert_eq!(settings.retries, 3);
  assert_eq!(settings.timeout_ms, 30000);
  assert_eq!(settings.ratio, 0.75);
  assert_eq!(settings.weight, 1.5);
  assert!(settings.verbose);
  assert_eq!(settings.port, 8080);
  assert_eq!(settings.level, -3);
  assert_eq!(settings.grade, 'A');
}

#[test]
fn test_unrecognised_boolean_is_false() {
  let container = container_with(vec![settings(vec![PropertyBinding::literal("verbose", "yes")])]);
  let settings = container.get_bean_as::<Settings>("settings").unwrap();
  assert!(!settings.verbose);
}

#[test]
fn test_reference_property_uses_setter() {
  // Arrange
  let container = container_with(vec![
    BeanDefinition::new("sms", "fixtures::SmsMessenger"),
    settings(vec![PropertyBinding::reference("messenger", "sms")]),
  ]);
  container.refresh().unwrap();

  // Act
  let settings = container.get_bean_as::<Settings>("settings").unwrap();
  let sms = container.get_bean_as::<dyn Messenger>("sms").unwrap();

  // Assert
  assert!(Arc::ptr_eq(settings.messenger.as_ref().unwrap(), &sms));
}

#[test]
fn test_property_errors() {
  let unparsable = container_with(vec![settings(vec![PropertyBinding::literal("retries", "many")])]);
  assert!(matches!(
    unparsable.get_bean("settings"),
    Err(Error::PropertyConversion { ref value, ref target, .. }) if value == "many" && target == "i32"
  ));

  let no_target = container_with(vec![settings(vec![PropertyBinding::literal("colour", "red")])]);
  assert!(matches!(
    no_target.get_bean("settings"),
    Err(Error::NoInjectionTarget { ref property, .. }) if property == "colour"
  ));

  let empty_char = container_with(vec![settings(vec![PropertyBinding::literal("grade", "")])]);
  assert!(matches!(
    empty_char.get_bean("settings"),
    Err(Error::PropertyConversion { .. })
  ));
}

#[test]
fn test_dangling_reference_is_a_creation_error() {
  // Arrange: registered after refresh, so validation never sees the dangling ref.
  let container = container_with(vec![BeanDefinition::new("sms", "fixtures::SmsMessenger")]);
  container.refresh().unwrap();
  container
    .register_bean_definition(settings(vec![PropertyBinding::reference("messenger", "ghost")]))
    .unwrap();

  // Act
  let err = container.get_bean("settings").unwrap_err();

  // Assert
  assert!(container.contains_bean("settings"));
  match &err {
    Error::MissingDependency { id, target, dependency } => {
      assert_eq!(id, "settings");
      assert!(target.contains("messenger"), "{}", target);
      assert!(dependency.contains("ghost"), "{}", dependency);
    }
    other => panic!("unexpected error: {}", other),
  }
  assert!(err.is_creation());
}

#[test]
fn test_reference_to_wrong_type_is_a_mismatch() {
  let container = container_with(vec![
    BeanDefinition::new("serviceA", "fixtures::ServiceA"),
    settings(vec![PropertyBinding::reference("messenger", "serviceA")]),
  ]);
  assert!(matches!(
    container.refresh(),
    Err(Error::TypeMismatch { ref id, .. }) if id == "serviceA"
  ));
}
