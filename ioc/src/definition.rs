//! Declarative bean metadata: definitions and their property bindings.

use crate::scope::Scope;
use std::fmt;

/// Where a definition came from.
///
/// Definitions produced by a [`DefinitionSource`](crate::DefinitionSource) are
/// dropped and re-ingested on every refresh; manually registered ones persist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Origin {
  #[default]
  Manual,
  Source(String),
}

/// The value side of a [`PropertyBinding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingValue {
  /// A scalar literal, coerced to the target member's type at injection time.
  Literal(String),
  /// The id of another bean.
  Reference(String),
}

/// A named property assignment, typically read from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBinding {
  pub name: String,
  pub value: BindingValue,
}

impl PropertyBinding {
  pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: BindingValue::Literal(value.into()),
    }
  }

  pub fn reference(name: impl Into<String>, bean_id: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: BindingValue::Reference(bean_id.into()),
    }
  }

  pub fn is_reference(&self) -> bool {
    matches!(self.value, BindingValue::Reference(_))
  }

  /// The referenced bean id, if this binding is a reference.
  pub fn reference_id(&self) -> Option<&str> {
    match &self.value {
      BindingValue::Reference(id) => Some(id),
      BindingValue::Literal(_) => None,
    }
  }
}

/// Describes how to build one bean.
///
/// `type_name` is the key of a [`BeanType`](crate::BeanType) in the container's
/// [`TypeCatalog`](crate::TypeCatalog). It is checked at refresh, not here, so a
/// definition with an unknown or empty type can still be registered and will
/// fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDefinition {
  id: String,
  type_name: String,
  scope: Scope,
  properties: Vec<PropertyBinding>,
  origin: Origin,
}

impl BeanDefinition {
  /// Creates a singleton definition with no property bindings.
  pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      type_name: type_name.into(),
      scope: Scope::Singleton,
      properties: Vec::new(),
      origin: Origin::Manual,
    }
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn with_property(mut self, binding: PropertyBinding) -> Self {
    self.properties.push(binding);
    self
  }

  pub fn with_origin(mut self, origin: Origin) -> Self {
    self.origin = origin;
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn properties(&self) -> &[PropertyBinding] {
    &self.properties
  }

  pub fn origin(&self) -> &Origin {
    &self.origin
  }

  pub fn is_singleton(&self) -> bool {
    self.scope == Scope::Singleton
  }
}

impl fmt::Display for BeanDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "BeanDefinition{{id='{}', type='{}', scope='{}'}}",
      self.id, self.type_name, self.scope
    )
  }
}
