//! The type catalog: every [`BeanType`] a container can instantiate, by name.

use crate::descriptor::BeanType;
use linkme::distributed_slice;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Link-time registrations of bean types.
///
/// Any crate in the final binary can contribute a type here, and
/// [`TypeCatalog::linked`] collects them all:
///
/// ```ignore
/// #[linkme::distributed_slice(fibre_beans::BEAN_TYPES)]
/// static MAILER: fn() -> BeanType = || {
///   BeanType::builder::<Mailer>("app::Mailer")
///     .default_constructor(Mailer::default)
///     .component()
///     .build()
/// };
/// ```
#[distributed_slice]
pub static BEAN_TYPES: [fn() -> BeanType] = [..];

static LINKED: Lazy<Arc<TypeCatalog>> = Lazy::new(|| Arc::new(TypeCatalog::collect_linked()));

/// Bean types keyed by name, iterated in registration order.
#[derive(Default)]
pub struct TypeCatalog {
  types: Vec<BeanType>,
  by_name: HashMap<String, usize>,
}

impl TypeCatalog {
  /// Creates a new, empty `TypeCatalog`.
  pub fn new() -> Self {
    Self::default()
  }

  /// The shared catalog of every type registered through [`BEAN_TYPES`].
  pub fn linked() -> Arc<TypeCatalog> {
    LINKED.clone()
  }

  /// A fresh catalog holding every type registered through [`BEAN_TYPES`],
  /// which can be extended further.
  pub fn collect_linked() -> Self {
    let mut catalog = Self::new();
    for make in BEAN_TYPES {
      catalog.register(make());
    }
    debug!(types = catalog.len(), "Collected link-time bean types");
    catalog
  }

  /// Adds a type, replacing any earlier one with the same name.
  pub fn register(&mut self, bean_type: BeanType) -> &mut Self {
    match self.by_name.get(bean_type.name()) {
      Some(&slot) => {
        warn!(bean_type = bean_type.name(), "Replacing bean type in catalog");
        self.types[slot] = bean_type;
      }
      None => {
        self
          .by_name
          .insert(bean_type.name().to_owned(), self.types.len());
        self.types.push(bean_type);
      }
    }
    self
  }

  /// Builder-style [`register`](Self::register).
  pub fn with(mut self, bean_type: BeanType) -> Self {
    self.register(bean_type);
    self
  }

  pub fn get(&self, name: &str) -> Option<&BeanType> {
    self.by_name.get(name).map(|&slot| &self.types[slot])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.by_name.contains_key(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &BeanType> {
    self.types.iter()
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct First;
  #[derive(Default)]
  struct Second;

  #[test]
  fn replacing_a_name_keeps_its_position() {
    let mut catalog = TypeCatalog::new();
    catalog
      .register(BeanType::builder::<First>("a::Thing").build())
      .register(BeanType::builder::<First>("a::Other").build())
      .register(
        BeanType::builder::<Second>("a::Thing")
          .default_constructor(Second::default)
          .build(),
      );

    let names: Vec<&str> = catalog.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["a::Thing", "a::Other"]);
    assert_eq!(catalog.len(), 2);
    assert!(catalog
      .get("a::Thing")
      .unwrap()
      .provides(crate::core::TypeKey::of::<Second>()));
  }
}
