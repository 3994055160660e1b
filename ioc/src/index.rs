//! The type index used for autowiring by type.

use crate::catalog::TypeCatalog;
use crate::core::TypeKey;
use crate::registry::Registry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Maps every concrete type and declared role to the id of the definition
/// that provides it.
///
/// Rebuilt on every refresh, before anything is instantiated. When two
/// definitions provide the same key the later registration wins; that makes
/// autowiring by that key order-dependent, so collisions are logged.
#[derive(Debug, Default)]
pub(crate) struct TypeIndex {
  by_type: HashMap<TypeKey, String>,
}

impl TypeIndex {
  pub(crate) fn build(registry: &Registry, catalog: &TypeCatalog) -> Self {
    let mut by_type: HashMap<TypeKey, String> = HashMap::new();
    for definition in registry.iter() {
      // Unknown types are reported by validation, which runs next.
      let Some(bean_type) = catalog.get(definition.type_name()) else {
        continue;
      };
      for key in bean_type.provided_keys() {
        if let Some(previous) = by_type.insert(key, definition.id().to_owned()) {
          if previous != definition.id() {
            warn!(
              type_key = key.name(),
              previous = %previous,
              winner = definition.id(),
              "Multiple beans provide the same type; autowiring by this type picks the last one"
            );
          }
        }
      }
    }
    debug!(entries = by_type.len(), "Built type index");
    Self { by_type }
  }

  pub(crate) fn lookup(&self, key: TypeKey) -> Option<&str> {
    self.by_type.get(&key).map(String::as_str)
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.by_type.len()
  }
}
