//! The definition registry: bean definitions keyed by id, in registration order.

use crate::catalog::TypeCatalog;
use crate::definition::{BeanDefinition, Origin};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone)]
pub(crate) struct Registry {
  definitions: HashMap<String, BeanDefinition>,
  // Registration order. An overridden id keeps its original slot.
  order: Vec<String>,
}

impl Registry {
  #[cfg(test)]
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Registers a definition, replacing any existing one with the same id.
  pub(crate) fn register(&mut self, definition: BeanDefinition) -> Result<()> {
    let id = definition.id().to_owned();
    if id.is_empty() {
      return Err(Error::InvalidDefinition {
        reason: format!(
          "bean ID cannot be empty (type '{}')",
          definition.type_name()
        ),
      });
    }

    match self.definitions.insert(id.clone(), definition) {
      Some(previous) => {
        warn!(bean = %id, previous_type = previous.type_name(), "Overriding bean definition");
      }
      None => {
        debug!(bean = %id, "Registering bean definition");
        self.order.push(id);
      }
    }
    Ok(())
  }

  pub(crate) fn get(&self, id: &str) -> Result<&BeanDefinition> {
    self.definitions.get(id).ok_or_else(|| Error::NotFound { id: id.to_owned() })
  }

  pub(crate) fn contains(&self, id: &str) -> bool {
    self.definitions.contains_key(id)
  }

  pub(crate) fn len(&self) -> usize {
    self.order.len()
  }

  pub(crate) fn list_ids(&self) -> Vec<String> {
    self.order.clone()
  }

  /// Definitions in registration order.
  pub(crate) fn iter(&self) -> impl Iterator<Item = &BeanDefinition> {
    self.order.iter().filter_map(|id| self.definitions.get(id))
  }

  pub(crate) fn snapshot(&self) -> Vec<BeanDefinition> {
    self.iter().cloned().collect()
  }

  /// Drops every definition that was produced by a definition source.
  pub(crate) fn remove_from_sources(&mut self) -> usize {
    let before = self.order.len();
    self
      .definitions
      .retain(|_, definition| *definition.origin() == Origin::Manual);
    let definitions = &self.definitions;
    self.order.retain(|id| definitions.contains_key(id));
    before - self.order.len()
  }

  /// Checks that every definition names a known type and that every reference
  /// binding points at a registered id.
  pub(crate) fn validate(&self, catalog: &TypeCatalog) -> Result<()> {
    debug!("Validating bean definitions");
    for definition in self.iter() {
      let id = definition.id();
      if definition.type_name().is_empty() {
        return Err(Error::Validation {
          id: id.to_owned(),
          reason: "bean type name is required".to_owned(),
        });
      }
      if !catalog.contains(definition.type_name()) {
        return Err(Error::Validation {
          id: id.to_owned(),
          reason: format!("bean type not found: {}", definition.type_name()),
        });
      }
      for binding in definition.properties() {
        if let Some(target) = binding.reference_id() {
          if !self.contains(target) {
            return Err(Error::Validation {
              id: id.to_owned(),
              reason: format!(
                "property '{}' references undefined bean: {}",
                binding.name, target
              ),
            });
          }
        }
      }
    }
    Ok(())
  }
}
