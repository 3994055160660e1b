//! Bean definitions discovered from component markers in the type catalog.

use super::DefinitionSource;
use crate::catalog::TypeCatalog;
use crate::definition::BeanDefinition;
use crate::descriptor::BeanType;
use crate::error::Result;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Registers every marked component whose type name lies under one of the
/// given module prefixes.
///
/// A prefix matches a type name equal to it or starting with `prefix::`, so
/// `app::svc` covers `app::svc::Mailer` but not `app::svcs::Mailer`. The
/// empty prefix matches everything.
#[derive(Debug, Clone)]
pub struct ComponentScan {
  name: String,
  prefixes: Vec<String>,
}

impl ComponentScan {
  pub fn new<I, S>(prefixes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let prefixes: Vec<String> = prefixes
      .into_iter()
      .map(|p| p.into().trim_end_matches("::").to_owned())
      .collect();
    Self {
      name: format!("scan:{}", prefixes.join(",")),
      prefixes,
    }
  }

  pub fn prefixes(&self) -> &[String] {
    &self.prefixes
  }

  fn covers(&self, type_name: &str) -> bool {
    self.prefixes.iter().any(|prefix| {
      prefix.is_empty()
        || type_name == prefix
        || type_name
          .strip_prefix(prefix.as_str())
          .is_some_and(|rest| rest.starts_with("::"))
    })
  }
}

impl DefinitionSource for ComponentScan {
  fn name(&self) -> &str {
    &self.name
  }

  fn load(&self, catalog: &TypeCatalog) -> Result<Vec<BeanDefinition>> {
    let mut seen = HashSet::new();
    let mut definitions = Vec::new();

    for bean_type in catalog.iter() {
      let Some(marker) = bean_type.component() else {
        continue;
      };
      if !self.covers(bean_type.name()) || !seen.insert(bean_type.name()) {
        continue;
      }
      let id = marker
        .name
        .clone()
        .unwrap_or_else(|| default_bean_id(bean_type));
      trace!(bean = %id, bean_type = bean_type.name(), "Found component");
      definitions.push(BeanDefinition::new(id, bean_type.name()).with_scope(marker.scope));
    }

    debug!(source = %self.name, count = definitions.len(), "Component scan finished");
    Ok(definitions)
  }
}

/// The simple type name with its first letter lower-cased: `UserService`
/// becomes `userService`.
fn default_bean_id(bean_type: &BeanType) -> String {
  let simple = bean_type.simple_name();
  let mut chars = simple.chars();
  match chars.next() {
    Some(first) => first.to_lowercase().chain(chars).collect(),
    None => String::new(),
  }
}
