//! Bean lifecycles and the cache that backs the singleton one.

use crate::resolver::Bean;
use dashmap::DashMap;
use std::fmt;
use std::str::FromStr;

/// The lifecycle of the instances built from a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
  /// One cached instance per container, until the next refresh.
  #[default]
  Singleton,
  /// A fresh instance on every request; never cached.
  Prototype,
}

impl Scope {
  pub fn as_str(&self) -> &'static str {
    match self {
      Scope::Singleton => "singleton",
      Scope::Prototype => "prototype",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Scope {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "singleton" => Ok(Scope::Singleton),
      "prototype" => Ok(Scope::Prototype),
      other => Err(format!(
        "unknown scope '{}', expected 'singleton' or 'prototype'",
        other
      )),
    }
  }
}

/// Completed singleton instances, keyed by bean id.
///
/// Only fully built beans are ever inserted. Every access already happens under
/// the container lock; the `DashMap` is there for writes through `&self` while
/// a resolution pass recursively builds dependencies, so no entry guard may be
/// held across a call back into the resolver.
#[derive(Default)]
pub(crate) struct SingletonCache {
  instances: DashMap<String, Bean>,
}

impl SingletonCache {
  #[cfg(test)]
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn get(&self, id: &str) -> Option<Bean> {
    self.instances.get(id).map(|entry| entry.value().clone())
  }

  pub(crate) fn insert(&self, id: &str, bean: Bean) {
    self.instances.insert(id.to_owned(), bean);
  }

  /// Drops the instance cached for `id`, returning whether there was one.
  pub(crate) fn remove(&self, id: &str) -> bool {
    self.instances.remove(id).is_some()
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, id: &str) -> bool {
    self.instances.contains_key(id)
  }

  pub(crate) fn len(&self) -> usize {
    self.instances.len()
  }

  pub(crate) fn clear(&self) {
    self.instances.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[test]
  fn scope_parses_known_values() {
    assert_eq!("singleton".parse::<Scope>().unwrap(), Scope::Singleton);
    assert_eq!("prototype".parse::<Scope>().unwrap(), Scope::Prototype);
    assert!("request".parse::<Scope>().is_err());
    assert_eq!(Scope::default(), Scope::Singleton);
  }

  #[test]
  fn cache_returns_the_same_instance() {
    let cache = SingletonCache::new();
    let bean: Bean = Arc::new(7_u32);
    cache.insert("seven", bean.clone());

    let cached = cache.get("seven").unwrap();
    assert!(Arc::ptr_eq(&cached, &bean));
    assert!(cache.contains("seven"));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.get("seven").is_none());
  }

  #[test]
  fn remove_reports_whether_an_instance_was_cached() {
    let cache = SingletonCache::new();
    cache.insert("seven", Arc::new(7_u32));

    assert!(cache.remove("seven"));
    assert!(!cache.remove("seven"));
    assert_eq!(cache.len(), 0);
  }
}
