//! The main `Container` struct and its associated methods.

use crate::catalog::TypeCatalog;
use crate::config::ContainerConfig;
use crate::definition::{BeanDefinition, Origin};
use crate::error::{Error, Result};
use crate::index::TypeIndex;
use crate::registry::Registry;
use crate::resolver::{Bean, Resolver};
use crate::scope::SingletonCache;
use crate::source::{ComponentScan, DefinitionSource, MarkupSource};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Default)]
struct ContainerState {
  registry: Registry,
  index: TypeIndex,
  singletons: SingletonCache,
  ready: bool,
}

/// The Inversion of Control (IoC) container.
///
/// Holds bean definitions, builds instances from them on demand and caches
/// the singletons. All operations are serialized by one lock, which makes the
/// container safe to share between threads. Constructors run while that lock
/// is held and must not call back into the container.
pub struct Container {
  catalog: Arc<TypeCatalog>,
  sources: Vec<Box<dyn DefinitionSource>>,
  state: Mutex<ContainerState>,
}

impl Container {
  /// Creates a new `Container` with no definition sources.
  pub fn new(catalog: impl Into<Arc<TypeCatalog>>) -> Self {
    Self::builder(catalog).build()
  }

  pub fn builder(catalog: impl Into<Arc<TypeCatalog>>) -> ContainerBuilder {
    ContainerBuilder {
      catalog: catalog.into(),
      sources: Vec::new(),
    }
  }

  /// Builds a container over the sources named in `config` and refreshes it.
  pub fn from_config(
    catalog: impl Into<Arc<TypeCatalog>>,
    config: &ContainerConfig,
  ) -> Result<Self> {
    let mut builder = Self::builder(catalog);
    builder.sources.extend(config.sources());
    builder.build_refreshed()
  }

  pub fn catalog(&self) -> &TypeCatalog {
    &self.catalog
  }

  // --- Definitions ---

  /// Registers a definition directly. It survives every later refresh.
  ///
  /// Overriding an id drops its cached singleton. Other cached singletons are
  /// kept until the next refresh, and the type index is only rebuilt by a
  /// refresh.
  pub fn register_bean_definition(&self, definition: BeanDefinition) -> Result<()> {
    let mut state = self.state.lock();
    let id = definition.id().to_owned();
    state
      .registry
      .register(definition.with_origin(Origin::Manual))?;
    if state.singletons.remove(&id) {
      debug!(bean = %id, "Evicted cached singleton of overridden definition");
    }
    Ok(())
  }

  pub fn contains_bean(&self, id: &str) -> bool {
    self.state.lock().registry.contains(id)
  }

  pub fn list_definition_ids(&self) -> HashSet<String> {
    self.state.lock().registry.list_ids().into_iter().collect()
  }

  pub fn definition(&self, id: &str) -> Option<BeanDefinition> {
    self.state.lock().registry.get(id).ok().cloned()
  }

  /// Every definition, in registration order.
  pub fn definitions(&self) -> Vec<BeanDefinition> {
    self.state.lock().registry.snapshot()
  }

  // --- Lifecycle ---

  /// Reloads every source, validates all definitions and eagerly builds
  /// every singleton.
  ///
  /// The first error aborts the refresh and leaves the container not ready
  /// with no cached singletons.
  pub fn refresh(&self) -> Result<()> {
    let mut state = self.state.lock();
    info!(sources = self.sources.len(), "Refreshing container");

    match self.refresh_locked(&mut state) {
      Ok(()) => {
        info!(
          definitions = state.registry.len(),
          singletons = state.singletons.len(),
          "Container refreshed"
        );
        Ok(())
      }
      Err(e) => {
        state.singletons.clear();
        error!(error = %e, "Container refresh failed");
        Err(e)
      }
    }
  }

  fn refresh_locked(&self, state: &mut ContainerState) -> Result<()> {
    state.ready = false;
    state.singletons.clear();
    state.index = TypeIndex::default();

    let dropped = state.registry.remove_from_sources();
    debug!(dropped, "Dropped source definitions");

    for source in &self.sources {
      let definitions = source.load(&self.catalog)?;
      debug!(source = source.name(), count = definitions.len(), "Loaded bean definitions");
      for definition in definitions {
        state
          .registry
          .register(definition.with_origin(Origin::Source(source.name().to_owned())))?;
      }
    }

    state.index = TypeIndex::build(&state.registry, &self.catalog);
    state.registry.validate(&self.catalog)?;

    let singleton_ids: Vec<String> = state
      .registry
      .iter()
      .filter(|definition| definition.is_singleton())
      .map(|definition| definition.id().to_owned())
      .collect();
    debug!(count = singleton_ids.len(), "Pre-instantiating singletons");

    let resolver = Resolver::new(
      &self.catalog,
      &state.registry,
      &state.index,
      &state.singletons,
    );
    for id in &singleton_ids {
      resolver.get_bean(id)?;
    }

    state.ready = true;
    Ok(())
  }

  /// True once a refresh has completed successfully, until the next one starts.
  pub fn is_ready(&self) -> bool {
    self.state.lock().ready
  }

  pub fn singleton_count(&self) -> usize {
    self.state.lock().singletons.len()
  }

  // --- Resolution ---

  /// Resolves a bean by id, building it and its dependencies as needed.
  pub fn get_bean(&self, id: &str) -> Result<Bean> {
    let state = self.state.lock();
    let resolver = Resolver::new(
      &self.catalog,
      &state.registry,
      &state.index,
      &state.singletons,
    );
    resolver.get_bean(id).map_err(|e| log_failure(id, e))
  }

  /// Resolves a bean by id as `T`: its concrete type or a role it declares.
  pub fn get_bean_as<T: ?Sized + Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    let state = self.state.lock();
    let resolver = Resolver::new(
      &self.catalog,
      &state.registry,
      &state.index,
      &state.singletons,
    );
    resolver.get_bean_as::<T>(id).map_err(|e| log_failure(id, e))
  }
}

fn log_failure(id: &str, e: Error) -> Error {
  match &e {
    Error::NotFound { .. } => debug!(bean = id, "No bean definition found"),
    _ => error!(bean = id, error = %e, "Failed to resolve bean"),
  }
  e
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("Container")
      .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
      .field("definitions", &state.registry.len())
      .field("singletons", &state.singletons.len())
      .field("ready", &state.ready)
      .finish()
  }
}

/// Collects the definition sources of a [`Container`].
pub struct ContainerBuilder {
  catalog: Arc<TypeCatalog>,
  sources: Vec<Box<dyn DefinitionSource>>,
}

impl ContainerBuilder {
  pub fn source(mut self, source: impl DefinitionSource + 'static) -> Self {
    self.sources.push(Box::new(source));
    self
  }

  pub fn markup_file(self, path: impl Into<PathBuf>) -> Self {
    self.source(MarkupSource::from_file(path))
  }

  pub fn markup_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
    self.source(MarkupSource::from_text(name, text))
  }

  pub fn scan<I, S>(self, prefixes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.source(ComponentScan::new(prefixes))
  }

  /// Builds the container without refreshing it.
  pub fn build(self) -> Container {
    Container {
      catalog: self.catalog,
      sources: self.sources,
      state: Mutex::new(ContainerState::default()),
    }
  }

  /// Builds the container and runs the first refresh.
  pub fn build_refreshed(self) -> Result<Container> {
    let container = self.build();
    container.refresh()?;
    Ok(container)
  }
}
