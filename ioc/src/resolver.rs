//! The resolution engine: turns definitions into wired instances.
//!
//! A [`Resolver`] lives for exactly one top-level request (`get_bean` or the
//! eager phase of a refresh). Every nested lookup triggered while building
//! dependencies goes through the same resolver, so they share one
//! [`CreationTracker`] and a cycle across any number of beans is caught.

use crate::catalog::TypeCatalog;
use crate::core::{CreationTracker, TypeKey};
use crate::definition::{BeanDefinition, BindingValue};
use crate::descriptor::{
  Args, BeanType, Constructor, Dependency, Injected, Instance, MemberKind, PropertyInput, SlotTarget,
};
use crate::error::{Error, Result};
use crate::index::TypeIndex;
use crate::registry::Registry;
use crate::scope::{Scope, SingletonCache};
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// A live bean instance. Its dynamic type is the concrete type of its definition.
pub type Bean = Arc<dyn Any + Send + Sync>;

pub(crate) struct Resolver<'a> {
  catalog: &'a TypeCatalog,
  registry: &'a Registry,
  index: &'a TypeIndex,
  singletons: &'a SingletonCache,
  tracker: CreationTracker,
}

impl<'a> Resolver<'a> {
  pub(crate) fn new(
    catalog: &'a TypeCatalog,
    registry: &'a Registry,
    index: &'a TypeIndex,
    singletons: &'a SingletonCache,
  ) -> Self {
    Self {
      catalog,
      registry,
      index,
      singletons,
      tracker: CreationTracker::new(),
    }
  }

  pub(crate) fn get_bean(&self, id: &str) -> Result<Bean> {
    let definition = self.registry.get(id)?;

    match definition.scope() {
      Scope::Prototype => {
        debug!(bean = id, "Creating new prototype instance");
        self.construct(definition)
      }
      Scope::Singleton => {
        if let Some(bean) = self.singletons.get(id) {
          debug!(bean = id, "Returning cached singleton instance");
          return Ok(bean);
        }
        debug!(bean = id, "Creating singleton instance");
        let bean = self.construct(definition)?;
        self.singletons.insert(id, bean.clone());
        Ok(bean)
      }
    }
  }

  /// Resolves `id` and views it as `T`, a concrete type or a declared role.
  pub(crate) fn get_bean_as<T: ?Sized + Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    let bean = self.get_bean(id)?;
    let key = TypeKey::of::<T>();
    let injected = self.view_as(id, &bean, key)?;
    injected
      .downcast::<Arc<T>>()
      .map(|arc| *arc)
      .map_err(|_| self.mismatch(id, key))
  }

  fn construct(&self, definition: &BeanDefinition) -> Result<Bean> {
    let id = definition.id();
    let _guard = self.tracker.enter(id)?;

    let bean_type = self.bean_type(definition)?;
    let mut instance = self.instantiate(id, bean_type)?;
    self.inject_members(id, bean_type, instance.as_mut())?;
    self.apply_properties(definition, bean_type, instance.as_mut())?;

    debug!(bean = id, bean_type = bean_type.name(), "Bean created");
    Ok(Bean::from(instance))
  }

  fn bean_type(&self, definition: &BeanDefinition) -> Result<&'a BeanType> {
    self
      .catalog
      .get(definition.type_name())
      .ok_or_else(|| Error::Instantiation {
        id: definition.id().to_owned(),
        reason: format!("bean type not found: '{}'", definition.type_name()),
      })
  }

  fn instantiate(&self, id: &str, bean_type: &BeanType) -> Result<Instance> {
    let constructor = select_constructor(id, bean_type)?;

    let mut values = Vec::with_capacity(constructor.params.len());
    for (position, dependency) in constructor.params.iter().enumerate() {
      let target = format!("constructor parameter {} of {}", position, bean_type.name());
      let value = self.resolve_dependency(id, &target, dependency)?;
      values.push((dependency.clone(), value));
    }

    let mut args = Args::new(id, values);
    (constructor.invoke)(&mut args)
  }

  fn inject_members(
    &self,
    id: &str,
    bean_type: &BeanType,
    instance: &mut (dyn Any + Send + Sync),
  ) -> Result<()> {
    for member in bean_type.members() {
      let kind = match member.kind {
        MemberKind::Field => "field",
        MemberKind::Setter => "setter",
      };
      let target = format!("{} '{}' in {}", kind, member.name, bean_type.name());
      let Some(value) = self.resolve_dependency(id, &target, &member.dependency)? else {
        debug!(bean = id, member = %member.name, "Optional dependency left unset");
        continue;
      };
      if !member.apply(instance, value) {
        return Err(self.mismatch(id, member.dependency.key()));
      }
      debug!(bean = id, member = %member.name, "Injected dependency");
    }
    Ok(())
  }

  fn apply_properties(
    &self,
    definition: &BeanDefinition,
    bean_type: &BeanType,
    instance: &mut (dyn Any + Send + Sync),
  ) -> Result<()> {
    let id = definition.id();
    for binding in definition.properties() {
      let slot = bean_type
        .property_slot(&binding.name)
        .ok_or_else(|| Error::NoInjectionTarget {
          id: id.to_owned(),
          property: binding.name.clone(),
        })?;

      let conversion_error = |value: &str, target: String| Error::PropertyConversion {
        id: id.to_owned(),
        property: binding.name.clone(),
        value: value.to_owned(),
        target,
      };

      let input = match (&binding.value, slot.target) {
        (BindingValue::Literal(literal), SlotTarget::Scalar(kind)) => {
          let value = Value::coerce(literal, kind)
            .ok_or_else(|| conversion_error(literal, kind.to_string()))?;
          PropertyInput::Scalar(value)
        }
        (BindingValue::Reference(ref_id), SlotTarget::Bean(key)) => {
          let target = format!("property '{}'", binding.name);
          let wanted = format!("{} (ref '{}')", key, ref_id);
          let bean = self.get_dependency(id, &target, &wanted, ref_id)?;
          PropertyInput::Bean(self.view_as(ref_id, &bean, key)?)
        }
        (BindingValue::Literal(literal), SlotTarget::Bean(key)) => {
          return Err(conversion_error(literal, key.name().to_owned()));
        }
        (BindingValue::Reference(ref_id), SlotTarget::Scalar(kind)) => {
          return Err(conversion_error(&format!("ref:{}", ref_id), kind.to_string()));
        }
      };

      if !slot.apply(instance, input) {
        return Err(Error::Instantiation {
          id: id.to_owned(),
          reason: format!("property '{}' rejected its value", binding.name),
        });
      }
      debug!(bean = id, property = %binding.name, "Applied property");
    }
    Ok(())
  }

  /// Resolves one dependency. A qualifier names the bean directly and must
  /// exist even when the dependency is optional; otherwise the bean is found
  /// by type. `Ok(None)` only for optional dependencies.
  fn resolve_dependency(
    &self,
    id: &str,
    target: &str,
    dependency: &Dependency,
  ) -> Result<Option<Injected>> {
    let wanted = dependency.to_string();
    let resolved = match dependency.qualifier_label() {
      Some(label) => {
        let bean = self.get_dependency(id, target, &wanted, label)?;
        Some(self.view_as(label, &bean, dependency.key())?)
      }
      None => self.resolve_by_type(id, target, &wanted, dependency.key())?,
    };

    if resolved.is_none() && dependency.is_required() {
      return Err(Error::MissingDependency {
        id: id.to_owned(),
        target: target.to_owned(),
        dependency: wanted,
      });
    }
    Ok(resolved)
  }

  /// Resolves `dependency_id` while building `id`. An unknown id here is a
  /// creation failure of `id`, never a `NotFound` for the caller.
  fn get_dependency(
    &self,
    id: &str,
    target: &str,
    wanted: &str,
    dependency_id: &str,
  ) -> Result<Bean> {
    self.get_bean(dependency_id).map_err(|err| match err {
      Error::NotFound { .. } => Error::MissingDependency {
        id: id.to_owned(),
        target: target.to_owned(),
        dependency: wanted.to_owned(),
      },
      other => other,
    })
  }

  /// Exact match in the type index first, then the first definition in
  /// registration order whose type provides `key`.
  fn resolve_by_type(
    &self,
    id: &str,
    target: &str,
    wanted: &str,
    key: TypeKey,
  ) -> Result<Option<Injected>> {
    if let Some(candidate) = self.index.lookup(key) {
      if self.registry.contains(candidate) {
        let bean = self.get_dependency(id, target, wanted, candidate)?;
        return self.view_as(candidate, &bean, key).map(Some);
      }
    }

    for definition in self.registry.iter() {
      let provides = self
        .catalog
        .get(definition.type_name())
        .is_some_and(|bean_type| bean_type.provides(key));
      if provides {
        debug!(type_key = key.name(), bean = definition.id(), "Resolved by assignability scan");
        let bean = self.get_dependency(id, target, wanted, definition.id())?;
        return self.view_as(definition.id(), &bean, key).map(Some);
      }
    }
    Ok(None)
  }

  /// Casts the bean registered as `id` to `key` using its type's provisions.
  fn view_as(&self, id: &str, bean: &Bean, key: TypeKey) -> Result<Injected> {
    let definition = self.registry.get(id)?;
    self
      .bean_type(definition)?
      .cast(bean, key)
      .ok_or_else(|| self.mismatch(id, key))
  }

  fn mismatch(&self, id: &str, expected: TypeKey) -> Error {
    let actual = self
      .registry
      .get(id)
      .map(|definition| definition.type_name().to_owned())
      .unwrap_or_else(|_| "<unknown>".to_owned());
    Error::TypeMismatch {
      id: id.to_owned(),
      expected: expected.name().to_owned(),
      actual,
    }
  }
}

/// Exactly one injectable constructor, or else the zero-argument one.
fn select_constructor<'t>(id: &str, bean_type: &'t BeanType) -> Result<&'t Constructor> {
  let mut injectable = bean_type.constructors().iter().filter(|c| c.injectable);
  match (injectable.next(), injectable.next()) {
    (Some(only), None) => Ok(only),
    (Some(_), Some(_)) => Err(Error::AmbiguousConstructor {
      id: id.to_owned(),
      type_name: bean_type.name().to_owned(),
      count: bean_type.constructors().iter().filter(|c| c.injectable).count(),
    }),
    (None, _) => bean_type
      .constructors()
      .iter()
      .find(|c| c.params.is_empty())
      .ok_or_else(|| Error::NoUsableConstructor {
        id: id.to_owned(),
        type_name: bean_type.name().to_owned(),
      }),
  }
}
