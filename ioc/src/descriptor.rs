//! Per-type metadata: how the container builds and wires one concrete type.
//!
//! A [`BeanType`] is the explicit stand-in for runtime introspection. It lists
//! the constructors of a type (and which one is marked injectable), the
//! fields and setters to autowire after construction, the named slots that
//! markup property bindings can target, the roles (`dyn Trait`) the type can be
//! served as, and an optional component marker for scanning.
//!
//! ```
//! use fibre_beans::{Autowire, BeanType, Dependency};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {}
//!
//! #[derive(Default)]
//! struct MemoryRepository;
//! impl Repository for MemoryRepository {}
//!
//! struct UserService {
//!   repository: Arc<dyn Repository>,
//!   greeting: String,
//! }
//!
//! let repository_type = BeanType::builder::<MemoryRepository>("app::MemoryRepository")
//!   .implements::<dyn Repository, _>(|repo| repo as Arc<dyn Repository>)
//!   .default_constructor(MemoryRepository::default)
//!   .component()
//!   .build();
//!
//! let service_type = BeanType::builder::<UserService>("app::UserService")
//!   .injectable_constructor([Dependency::of::<dyn Repository>()], |args| {
//!     Ok(UserService { repository: args.next()?, greeting: String::new() })
//!   })
//!   .property_setter::<String, _>("set_greeting", |service, value| service.greeting = value)
//!   .build();
//!
//! assert!(repository_type.is_component());
//! assert_eq!(service_type.simple_name(), "UserService");
//! ```

use crate::core::TypeKey;
use crate::error::{Error, Result};
use crate::resolver::Bean;
use crate::scope::Scope;
use crate::value::{ScalarKind, ScalarValue, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A resolved dependency, boxed as the `Arc<T>` of the type it was requested as.
pub(crate) type Injected = Box<dyn Any + Send + Sync>;

/// An instance between construction and the end of injection.
pub(crate) type Instance = Box<dyn Any + Send + Sync>;

type CastFn = Box<dyn Fn(&Bean) -> Option<Injected> + Send + Sync>;
type ConstructFn = Box<dyn Fn(&mut Args) -> Result<Instance> + Send + Sync>;
type MemberFn = Box<dyn Fn(&mut (dyn Any + Send + Sync), Injected) -> bool + Send + Sync>;
type SlotFn = Box<dyn Fn(&mut (dyn Any + Send + Sync), PropertyInput) -> bool + Send + Sync>;

// --- Dependencies ---

/// A constructor parameter: the type it needs, plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
  key: TypeKey,
  qualifier: Option<String>,
  required: bool,
}

impl Dependency {
  /// A required dependency on `T`, resolved by type.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      key: TypeKey::of::<T>(),
      qualifier: None,
      required: true,
    }
  }

  /// Resolve by bean id instead of by type. An empty label means no qualifier.
  pub fn qualifier(mut self, label: impl Into<String>) -> Self {
    let label = label.into();
    self.qualifier = (!label.is_empty()).then_some(label);
    self
  }

  /// Leave the value unset instead of failing when no bean of the type
  /// matches. A qualifier must still name a registered bean.
  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  pub fn qualifier_label(&self) -> Option<&str> {
    self.qualifier.as_deref()
  }

  pub fn is_required(&self) -> bool {
    self.required
  }
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.qualifier {
      Some(label) => write!(f, "{} (qualifier '{}')", self.key, label),
      None => write!(f, "{}", self.key),
    }
  }
}

/// Options for an autowired field or setter.
#[derive(Debug, Clone, Default)]
pub struct Autowire {
  qualifier: Option<String>,
  optional: bool,
}

impl Autowire {
  pub fn required() -> Self {
    Self::default()
  }

  pub fn optional() -> Self {
    Self {
      qualifier: None,
      optional: true,
    }
  }

  pub fn qualifier(mut self, label: impl Into<String>) -> Self {
    self.qualifier = Some(label.into());
    self
  }

  fn into_dependency<D: ?Sized + Any>(self) -> Dependency {
    let mut dependency = Dependency::of::<D>();
    if let Some(label) = self.qualifier {
      dependency = dependency.qualifier(label);
    }
    if self.optional {
      dependency = dependency.optional();
    }
    dependency
  }
}

// --- Constructor arguments ---

/// The resolved parameters handed to a constructor, in declaration order.
pub struct Args {
  bean_id: String,
  values: std::vec::IntoIter<(Dependency, Option<Injected>)>,
}

impl Args {
  pub(crate) fn new(bean_id: &str, values: Vec<(Dependency, Option<Injected>)>) -> Self {
    Self {
      bean_id: bean_id.to_owned(),
      values: values.into_iter(),
    }
  }

  /// Takes the next argument, which must have been resolved.
  pub fn next<T: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    match self.next_optional::<T>()? {
      Some(value) => Ok(value),
      None => Err(Error::MissingDependency {
        id: self.bean_id.clone(),
        target: "constructor parameter".to_owned(),
        dependency: std::any::type_name::<T>().to_owned(),
      }),
    }
  }

  /// Takes the next argument; `None` if it was optional and nothing matched.
  pub fn next_optional<T: ?Sized + Any + Send + Sync>(&mut self) -> Result<Option<Arc<T>>> {
    let (dependency, value) = self.values.next().ok_or_else(|| Error::Instantiation {
      id: self.bean_id.clone(),
      reason: "constructor took more arguments than it declared".to_owned(),
    })?;
    match value {
      None => Ok(None),
      Some(boxed) => boxed
        .downcast::<Arc<T>>()
        .map(|arc| Some(*arc))
        .map_err(|_| Error::TypeMismatch {
          id: self.bean_id.clone(),
          expected: std::any::type_name::<T>().to_owned(),
          actual: dependency.key().name().to_owned(),
        }),
    }
  }

  pub fn remaining(&self) -> usize {
    self.values.len()
  }

  pub fn bean_id(&self) -> &str {
    &self.bean_id
  }

  /// Builds an instantiation error for this bean, for constructors that fail.
  pub fn error(&self, reason: impl Into<String>) -> Error {
    Error::Instantiation {
      id: self.bean_id.clone(),
      reason: reason.into(),
    }
  }
}

// --- Type metadata ---

pub(crate) struct Provision {
  pub(crate) key: TypeKey,
  cast: CastFn,
}

pub(crate) struct Constructor {
  pub(crate) injectable: bool,
  pub(crate) params: Vec<Dependency>,
  pub(crate) invoke: ConstructFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
  Field,
  Setter,
}

/// An autowired field or setter.
pub(crate) struct Member {
  pub(crate) kind: MemberKind,
  pub(crate) name: String,
  pub(crate) dependency: Dependency,
  apply: MemberFn,
}

impl Member {
  pub(crate) fn apply(&self, instance: &mut (dyn Any + Send + Sync), value: Injected) -> bool {
    (self.apply)(instance, value)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotTarget {
  Scalar(ScalarKind),
  Bean(TypeKey),
}

pub(crate) enum PropertyInput {
  Scalar(Value),
  Bean(Injected),
}

/// A named target for a markup property binding.
pub(crate) struct PropertySlot {
  pub(crate) target: SlotTarget,
  apply: SlotFn,
}

impl PropertySlot {
  pub(crate) fn apply(&self, instance: &mut (dyn Any + Send + Sync), input: PropertyInput) -> bool {
    (self.apply)(instance, input)
  }
}

/// The component marker consumed by [`ComponentScan`](crate::ComponentScan).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMarker {
  pub name: Option<String>,
  pub scope: Scope,
}

/// Build and wiring metadata for one concrete type.
pub struct BeanType {
  name: String,
  concrete: TypeKey,
  provisions: Vec<Provision>,
  constructors: Vec<Constructor>,
  members: Vec<Member>,
  property_setters: HashMap<String, PropertySlot>,
  property_fields: HashMap<String, PropertySlot>,
  component: Option<ComponentMarker>,
}

impl BeanType {
  /// Starts describing `T` under the catalog name `name`, conventionally its
  /// module path (`my_app::service::UserService`).
  pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> BeanTypeBuilder<T> {
    BeanTypeBuilder::new(name.into())
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The last `::` segment of the name.
  pub fn simple_name(&self) -> &str {
    self.name.rsplit("::").next().unwrap_or(&self.name)
  }

  pub fn concrete_key(&self) -> TypeKey {
    self.concrete
  }

  /// Every key this type can be served as, the concrete type first.
  pub fn provided_keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
    self.provisions.iter().map(|p| p.key)
  }

  pub fn provides(&self, key: TypeKey) -> bool {
    self.provisions.iter().any(|p| p.key == key)
  }

  pub fn component(&self) -> Option<&ComponentMarker> {
    self.component.as_ref()
  }

  pub fn is_component(&self) -> bool {
    self.component.is_some()
  }

  /// Views an instance of this type as `key`, boxed as the matching `Arc`.
  pub(crate) fn cast(&self, bean: &Bean, key: TypeKey) -> Option<Injected> {
    self
      .provisions
      .iter()
      .find(|p| p.key == key)
      .and_then(|p| (p.cast)(bean))
  }

  pub(crate) fn constructors(&self) -> &[Constructor] {
    &self.constructors
  }

  /// Autowired members, fields before setters, each in declaration order.
  pub(crate) fn members(&self) -> impl Iterator<Item = &Member> {
    let fields = self.members.iter().filter(|m| m.kind == MemberKind::Field);
    let setters = self.members.iter().filter(|m| m.kind == MemberKind::Setter);
    fields.chain(setters)
  }

  /// The slot a property binding named `property` lands in: the setter
  /// `set_<property>` if declared, else the field `<property>`.
  pub(crate) fn property_slot(&self, property: &str) -> Option<&PropertySlot> {
    self
      .property_setters
      .get(&format!("set_{}", property))
      .or_else(|| self.property_fields.get(property))
  }
}

impl fmt::Debug for BeanType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BeanType")
      .field("name", &self.name)
      .field("roles", &self.provisions.iter().skip(1).map(|p| p.key).collect::<Vec<_>>())
      .field("constructors", &self.constructors.len())
      .field("members", &self.members.len())
      .field("component", &self.component)
      .finish()
  }
}

// --- Builder ---

/// Typed builder for a [`BeanType`].
pub struct BeanTypeBuilder<T> {
  inner: BeanType,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> BeanTypeBuilder<T> {
  fn new(name: String) -> Self {
    let concrete = Provision {
      key: TypeKey::of::<T>(),
      cast: Box::new(|bean: &Bean| {
        bean
          .clone()
          .downcast::<T>()
          .ok()
          .map(|arc| Box::new(arc) as Injected)
      }),
    };
    Self {
      inner: BeanType {
        name,
        concrete: TypeKey::of::<T>(),
        provisions: vec![concrete],
        constructors: Vec::new(),
        members: Vec::new(),
        property_setters: HashMap::new(),
        property_fields: HashMap::new(),
        component: None,
      },
      _marker: PhantomData,
    }
  }

  /// Declares that `T` can be served as the role `R`, typically `dyn Trait`.
  pub fn implements<R, F>(mut self, upcast: F) -> Self
  where
    R: ?Sized + Any + Send + Sync,
    F: Fn(Arc<T>) -> Arc<R> + Send + Sync + 'static,
  {
    let key = TypeKey::of::<R>();
    if key.type_id() == TypeId::of::<T>() || self.inner.provides(key) {
      return self;
    }
    self.inner.provisions.push(Provision {
      key,
      cast: Box::new(move |bean: &Bean| {
        bean
          .clone()
          .downcast::<T>()
          .ok()
          .map(|arc| Box::new(upcast(arc)) as Injected)
      }),
    });
    self
  }

  /// A zero-argument constructor that is not marked injectable.
  pub fn default_constructor<F>(self, construct: F) -> Self
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.push_constructor(false, Vec::new(), move |_| Ok(construct()))
  }

  /// A constructor that is not marked injectable. Only used when it takes no
  /// parameters and no injectable constructor exists.
  pub fn constructor<P, F>(self, params: P, construct: F) -> Self
  where
    P: IntoIterator<Item = Dependency>,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    self.push_constructor(false, params.into_iter().collect(), construct)
  }

  /// A constructor marked injectable; its parameters are resolved from the container.
  pub fn injectable_constructor<P, F>(self, params: P, construct: F) -> Self
  where
    P: IntoIterator<Item = Dependency>,
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    self.push_constructor(true, params.into_iter().collect(), construct)
  }

  fn push_constructor<F>(mut self, injectable: bool, params: Vec<Dependency>, construct: F) -> Self
  where
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    self.inner.constructors.push(Constructor {
      injectable,
      params,
      invoke: Box::new(move |args| construct(args).map(|value| Box::new(value) as Instance)),
    });
    self
  }

  /// A field autowired with a `D` after construction.
  pub fn autowired_field<D, F>(self, name: impl Into<String>, options: Autowire, apply: F) -> Self
  where
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  {
    self.push_member(MemberKind::Field, name.into(), options, apply)
  }

  /// A setter autowired with a `D` after the fields.
  pub fn autowired_setter<D, F>(self, name: impl Into<String>, options: Autowire, apply: F) -> Self
  where
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  {
    self.push_member(MemberKind::Setter, name.into(), options, apply)
  }

  fn push_member<D, F>(mut self, kind: MemberKind, name: String, options: Autowire, apply: F) -> Self
  where
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  {
    self.inner.members.push(Member {
      kind,
      name,
      dependency: options.into_dependency::<D>(),
      apply: Box::new(move |instance, value| {
        match (instance.downcast_mut::<T>(), value.downcast::<Arc<D>>()) {
          (Some(target), Ok(value)) => {
            apply(target, *value);
            true
          }
          _ => false,
        }
      }),
    });
    self
  }

  /// A field that a literal property binding named `name` can set.
  pub fn property<V, F>(mut self, name: impl Into<String>, apply: F) -> Self
  where
    V: ScalarValue,
    F: Fn(&mut T, V) + Send + Sync + 'static,
  {
    self
      .inner
      .property_fields
      .insert(name.into(), scalar_slot::<T, V, F>(apply));
    self
  }

  /// A setter (conventionally `set_<property>`) for a literal property binding.
  pub fn property_setter<V, F>(mut self, name: impl Into<String>, apply: F) -> Self
  where
    V: ScalarValue,
    F: Fn(&mut T, V) + Send + Sync + 'static,
  {
    self
      .inner
      .property_setters
      .insert(name.into(), scalar_slot::<T, V, F>(apply));
    self
  }

  /// A field that a reference property binding named `name` can set.
  pub fn property_ref<D, F>(mut self, name: impl Into<String>, apply: F) -> Self
  where
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  {
    self
      .inner
      .property_fields
      .insert(name.into(), bean_slot::<T, D, F>(apply));
    self
  }

  /// A setter (conventionally `set_<property>`) for a reference property binding.
  pub fn property_ref_setter<D, F>(mut self, name: impl Into<String>, apply: F) -> Self
  where
    D: ?Sized + Any + Send + Sync,
    F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  {
    self
      .inner
      .property_setters
      .insert(name.into(), bean_slot::<T, D, F>(apply));
    self
  }

  /// Marks the type as a component with the default id and scope.
  pub fn component(mut self) -> Self {
    self.marker().name = None;
    self
  }

  /// Marks the type as a component registered under `name`.
  pub fn component_named(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    self.marker().name = (!name.is_empty()).then_some(name);
    self
  }

  /// Sets the scope a component scan assigns. Implies the component marker.
  pub fn scope(mut self, scope: Scope) -> Self {
    self.marker().scope = scope;
    self
  }

  fn marker(&mut self) -> &mut ComponentMarker {
    self.inner.component.get_or_insert(ComponentMarker {
      name: None,
      scope: Scope::Singleton,
    })
  }

  pub fn build(self) -> BeanType {
    self.inner
  }
}

fn scalar_slot<T, V, F>(apply: F) -> PropertySlot
where
  T: Any + Send + Sync,
  V: ScalarValue,
  F: Fn(&mut T, V) + Send + Sync + 'static,
{
  PropertySlot {
    target: SlotTarget::Scalar(V::KIND),
    apply: Box::new(move |instance, input| {
      let value = match input {
        PropertyInput::Scalar(value) => V::from_value(value),
        PropertyInput::Bean(_) => None,
      };
      match (instance.downcast_mut::<T>(), value) {
        (Some(target), Some(value)) => {
          apply(target, value);
          true
        }
        _ => false,
      }
    }),
  }
}

fn bean_slot<T, D, F>(apply: F) -> PropertySlot
where
  T: Any + Send + Sync,
  D: ?Sized + Any + Send + Sync,
  F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
{
  PropertySlot {
    target: SlotTarget::Bean(TypeKey::of::<D>()),
    apply: Box::new(move |instance, input| {
      let value = match input {
        PropertyInput::Bean(boxed) => boxed.downcast::<Arc<D>>().ok(),
        PropertyInput::Scalar(_) => None,
      };
      match (instance.downcast_mut::<T>(), value) {
        (Some(target), Some(value)) => {
          apply(target, *value);
          true
        }
        _ => false,
      }
    }),
  }
}
