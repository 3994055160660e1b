//! Type identity and the per-resolution creation tracker.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;

/// Identifies a type a bean can be served as: its concrete type or one of the
/// `dyn Trait` roles its [`BeanType`](crate::BeanType) declares.
#[derive(Clone, Copy)]
pub struct TypeKey {
  type_id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

// `type_name` is not guaranteed unique, so identity is the `TypeId` alone.
impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// The ordered set of bean ids currently under construction within one
/// top-level resolution. Nested resolutions share it, which is what lets a
/// cycle spanning several beans be detected.
#[derive(Default)]
pub(crate) struct CreationTracker {
  in_progress: RefCell<Vec<String>>,
}

impl CreationTracker {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Marks `id` as under construction.
  ///
  /// Fails with the full chain if `id` is already being built. The returned
  /// guard removes the id again when dropped, on success, error, or unwind.
  pub(crate) fn enter(&self, id: &str) -> Result<CreationGuard<'_>> {
    let mut in_progress = self.in_progress.borrow_mut();
    if in_progress.iter().any(|entry| entry == id) {
      let mut chain = in_progress.clone();
      chain.push(id.to_owned());
      return Err(Error::CircularDependency { chain });
    }
    in_progress.push(id.to_owned());
    Ok(CreationGuard {
      tracker: self,
      id: id.to_owned(),
    })
  }

  #[cfg(test)]
  pub(crate) fn is_empty(&self) -> bool {
    self.in_progress.borrow().is_empty()
  }

  #[cfg(test)]
  pub(crate) fn chain(&self) -> Vec<String> {
    self.in_progress.borrow().clone()
  }
}

/// An RAII guard for one entry of a [`CreationTracker`].
pub(crate) struct CreationGuard<'t> {
  tracker: &'t CreationTracker,
  id: String,
}

impl Drop for CreationGuard<'_> {
  fn drop(&mut self) {
    let mut in_progress = self.tracker.in_progress.borrow_mut();
    if let Some(pos) = in_progress.iter().rposition(|entry| *entry == self.id) {
      in_progress.remove(pos);
    }
  }
}
