//! Producers of bean definitions.

mod markup;
mod scan;

pub use markup::MarkupSource;
pub use scan::ComponentScan;

use crate::catalog::TypeCatalog;
use crate::definition::BeanDefinition;
use crate::error::Result;

/// Something that yields bean definitions for a container to register.
///
/// Sources are re-read on every [`Container::refresh`](crate::Container::refresh).
pub trait DefinitionSource: Send + Sync {
  /// A short label for logs and errors, such as a file path.
  fn name(&self) -> &str;

  /// Produces the definitions, in the order they should be registered.
  fn load(&self, catalog: &TypeCatalog) -> Result<Vec<BeanDefinition>>;
}
