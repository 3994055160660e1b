//! Public macros for ergonomic bean resolution.

/// Resolves a bean from a container, panicking if it cannot be built.
///
/// For a non-panicking version, use [`Container::get_bean_as`](crate::Container::get_bean_as)
/// or [`Container::get_bean`](crate::Container::get_bean) directly.
///
/// # Panics
///
/// Panics with the resolution error if the bean is unknown, fails to build,
/// or is not of the requested type.
///
/// # Examples
///
/// ```
/// use fibre_beans::{resolve, BeanDefinition, BeanType, Container, TypeCatalog};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// let catalog = TypeCatalog::new().with(
///   BeanType::builder::<EnglishGreeter>("app::EnglishGreeter")
///     .implements::<dyn Greeter, _>(|g| g as Arc<dyn Greeter>)
///     .default_constructor(EnglishGreeter::default)
///     .build(),
/// );
/// let container = Container::new(catalog);
/// container
///   .register_bean_definition(BeanDefinition::new("greeter", "app::EnglishGreeter"))
///   .unwrap();
/// container.refresh().unwrap();
///
/// // Concrete type
/// let concrete = resolve!(container, "greeter", EnglishGreeter);
/// assert_eq!(concrete.greet(), "Hello!");
///
/// // Trait object
/// let greeter = resolve!(container, "greeter", trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
///
/// // Untyped
/// let bean = resolve!(container, "greeter");
/// assert!(bean.downcast::<EnglishGreeter>().is_ok());
/// ```
#[macro_export]
macro_rules! resolve {
  // resolve!(container, "id", trait MyTrait)
  ($container:expr, $id:expr, trait $trait_ident:ident) => {{
    let id: &str = &$id;
    $container
      .get_bean_as::<dyn $trait_ident>(id)
      .unwrap_or_else(|e| {
        panic!(
          "Failed to resolve required bean '{}' as {}: {}",
          id,
          std::any::type_name::<dyn $trait_ident>(),
          e
        )
      })
  }};

  // resolve!(container, "id", MyType)
  ($container:expr, $id:expr, $type:ty) => {{
    let id: &str = &$id;
    $container.get_bean_as::<$type>(id).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required bean '{}' as {}: {}",
        id,
        std::any::type_name::<$type>(),
        e
      )
    })
  }};

  // resolve!(container, "id")
  ($container:expr, $id:expr) => {{
    let id: &str = &$id;
    $container
      .get_bean(id)
      .unwrap_or_else(|e| panic!("Failed to resolve required bean '{}': {}", id, e))
  }};
}
