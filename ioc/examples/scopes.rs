use fibre_beans::{resolve, BeanDefinition, BeanType, Container, Scope, TypeCatalog};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// A simple bean that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

fn main() -> fibre_beans::Result<()> {
  let counter = Arc::new(AtomicUsize::new(0));

  // --- Type metadata ---
  // The constructor runs once for a singleton and on every request for a prototype.
  let catalog = TypeCatalog::new().with(
    BeanType::builder::<RequestTracker>("demo::RequestTracker")
      .default_constructor(move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        println!("Creating RequestTracker #{}...", id);
        RequestTracker { id }
      })
      .build(),
  );

  // --- Definitions ---
  let container = Container::new(catalog);
  container.register_bean_definition(BeanDefinition::new(
    "singleton_tracker",
    "demo::RequestTracker",
  ))?;
  container.register_bean_definition(
    BeanDefinition::new("prototype_tracker", "demo::RequestTracker").with_scope(Scope::Prototype),
  )?;

  // Refresh builds the singleton eagerly; the prototype is left alone.
  println!("Refreshing...");
  container.refresh()?;

  // --- Singleton Demonstration ---
  println!("\nResolving singleton twice:");
  let s1 = resolve!(container, "singleton_tracker", RequestTracker);
  let s2 = resolve!(container, "singleton_tracker", RequestTracker);
  println!("  ID: {}, ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2));

  // --- Prototype Demonstration ---
  println!("\nResolving prototype twice:");
  let p1 = container.get_bean_as::<RequestTracker>("prototype_tracker")?;
  let p2 = container.get_bean_as::<RequestTracker>("prototype_tracker")?;
  println!("  ID: {}, ID: {}", p1.id, p2.id);
  assert_ne!(p1.id, p2.id);

  Ok(())
}
