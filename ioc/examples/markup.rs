use fibre_beans::{BeanType, Container, Error, TypeCatalog};
use std::sync::Arc;

trait Store: Send + Sync {
  fn describe(&self) -> String;
}

#[derive(Default)]
struct DiskStore {
  path: String,
  capacity_mb: i64,
}

impl Store for DiskStore {
  fn describe(&self) -> String {
    format!("disk store at {} ({} MB)", self.path, self.capacity_mb)
  }
}

#[derive(Default)]
struct Uploader {
  store: Option<Arc<dyn Store>>,
  retries: i32,
  compress: bool,
}

const BEANS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<beans>
  <bean id="store" class="demo::DiskStore">
    <property name="path" value="/var/data"/>
    <property name="capacity_mb" value="512"/>
  </bean>
  <bean id="uploader" class="demo::Uploader">
    <property name="store" ref="store"/>
    <property name="retries" value="3"/>
    <property name="compress" value="true"/>
  </bean>
</beans>"#;

const BROKEN: &str = r#"<beans>
  <bean id="uploader" class="demo::Uploader">
    <property name="store" ref="archive"/>
  </bean>
</beans>"#;

fn catalog() -> TypeCatalog {
  TypeCatalog::new()
    .with(
      BeanType::builder::<DiskStore>("demo::DiskStore")
        .implements::<dyn Store, _>(|s| s as Arc<dyn Store>)
        .default_constructor(DiskStore::default)
        .property::<String, _>("path", |s, v| s.path = v)
        .property::<i64, _>("capacity_mb", |s, v| s.capacity_mb = v)
        .build(),
    )
    .with(
      BeanType::builder::<Uploader>("demo::Uploader")
        .default_constructor(Uploader::default)
        .property_ref_setter::<dyn Store, _>("set_store", |u, s| u.store = Some(s))
        .property::<i32, _>("retries", |u, v| u.retries = v)
        .property::<bool, _>("compress", |u, v| u.compress = v)
        .build(),
    )
}

fn main() -> fibre_beans::Result<()> {
  let catalog = Arc::new(catalog());

  // --- A valid document ---
  let container = Container::builder(catalog.clone())
    .markup_text("beans.xml", BEANS)
    .build_refreshed()?;

  let uploader = container.get_bean_as::<Uploader>("uploader")?;
  if let Some(store) = &uploader.store {
    println!("Uploader uses the {}", store.describe());
  }
  println!(
    "Retries: {}, compression: {}",
    uploader.retries, uploader.compress
  );

  // --- A document with a dangling reference ---
  // Validation fails the refresh before anything is built.
  let broken = Container::builder(catalog)
    .markup_text("broken.xml", BROKEN)
    .build();
  match broken.refresh() {
    Err(e @ Error::Validation { .. }) => println!("Refresh rejected: {}", e),
    other => println!("Unexpected outcome: {:?}", other),
  }

  Ok(())
}
