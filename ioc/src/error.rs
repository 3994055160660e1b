use thiserror::Error;

/// The main error type for the `fibre_beans` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("No bean definition found for bean ID: {id}")]
  NotFound { id: String },

  #[error("Invalid bean definition: {reason}")]
  InvalidDefinition { reason: String },

  #[error("Validation failed for bean '{id}': {reason}")]
  Validation { id: String, reason: String },

  #[error("Circular reference detected: {}", .chain.join(" -> "))]
  CircularDependency { chain: Vec<String> },

  #[error("Error creating bean '{id}': {count} constructors of {type_name} are marked injectable")]
  AmbiguousConstructor {
    id: String,
    type_name: String,
    count: usize,
  },

  #[error("Error creating bean '{id}': no injectable or zero-argument constructor on {type_name}")]
  NoUsableConstructor { id: String, type_name: String },

  #[error("Error creating bean '{id}': could not autowire {target} - no matching bean of type {dependency}")]
  MissingDependency {
    id: String,
    target: String,
    dependency: String,
  },

  #[error("Bean '{id}' is not of required type {expected}, actual type is {actual}")]
  TypeMismatch {
    id: String,
    expected: String,
    actual: String,
  },

  #[error("Error creating bean '{id}': no setter method or field found for property '{property}'")]
  NoInjectionTarget { id: String, property: String },

  #[error("Error creating bean '{id}': cannot convert '{value}' to {target} for property '{property}'")]
  PropertyConversion {
    id: String,
    property: String,
    value: String,
    target: String,
  },

  #[error("Error creating bean '{id}': {reason}")]
  Instantiation { id: String, reason: String },

  #[error("Malformed bean definition source '{source_name}': {reason}")]
  MalformedSource { source_name: String, reason: String },

  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

impl Error {
  /// True for every error raised while constructing or wiring a bean, as
  /// opposed to lookup, validation, or source errors.
  pub fn is_creation(&self) -> bool {
    matches!(
      self,
      Error::CircularDependency { .. }
        | Error::AmbiguousConstructor { .. }
        | Error::NoUsableConstructor { .. }
        | Error::MissingDependency { .. }
        | Error::NoInjectionTarget { .. }
        | Error::PropertyConversion { .. }
        | Error::Instantiation { .. }
    )
  }

  /// The ids participating in a detected cycle, in the order they were entered.
  pub fn cycle_chain(&self) -> Option<&[String]> {
    match self {
      Error::CircularDependency { chain } => Some(chain),
      _ => None,
    }
  }
}

/// A specialized `Result` type for `fibre_beans` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
