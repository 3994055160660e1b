//! YAML configuration naming the definition sources of a container.
//!
//! ```yaml
//! version: 1
//! markup:
//!   - beans/services.xml
//! scan:
//!   - my_app::components
//! ```
//!
//! Markup paths are resolved relative to the directory of the file they are
//! declared in.

use crate::error::{Error, Result};
use crate::source::{ComponentScan, DefinitionSource, MarkupSource};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_BASE_NAME: &str = "fibre_beans";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

// --- Raw ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfigRaw {
  #[serde(default = "default_version")]
  pub version: u32,
  #[serde(default)]
  pub markup: Vec<String>,
  #[serde(default)]
  pub scan: Vec<String>,
}

fn default_version() -> u32 {
  1
}

// --- Processed ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerConfig {
  pub markup_files: Vec<PathBuf>,
  pub scan_prefixes: Vec<String>,
}

impl ContainerConfig {
  /// Parses a document; relative markup paths are resolved against `base_dir`.
  pub fn from_yaml_str(yaml: &str, base_dir: &Path) -> Result<Self> {
    let raw: ContainerConfigRaw =
      serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    process_raw_config(raw, base_dir)
  }

  /// One markup source per file, then a single scan over all prefixes.
  pub fn sources(&self) -> Vec<Box<dyn DefinitionSource>> {
    let mut sources: Vec<Box<dyn DefinitionSource>> = self
      .markup_files
      .iter()
      .map(|path| Box::new(MarkupSource::from_file(path)) as Box<dyn DefinitionSource>)
      .collect();
    if !self.scan_prefixes.is_empty() {
      sources.push(Box::new(ComponentScan::new(self.scan_prefixes.iter().cloned())));
    }
    sources
  }
}

pub fn process_raw_config(raw: ContainerConfigRaw, base_dir: &Path) -> Result<ContainerConfig> {
  if raw.version != 1 {
    return Err(Error::ConfigParse(format!(
      "unsupported configuration version {}",
      raw.version
    )));
  }

  let mut markup_files = Vec::with_capacity(raw.markup.len());
  for entry in raw.markup {
    if entry.trim().is_empty() {
      return Err(Error::ConfigParse("markup entries must not be empty".to_string()));
    }
    let path = PathBuf::from(entry);
    markup_files.push(if path.is_absolute() {
      path
    } else {
      base_dir.join(path)
    });
  }

  // An empty prefix would scan every component in the catalog.
  if raw.scan.iter().any(|prefix| prefix.trim().is_empty()) {
    return Err(Error::ConfigParse("scan prefixes must not be empty".to_string()));
  }

  Ok(ContainerConfig {
    markup_files,
    scan_prefixes: raw.scan,
  })
}

/// Reads and processes a configuration file.
pub fn load_config(path: &Path) -> Result<ContainerConfig> {
  debug!(path = %path.display(), "Loading container configuration");
  let file = File::open(path)?;
  let raw: ContainerConfigRaw = serde_yaml::from_reader(BufReader::new(file))
    .map_err(|e| Error::ConfigParse(e.to_string()))?;
  let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
  process_raw_config(raw, base_dir)
}

/// Finds `fibre_beans.<env>.yaml` or `fibre_beans.yaml` in the working
/// directory. The environment comes from the argument, then `FIBRE_ENV`,
/// then `APP_ENV`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("FIBRE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!(
        "{}.{}.{}",
        DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
      ));
    }
  }
  files_to_check.push(format!("{}.{}", DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check FIBRE_ENV/APP_ENV.",
    files_to_check, dir
  )))
}
