//! Bean definitions from XML markup.
//!
//! The accepted grammar is deliberately small:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <beans>
//!   <!-- comments are allowed between elements -->
//!   <bean id="repository" class="app::MemoryRepository"/>
//!   <bean id="service" class="app::UserService" scope="prototype">
//!     <property name="greeting" value="Hello"/>
//!     <property name="repository" ref="repository"/>
//!   </bean>
//! </beans>
//! ```
//!
//! Anything else (other elements, stray text, a property with both or neither
//! of `value`/`ref`) is rejected as a malformed source. A bean without a
//! `class` is accepted here and rejected by validation at refresh.

use super::DefinitionSource;
use crate::catalog::TypeCatalog;
use crate::definition::{BeanDefinition, PropertyBinding};
use crate::error::{Error, Result};
use crate::scope::Scope;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use tracing::debug;

enum MarkupInput {
  File(PathBuf),
  Text(String),
}

/// A [`DefinitionSource`] reading the bean markup format.
pub struct MarkupSource {
  name: String,
  input: MarkupInput,
}

impl MarkupSource {
  /// Reads definitions from a file on every load.
  pub fn from_file(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    Self {
      name: path.display().to_string(),
      input: MarkupInput::File(path),
    }
  }

  /// Reads definitions from an in-memory document.
  pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      input: MarkupInput::Text(text.into()),
    }
  }

  /// Consumes `reader` fully and parses it.
  pub fn read<R: Read>(source_name: &str, mut reader: R) -> Result<Vec<BeanDefinition>> {
    let mut text = String::new();
    reader
      .read_to_string(&mut text)
      .map_err(|e| unreadable(source_name, e))?;
    Self::parse(source_name, &text)
  }

  pub fn parse(source_name: &str, text: &str) -> Result<Vec<BeanDefinition>> {
    let definitions = Parser::new(source_name, text).document()?;
    debug!(source = source_name, count = definitions.len(), "Parsed bean markup");
    Ok(definitions)
  }
}

impl DefinitionSource for MarkupSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn load(&self, _catalog: &TypeCatalog) -> Result<Vec<BeanDefinition>> {
    match &self.input {
      MarkupInput::File(path) => {
        debug!(path = %path.display(), "Loading bean definitions from file");
        let file = File::open(path).map_err(|e| unreadable(&self.name, e))?;
        Self::read(&self.name, BufReader::new(file))
      }
      MarkupInput::Text(text) => Self::parse(&self.name, text),
    }
  }
}

fn unreadable(source_name: &str, error: io::Error) -> Error {
  Error::MalformedSource {
    source_name: source_name.to_owned(),
    reason: format!("cannot read source: {}", error),
  }
}

// --- Parser ---

struct Tag {
  name: String,
  attributes: Vec<(String, String)>,
  self_closing: bool,
  at: usize,
}

struct Parser<'s> {
  source_name: &'s str,
  text: &'s str,
  pos: usize,
}

impl<'s> Parser<'s> {
  fn new(source_name: &'s str, text: &'s str) -> Self {
    // A leading byte-order mark is not part of the document.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    Self {
      source_name,
      text,
      pos: 0,
    }
  }

  fn document(mut self) -> Result<Vec<BeanDefinition>> {
    self.skip_misc()?;
    if self.rest().is_empty() {
      return Err(self.error(self.pos, "document has no root element"));
    }

    let root = self.open_tag()?;
    if root.name != "beans" {
      return Err(self.error(
        root.at,
        format!("expected root element <beans>, found <{}>", root.name),
      ));
    }

    let mut definitions = Vec::new();
    if !root.self_closing {
      loop {
        self.skip_misc()?;
        if self.at_end_tag() {
          self.close_tag("beans")?;
          break;
        }
        let tag = self.open_tag()?;
        if tag.name != "bean" {
          return Err(self.error(
            tag.at,
            format!("unexpected element <{}> inside <beans>", tag.name),
          ));
        }
        definitions.push(self.bean(tag)?);
      }
    }

    self.skip_misc()?;
    if !self.rest().is_empty() {
      return Err(self.error(self.pos, "unexpected content after the root element"));
    }
    Ok(definitions)
  }

  fn bean(&mut self, tag: Tag) -> Result<BeanDefinition> {
    let (mut id, mut class, mut scope) = (None, None, None);
    for (name, value) in tag.attributes {
      match name.as_str() {
        "id" => id = Some(value),
        "class" => class = Some(value),
        "scope" => scope = Some(value),
        other => {
          return Err(self.error(tag.at, format!("unknown attribute '{}' on <bean>", other)));
        }
      }
    }

    let id = id
      .filter(|id| !id.is_empty())
      .ok_or_else(|| self.error(tag.at, "<bean> requires a non-empty 'id' attribute"))?;
    let scope = match scope.as_deref() {
      None | Some("") => Scope::Singleton,
      Some(value) => value
        .parse::<Scope>()
        .map_err(|reason| self.error(tag.at, format!("bean '{}': {}", id, reason)))?,
    };

    let mut definition = BeanDefinition::new(id, class.unwrap_or_default()).with_scope(scope);
    if !tag.self_closing {
      loop {
        self.skip_misc()?;
        if self.at_end_tag() {
          self.close_tag("bean")?;
          break;
        }
        let child = self.open_tag()?;
        if child.name != "property" {
          return Err(self.error(
            child.at,
            format!("unexpected element <{}> inside <bean>", child.name),
          ));
        }
        definition = definition.with_property(self.property(child)?);
      }
    }
    Ok(definition)
  }

  fn property(&mut self, tag: Tag) -> Result<PropertyBinding> {
    let (mut name, mut value, mut reference) = (None, None, None);
    for (attribute, content) in tag.attributes {
      match attribute.as_str() {
        "name" => name = Some(content),
        "value" => value = Some(content),
        "ref" => reference = Some(content),
        other => {
          return Err(self.error(
            tag.at,
            format!("unknown attribute '{}' on <property>", other),
          ));
        }
      }
    }

    let name = name
      .filter(|name| !name.is_empty())
      .ok_or_else(|| self.error(tag.at, "<property> requires a non-empty 'name' attribute"))?;
    let binding = match (value, reference) {
      (Some(literal), None) => PropertyBinding::literal(name, literal),
      (None, Some(bean_id)) if !bean_id.is_empty() => PropertyBinding::reference(name, bean_id),
      (None, Some(_)) => {
        return Err(self.error(tag.at, format!("property '{}' has an empty 'ref'", name)));
      }
      (Some(_), Some(_)) => {
        return Err(self.error(
          tag.at,
          format!("property '{}' has both 'value' and 'ref'", name),
        ));
      }
      (None, None) => {
        return Err(self.error(
          tag.at,
          format!("property '{}' needs either 'value' or 'ref'", name),
        ));
      }
    };

    if !tag.self_closing {
      self.skip_misc()?;
      if !self.at_end_tag() {
        return Err(self.error(self.pos, "<property> cannot have content"));
      }
      self.close_tag("property")?;
    }
    Ok(binding)
  }

  // --- Lexing ---

  fn rest(&self) -> &'s str {
    &self.text[self.pos..]
  }

  fn at_end_tag(&self) -> bool {
    self.rest().starts_with("</")
  }

  fn skip_whitespace(&mut self) {
    let trimmed = self.rest().trim_start();
    self.pos = self.text.len() - trimmed.len();
  }

  /// Skips whitespace, comments, processing instructions and a doctype.
  fn skip_misc(&mut self) -> Result<()> {
    loop {
      self.skip_whitespace();
      let rest = self.rest();
      if rest.starts_with("<!--") {
        self.skip_past(4, "-->", "unterminated comment")?;
      } else if rest.starts_with("<?") {
        self.skip_past(2, "?>", "unterminated processing instruction")?;
      } else if rest.starts_with("<!DOCTYPE") {
        self.skip_past(9, ">", "unterminated doctype")?;
      } else {
        return Ok(());
      }
    }
  }

  fn skip_past(&mut self, opener_len: usize, terminator: &str, reason: &str) -> Result<()> {
    let start = self.pos;
    match self.text[start + opener_len..].find(terminator) {
      Some(offset) => {
        self.pos = start + opener_len + offset + terminator.len();
        Ok(())
      }
      None => Err(self.error(start, reason)),
    }
  }

  fn open_tag(&mut self) -> Result<Tag> {
    let at = self.pos;
    if !self.rest().starts_with('<') || self.at_end_tag() {
      return Err(self.error(at, "expected an element"));
    }
    self.pos += 1;
    let name = self.name()?;

    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
      self.skip_whitespace();
      let rest = self.rest();
      if rest.starts_with("/>") {
        self.pos += 2;
        return Ok(Tag {
          name,
          attributes,
          self_closing: true,
          at,
        });
      }
      if rest.starts_with('>') {
        self.pos += 1;
        return Ok(Tag {
          name,
          attributes,
          self_closing: false,
          at,
        });
      }
      if rest.is_empty() {
        return Err(self.error(at, format!("unterminated <{}> tag", name)));
      }

      let attribute = self.name()?;
      self.skip_whitespace();
      if !self.rest().starts_with('=') {
        return Err(self.error(self.pos, format!("attribute '{}' has no value", attribute)));
      }
      self.pos += 1;
      self.skip_whitespace();
      let value = self.quoted()?;
      if attributes.iter().any(|(existing, _)| *existing == attribute) {
        return Err(self.error(at, format!("duplicate attribute '{}'", attribute)));
      }
      attributes.push((attribute, value));
    }
  }

  fn close_tag(&mut self, expected: &str) -> Result<()> {
    let at = self.pos;
    self.pos += 2;
    let name = self.name()?;
    self.skip_whitespace();
    if !self.rest().starts_with('>') {
      return Err(self.error(at, format!("unterminated </{}> tag", name)));
    }
    self.pos += 1;
    if name != expected {
      return Err(self.error(
        at,
        format!("expected </{}>, found </{}>", expected, name),
      ));
    }
    Ok(())
  }

  fn name(&mut self) -> Result<String> {
    let rest = self.rest();
    let len = rest
      .char_indices()
      .find(|&(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')))
      .map(|(i, _)| i)
      .unwrap_or(rest.len());
    let starts_ok = rest
      .chars()
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if len == 0 || !starts_ok {
      return Err(self.error(self.pos, "expected a name"));
    }
    self.pos += len;
    Ok(rest[..len].to_owned())
  }

  fn quoted(&mut self) -> Result<String> {
    let at = self.pos;
    let quote = match self.rest().chars().next() {
      Some(q @ ('"' | '\'')) => q,
      _ => return Err(self.error(at, "expected a quoted attribute value")),
    };
    self.pos += 1;
    let rest = self.rest();
    let end = rest
      .find(quote)
      .ok_or_else(|| self.error(at, "unterminated attribute value"))?;
    let raw = &rest[..end];
    if raw.contains('<') {
      return Err(self.error(at, "'<' is not allowed in attribute values"));
    }
    let value = decode_entities(raw).map_err(|reason| self.error(at, reason))?;
    self.pos += end + 1;
    Ok(value)
  }

  fn error(&self, at: usize, reason: impl Display) -> Error {
    let line = self.text[..at].matches('\n').count() + 1;
    Error::MalformedSource {
      source_name: self.source_name.to_owned(),
      reason: format!("line {}: {}", line, reason),
    }
  }
}

fn decode_entities(raw: &str) -> std::result::Result<String, String> {
  if !raw.contains('&') {
    return Ok(raw.to_owned());
  }

  let mut decoded = String::with_capacity(raw.len());
  let mut rest = raw;
  while let Some(amp) = rest.find('&') {
    decoded.push_str(&rest[..amp]);
    let after = &rest[amp + 1..];
    let semi = after
      .find(';')
      .ok_or_else(|| format!("unterminated entity in '{}'", raw))?;
    let entity = &after[..semi];
    let ch = match entity {
      "amp" => '&',
      "lt" => '<',
      "gt" => '>',
      "quot" => '"',
      "apos" => '\'',
      _ => {
        let code = if let Some(hex) = entity.strip_prefix("#x") {
          u32::from_str_radix(hex, 16).ok()
        } else if let Some(dec) = entity.strip_prefix('#') {
          dec.parse::<u32>().ok()
        } else {
          None
        };
        code
          .and_then(char::from_u32)
          .ok_or_else(|| format!("unknown entity '&{};'", entity))?
      }
    };
    decoded.push(ch);
    rest = &after[semi + 1..];
  }
  decoded.push_str(rest);
  Ok(decoded)
}
