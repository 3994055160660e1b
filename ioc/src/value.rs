//! Scalar values for literal property bindings and their string coercion.

use std::fmt;

/// The scalar type a property slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
  Int,
  Long,
  Double,
  Float,
  Bool,
  Short,
  Byte,
  Char,
  /// Any other target; receives the raw literal.
  Str,
}

impl fmt::Display for ScalarKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ScalarKind::Int => "i32",
      ScalarKind::Long => "i64",
      ScalarKind::Double => "f64",
      ScalarKind::Float => "f32",
      ScalarKind::Bool => "bool",
      ScalarKind::Short => "i16",
      ScalarKind::Byte => "i8",
      ScalarKind::Char => "char",
      ScalarKind::Str => "String",
    };
    f.write_str(name)
  }
}

/// A literal after coercion to its target kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Int(i32),
  Long(i64),
  Double(f64),
  Float(f32),
  Bool(bool),
  Short(i16),
  Byte(i8),
  Char(char),
  Str(String),
}

impl Value {
  /// Coerces `literal` to `kind`.
  ///
  /// Numbers are parsed after trimming surrounding whitespace. Booleans follow
  /// the lenient rule: `true` in any case is `true`, everything else is
  /// `false`. A char takes the first character and fails on an empty literal.
  /// Returns `None` when the literal does not parse as `kind`.
  pub fn coerce(literal: &str, kind: ScalarKind) -> Option<Value> {
    let trimmed = literal.trim();
    let value = match kind {
      ScalarKind::Int => Value::Int(trimmed.parse().ok()?),
      ScalarKind::Long => Value::Long(trimmed.parse().ok()?),
      ScalarKind::Double => Value::Double(trimmed.parse().ok()?),
      ScalarKind::Float => Value::Float(trimmed.parse().ok()?),
      ScalarKind::Bool => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
      ScalarKind::Short => Value::Short(trimmed.parse().ok()?),
      ScalarKind::Byte => Value::Byte(trimmed.parse().ok()?),
      ScalarKind::Char => Value::Char(literal.chars().next()?),
      ScalarKind::Str => Value::Str(literal.to_owned()),
    };
    Some(value)
  }
}

/// A Rust type that can receive a literal property value.
pub trait ScalarValue: Sized + 'static {
  const KIND: ScalarKind;

  fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_scalar_value {
  ($($ty:ty => $variant:ident),* $(,)?) => {
    $(
      impl ScalarValue for $ty {
        const KIND: ScalarKind = ScalarKind::$variant;

        fn from_value(value: Value) -> Option<Self> {
          match value {
            Value::$variant(inner) => Some(inner),
            _ => None,
          }
        }
      }
    )*
  };
}

impl_scalar_value! {
  i32 => Int,
  i64 => Long,
  f64 => Double,
  f32 => Float,
  bool => Bool,
  i16 => Short,
  i8 => Byte,
  char => Char,
  String => Str,
}
