// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime value model for `push_vm`.
//!
//! Values are dynamically typed: each variant maps to exactly one stack through the
//! [`TypeRegistry`](crate::types::TypeRegistry). Numbers are kept "reasonable" by clamping to
//! [`MAX_NUMBER_MAGNITUDE`], which evolved programs rely on for compatibility.

use core::fmt;
use std::sync::Arc;

use crate::atom::Atom;
use crate::types::StackId;

/// Largest magnitude an `int` or `float` result may take.
pub const MAX_NUMBER_MAGNITUDE: i64 = 1_000_000_000_000;

/// Smallest non-zero magnitude a `float` result may take; smaller results collapse to `0.0`.
pub const MIN_FLOAT_MAGNITUDE: f64 = 1e-10;

/// A value of a user-registered type.
///
/// The payload is kept as JSON so that user types round-trip through the program codec without a
/// bespoke serializer.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomValue {
    /// Name of the registered type this value belongs to.
    pub type_name: Arc<str>,
    /// Opaque payload.
    pub data: serde_json::Value,
}

impl CustomValue {
    /// Creates a custom value tagged with `type_name`.
    pub fn new(type_name: impl Into<Arc<str>>, data: serde_json::Value) -> Self {
        Self {
            type_name: type_name.into(),
            data,
        }
    }
}

/// A runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer, clamped to `±MAX_NUMBER_MAGNITUDE` by arithmetic.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// Single Unicode scalar.
    Char(char),
    /// UTF-8 string.
    Str(String),
    /// Vector of booleans.
    BoolVec(Vec<bool>),
    /// Vector of integers.
    IntVec(Vec<i64>),
    /// Vector of floats.
    FloatVec(Vec<f64>),
    /// Vector of chars.
    CharVec(Vec<char>),
    /// Vector of strings.
    StrVec(Vec<String>),
    /// Code as data. Only the `exec` and `code` stacks hold this variant.
    Code(Box<Atom>),
    /// A value of a user-registered type.
    Custom(CustomValue),
}

impl Value {
    /// Returns the core stack this value belongs to, if it is a core value.
    ///
    /// `Code` values return `None`: `exec` and `code` are reserved pseudo-stacks and are never
    /// selected by value.
    #[must_use]
    pub fn core_stack(&self) -> Option<StackId> {
        Some(match self {
            Self::Bool(_) => StackId::BOOL,
            Self::Int(_) => StackId::INT,
            Self::Float(_) => StackId::FLOAT,
            Self::Char(_) => StackId::CHAR,
            Self::Str(_) => StackId::STR,
            Self::BoolVec(_) => StackId::VECTOR_BOOL,
            Self::IntVec(_) => StackId::VECTOR_INT,
            Self::FloatVec(_) => StackId::VECTOR_FLOAT,
            Self::CharVec(_) => StackId::VECTOR_CHAR,
            Self::StrVec(_) => StackId::VECTOR_STR,
            Self::Code(_) | Self::Custom(_) => return None,
        })
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "str",
            Self::BoolVec(_) => "vector_bool",
            Self::IntVec(_) => "vector_int",
            Self::FloatVec(_) => "vector_float",
            Self::CharVec(_) => "vector_char",
            Self::StrVec(_) => "vector_str",
            Self::Code(_) => "code",
            Self::Custom(c) => &c.type_name,
        }
    }

    /// Returns the element count of a collection value (chars for strings, points for code).
    #[must_use]
    pub fn collection_len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::BoolVec(v) => Some(v.len()),
            Self::IntVec(v) => Some(v.len()),
            Self::FloatVec(v) => Some(v.len()),
            Self::CharVec(v) => Some(v.len()),
            Self::StrVec(v) => Some(v.len()),
            Self::Code(a) => Some(a.size()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Atom> for Value {
    fn from(v: Atom) -> Self {
        Self::Code(Box::new(v))
    }
}

fn write_seq<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

/// Float display that always carries a fractional part (`2.0`, not `2`).
pub(crate) struct FloatDisplay(pub(crate) f64);

impl fmt::Display for FloatDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Displays values the way the `print_*` instructions write them.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{}", FloatDisplay(*x)),
            Self::Char(c) => write!(f, "{c}"),
            Self::Str(s) => f.write_str(s),
            Self::BoolVec(v) => write_seq(f, v),
            Self::IntVec(v) => write_seq(f, v),
            Self::FloatVec(v) => {
                let shown: Vec<FloatDisplay> = v.iter().map(|x| FloatDisplay(*x)).collect();
                write_seq(f, &shown)
            }
            Self::CharVec(v) => write_seq(f, v),
            Self::StrVec(v) => write_seq(f, v),
            Self::Code(a) => write!(f, "{a}"),
            Self::Custom(c) => write!(f, "{}", c.data),
        }
    }
}

/// Clamps an integer result to `±MAX_NUMBER_MAGNITUDE`.
#[must_use]
pub fn reasonable_int(n: i128) -> i64 {
    let max = i128::from(MAX_NUMBER_MAGNITUDE);
    i64::try_from(n.clamp(-max, max)).unwrap_or(MAX_NUMBER_MAGNITUDE)
}

/// Clamps a float result to `±MAX_NUMBER_MAGNITUDE` and flushes tiny magnitudes to zero.
///
/// Returns `None` for NaN, which instructions treat as a revert.
#[must_use]
pub fn reasonable_float(x: f64) -> Option<f64> {
    const MAX: f64 = 1e12;
    if x.is_nan() {
        return None;
    }
    let x = x.clamp(-MAX, MAX);
    if x.abs() < MIN_FLOAT_MAGNITUDE {
        Some(0.0)
    } else {
        Some(x)
    }
}

/// Element types that have a matching vector stack.
///
/// Vector instructions are generic over this trait; each implementation ties an element stack to
/// its vector stack.
pub(crate) trait Element: Clone + PartialEq + Send + Sync + 'static {
    /// Stack holding single elements.
    const STACK: StackId;
    /// Stack holding vectors of elements.
    const VECTOR: StackId;
    /// Name of the vector stack.
    const VECTOR_NAME: &'static str;

    fn into_value(self) -> Value;
    fn from_value(v: Value) -> Option<Self>;
    fn vec_into_value(v: Vec<Self>) -> Value;
    fn vec_from_value(v: Value) -> Option<Vec<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident, $vec_variant:ident, $stack:ident, $vector:ident, $name:literal) => {
        impl Element for $ty {
            const STACK: StackId = StackId::$stack;
            const VECTOR: StackId = StackId::$vector;
            const VECTOR_NAME: &'static str = $name;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(v: Value) -> Option<Self> {
                match v {
                    Value::$variant(x) => Some(x),
                    _ => None,
                }
            }

            fn vec_into_value(v: Vec<Self>) -> Value {
                Value::$vec_variant(v)
            }

            fn vec_from_value(v: Value) -> Option<Vec<Self>> {
                match v {
                    Value::$vec_variant(x) => Some(x),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool, BoolVec, BOOL, VECTOR_BOOL, "vector_bool");
impl_element!(i64, Int, IntVec, INT, VECTOR_INT, "vector_int");
impl_element!(f64, Float, FloatVec, FLOAT, VECTOR_FLOAT, "vector_float");
impl_element!(char, Char, CharVec, CHAR, VECTOR_CHAR, "vector_char");
impl_element!(String, Str, StrVec, STR, VECTOR_STR, "vector_str");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_clamp_is_symmetric() {
        assert_eq!(reasonable_int(5), 5);
        assert_eq!(reasonable_int(i128::from(i64::MAX)), MAX_NUMBER_MAGNITUDE);
        assert_eq!(reasonable_int(-(1_i128 << 80)), -MAX_NUMBER_MAGNITUDE);
    }

    #[test]
    fn float_clamp_flushes_tiny_and_rejects_nan() {
        assert_eq!(reasonable_float(1e-12), Some(0.0));
        assert_eq!(reasonable_float(-1e300), Some(-1e12));
        assert_eq!(reasonable_float(0.5), Some(0.5));
        assert_eq!(reasonable_float(f64::NAN), None);
    }

    #[test]
    fn display_matches_print_form() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::IntVec(vec![1, 2, 3]).to_string(), "[1 2 3]");
        assert_eq!(Value::Str("a b".into()).to_string(), "a b");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn collection_len_counts_chars() {
        assert_eq!(Value::Str("héllo".into()).collection_len(), Some(5));
        assert_eq!(Value::Int(3).collection_len(), None);
    }
}
