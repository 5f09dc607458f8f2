// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`PushType`] registry.
//!
//! Every stack in a [`PushState`](crate::state::PushState) is named by a [`PushType`]. The core
//! types occupy fixed [`StackId`]s so instructions can address them without a lookup; user types
//! are appended after them.
//!
//! ## Policy and invariants
//!
//! - Registered (non-reserved) types partition the value space: registration is rejected when the
//!   new predicate accepts an existing type's witness value, or vice versa.
//! - `exec`, `code`, `stdout`, and `untyped` are reserved names. Only the registry itself may
//!   register `exec` and `code`, and they are never returned by [`TypeRegistry::push_type_of`].

use core::fmt;

use hashbrown::HashMap;

use crate::atom::{Atom, Literal};
use crate::value::{Value, reasonable_int};

/// Index of a stack within a [`PushState`](crate::state::PushState).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct StackId(u16);

impl StackId {
    /// The `exec` stack: pending computation.
    pub const EXEC: Self = Self(0);
    /// The `code` stack: code as data.
    pub const CODE: Self = Self(1);
    /// The `bool` stack.
    pub const BOOL: Self = Self(2);
    /// The `int` stack.
    pub const INT: Self = Self(3);
    /// The `float` stack.
    pub const FLOAT: Self = Self(4);
    /// The `char` stack.
    pub const CHAR: Self = Self(5);
    /// The `str` stack.
    pub const STR: Self = Self(6);
    /// The `vector_bool` stack.
    pub const VECTOR_BOOL: Self = Self(7);
    /// The `vector_int` stack.
    pub const VECTOR_INT: Self = Self(8);
    /// The `vector_float` stack.
    pub const VECTOR_FLOAT: Self = Self(9);
    /// The `vector_char` stack.
    pub const VECTOR_CHAR: Self = Self(10);
    /// The `vector_str` stack.
    pub const VECTOR_STR: Self = Self(11);

    /// Number of core stacks; user types start at this index.
    pub const CORE_COUNT: usize = 12;

    /// Creates a stack id from its raw index.
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the index of this stack.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Names that user code may not register or unregister.
pub const RESERVED_NAMES: [&str; 4] = ["exec", "code", "stdout", "untyped"];

/// Returns `true` if `name` is reserved.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Membership predicate for a [`PushType`].
pub type IsInstanceFn = fn(&Value) -> bool;

/// Coercion into a [`PushType`]'s canonical representation. Returns `None` if not coercible.
pub type CoerceFn = fn(&Value) -> Option<Value>;

/// A family of values that share a stack.
#[derive(Clone)]
pub struct PushType {
    name: Box<str>,
    is_instance: IsInstanceFn,
    coerce: CoerceFn,
    witness: Value,
    is_collection: bool,
    is_numeric: bool,
}

impl fmt::Debug for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushType")
            .field("name", &self.name)
            .field("witness", &self.witness)
            .field("is_collection", &self.is_collection)
            .field("is_numeric", &self.is_numeric)
            .finish_non_exhaustive()
    }
}

impl PushType {
    /// Creates a type from its name, predicate, coercion, and a witness value.
    ///
    /// The witness is a representative member used to detect overlapping registrations.
    pub fn new(
        name: impl Into<Box<str>>,
        is_instance: IsInstanceFn,
        coerce: CoerceFn,
        witness: Value,
    ) -> Self {
        Self {
            name: name.into(),
            is_instance,
            coerce,
            witness,
            is_collection: false,
            is_numeric: false,
        }
    }

    /// Marks the type as a collection.
    #[must_use]
    pub fn collection(mut self, yes: bool) -> Self {
        self.is_collection = yes;
        self
    }

    /// Marks the type as numeric.
    #[must_use]
    pub fn numeric(mut self, yes: bool) -> Self {
        self.is_numeric = yes;
        self
    }

    /// Returns the stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if `value` belongs to this type.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        (self.is_instance)(value)
    }

    /// Coerces `value` into this type.
    #[must_use]
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        (self.coerce)(value)
    }

    /// Returns the witness value.
    #[must_use]
    pub fn witness(&self) -> &Value {
        &self.witness
    }

    /// Returns `true` for string, vector, and similar types.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    /// Returns `true` for numeric types.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.is_numeric
    }
}

/// Type registry errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is reserved for the VM.
    ReservedName(Box<str>),
    /// A type with this name is already registered.
    DuplicateName(Box<str>),
    /// The new type overlaps an existing one.
    AmbiguousType {
        /// Name of the type being registered.
        name: Box<str>,
        /// Name of the registered type it overlaps.
        conflicts_with: Box<str>,
    },
    /// The type's witness is not accepted by its own predicate.
    InvalidWitness(Box<str>),
    /// No type is registered under this name.
    UnknownType(Box<str>),
    /// No registered type accepts the value.
    NoTypeForValue,
    /// An instruction declares a stack the registry does not know.
    UnregisteredStack {
        /// Instruction name.
        instruction: Box<str>,
        /// Raw stack index.
        stack: u16,
    },
    /// The registry has no room for another stack.
    TooManyTypes,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedName(name) => write!(f, "type name is reserved: {name}"),
            Self::DuplicateName(name) => write!(f, "type already registered: {name}"),
            Self::AmbiguousType {
                name,
                conflicts_with,
            } => write!(f, "type {name} overlaps registered type {conflicts_with}"),
            Self::InvalidWitness(name) => write!(f, "witness rejected by its own type: {name}"),
            Self::UnknownType(name) => write!(f, "unknown type: {name}"),
            Self::NoTypeForValue => write!(f, "no registered type accepts the value"),
            Self::UnregisteredStack { instruction, stack } => write!(
                f,
                "instruction {instruction} declares unregistered stack {stack}"
            ),
            Self::TooManyTypes => write!(f, "too many registered types"),
        }
    }
}

impl core::error::Error for RegistryError {}

/// Name-indexed collection of [`PushType`]s.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    slots: Vec<Option<PushType>>,
    by_name: HashMap<Box<str>, StackId>,
}

impl TypeRegistry {
    /// Creates a registry with no types, not even `exec` and `code`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding `exec`, `code`, and the ten core data types.
    #[must_use]
    pub fn core() -> Self {
        let mut reg = Self::empty();
        for pt in core_types() {
            let id = reg.insert(pt);
            debug_assert!(id.is_ok(), "core types fit the stack id range");
        }
        reg
    }

    /// Registers a user type and returns its stack id.
    pub fn register(&mut self, pt: PushType) -> Result<StackId, RegistryError> {
        if is_reserved(&pt.name) {
            return Err(RegistryError::ReservedName(pt.name));
        }
        if self.by_name.contains_key(&pt.name) {
            return Err(RegistryError::DuplicateName(pt.name));
        }
        if !pt.is_instance(&pt.witness) {
            return Err(RegistryError::InvalidWitness(pt.name));
        }
        for existing in self.slots.iter().flatten() {
            if is_reserved(&existing.name) {
                continue;
            }
            if pt.is_instance(&existing.witness) || existing.is_instance(&pt.witness) {
                return Err(RegistryError::AmbiguousType {
                    name: pt.name,
                    conflicts_with: existing.name.clone(),
                });
            }
        }
        self.insert(pt)
    }

    /// Removes a type by name. Its stack id is not reused.
    pub fn unregister(&mut self, name: &str) -> Result<PushType, RegistryError> {
        if is_reserved(name) {
            return Err(RegistryError::ReservedName(name.into()));
        }
        let id = self
            .by_name
            .remove(name)
            .ok_or_else(|| RegistryError::UnknownType(name.into()))?;
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| RegistryError::UnknownType(name.into()))
    }

    /// Returns the unique non-reserved type accepting `value`.
    pub fn push_type_of(&self, value: &Value) -> Result<&PushType, RegistryError> {
        let id = self.stack_of(value)?;
        self.get(id).ok_or(RegistryError::NoTypeForValue)
    }

    /// Returns the stack a value of this type is pushed onto.
    pub fn stack_of(&self, value: &Value) -> Result<StackId, RegistryError> {
        if let Some(id) = value.core_stack()
            && let Some(pt) = self.get(id)
            && pt.is_instance(value)
        {
            return Ok(id);
        }
        self.slots
            .iter()
            .enumerate()
            .find_map(|(i, slot)| {
                let pt = slot.as_ref()?;
                if is_reserved(&pt.name) || !pt.is_instance(value) {
                    return None;
                }
                Some(StackId(u16::try_from(i).ok()?))
            })
            .ok_or(RegistryError::NoTypeForValue)
    }

    /// Wraps `value` in a literal of its inferred type.
    pub fn infer_literal(&self, value: Value) -> Result<Literal, RegistryError> {
        let id = self.stack_of(&value)?;
        Ok(Literal::new(value, id))
    }

    /// Convenience over [`TypeRegistry::infer_literal`] producing an atom.
    pub fn literal_atom(&self, value: Value) -> Result<Atom, RegistryError> {
        self.infer_literal(value).map(Atom::Literal)
    }

    /// Returns the type registered at `id`.
    #[must_use]
    pub fn get(&self, id: StackId) -> Option<&PushType> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Looks up a stack id by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<StackId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name of the stack at `id`.
    #[must_use]
    pub fn name_of(&self, id: StackId) -> Option<&str> {
        self.get(id).map(PushType::name)
    }

    /// Returns `true` if a type is registered at `id`.
    #[must_use]
    pub fn contains(&self, id: StackId) -> bool {
        self.get(id).is_some()
    }

    /// Number of stack slots a [`PushState`](crate::state::PushState) needs for this registry.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over registered types in stack order.
    pub fn iter(&self) -> impl Iterator<Item = (StackId, &PushType)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let pt = slot.as_ref()?;
            Some((StackId(u16::try_from(i).ok()?), pt))
        })
    }

    fn insert(&mut self, pt: PushType) -> Result<StackId, RegistryError> {
        let id = StackId(u16::try_from(self.slots.len()).map_err(|_| RegistryError::TooManyTypes)?);
        self.by_name.insert(pt.name.clone(), id);
        self.slots.push(Some(pt));
        Ok(id)
    }
}

fn core_types() -> [PushType; StackId::CORE_COUNT] {
    [
        PushType::new(
            "exec",
            |v| matches!(v, Value::Code(_)),
            coerce_code,
            Value::Code(Box::new(Atom::noop())),
        ),
        PushType::new(
            "code",
            |v| matches!(v, Value::Code(_)),
            coerce_code,
            Value::Code(Box::new(Atom::noop())),
        ),
        PushType::new(
            "bool",
            |v| matches!(v, Value::Bool(_)),
            coerce_bool,
            Value::Bool(false),
        ),
        PushType::new(
            "int",
            |v| matches!(v, Value::Int(_)),
            coerce_int,
            Value::Int(0),
        )
        .numeric(true),
        PushType::new(
            "float",
            |v| matches!(v, Value::Float(_)),
            coerce_float,
            Value::Float(0.0),
        )
        .numeric(true),
        PushType::new(
            "char",
            |v| matches!(v, Value::Char(_)),
            coerce_char,
            Value::Char('a'),
        ),
        PushType::new(
            "str",
            |v| matches!(v, Value::Str(_)),
            coerce_str,
            Value::Str(String::new()),
        )
        .collection(true),
        PushType::new(
            "vector_bool",
            |v| matches!(v, Value::BoolVec(_)),
            |v| match v {
                Value::BoolVec(x) => Some(Value::BoolVec(x.clone())),
                _ => None,
            },
            Value::BoolVec(Vec::new()),
        )
        .collection(true),
        PushType::new(
            "vector_int",
            |v| matches!(v, Value::IntVec(_)),
            |v| match v {
                Value::IntVec(x) => Some(Value::IntVec(x.clone())),
                _ => None,
            },
            Value::IntVec(Vec::new()),
        )
        .collection(true),
        PushType::new(
            "vector_float",
            |v| matches!(v, Value::FloatVec(_)),
            coerce_float_vec,
            Value::FloatVec(Vec::new()),
        )
        .collection(true),
        PushType::new(
            "vector_char",
            |v| matches!(v, Value::CharVec(_)),
            coerce_char_vec,
            Value::CharVec(Vec::new()),
        )
        .collection(true),
        PushType::new(
            "vector_str",
            |v| matches!(v, Value::StrVec(_)),
            |v| match v {
                Value::StrVec(x) => Some(Value::StrVec(x.clone())),
                _ => None,
            },
            Value::StrVec(Vec::new()),
        )
        .collection(true),
    ]
}

fn coerce_code(v: &Value) -> Option<Value> {
    match v {
        Value::Code(a) => Some(Value::Code(a.clone())),
        _ => None,
    }
}

fn coerce_bool(v: &Value) -> Option<Value> {
    Some(Value::Bool(match v {
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        _ => return None,
    }))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int truncation is the coercion"
)]
fn coerce_int(v: &Value) -> Option<Value> {
    Some(Value::Int(match v {
        Value::Int(n) => *n,
        Value::Bool(b) => i64::from(*b),
        Value::Float(x) if x.is_finite() => reasonable_int(x.trunc() as i128),
        Value::Char(c) => i64::from(u32::from(*c)),
        Value::Str(s) => reasonable_int(s.trim().parse::<i128>().ok()?),
        _ => return None,
    }))
}

fn coerce_float(v: &Value) -> Option<Value> {
    Some(Value::Float(match v {
        Value::Float(x) => *x,
        Value::Int(n) => *n as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    }))
}

fn coerce_char(v: &Value) -> Option<Value> {
    match v {
        Value::Char(c) => Some(Value::Char(*c)),
        Value::Str(s) => {
            let mut it = s.chars();
            let c = it.next()?;
            it.next().is_none().then_some(Value::Char(c))
        }
        Value::Int(n) => u32::try_from(*n).ok().and_then(char::from_u32).map(Value::Char),
        _ => None,
    }
}

fn coerce_str(v: &Value) -> Option<Value> {
    match v {
        Value::Str(s) => Some(Value::Str(s.clone())),
        Value::Char(c) => Some(Value::Str(c.to_string())),
        _ => None,
    }
}

fn coerce_float_vec(v: &Value) -> Option<Value> {
    match v {
        Value::FloatVec(x) => Some(Value::FloatVec(x.clone())),
        Value::IntVec(x) => Some(Value::FloatVec(x.iter().map(|n| *n as f64).collect())),
        _ => None,
    }
}

fn coerce_char_vec(v: &Value) -> Option<Value> {
    match v {
        Value::CharVec(x) => Some(Value::CharVec(x.clone())),
        Value::StrVec(x) => x
            .iter()
            .map(|s| {
                let mut it = s.chars();
                let c = it.next()?;
                it.next().is_none().then_some(c)
            })
            .collect::<Option<Vec<char>>>()
            .map(Value::CharVec),
        _ => None,
    }
}
