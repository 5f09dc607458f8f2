// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Program atoms and code blocks.
//!
//! A [`CodeBlock`] is a persistent tree: editing operations return a new block and share nothing
//! mutable with the original. Blocks are reference counted so that pushing a whole block onto
//! `exec` (which code-manipulating instructions do constantly) is cheap.
//!
//! ## Point numbering
//!
//! Code-manipulation instructions address sub-programs by *point*: a depth-first pre-order index
//! where point 0 is the block itself, point 1 its first child, and a nested block's children
//! follow it before its next sibling. [`CodeBlock::size`] is the number of points.

use core::fmt;
use std::sync::Arc;

use crate::types::StackId;
use crate::value::{FloatDisplay, Value};

/// Name of the structural no-op that opens one code group in genome form.
pub const OPEN_PAREN: &str = "noop_open_paren";

/// A value tagged with the stack it is pushed onto.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    /// The value.
    pub value: Value,
    /// Stack the value belongs to. The value satisfies that type's predicate.
    pub push_type: StackId,
}

impl Literal {
    /// Creates a literal. Callers are responsible for `value` matching `push_type`;
    /// [`TypeRegistry::infer_literal`](crate::types::TypeRegistry::infer_literal) checks this.
    pub fn new(value: Value, push_type: StackId) -> Self {
        Self { value, push_type }
    }
}

/// A reference to an instruction by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstructionMeta {
    /// Instruction name.
    pub name: Arc<str>,
    /// Number of code groups the instruction opens in genome form.
    pub code_blocks: u8,
}

impl InstructionMeta {
    /// Creates an instruction reference.
    pub fn new(name: impl Into<Arc<str>>, code_blocks: u8) -> Self {
        Self {
            name: name.into(),
            code_blocks,
        }
    }
}

/// The smallest unit of a program.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    /// A typed value.
    Literal(Literal),
    /// Positional program input.
    Input(usize),
    /// An instruction, resolved by name when dispatched.
    Instruction(InstructionMeta),
    /// An instruction reference pushed by other instructions (e.g. loop re-invocation).
    ///
    /// Resolved at dispatch time so expansions can refer to themselves without cycles.
    JitInstruction(Arc<str>),
    /// End of a code group. Genome only.
    Closer,
    /// A nested block. Program only.
    Block(CodeBlock),
}

impl Atom {
    /// An `int` literal.
    pub fn int(n: i64) -> Self {
        Self::Literal(Literal::new(Value::Int(n), StackId::INT))
    }

    /// A `float` literal.
    pub fn float(x: f64) -> Self {
        Self::Literal(Literal::new(Value::Float(x), StackId::FLOAT))
    }

    /// A `bool` literal.
    pub fn bool(b: bool) -> Self {
        Self::Literal(Literal::new(Value::Bool(b), StackId::BOOL))
    }

    /// A `char` literal.
    pub fn char(c: char) -> Self {
        Self::Literal(Literal::new(Value::Char(c), StackId::CHAR))
    }

    /// A `str` literal.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Literal(Literal::new(Value::Str(s.into()), StackId::STR))
    }

    /// An instruction reference that opens no code groups.
    pub fn instruction(name: impl Into<Arc<str>>) -> Self {
        Self::Instruction(InstructionMeta::new(name, 0))
    }

    /// A dispatch-time instruction reference.
    pub fn jit(name: impl Into<Arc<str>>) -> Self {
        Self::JitInstruction(name.into())
    }

    /// The `noop` instruction.
    pub fn noop() -> Self {
        Self::instruction("noop")
    }

    /// Wraps a list of atoms into a block atom.
    pub fn block(atoms: impl IntoIterator<Item = Self>) -> Self {
        Self::Block(atoms.into_iter().collect())
    }

    /// Number of points in this atom (1 unless it is a block).
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Block(b) => b.size(),
            _ => 1,
        }
    }

    /// Nesting depth: 0 for a plain atom.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Block(b) => b.depth(),
            _ => 0,
        }
    }

    /// Returns the block's contents, or a block holding only this atom.
    #[must_use]
    pub fn into_block(self) -> CodeBlock {
        match self {
            Self::Block(b) => b,
            other => CodeBlock::new(vec![other]),
        }
    }
}

impl From<CodeBlock> for Atom {
    fn from(b: CodeBlock) -> Self {
        Self::Block(b)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => match &lit.value {
                Value::Str(s) => write!(f, "{s:?}"),
                Value::Char(c) => write!(f, "{c:?}"),
                Value::Float(x) => write!(f, "{}", FloatDisplay(*x)),
                other => write!(f, "{other}"),
            },
            Self::Input(i) => write!(f, "input_{i}"),
            Self::Instruction(meta) => f.write_str(&meta.name),
            Self::JitInstruction(name) => f.write_str(name),
            Self::Closer => f.write_str("close"),
            Self::Block(b) => write!(f, "{b}"),
        }
    }
}

/// An immutable, ordered sequence of atoms. Never contains [`Atom::Closer`].
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    atoms: Arc<[Atom]>,
}

impl Default for CodeBlock {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FromIterator<Atom> for CodeBlock {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl CodeBlock {
    /// Creates a block from its atoms. Any [`Atom::Closer`] is dropped.
    #[must_use]
    pub fn new(mut atoms: Vec<Atom>) -> Self {
        atoms.retain(|a| !matches!(a, Atom::Closer));
        Self {
            atoms: Arc::from(atoms),
        }
    }

    /// Returns the block's top-level atoms.
    #[must_use]
    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Number of top-level atoms.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Returns `true` if the block has no atoms.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Iterates over top-level atoms.
    pub fn iter(&self) -> core::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Total number of points: every atom counts once, nested blocks recursively, and each block
    /// (including this one) counts itself.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.atoms.iter().map(Atom::size).sum::<usize>()
    }

    /// Maximum nesting; a flat block has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.atoms.iter().map(Atom::depth).max().unwrap_or(0)
    }

    /// Returns the sub-program at pre-order `point`, or `None` past the end.
    #[must_use]
    pub fn code_at_point(&self, point: usize) -> Option<Atom> {
        if point == 0 {
            return Some(Atom::Block(self.clone()));
        }
        let mut remaining = point - 1;
        for atom in self.iter() {
            let size = atom.size();
            if remaining < size {
                return match atom {
                    Atom::Block(b) => b.code_at_point(remaining),
                    other => Some(other.clone()),
                };
            }
            remaining -= size;
        }
        None
    }

    /// Returns a copy with `atom` inserted so that it occupies pre-order `point`.
    ///
    /// Point 0 inserts at the front. Points at or past [`CodeBlock::size`] append to the end of
    /// this (outermost) block.
    #[must_use]
    pub fn with_code_inserted_at_point(&self, atom: Atom, point: usize) -> Self {
        self.insert_at(atom, point.max(1))
    }

    fn insert_at(&self, atom: Atom, point: usize) -> Self {
        let mut remaining = point - 1;
        for (i, child) in self.iter().enumerate() {
            if remaining == 0 {
                return self.splice(i, 0, atom);
            }
            let size = child.size();
            if let Atom::Block(inner) = child
                && remaining < size
            {
                let replaced = Atom::Block(inner.insert_at(atom, remaining));
                return self.splice(i, 1, replaced);
            }
            remaining -= size;
        }
        self.splice(self.len(), 0, atom)
    }

    /// Returns a copy with top-level atoms in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        self.iter().rev().cloned().collect()
    }

    /// Returns the concatenation of `self` and `other`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        self.iter().chain(other.iter()).cloned().collect()
    }

    fn splice(&self, at: usize, remove: usize, atom: Atom) -> Self {
        let mut atoms = self.atoms.to_vec();
        atoms.splice(at..at + remove, [atom]);
        Self::new(atoms)
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, atom) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{atom}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ( a ( b c ) d )
    fn sample() -> CodeBlock {
        CodeBlock::new(vec![
            Atom::int(1),
            Atom::block([Atom::int(2), Atom::int(3)]),
            Atom::int(4),
        ])
    }

    #[test]
    fn size_and_depth() {
        let c = sample();
        assert_eq!(c.size(), 6);
        assert_eq!(c.depth(), 2);
        assert_eq!(CodeBlock::default().size(), 1);
        assert_eq!(CodeBlock::default().depth(), 1);
    }

    #[test]
    fn code_at_point_is_preorder() {
        let c = sample();
        assert_eq!(c.code_at_point(0), Some(Atom::Block(c.clone())));
        assert_eq!(c.code_at_point(1), Some(Atom::int(1)));
        assert_eq!(
            c.code_at_point(2),
            Some(Atom::block([Atom::int(2), Atom::int(3)]))
        );
        assert_eq!(c.code_at_point(3), Some(Atom::int(2)));
        assert_eq!(c.code_at_point(4), Some(Atom::int(3)));
        assert_eq!(c.code_at_point(5), Some(Atom::int(4)));
        assert_eq!(c.code_at_point(6), None);
    }

    #[test]
    fn insertion_lands_at_requested_point() {
        let c = sample();
        for point in 1..c.size() {
            let inserted = c.with_code_inserted_at_point(Atom::int(99), point);
            assert_eq!(inserted.size(), c.size() + 1, "point {point}");
            assert_eq!(
                inserted.code_at_point(point),
                Some(Atom::int(99)),
                "point {point}"
            );
        }
    }

    #[test]
    fn insertion_past_end_appends_to_outermost() {
        let c = sample();
        let inserted = c.with_code_inserted_at_point(Atom::int(99), 100);
        assert_eq!(inserted.atoms().last(), Some(&Atom::int(99)));
        assert_eq!(inserted.len(), 4);
        let front = c.with_code_inserted_at_point(Atom::int(99), 0);
        assert_eq!(front.atoms().first(), Some(&Atom::int(99)));
    }

    #[test]
    fn closers_never_enter_a_block() {
        let c = CodeBlock::new(vec![Atom::int(1), Atom::Closer]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn display_uses_push_notation() {
        let c = CodeBlock::new(vec![
            Atom::str("hi"),
            Atom::char(' '),
            Atom::float(1.0),
            Atom::instruction("int_add"),
            Atom::Input(0),
        ]);
        assert_eq!(c.to_string(), "(\"hi\" ' ' 1.0 int_add input_0)");
    }
}
