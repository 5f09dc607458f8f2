// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpreter working memory.
//!
//! A [`PushState`] holds one stack per registered type, the run's inputs, and the `stdout`
//! buffer. Stacks are indexed by [`StackId`]; a slot that has no registered type has no stack and
//! every access to it fails with [`InstrError::TypeError`].
//!
//! ## Atomicity
//!
//! Instructions mutate the state directly. While a transaction is open (see
//! [`PushState::begin`]), every mutation records an undo entry; [`PushState::rollback`] replays
//! them in reverse so a reverting instruction leaves the state exactly as it found it.

use core::fmt;

use crate::atom::Atom;
use crate::types::{StackId, TypeRegistry};
use crate::value::{Element, Value};

/// Non-success outcome of an instruction body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrError {
    /// Preconditions were not met; the instruction has no effect.
    Revert,
    /// The instruction touched a stack that does not exist or found a value of the wrong kind.
    ///
    /// This is a library misconfiguration, not misbehavior of the evolved program.
    TypeError(Box<str>),
}

impl fmt::Display for InstrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revert => write!(f, "instruction reverted"),
            Self::TypeError(detail) => write!(f, "type error: {detail}"),
        }
    }
}

impl core::error::Error for InstrError {}

#[derive(Clone, Debug)]
enum Undo {
    Pushed(StackId),
    Popped(StackId, Value),
    Inserted(StackId, usize),
    Removed(StackId, usize, Value),
    Replaced(StackId, Vec<Value>),
    Stdout(usize),
}

/// Stacks, inputs, and output buffer for one interpretation.
#[derive(Clone, Debug, Default)]
pub struct PushState {
    stacks: Vec<Option<Vec<Value>>>,
    inputs: Vec<Value>,
    stdout: String,
    stdout_chars: usize,
    journal: Vec<Undo>,
    recording: bool,
    pushed: usize,
}

/// Two states are equal when their stacks, inputs, and `stdout` are equal.
impl PartialEq for PushState {
    fn eq(&self, other: &Self) -> bool {
        self.stacks == other.stacks && self.inputs == other.inputs && self.stdout == other.stdout
    }
}

fn missing(id: StackId) -> InstrError {
    InstrError::TypeError(format!("no stack registered at index {}", id.index()).into())
}

fn wrong_kind(id: StackId, v: &Value) -> InstrError {
    InstrError::TypeError(
        format!(
            "stack {} holds a value of kind {}",
            id.index(),
            v.kind_name()
        )
        .into(),
    )
}

impl PushState {
    /// Creates an empty state with one stack per type in `registry`.
    #[must_use]
    pub fn new(registry: &TypeRegistry) -> Self {
        let mut stacks = vec![None; registry.slot_count()];
        for (id, _) in registry.iter() {
            stacks[id.index()] = Some(Vec::new());
        }
        Self {
            stacks,
            ..Self::default()
        }
    }

    /// Clears every stack, the inputs, and `stdout`, keeping the stack layout.
    pub fn reset(&mut self) {
        for s in self.stacks.iter_mut().flatten() {
            s.clear();
        }
        self.inputs.clear();
        self.stdout.clear();
        self.stdout_chars = 0;
        self.journal.clear();
        self.recording = false;
        self.pushed = 0;
    }

    /// Replaces the inputs.
    pub fn load_inputs(&mut self, inputs: impl IntoIterator<Item = Value>) {
        self.inputs.clear();
        self.inputs.extend(inputs);
    }

    /// Returns the inputs.
    #[must_use]
    pub fn inputs(&self) -> &[Value] {
        &self.inputs
    }

    /// Returns the accumulated `stdout`.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns a stack, bottom first.
    #[must_use]
    pub fn stack(&self, id: StackId) -> Option<&[Value]> {
        self.stacks.get(id.index())?.as_deref()
    }

    /// Number of items on a stack (0 if the stack does not exist).
    #[must_use]
    pub fn depth(&self, id: StackId) -> usize {
        self.stack(id).map_or(0, <[Value]>::len)
    }

    /// Returns the top of a stack.
    #[must_use]
    pub fn top(&self, id: StackId) -> Option<&Value> {
        self.stack(id)?.last()
    }

    fn stack_mut(&mut self, id: StackId) -> Result<&mut Vec<Value>, InstrError> {
        self.stacks
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(id))
    }

    fn record(&mut self, undo: Undo) {
        if self.recording {
            self.journal.push(undo);
        }
    }

    // --- transactions ---

    /// Opens a transaction. Mutations are journaled until [`PushState::commit`] or
    /// [`PushState::rollback`].
    pub fn begin(&mut self) {
        self.journal.clear();
        self.recording = true;
        self.pushed = 0;
    }

    /// Items pushed or inserted since [`PushState::begin`].
    #[must_use]
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Closes the transaction, keeping its effects. Returns the number of items it pushed.
    pub fn commit(&mut self) -> usize {
        self.journal.clear();
        self.recording = false;
        core::mem::take(&mut self.pushed)
    }

    /// Closes the transaction, undoing its effects.
    pub fn rollback(&mut self) {
        self.recording = false;
        self.pushed = 0;
        while let Some(undo) = self.journal.pop() {
            self.undo(undo);
        }
    }

    fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::Stdout(len) => {
                self.stdout.truncate(len);
                self.stdout_chars = self.stdout.chars().count();
            }
            Undo::Pushed(id) => {
                if let Ok(s) = self.stack_mut(id) {
                    s.pop();
                }
            }
            Undo::Popped(id, v) => {
                if let Ok(s) = self.stack_mut(id) {
                    s.push(v);
                }
            }
            Undo::Inserted(id, at) => {
                if let Ok(s) = self.stack_mut(id) {
                    s.remove(at);
                }
            }
            Undo::Removed(id, at, v) => {
                if let Ok(s) = self.stack_mut(id) {
                    s.insert(at, v);
                }
            }
            Undo::Replaced(id, items) => {
                if let Ok(s) = self.stack_mut(id) {
                    *s = items;
                }
            }
        }
    }

    // --- generic stack operations ---

    /// Pushes a value.
    pub fn push(&mut self, id: StackId, v: Value) -> Result<(), InstrError> {
        self.stack_mut(id)?.push(v);
        self.pushed += 1;
        self.record(Undo::Pushed(id));
        Ok(())
    }

    /// Pops the top value; reverts if the stack is empty.
    pub fn pop(&mut self, id: StackId) -> Result<Value, InstrError> {
        let v = self.stack_mut(id)?.pop().ok_or(InstrError::Revert)?;
        if self.recording {
            self.journal.push(Undo::Popped(id, v.clone()));
        }
        Ok(v)
    }

    /// Returns the item `depth` places below the top (0 is the top); reverts if out of range.
    pub fn peek_at(&self, id: StackId, depth: usize) -> Result<&Value, InstrError> {
        let s = self.stack(id).ok_or_else(|| missing(id))?;
        let at = s
            .len()
            .checked_sub(depth + 1)
            .ok_or(InstrError::Revert)?;
        Ok(&s[at])
    }

    /// Returns the top value; reverts if the stack is empty.
    pub fn peek(&self, id: StackId) -> Result<&Value, InstrError> {
        self.peek_at(id, 0)
    }

    /// Empties a stack.
    pub fn flush(&mut self, id: StackId) -> Result<(), InstrError> {
        let items = core::mem::take(self.stack_mut(id)?);
        self.record(Undo::Replaced(id, items));
        Ok(())
    }

    /// Removes and returns the item `depth` places below the top.
    pub fn yank(&mut self, id: StackId, depth: usize) -> Result<Value, InstrError> {
        let s = self.stack_mut(id)?;
        let at = s
            .len()
            .checked_sub(depth + 1)
            .ok_or(InstrError::Revert)?;
        let v = s.remove(at);
        if self.recording {
            self.journal.push(Undo::Removed(id, at, v.clone()));
        }
        Ok(v)
    }

    /// Inserts a value so that `depth` items sit above it. Depths past the bottom insert at the
    /// bottom.
    pub fn shove(&mut self, id: StackId, depth: usize, v: Value) -> Result<(), InstrError> {
        let s = self.stack_mut(id)?;
        let at = s.len().saturating_sub(depth);
        s.insert(at, v);
        self.pushed += 1;
        self.record(Undo::Inserted(id, at));
        Ok(())
    }

    // --- typed helpers ---

    /// Pops an `int`.
    pub fn pop_int(&mut self) -> Result<i64, InstrError> {
        self.pop_elem::<i64>()
    }

    /// Pops a `float`.
    pub fn pop_float(&mut self) -> Result<f64, InstrError> {
        self.pop_elem::<f64>()
    }

    /// Pops a `bool`.
    pub fn pop_bool(&mut self) -> Result<bool, InstrError> {
        self.pop_elem::<bool>()
    }

    /// Pops a `char`.
    pub fn pop_char(&mut self) -> Result<char, InstrError> {
        self.pop_elem::<char>()
    }

    /// Pops a `str`.
    pub fn pop_str(&mut self) -> Result<String, InstrError> {
        self.pop_elem::<String>()
    }

    /// Pops an atom from `exec` or `code`.
    pub fn pop_code(&mut self, id: StackId) -> Result<Atom, InstrError> {
        match self.pop(id)? {
            Value::Code(a) => Ok(*a),
            other => Err(wrong_kind(id, &other)),
        }
    }

    /// Pushes an atom onto `exec` or `code`.
    pub fn push_code(&mut self, id: StackId, atom: Atom) -> Result<(), InstrError> {
        self.push(id, Value::Code(Box::new(atom)))
    }

    /// Returns the atom at the top of `exec` or `code`.
    pub fn peek_code(&self, id: StackId) -> Result<&Atom, InstrError> {
        match self.peek(id)? {
            Value::Code(a) => Ok(a),
            other => Err(wrong_kind(id, other)),
        }
    }

    pub(crate) fn pop_elem<T: Element>(&mut self) -> Result<T, InstrError> {
        let v = self.pop(T::STACK)?;
        T::from_value(v).ok_or_else(|| InstrError::TypeError("element stack mismatch".into()))
    }

    pub(crate) fn push_elem<T: Element>(&mut self, x: T) -> Result<(), InstrError> {
        self.push(T::STACK, x.into_value())
    }

    pub(crate) fn pop_vec<T: Element>(&mut self) -> Result<Vec<T>, InstrError> {
        let v = self.pop(T::VECTOR)?;
        T::vec_from_value(v).ok_or_else(|| InstrError::TypeError("vector stack mismatch".into()))
    }

    pub(crate) fn push_vec<T: Element>(&mut self, v: Vec<T>) -> Result<(), InstrError> {
        self.push(T::VECTOR, T::vec_into_value(v))
    }

    /// Appends to `stdout`; reverts if it would grow past `cap` characters.
    pub fn append_stdout(&mut self, text: &str, cap: usize) -> Result<(), InstrError> {
        let added = text.chars().count();
        if self.stdout_chars + added > cap {
            return Err(InstrError::Revert);
        }
        self.record(Undo::Stdout(self.stdout.len()));
        self.stdout.push_str(text);
        self.stdout_chars += added;
        Ok(())
    }

    // --- snapshots ---

    /// Returns a copy of the state for later [`PushState::restore`].
    #[must_use]
    pub fn snapshot(&self) -> Self {
        let mut snap = self.clone();
        snap.journal.clear();
        snap.recording = false;
        snap.pushed = 0;
        snap
    }

    /// Restores a state captured with [`PushState::snapshot`].
    pub fn restore(&mut self, snapshot: Self) {
        *self = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PushState {
        PushState::new(&TypeRegistry::core())
    }

    #[test]
    fn rollback_restores_every_kind_of_mutation() {
        let mut s = state();
        s.push(StackId::INT, Value::Int(1)).unwrap();
        s.push(StackId::INT, Value::Int(2)).unwrap();
        s.push(StackId::INT, Value::Int(3)).unwrap();
        s.append_stdout("hi", 10).unwrap();
        let before = s.snapshot();

        s.begin();
        s.pop(StackId::INT).unwrap();
        s.yank(StackId::INT, 1).unwrap();
        s.shove(StackId::INT, 5, Value::Int(9)).unwrap();
        s.flush(StackId::INT).unwrap();
        s.push(StackId::BOOL, Value::Bool(true)).unwrap();
        s.append_stdout("!!", 10).unwrap();
        s.rollback();

        assert_eq!(s, before);
        assert_eq!(s.stdout(), "hi");
    }

    #[test]
    fn restore_returns_to_snapshot() {
        let mut s = state();
        s.load_inputs([Value::Int(4)]);
        s.push(StackId::STR, Value::from("a")).unwrap();
        s.push_code(StackId::EXEC, Atom::int(1)).unwrap();
        s.append_stdout("x", 10).unwrap();
        let snap = s.snapshot();

        s.pop(StackId::STR).unwrap();
        s.flush(StackId::EXEC).unwrap();
        s.push(StackId::FLOAT, Value::Float(0.5)).unwrap();
        s.append_stdout("yz", 10).unwrap();
        assert_ne!(s, snap);

        s.restore(snap.clone());
        assert_eq!(s, snap);
        assert_eq!(s.stack(StackId::STR).unwrap(), &[Value::from("a")]);
        assert_eq!(s.depth(StackId::EXEC), 1);
        assert_eq!(s.depth(StackId::FLOAT), 0);
        assert_eq!(s.inputs(), &[Value::Int(4)]);
        assert_eq!(s.stdout(), "x");
    }

    #[test]
    fn commit_reports_pushed_items() {
        let mut s = state();
        s.begin();
        s.push(StackId::INT, Value::Int(1)).unwrap();
        s.shove(StackId::INT, 0, Value::Int(2)).unwrap();
        s.pop(StackId::INT).unwrap();
        assert_eq!(s.commit(), 2);
    }

    #[test]
    fn yank_and_shove_count_from_top() {
        let mut s = state();
        for n in 0..4 {
            s.push(StackId::INT, Value::Int(n)).unwrap();
        }
        assert_eq!(s.yank(StackId::INT, 1).unwrap(), Value::Int(2));
        s.shove(StackId::INT, 2, Value::Int(7)).unwrap();
        assert_eq!(
            s.stack(StackId::INT).unwrap(),
            &[Value::Int(0), Value::Int(7), Value::Int(1), Value::Int(3)]
        );
        assert_eq!(s.peek_at(StackId::INT, 3).unwrap(), &Value::Int(0));
        assert_eq!(s.peek_at(StackId::INT, 4), Err(InstrError::Revert));
    }

    #[test]
    fn empty_pop_reverts_and_missing_stack_is_type_error() {
        let mut s = state();
        assert_eq!(s.pop(StackId::FLOAT), Err(InstrError::Revert));
        assert!(matches!(
            s.pop(StackId::new(40)),
            Err(InstrError::TypeError(_))
        ));
    }

    #[test]
    fn stdout_cap_counts_chars() {
        let mut s = state();
        s.append_stdout("héllo", 5).unwrap();
        assert_eq!(s.append_stdout("x", 5), Err(InstrError::Revert));
    }
}
