// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The instruction set.
//!
//! An [`Instruction`] is a value: a name, the stacks it reads and writes, the number of code
//! groups it opens in genome form, and a function over [`PushState`]. Instructions live in a flat
//! name-keyed [`InstructionSet`].
//!
//! ## Contract
//!
//! - [`Instruction::eval`] reverts without running the body when a declared input stack is too
//!   shallow.
//! - Bodies mutate the state directly and return [`InstrError::Revert`] to abandon their effects.
//!   The interpreter brackets every call in a [`PushState`] transaction, so partial effects are
//!   rolled back.
//! - Numeric results are clamped; size violations revert.

mod code;
mod common;
mod io;
mod logical;
mod numeric;
mod text;
mod vector;

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::atom::{Atom, InstructionMeta};
use crate::config::PushConfig;
use crate::state::PushState;
use crate::types::{RegistryError, StackId, TypeRegistry};

pub use crate::state::InstrError;

/// Signature of an instruction body.
pub type InstrFn = dyn Fn(&mut PushState, &PushConfig) -> Result<(), InstrError> + Send + Sync;

/// A named operation on a [`PushState`].
#[derive(Clone)]
pub struct Instruction {
    name: Arc<str>,
    inputs: Box<[StackId]>,
    outputs: Box<[StackId]>,
    code_blocks: u8,
    func: Arc<InstrFn>,
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("code_blocks", &self.code_blocks)
            .finish_non_exhaustive()
    }
}

impl Instruction {
    /// Creates an instruction.
    ///
    /// `inputs` lists every item the body pops or inspects, with repetition: `int_add` declares
    /// `[INT, INT]`. `outputs` lists the stacks the body may push to.
    pub fn new<F>(
        name: impl Into<Arc<str>>,
        inputs: &[StackId],
        outputs: &[StackId],
        func: F,
    ) -> Self
    where
        F: Fn(&mut PushState, &PushConfig) -> Result<(), InstrError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: inputs.into(),
            outputs: outputs.into(),
            code_blocks: 0,
            func: Arc::new(func),
        }
    }

    /// Sets the number of code groups this instruction opens in genome form.
    #[must_use]
    pub fn with_code_blocks(mut self, n: u8) -> Self {
        self.code_blocks = n;
        self
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared inputs, with repetition.
    #[must_use]
    pub fn inputs(&self) -> &[StackId] {
        &self.inputs
    }

    /// Returns the declared output stacks.
    #[must_use]
    pub fn outputs(&self) -> &[StackId] {
        &self.outputs
    }

    /// Number of code groups opened in genome form.
    #[must_use]
    pub fn code_blocks(&self) -> u8 {
        self.code_blocks
    }

    /// Every stack this instruction touches.
    pub fn stacks(&self) -> impl Iterator<Item = StackId> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }

    /// Returns the atom referring to this instruction.
    #[must_use]
    pub fn meta(&self) -> InstructionMeta {
        InstructionMeta {
            name: self.name.clone(),
            code_blocks: self.code_blocks,
        }
    }

    /// Returns `true` if every declared input stack holds enough items.
    #[must_use]
    pub fn preconditions_met(&self, state: &PushState) -> bool {
        let mut seen: Vec<(StackId, usize)> = Vec::with_capacity(self.inputs.len());
        for &id in self.inputs.iter() {
            match seen.iter_mut().find(|(s, _)| *s == id) {
                Some((_, n)) => *n += 1,
                None => seen.push((id, 1)),
            }
        }
        seen.iter().all(|&(id, n)| state.depth(id) >= n)
    }

    /// Runs the instruction. The caller owns the surrounding transaction.
    pub fn eval(&self, state: &mut PushState, config: &PushConfig) -> Result<(), InstrError> {
        if !self.preconditions_met(state) {
            return Err(InstrError::Revert);
        }
        (self.func)(state, config)
    }
}

/// Name-keyed instruction library.
#[derive(Clone, Debug, Default)]
pub struct InstructionSet {
    map: HashMap<Arc<str>, Instruction>,
}

impl InstructionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the built-in library for every type in `registry`.
    ///
    /// Common stack instructions and `print_*` are generated for every registered stack, user
    /// types included. Instructions touching a core stack missing from `registry` are left out.
    #[must_use]
    pub fn core(registry: &TypeRegistry) -> Self {
        let mut set = Self::empty();
        for (id, pt) in registry.iter() {
            common::register(&mut set, id, pt);
            io::register_print(&mut set, id, pt.name());
        }
        numeric::register(&mut set);
        logical::register(&mut set);
        text::register(&mut set);
        vector::register(&mut set);
        io::register(&mut set);
        code::register(&mut set);
        set.map
            .retain(|_, instr| instr.stacks().all(|s| registry.contains(s)));
        set
    }

    /// Adds an instruction, returning the one it replaced.
    pub fn register(&mut self, instr: Instruction) -> Option<Instruction> {
        self.map.insert(instr.name.clone(), instr)
    }

    /// Removes an instruction by name.
    pub fn unregister(&mut self, name: &str) -> Option<Instruction> {
        self.map.remove(name)
    }

    /// Looks up an instruction by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Instruction> {
        self.map.get(name)
    }

    /// Returns `true` if an instruction is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over instructions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.map.values()
    }

    /// Sorted instruction names.
    #[must_use]
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted names starting with `prefix`.
    #[must_use]
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self
            .map
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Keeps only instructions whose every stack is one of `stacks`.
    ///
    /// Unknown stack names are ignored. Instructions touching no stack are kept.
    pub fn retain_stacks(&mut self, registry: &TypeRegistry, stacks: &[&str]) {
        let allowed: Vec<StackId> = stacks.iter().filter_map(|n| registry.id_of(n)).collect();
        self.map
            .retain(|_, instr| instr.stacks().all(|s| allowed.contains(&s)));
    }

    /// Keeps only instructions whose name satisfies `keep`.
    pub fn retain_matching(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.map.retain(|name, _| keep(name));
    }

    /// Checks that every instruction only declares stacks registered in `registry`.
    pub fn validate(&self, registry: &TypeRegistry) -> Result<(), RegistryError> {
        for instr in self.map.values() {
            if let Some(s) = instr.stacks().find(|s| !registry.contains(*s)) {
                return Err(RegistryError::UnregisteredStack {
                    instruction: Box::from(instr.name()),
                    stack: u16::try_from(s.index()).unwrap_or(u16::MAX),
                });
            }
        }
        Ok(())
    }

    /// Returns the genome-form reference to an instruction.
    #[must_use]
    pub fn meta(&self, name: &str) -> Option<InstructionMeta> {
        self.get(name).map(Instruction::meta)
    }

    /// Returns an instruction atom with its `code_blocks` filled in.
    #[must_use]
    pub fn atom(&self, name: &str) -> Option<Atom> {
        self.meta(name).map(Atom::Instruction)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::value::Value;

    /// Runs one instruction inside a transaction the way the interpreter does.
    pub(crate) fn apply(
        set: &InstructionSet,
        state: &mut PushState,
        name: &str,
    ) -> Result<(), InstrError> {
        let instr = set.get(name).unwrap_or_else(|| panic!("missing {name}"));
        state.begin();
        match instr.eval(state, &PushConfig::default()) {
            Ok(()) => {
                state.commit();
                Ok(())
            }
            Err(e) => {
                state.rollback();
                Err(e)
            }
        }
    }

    pub(crate) fn fresh() -> (InstructionSet, PushState) {
        let reg = TypeRegistry::core();
        (InstructionSet::core(&reg), PushState::new(&reg))
    }

    pub(crate) fn stack(state: &PushState, id: StackId) -> Vec<Value> {
        state.stack(id).unwrap_or_default().to_vec()
    }
}
