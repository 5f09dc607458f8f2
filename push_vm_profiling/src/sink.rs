// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::resolver::{DefaultLabelResolver, LabelResolver, default_instruction_label};
use push_vm::trace::{InstrOutcome, TraceMask, TraceSink};
use std::string::String;
use std::vec::Vec;

type BackendGuard = tracy_client::Span;

struct ScopeEntry {
    step: usize,
    // Keep the label alive for backends that may borrow it.
    label: String,
    guard: Option<BackendGuard>,
}

/// A `TraceSink` that emits one Tracy scope per dispatched instruction via `tracy-client`.
pub struct ProfilingTraceSink<R = DefaultLabelResolver> {
    resolver: R,
    stack: Vec<ScopeEntry>,
    reverts: u64,
}

impl ProfilingTraceSink<DefaultLabelResolver> {
    /// Create a new sink labelled by instruction name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LabelResolver> ProfilingTraceSink<R> {
    /// Create a new sink with a custom label resolver.
    #[must_use]
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            reverts: 0,
        }
    }

    /// Reverted instructions seen so far.
    #[must_use]
    pub fn reverts(&self) -> u64 {
        self.reverts
    }

    fn on_instr_enter(&mut self, name: &str, step: usize) {
        let label = self
            .resolver
            .instruction_label(name)
            .unwrap_or_else(|| default_instruction_label(name));
        let guard = self.start_scope(&label, step);
        self.stack.push(ScopeEntry { step, label, guard });
    }

    fn on_instr_exit(&mut self, step: usize) {
        if let Some(top) = self.stack.last()
            && top.step == step
        {
            if let Some(entry) = self.stack.pop() {
                let ScopeEntry {
                    label: _label,
                    guard: _guard,
                    ..
                } = entry;
                let _ = (_label, _guard);
            }
            return;
        }
        // If the stack got out of sync, drop any active scopes to avoid leaking.
        self.drop_active_scopes();
    }

    fn start_scope(&self, label: &str, step: usize) -> Option<BackendGuard> {
        let client = tracy_client::Client::running()?;
        let line = u32::try_from(step).unwrap_or(u32::MAX);
        Some(client.span_alloc(Some(label), "push_vm.instruction", "push_vm", line, 0))
    }

    // Drop in LIFO order so nested spans close inner-to-outer.
    fn drop_active_scopes(&mut self) {
        while let Some(entry) = self.stack.pop() {
            let ScopeEntry {
                label: _label,
                guard: _guard,
                ..
            } = entry;
            let _ = (_label, _guard);
        }
    }
}

impl<R: LabelResolver> TraceSink for ProfilingTraceSink<R> {
    fn mask(&self) -> TraceMask {
        TraceMask::INSTR | TraceMask::REVERT
    }

    fn instr_enter(&mut self, name: &str, step: usize) {
        self.on_instr_enter(name, step);
    }

    fn instr_exit(&mut self, _name: &str, step: usize, _outcome: InstrOutcome) {
        self.on_instr_exit(step);
    }

    fn revert(&mut self, _name: &str, _step: usize) {
        self.reverts += 1;
    }
}

impl<R> Default for ProfilingTraceSink<R>
where
    R: LabelResolver + Default,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<R> std::fmt::Debug for ProfilingTraceSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingTraceSink")
            .field("stack_depth", &self.stack.len())
            .field("reverts", &self.reverts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ProfilingTraceSink;
    use push_vm::trace::TraceSink;
    use push_vm::{Atom, CodeBlock, Interpreter, PushConfig, Termination};

    #[test]
    fn start_scope_without_tracy_client_does_not_panic() {
        let sink = ProfilingTraceSink::new();
        let _guard = sink.start_scope("test", 0);
    }

    #[test]
    fn scopes_balance_over_a_run() {
        let mut vm = Interpreter::with_core();
        let mut sink = ProfilingTraceSink::new();
        let mask = sink.mask();
        let code = CodeBlock::new(vec![
            Atom::int(1),
            Atom::instruction("int_add"),
            Atom::int(2),
            Atom::instruction("int_add"),
        ]);
        let r = vm.run_with_trace(
            &code,
            &[],
            &["int"],
            &PushConfig::default(),
            mask,
            Some(&mut sink),
        );
        assert_eq!(r.termination, Termination::Normal);
        assert!(sink.stack.is_empty());
        assert_eq!(sink.reverts(), 1);
    }
}
