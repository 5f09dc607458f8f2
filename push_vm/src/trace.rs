// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for `push_vm`.
//!
//! The interpreter only emits events requested by a [`TraceMask`], and only when a
//! [`TraceSink`] is supplied. The VM never writes to a real stream itself.
//!
//! To enable tracing, pass a mask and sink to
//! [`Interpreter::run_with_trace`](crate::interpreter::Interpreter::run_with_trace).

use crate::atom::{Atom, CodeBlock};
use crate::interpreter::Termination;

/// A set of trace events requested by a [`TraceSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceMask(u32);

impl core::ops::BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TraceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TraceMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Trace run boundaries.
    ///
    /// Enables:
    /// - [`TraceSink::run_start`]
    /// - [`TraceSink::run_end`]
    pub const RUN: Self = Self(1 << 0);
    /// Trace every atom popped from `exec`.
    ///
    /// Enables:
    /// - [`TraceSink::step`]
    pub const STEP: Self = Self(1 << 1);
    /// Trace instruction dispatch.
    ///
    /// Enables:
    /// - [`TraceSink::instr_enter`]
    /// - [`TraceSink::instr_exit`]
    pub const INSTR: Self = Self(1 << 2);
    /// Trace reverted instructions.
    ///
    /// Enables:
    /// - [`TraceSink::revert`]
    pub const REVERT: Self = Self(1 << 3);
    /// Every event.
    pub const ALL: Self = Self(0b1111);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// How an instruction dispatch ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstrOutcome {
    /// The instruction committed.
    Committed {
        /// Items it pushed.
        pushed: usize,
    },
    /// The instruction reverted and had no effect.
    Reverted,
    /// The instruction ended the run.
    Terminated,
}

/// A trace sink that can receive interpreter events.
pub trait TraceSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }

    /// Called before the first step.
    ///
    /// Called only if the mask includes [`TraceMask::RUN`].
    fn run_start(&mut self, _code: &CodeBlock, _input_count: usize) {}

    /// Called for each atom popped from `exec`.
    ///
    /// Called only if the mask includes [`TraceMask::STEP`].
    ///
    /// - `step`: 1-based step number
    /// - `atom`: the atom about to be dispatched
    fn step(&mut self, _step: usize, _atom: &Atom) {}

    /// Called before an instruction body runs.
    ///
    /// Called only if the mask includes [`TraceMask::INSTR`].
    fn instr_enter(&mut self, _name: &str, _step: usize) {}

    /// Called after an instruction body runs, paired with [`TraceSink::instr_enter`].
    ///
    /// Called only if the mask includes [`TraceMask::INSTR`].
    fn instr_exit(&mut self, _name: &str, _step: usize, _outcome: InstrOutcome) {}

    /// Called when an instruction reverts.
    ///
    /// Called only if the mask includes [`TraceMask::REVERT`].
    fn revert(&mut self, _name: &str, _step: usize) {}

    /// Called once the run has ended, whatever the reason.
    ///
    /// Called only if the mask includes [`TraceMask::RUN`].
    fn run_end(&mut self, _steps: usize, _termination: &Termination) {}
}

#[cfg(test)]
mod tests {
    use super::TraceMask;

    #[test]
    fn mask_union_contains_parts() {
        let m = TraceMask::RUN | TraceMask::REVERT;
        assert!(m.contains(TraceMask::RUN));
        assert!(m.contains(TraceMask::REVERT));
        assert!(!m.contains(TraceMask::INSTR));
        assert!(TraceMask::ALL.contains(m));
        assert!(m.contains(TraceMask::NONE));
    }
}
