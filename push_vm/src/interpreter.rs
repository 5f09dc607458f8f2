// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Push interpreter.
//!
//! [`Interpreter`] consumes the `exec` stack one atom at a time until it is empty or a limit in
//! [`PushConfig`] trips. Runs never fail: every outcome, including malformed programs, is reported
//! as a [`Termination`] inside the [`RunResult`].
//!
//! An interpreter owns a reusable [`PushState`]; after a run, [`Interpreter::state`] exposes the
//! final stacks.

use core::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::atom::{Atom, CodeBlock};
use crate::config::{Program, PushConfig};
use crate::instructions::{InstrError, InstructionSet};
use crate::state::PushState;
use crate::trace::{InstrOutcome, TraceMask, TraceSink};
use crate::types::{RegistryError, StackId, TypeRegistry};
use crate::value::Value;

/// Name of the pseudo-output holding the `stdout` buffer.
pub const STDOUT: &str = "stdout";

/// Why a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    /// `exec` was exhausted.
    Normal,
    /// [`PushConfig::step_limit`] atoms were dispatched and work remained.
    StepLimitExceeded,
    /// [`PushConfig::runtime_limit_ms`] elapsed.
    TimeLimitExceeded,
    /// One instruction pushed more than [`PushConfig::growth_cap`] items.
    GrowthCapExceeded,
    /// An instruction name did not resolve.
    UnknownInstruction(Box<str>),
    /// An `Input` atom referred past the end of the inputs.
    InvalidInputIndex(usize),
    /// A value or stack did not match the type library.
    TypeError(Box<str>),
}

impl Termination {
    /// Returns `true` for [`Termination::Normal`].
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::StepLimitExceeded => write!(f, "step limit exceeded"),
            Self::TimeLimitExceeded => write!(f, "time limit exceeded"),
            Self::GrowthCapExceeded => write!(f, "growth cap exceeded"),
            Self::UnknownInstruction(name) => write!(f, "unknown instruction: {name}"),
            Self::InvalidInputIndex(i) => write!(f, "invalid input index: {i}"),
            Self::TypeError(detail) => write!(f, "type error: {detail}"),
        }
    }
}

impl core::error::Error for Termination {}

/// Outputs of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    /// Top of each requested output stack, `None` if it was empty or unknown.
    pub outputs: Vec<Option<Value>>,
    /// Everything the program printed.
    pub stdout: String,
    /// Why the run ended.
    pub termination: Termination,
    /// Atoms dispatched.
    pub steps_taken: usize,
}

struct Tracer<'a> {
    mask: TraceMask,
    sink: Option<&'a mut dyn TraceSink>,
}

impl<'a> Tracer<'a> {
    fn on(&mut self, bit: TraceMask) -> Option<&mut (dyn TraceSink + 'a)> {
        if self.mask.contains(bit) {
            self.sink.as_deref_mut()
        } else {
            None
        }
    }
}

/// Runs Push code against a type library and instruction set.
#[derive(Debug)]
pub struct Interpreter {
    registry: Arc<TypeRegistry>,
    instructions: Arc<InstructionSet>,
    state: PushState,
}

impl Interpreter {
    /// Creates an interpreter, checking that every instruction's stacks are registered.
    pub fn new(
        registry: Arc<TypeRegistry>,
        instructions: Arc<InstructionSet>,
    ) -> Result<Self, RegistryError> {
        instructions.validate(&registry)?;
        let state = PushState::new(&registry);
        Ok(Self {
            registry,
            instructions,
            state,
        })
    }

    /// Creates an interpreter over the core types and the full built-in instruction set.
    #[must_use]
    pub fn with_core() -> Self {
        let registry = TypeRegistry::core();
        let instructions = InstructionSet::core(&registry);
        let state = PushState::new(&registry);
        Self {
            registry: Arc::new(registry),
            instructions: Arc::new(instructions),
            state,
        }
    }

    /// Returns the type library.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Returns the instruction set.
    #[must_use]
    pub fn instructions(&self) -> &Arc<InstructionSet> {
        &self.instructions
    }

    /// Returns the state left by the last run.
    #[must_use]
    pub fn state(&self) -> &PushState {
        &self.state
    }

    /// Runs a program with the outputs and limits of its signature.
    pub fn run(&mut self, program: &Program, inputs: &[Value]) -> RunResult {
        let sig = &program.signature;
        self.run_code(&program.code, inputs, &sig.output_stacks, &sig.push_config)
    }

    /// Runs code with explicit outputs and limits.
    pub fn run_code<S: AsRef<str>>(
        &mut self,
        code: &CodeBlock,
        inputs: &[Value],
        output_stacks: &[S],
        config: &PushConfig,
    ) -> RunResult {
        self.run_with_trace(code, inputs, output_stacks, config, TraceMask::NONE, None)
    }

    /// Runs code, reporting the events in `mask` to `trace`.
    pub fn run_with_trace<S: AsRef<str>>(
        &mut self,
        code: &CodeBlock,
        inputs: &[Value],
        output_stacks: &[S],
        config: &PushConfig,
        mask: TraceMask,
        trace: Option<&mut dyn TraceSink>,
    ) -> RunResult {
        let mut tracer = Tracer { mask, sink: trace };
        if let Some(sink) = tracer.on(TraceMask::RUN) {
            sink.run_start(code, inputs.len());
        }

        self.state.reset();
        self.state.load_inputs(inputs.iter().cloned());
        let (termination, steps_taken) =
            match self.state.push_code(StackId::EXEC, Atom::Block(code.clone())) {
                Ok(()) => self.execute(config, &mut tracer),
                Err(e) => (Termination::TypeError(e.to_string().into()), 0),
            };

        if let Some(sink) = tracer.on(TraceMask::RUN) {
            sink.run_end(steps_taken, &termination);
        }
        RunResult {
            outputs: output_stacks
                .iter()
                .map(|name| self.output(name.as_ref()))
                .collect(),
            stdout: self.state.stdout().to_owned(),
            termination,
            steps_taken,
        }
    }

    fn output(&self, name: &str) -> Option<Value> {
        if name == STDOUT {
            return Some(Value::Str(self.state.stdout().to_owned()));
        }
        let id = self.registry.id_of(name)?;
        self.state.top(id).cloned()
    }

    fn execute(&mut self, config: &PushConfig, tracer: &mut Tracer<'_>) -> (Termination, usize) {
        let started = Instant::now();
        let budget = Duration::from_millis(config.runtime_limit_ms);
        let mut steps = 0;
        loop {
            if self.state.depth(StackId::EXEC) == 0 {
                return (Termination::Normal, steps);
            }
            if steps >= config.step_limit {
                return (Termination::StepLimitExceeded, steps);
            }
            if started.elapsed() > budget {
                return (Termination::TimeLimitExceeded, steps);
            }
            let atom = match self.state.pop_code(StackId::EXEC) {
                Ok(atom) => atom,
                Err(e) => return (Termination::TypeError(e.to_string().into()), steps),
            };
            steps += 1;
            if let Some(sink) = tracer.on(TraceMask::STEP) {
                sink.step(steps, &atom);
            }
            if let Err(t) = self.dispatch(atom, config, steps, tracer) {
                return (t, steps);
            }
        }
    }

    fn dispatch(
        &mut self,
        atom: Atom,
        config: &PushConfig,
        step: usize,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), Termination> {
        match atom {
            Atom::Literal(lit) => {
                let Some(pt) = self.registry.get(lit.push_type) else {
                    return Err(Termination::TypeError(
                        format!("literal {} names an unregistered stack", lit.value).into(),
                    ));
                };
                if !pt.is_instance(&lit.value) {
                    let detail = format!(
                        "literal {} does not belong on the {} stack",
                        lit.value,
                        pt.name()
                    );
                    return Err(Termination::TypeError(detail.into()));
                }
                self.state
                    .push(lit.push_type, lit.value)
                    .map_err(type_error)
            }
            Atom::Input(i) => {
                let v = self
                    .state
                    .inputs()
                    .get(i)
                    .cloned()
                    .ok_or(Termination::InvalidInputIndex(i))?;
                let atom = match v {
                    Value::Code(atom) => *atom,
                    other => self
                        .registry
                        .literal_atom(other)
                        .map_err(|e| Termination::TypeError(e.to_string().into()))?,
                };
                self.state.push_code(StackId::EXEC, atom).map_err(type_error)
            }
            Atom::Instruction(meta) => self.eval_instruction(&meta.name, config, step, tracer),
            Atom::JitInstruction(name) => self.eval_instruction(&name, config, step, tracer),
            Atom::Block(block) => {
                for a in block.iter().rev() {
                    self.state
                        .push_code(StackId::EXEC, a.clone())
                        .map_err(type_error)?;
                }
                Ok(())
            }
            // Genome-only marker; a no-op if it reaches exec.
            Atom::Closer => Ok(()),
        }
    }

    fn eval_instruction(
        &mut self,
        name: &str,
        config: &PushConfig,
        step: usize,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), Termination> {
        let instructions = Arc::clone(&self.instructions);
        let Some(instr) = instructions.get(name) else {
            return Err(Termination::UnknownInstruction(name.into()));
        };
        if let Some(sink) = tracer.on(TraceMask::INSTR) {
            sink.instr_enter(name, step);
        }

        self.state.begin();
        let (outcome, result) = match instr.eval(&mut self.state, config) {
            Ok(()) if self.state.pushed() > config.growth_cap => {
                self.state.rollback();
                (InstrOutcome::Terminated, Err(Termination::GrowthCapExceeded))
            }
            Ok(()) => {
                let pushed = self.state.commit();
                (InstrOutcome::Committed { pushed }, Ok(()))
            }
            Err(InstrError::Revert) => {
                self.state.rollback();
                if let Some(sink) = tracer.on(TraceMask::REVERT) {
                    sink.revert(name, step);
                }
                (InstrOutcome::Reverted, Ok(()))
            }
            Err(InstrError::TypeError(detail)) => {
                self.state.rollback();
                (InstrOutcome::Terminated, Err(Termination::TypeError(detail)))
            }
        };

        if let Some(sink) = tracer.on(TraceMask::INSTR) {
            sink.instr_exit(name, step, outcome);
        }
        result
    }
}

fn type_error(e: InstrError) -> Termination {
    match e {
        InstrError::TypeError(detail) => Termination::TypeError(detail),
        InstrError::Revert => Termination::TypeError("unexpected revert".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Literal;
    use crate::config::ProgramSignature;

    fn run(code: Vec<Atom>, inputs: &[Value], outputs: &[&str]) -> (Interpreter, RunResult) {
        let mut interp = Interpreter::with_core();
        let r = interp.run_code(
            &CodeBlock::new(code),
            inputs,
            outputs,
            &PushConfig::default(),
        );
        (interp, r)
    }

    #[test]
    fn blocks_execute_in_order() {
        let (interp, r) = run(
            vec![
                Atom::int(1),
                Atom::block([Atom::int(2), Atom::int(3)]),
                Atom::instruction("int_sub"),
            ],
            &[],
            &["int"],
        );
        assert_eq!(r.termination, Termination::Normal);
        assert_eq!(r.outputs, vec![Some(Value::Int(-1))]);
        assert_eq!(
            interp.state().stack(StackId::INT).unwrap(),
            &[Value::Int(1), Value::Int(-1)]
        );
        // Outer block, three atoms, inner block, two literals.
        assert_eq!(r.steps_taken, 6);
    }

    #[test]
    fn unknown_instruction_terminates() {
        let (_, r) = run(vec![Atom::instruction("int_frobnicate")], &[], &[]);
        assert_eq!(
            r.termination,
            Termination::UnknownInstruction("int_frobnicate".into())
        );
    }

    #[test]
    fn mistyped_literal_terminates() {
        let (interp, r) = run(
            vec![
                Atom::int(1),
                Atom::Literal(Literal::new(Value::from("x"), StackId::INT)),
            ],
            &[],
            &["int"],
        );
        assert!(matches!(r.termination, Termination::TypeError(_)));
        assert_eq!(r.outputs, vec![Some(Value::Int(1))]);
        assert_eq!(interp.state().depth(StackId::INT), 1);
    }

    #[test]
    fn input_routing() {
        let (interp, r) = run(
            vec![Atom::Input(0), Atom::Input(1)],
            &[Value::Float(1.5), Value::from(Atom::int(7))],
            &["float", "int", "missing"],
        );
        assert_eq!(r.termination, Termination::Normal);
        assert_eq!(r.outputs, vec![Some(Value::Float(1.5)), Some(Value::Int(7)), None]);
        assert_eq!(interp.state().inputs().len(), 2);

        let (_, r) = run(vec![Atom::Input(3)], &[], &[]);
        assert_eq!(r.termination, Termination::InvalidInputIndex(3));
    }

    #[test]
    fn growth_cap_aborts_the_run() {
        let (_, r) = run(
            vec![Atom::int(1), Atom::int(600), Atom::instruction("int_dup_times")],
            &[],
            &["int"],
        );
        assert_eq!(r.termination, Termination::GrowthCapExceeded);
    }

    #[test]
    fn stdout_is_an_output() {
        let (_, r) = run(
            vec![Atom::str("hi"), Atom::instruction("print_str")],
            &[],
            &[STDOUT],
        );
        assert_eq!(r.stdout, "hi");
        assert_eq!(r.outputs, vec![Some(Value::from("hi"))]);
    }

    #[test]
    fn run_uses_signature_limits() {
        let mut interp = Interpreter::with_core();
        let program = Program::new(
            CodeBlock::new(vec![Atom::int(1); 10]),
            ProgramSignature::new(0, ["int"])
                .with_config(PushConfig::default().with_step_limit(4)),
        );
        let r = interp.run(&program, &[]);
        assert_eq!(r.termination, Termination::StepLimitExceeded);
        assert_eq!(r.steps_taken, 4);
        assert_eq!(interp.state().depth(StackId::INT), 3);
    }

    #[test]
    fn state_is_reset_between_runs() {
        let mut interp = Interpreter::with_core();
        let code = CodeBlock::new(vec![Atom::int(1)]);
        let cfg = PushConfig::default();
        interp.run_code(&code, &[], &["int"], &cfg);
        interp.run_code(&code, &[], &["int"], &cfg);
        assert_eq!(interp.state().depth(StackId::INT), 1);
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TraceSink for Recorder {
        fn mask(&self) -> TraceMask {
            TraceMask::ALL
        }

        fn instr_enter(&mut self, name: &str, _step: usize) {
            self.events.push(format!("enter {name}"));
        }

        fn revert(&mut self, name: &str, _step: usize) {
            self.events.push(format!("revert {name}"));
        }

        fn run_end(&mut self, steps: usize, termination: &Termination) {
            self.events.push(format!("end {steps} {termination}"));
        }
    }

    #[test]
    fn trace_sink_sees_reverts() {
        let mut interp = Interpreter::with_core();
        let mut rec = Recorder::default();
        let mask = rec.mask();
        let code = CodeBlock::new(vec![Atom::instruction("int_add")]);
        interp.run_with_trace(
            &code,
            &[],
            &["int"],
            &PushConfig::default(),
            mask,
            Some(&mut rec),
        );
        assert_eq!(
            rec.events,
            vec!["enter int_add", "revert int_add", "end 2 normal"]
        );
    }
}
