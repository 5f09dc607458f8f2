// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stack-based, homoiconic interpreter for the Push language.
//!
//! Push programs operate on one stack per registered type. Code is itself data: the `exec` stack
//! holds the code still to run, and the `code` stack lets programs build and rearrange code at
//! run time. The interpreter is built for genetic programming, where almost every program is
//! nonsense, so:
//!
//! - an instruction whose preconditions are not met has no effect (it *reverts*), and
//! - every run is bounded by the resource governor in [`PushConfig`].
//!
//! Programs are evolved as linear [`Genome`]s and translated to nested [`CodeBlock`]s with
//! [`genome_to_code`].
//!
//! ## Example
//!
//! ```
//! use push_vm::{Atom, CodeBlock, Interpreter, PushConfig, Termination, Value};
//!
//! let mut vm = Interpreter::with_core();
//! let code = CodeBlock::new(vec![Atom::int(2), Atom::int(3), Atom::instruction("int_add")]);
//! let result = vm.run_code(&code, &[], &["int"], &PushConfig::default());
//! assert_eq!(result.termination, Termination::Normal);
//! assert_eq!(result.outputs, vec![Some(Value::Int(5))]);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: the type library and stack ids.
//! - [`value`], [`atom`]: runtime values and program atoms.
//! - [`state`]: the stacks and their undo journal.
//! - [`instructions`]: built-in instructions and [`InstructionSet`].
//! - [`interpreter`]: the run loop.
//! - [`genome`], [`simplify`]: linear genomes and simplification.
//! - [`codec`]: JSON form of programs and genomes.
//! - [`trace`]: observation hooks.

pub mod atom;
pub mod codec;
pub mod config;
pub mod genome;
pub mod instructions;
pub mod interpreter;
pub mod simplify;
pub mod state;
pub mod trace;
pub mod types;
pub mod value;

pub use atom::{Atom, CodeBlock, InstructionMeta, Literal, OPEN_PAREN};
pub use codec::{Codec, CodecError};
pub use config::{Program, ProgramSignature, PushConfig};
pub use genome::{Gene, Genome, code_to_genome, genome_to_code, normalize};
pub use instructions::{InstrError, Instruction, InstructionSet};
pub use interpreter::{Interpreter, RunResult, STDOUT, Termination};
pub use simplify::{ErrorFunction, GenomeSimplifier};
pub use state::PushState;
pub use trace::{InstrOutcome, TraceMask, TraceSink};
pub use types::{PushType, RegistryError, StackId, TypeRegistry};
pub use value::{CustomValue, Value};
