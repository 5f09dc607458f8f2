// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource limits and program signatures.

use serde::{Deserialize, Serialize};

use crate::atom::CodeBlock;

/// Resource limits for one run.
///
/// The defaults are the contract evolved programs are scored under; callers may raise them per
/// run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Maximum atoms dispatched.
    pub step_limit: usize,
    /// Wall-clock bound in milliseconds.
    pub runtime_limit_ms: u64,
    /// Maximum items a single instruction may push.
    pub growth_cap: usize,
    /// Maximum length of any string, vector, or `stdout`.
    pub collection_size_cap: usize,
    /// Maximum points in any code value an instruction builds, and in translated genomes.
    pub max_points: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            step_limit: 500,
            runtime_limit_ms: 5000,
            growth_cap: 500,
            collection_size_cap: 1000,
            max_points: 1000,
        }
    }
}

impl PushConfig {
    /// Sets the step limit.
    #[must_use]
    pub fn with_step_limit(mut self, n: usize) -> Self {
        self.step_limit = n;
        self
    }

    /// Sets the wall-clock limit.
    #[must_use]
    pub fn with_runtime_limit_ms(mut self, ms: u64) -> Self {
        self.runtime_limit_ms = ms;
        self
    }

    /// Sets the per-step growth cap.
    #[must_use]
    pub fn with_growth_cap(mut self, n: usize) -> Self {
        self.growth_cap = n;
        self
    }

    /// Sets the collection size cap.
    #[must_use]
    pub fn with_collection_size_cap(mut self, n: usize) -> Self {
        self.collection_size_cap = n;
        self
    }

    /// Sets the code size cap.
    #[must_use]
    pub fn with_max_points(mut self, n: usize) -> Self {
        self.max_points = n;
        self
    }
}

/// How a program is called and what it returns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSignature {
    /// Number of inputs the program expects.
    pub arity: usize,
    /// Stacks whose top values are the program's outputs. `"stdout"` names the output buffer.
    pub output_stacks: Vec<String>,
    /// Limits the program runs under.
    pub push_config: PushConfig,
}

impl ProgramSignature {
    /// Creates a signature with default limits.
    pub fn new(arity: usize, output_stacks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            arity,
            output_stacks: output_stacks.into_iter().map(Into::into).collect(),
            push_config: PushConfig::default(),
        }
    }

    /// Replaces the limits.
    #[must_use]
    pub fn with_config(mut self, push_config: PushConfig) -> Self {
        self.push_config = push_config;
        self
    }
}

/// Executable code paired with its signature.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// Program body.
    pub code: CodeBlock,
    /// Calling convention and limits.
    pub signature: ProgramSignature,
}

impl Program {
    /// Creates a program.
    pub fn new(code: CodeBlock, signature: ProgramSignature) -> Self {
        Self { code, signature }
    }
}
