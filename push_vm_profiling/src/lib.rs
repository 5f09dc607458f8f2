// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Profiling adapters for `push_vm` (currently Tracy).
//!
//! This crate is `std`-only and keeps `push_vm` itself free of profiling dependencies.
//! It listens for instruction enter/exit callbacks and emits matching profiling scopes.
//!
//! ## Backend
//! This crate currently supports the Tracy backend via `tracy-client`.
//!
//! ## Example
//! ```ignore
//! use push_vm::trace::TraceSink;
//! use push_vm_profiling::ProfilingTraceSink;
//!
//! let mut sink = ProfilingTraceSink::new();
//! let mask = sink.mask();
//! let result = vm.run_with_trace(&code, &inputs, &["int"], &config, mask, Some(&mut sink));
//! ```

mod resolver;
mod sink;

pub use resolver::{DefaultLabelResolver, LabelResolver, StackLabelResolver};
pub use sink::ProfilingTraceSink;
