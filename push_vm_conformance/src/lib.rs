// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance and regression tests for `push_vm`.
//!
//! The tests live in `tests/`:
//! - `acceptance.rs`: end-to-end scenarios.
//! - `properties.rs`: seeded randomized checks of atomicity, translation, and codec invariants.
