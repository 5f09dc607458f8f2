// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::string::String;

/// Optional label resolver for profiling scopes.
///
/// Return `None` to fall back to the instruction name.
pub trait LabelResolver {
    /// Resolve a label for an instruction scope.
    fn instruction_label(&mut self, _name: &str) -> Option<String> {
        None
    }
}

/// Default resolver that labels each scope with the instruction name.
#[derive(Default, Debug)]
pub struct DefaultLabelResolver;

impl LabelResolver for DefaultLabelResolver {}

/// Resolver that groups instructions by the stack they operate on.
///
/// `int_add` and `int_dup` both resolve to `stack:int`; `vector_float_nth` resolves to
/// `stack:vector_float`.
#[derive(Default, Debug)]
pub struct StackLabelResolver {
    cache: HashMap<String, String>,
}

impl LabelResolver for StackLabelResolver {
    fn instruction_label(&mut self, name: &str) -> Option<String> {
        if let Some(label) = self.cache.get(name) {
            return Some(label.clone());
        }
        let label = format!("stack:{}", stack_prefix(name)?);
        self.cache.insert(name.into(), label.clone());
        Some(label)
    }
}

fn stack_prefix(name: &str) -> Option<&str> {
    let split = if name.starts_with("vector_") {
        name.match_indices('_').nth(1)?.0
    } else {
        name.find('_')?
    };
    Some(&name[..split])
}

pub(crate) fn default_instruction_label(name: &str) -> String {
    format!("instr:{name}")
}

#[cfg(test)]
mod tests {
    use super::{LabelResolver, StackLabelResolver};

    #[test]
    fn groups_by_stack_prefix() {
        let mut r = StackLabelResolver::default();
        assert_eq!(r.instruction_label("int_add").as_deref(), Some("stack:int"));
        assert_eq!(
            r.instruction_label("vector_float_nth").as_deref(),
            Some("stack:vector_float")
        );
        assert_eq!(r.instruction_label("int_add").as_deref(), Some("stack:int"));
        assert_eq!(r.instruction_label("noop"), None);
    }
}
