// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared program fixtures for the `push_vm` wind-tunnel benchmarks.

use push_vm::{Atom, CodeBlock, Gene, Genome, InstructionSet, TypeRegistry};

/// A flat arithmetic program: `n` literal/`int_add` pairs after a seed literal.
#[must_use]
pub fn arithmetic_chain(n: usize) -> CodeBlock {
    let mut atoms = Vec::with_capacity(2 * n + 1);
    atoms.push(Atom::int(0));
    for i in 0..n {
        atoms.push(Atom::int(i64::try_from(i).unwrap_or(i64::MAX)));
        atoms.push(Atom::instruction("int_add"));
    }
    CodeBlock::new(atoms)
}

/// A counted loop summing `0..=n` with `exec_do_range`.
#[must_use]
pub fn counted_loop(set: &InstructionSet, n: i64) -> CodeBlock {
    let op = |name: &str| set.atom(name).unwrap_or_else(|| Atom::instruction(name));
    CodeBlock::new(vec![
        Atom::int(0),
        Atom::int(0),
        Atom::int(n),
        op("exec_do_range"),
        op("int_add"),
    ])
}

/// Replaces every space of input 0 with a newline, prints it, and counts the other characters.
#[must_use]
pub fn replace_space_with_newline(set: &InstructionSet) -> CodeBlock {
    let op = |name: &str| set.atom(name).unwrap_or_else(|| Atom::instruction(name));
    CodeBlock::new(vec![
        Atom::Input(0),
        op("str_dup"),
        Atom::char(' '),
        Atom::char('\n'),
        op("str_replace_all_char"),
        op("print_str"),
        Atom::char(' '),
        op("str_remove_all_char"),
        op("str_length"),
    ])
}

/// A genome of `blocks` nested `exec_dup` groups, each holding a literal.
#[must_use]
pub fn nested_genome(set: &InstructionSet, blocks: usize) -> Genome {
    let dup = set
        .atom("exec_dup")
        .unwrap_or_else(|| Atom::instruction("exec_dup"));
    let mut genes = Vec::with_capacity(blocks * 3);
    for i in 0..blocks {
        genes.push(Gene::new(dup.clone()));
        genes.push(Gene::new(Atom::int(i64::try_from(i).unwrap_or(i64::MAX))));
    }
    genes.extend((0..blocks).map(|_| Gene::closer()));
    Genome::new(genes)
}

/// The core type library and instruction set.
#[must_use]
pub fn core_library() -> (TypeRegistry, InstructionSet) {
    let registry = TypeRegistry::core();
    let set = InstructionSet::core(&registry);
    (registry, set)
}
