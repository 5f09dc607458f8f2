// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use push_vm::{
    Atom, CodeBlock, Gene, Genome, InstructionMeta, Interpreter, Literal, Program,
    ProgramSignature, PushConfig, StackId, Termination, Value, genome_to_code,
};

fn run(code: Vec<Atom>, inputs: &[Value], outputs: &[&str]) -> (Interpreter, push_vm::RunResult) {
    let mut vm = Interpreter::with_core();
    let program = Program::new(
        CodeBlock::new(code),
        ProgramSignature::new(inputs.len(), outputs.iter().copied()),
    );
    let result = vm.run(&program, inputs);
    (vm, result)
}

fn int_stack(vm: &Interpreter) -> Vec<i64> {
    vm.state()
        .stack(StackId::INT)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| match v {
            Value::Int(n) => Some(*n),
            _ => None,
        })
        .collect()
}

#[test]
fn arithmetic() {
    let (_, r) = run(
        vec![Atom::int(2), Atom::int(3), Atom::instruction("int_add")],
        &[],
        &["int"],
    );
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(r.outputs, vec![Some(Value::Int(5))]);
}

#[test]
fn div_by_zero_reverts() {
    let (vm, r) = run(
        vec![Atom::int(10), Atom::int(0), Atom::instruction("int_div")],
        &[],
        &["int"],
    );
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(int_stack(&vm), vec![10, 0]);
}

#[test]
fn replace_space_with_newline() {
    let (_, r) = run(
        vec![
            Atom::Input(0),
            Atom::instruction("str_dup"),
            Atom::char(' '),
            Atom::char('\n'),
            Atom::instruction("str_replace_all_char"),
            Atom::instruction("print_str"),
            Atom::char(' '),
            Atom::instruction("str_remove_all_char"),
            Atom::instruction("str_length"),
        ],
        &[Value::from("hello world")],
        &["stdout", "int"],
    );
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(r.stdout, "hello\nworld");
    assert_eq!(r.outputs[1], Some(Value::Int(10)));
}

#[test]
fn bounded_exec_do_range() {
    let (vm, r) = run(
        vec![
            Atom::int(0),
            Atom::int(2),
            Atom::instruction("exec_do_range"),
            Atom::int(5),
        ],
        &[],
        &["int"],
    );
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(int_stack(&vm), vec![0, 5, 1, 5, 2, 5]);
}

#[test]
fn genome_translation() {
    let genome = Genome::new(vec![
        Gene::new(Atom::Instruction(InstructionMeta::new("exec_if", 2))),
        Gene::new(Atom::bool(true)),
        Gene::closer(),
        Gene::new(Atom::int(1)),
        Gene::closer(),
        Gene::new(Atom::int(2)),
    ]);
    let code = genome_to_code(&genome, 1000);
    assert_eq!(
        code,
        CodeBlock::new(vec![
            Atom::Instruction(InstructionMeta::new("exec_if", 2)),
            Atom::block([Atom::bool(true)]),
            Atom::block([Atom::int(1)]),
            Atom::int(2),
        ])
    );

    // `exec_if` reverts on an empty `bool` stack, so both groups run.
    let mut vm = Interpreter::with_core();
    let r = vm.run_code(&code, &[], &["int"], &PushConfig::default());
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(int_stack(&vm), vec![1, 2]);

    // With a condition present, only the first group runs.
    let guarded = CodeBlock::new(vec![Atom::bool(true), Atom::Block(code)]);
    vm.run_code(&guarded, &[], &["int"], &PushConfig::default());
    assert_eq!(int_stack(&vm), vec![2]);
}

#[test]
fn self_replicating_loop_hits_step_limit() {
    let (vm, r) = run(
        vec![
            Atom::instruction("exec_dup"),
            Atom::block([Atom::int(1), Atom::instruction("exec_dup")]),
        ],
        &[],
        &["int"],
    );
    assert_eq!(r.termination, Termination::StepLimitExceeded);
    assert_eq!(r.steps_taken, 500);
    assert!(vm.state().depth(StackId::INT) <= 500);
    assert!(vm.state().depth(StackId::INT) > 0);
}

#[test]
fn time_limit() {
    let mut vm = Interpreter::with_core();
    let config = PushConfig::default()
        .with_step_limit(usize::MAX)
        .with_runtime_limit_ms(0);
    let code = CodeBlock::new(vec![
        Atom::instruction("exec_dup"),
        Atom::block([Atom::instruction("exec_dup")]),
    ]);
    let r = vm.run_code(&code, &[], &["int"], &config);
    assert_eq!(r.termination, Termination::TimeLimitExceeded);
}

#[test]
fn growth_cap_is_tight() {
    let program = |n| {
        vec![
            Atom::int(7),
            Atom::int(n),
            Atom::instruction("int_dup_times"),
        ]
    };
    let (_, r) = run(program(501), &[], &["int"]);
    assert_eq!(r.termination, Termination::GrowthCapExceeded);

    let (vm, r) = run(program(500), &[], &["int"]);
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(vm.state().depth(StackId::INT), 500);
}

#[test]
fn malformed_programs_terminate() {
    let (_, r) = run(vec![Atom::instruction("int_teleport")], &[], &[]);
    assert_eq!(
        r.termination,
        Termination::UnknownInstruction("int_teleport".into())
    );

    let (_, r) = run(vec![Atom::int(1), Atom::Input(2)], &[Value::Int(1)], &["int"]);
    assert_eq!(r.termination, Termination::InvalidInputIndex(2));
    // Outputs are still collected.
    assert_eq!(r.outputs, vec![Some(Value::Int(1))]);
}

#[test]
fn mistyped_literal_never_reaches_its_stack() {
    let (vm, r) = run(
        vec![Atom::Literal(Literal::new(Value::from("x"), StackId::INT))],
        &[],
        &["int"],
    );
    assert_eq!(
        r.termination,
        Termination::TypeError("literal x does not belong on the int stack".into())
    );
    assert_eq!(r.outputs, vec![None]);
    assert_eq!(vm.state().depth(StackId::INT), 0);
}

#[test]
fn code_as_data() {
    // Quote a block, double it with code_append, and run the result.
    let (vm, r) = run(
        vec![
            Atom::instruction("code_from_exec"),
            Atom::block([Atom::int(4)]),
            Atom::instruction("code_dup"),
            Atom::instruction("code_append"),
            Atom::instruction("code_do"),
            Atom::instruction("code_size"),
        ],
        &[],
        &["int"],
    );
    assert_eq!(r.termination, Termination::Normal);
    assert_eq!(int_stack(&vm), vec![4, 4]);
    assert_eq!(vm.state().depth(StackId::CODE), 0);
}
