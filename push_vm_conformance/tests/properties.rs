// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

//! Seeded randomized checks of the interpreter, translator, and codec invariants.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use push_vm::simplify::total_error;
use push_vm::{
    Atom, CodeBlock, Codec, Gene, Genome, GenomeSimplifier, InstrError, InstructionSet,
    Interpreter, OPEN_PAREN, PushConfig, PushState, StackId, TypeRegistry, Value, code_to_genome,
    genome_to_code, normalize,
};

const CASES: usize = 200;

fn library() -> (TypeRegistry, InstructionSet) {
    let registry = TypeRegistry::core();
    let set = InstructionSet::core(&registry);
    (registry, set)
}

fn random_literal(rng: &mut StdRng) -> Atom {
    match rng.gen_range(0..5) {
        0 => Atom::int(rng.gen_range(-20..20)),
        1 => Atom::float(f64::from(rng.gen_range(-40_i32..40)) / 4.0),
        2 => Atom::bool(rng.r#gen()),
        3 => Atom::char(*[' ', 'a', 'b', '\n', '7'].choose(rng).unwrap()),
        _ => Atom::str(*["", "a b", "hello", "x y z"].choose(rng).unwrap()),
    }
}

fn random_atom(rng: &mut StdRng, set: &InstructionSet, names: &[Arc<str>]) -> Atom {
    match rng.gen_range(0..10) {
        0..=3 => random_literal(rng),
        4 => Atom::Input(rng.gen_range(0..2)),
        _ => set.atom(names.choose(rng).unwrap()).unwrap(),
    }
}

fn random_genome(rng: &mut StdRng, set: &InstructionSet, names: &[Arc<str>]) -> Genome {
    let len = rng.gen_range(0..40);
    (0..len)
        .map(|_| {
            let atom = match rng.gen_range(0..8) {
                0 => Atom::Closer,
                1 => set.atom(OPEN_PAREN).unwrap(),
                _ => random_atom(rng, set, names),
            };
            Gene::new(atom)
                .silent(rng.gen_bool(0.1))
                .with_closes(if rng.gen_bool(0.2) { rng.gen_range(1..3) } else { 0 })
        })
        .collect()
}

fn random_value(rng: &mut StdRng, id: StackId) -> Value {
    match id {
        StackId::EXEC | StackId::CODE => Value::Code(Box::new(match rng.gen_range(0..3) {
            0 => random_literal(rng),
            1 => Atom::block((0..rng.gen_range(0..4)).map(|_| random_literal(rng))),
            _ => Atom::block([]),
        })),
        StackId::BOOL => Value::Bool(rng.r#gen()),
        StackId::INT => Value::Int(rng.gen_range(-8..8)),
        StackId::FLOAT => Value::Float(f64::from(rng.gen_range(-16_i32..16)) / 2.0),
        StackId::CHAR => Value::Char(*['a', ' ', 'Z', '3'].choose(rng).unwrap()),
        StackId::STR => Value::from(*["", "ab", "a b a", "xyz"].choose(rng).unwrap()),
        StackId::VECTOR_BOOL => {
            Value::BoolVec((0..rng.gen_range(0..4)).map(|_| rng.r#gen()).collect())
        }
        StackId::VECTOR_INT => {
            Value::IntVec((0..rng.gen_range(0..4)).map(|_| rng.gen_range(-3..3)).collect())
        }
        StackId::VECTOR_FLOAT => Value::FloatVec(
            (0..rng.gen_range(0..4))
                .map(|_| f64::from(rng.gen_range(-3_i32..3)))
                .collect(),
        ),
        StackId::VECTOR_CHAR => {
            Value::CharVec((0..rng.gen_range(0..4)).map(|_| 'q').collect())
        }
        _ => Value::StrVec((0..rng.gen_range(0..4)).map(|_| "s".to_owned()).collect()),
    }
}

fn random_state(rng: &mut StdRng, registry: &TypeRegistry) -> PushState {
    let mut st = PushState::new(registry);
    for (id, _) in registry.iter() {
        for _ in 0..rng.gen_range(0..4) {
            st.push(id, random_value(rng, id)).unwrap();
        }
    }
    st
}

#[test]
fn reverted_instructions_leave_state_untouched() {
    let (registry, set) = library();
    let config = PushConfig::default();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut reverts = 0;
    for _ in 0..20 {
        let base = random_state(&mut rng, &registry);
        for instr in set.iter() {
            let mut st = base.clone();
            st.begin();
            match instr.eval(&mut st, &config) {
                Ok(()) => {
                    st.commit();
                }
                Err(InstrError::Revert) => {
                    st.rollback();
                    reverts += 1;
                    assert_eq!(st, base, "{} left effects after reverting", instr.name());
                }
                Err(InstrError::TypeError(detail)) => {
                    panic!("{} raised a type error on core stacks: {detail}", instr.name())
                }
            }
        }
    }
    assert!(reverts > 0, "no instruction reverted");
}

#[test]
fn runs_respect_the_step_limit() {
    let (_, set) = library();
    let names = set.names();
    let mut vm = Interpreter::with_core();
    let config = PushConfig::default().with_step_limit(200);
    let mut rng = StdRng::seed_from_u64(11);
    let inputs = [Value::from("a b"), Value::Int(3)];
    for _ in 0..CASES {
        let code: CodeBlock = (0..rng.gen_range(1..30))
            .map(|_| random_atom(&mut rng, &set, &names))
            .collect();
        let r = vm.run_code(&code, &inputs, &["int", "stdout"], &config);
        assert!(r.steps_taken <= 200, "{code} took {} steps", r.steps_taken);
        assert!(
            !matches!(r.termination, push_vm::Termination::TypeError(_)),
            "{code} ended with {}",
            r.termination
        );
    }
}

#[test]
fn genome_round_trips_up_to_normalization() {
    let (_, set) = library();
    let names = set.names_with_prefix("exec_");
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..CASES {
        let g = random_genome(&mut rng, &set, &names);
        let code = genome_to_code(&g, usize::MAX);
        assert_eq!(code_to_genome(&code), normalize(&g), "genome {g:?}");
        assert_eq!(genome_to_code(&code_to_genome(&code), usize::MAX), code);
    }
}

#[test]
fn insertion_adds_one_point() {
    let (_, set) = library();
    let names = set.names_with_prefix("exec_");
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let code = genome_to_code(&random_genome(&mut rng, &set, &names), usize::MAX);
        for n in 0..code.size() {
            assert!(code.code_at_point(n).is_some(), "point {n} of {code}");
            let grown = code.with_code_inserted_at_point(Atom::int(99), n);
            assert_eq!(grown.size(), code.size() + 1, "insert at {n} into {code}");
        }
        assert!(code.code_at_point(code.size()).is_none());
    }
}

#[test]
fn simplifier_never_worsens() {
    let (_, set) = library();
    let names = set.names_with_prefix("int_");
    let mut vm = Interpreter::with_core();
    let config = PushConfig::default();
    // Target: 2x.
    let mut eval = |code: &CodeBlock| -> Vec<f64> {
        (0..5_i64)
            .map(|x| {
                let r = vm.run_code(code, &[Value::Int(x), Value::Int(0)], &["int"], &config);
                match r.outputs[0] {
                    Some(Value::Int(y)) => (y - 2 * x).abs() as f64,
                    _ => 1000.0,
                }
            })
            .collect()
    };
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..20 {
        let mut genes: Vec<Gene> = vec![
            Gene::new(Atom::Input(0)),
            Gene::new(Atom::Input(0)),
            Gene::new(set.atom("int_add").unwrap()),
        ];
        for _ in 0..rng.gen_range(0..8) {
            let at = rng.gen_range(0..=genes.len());
            genes.insert(at, Gene::new(random_atom(&mut rng, &set, &names)));
        }
        let genome = Genome::new(genes);
        let baseline = eval(&genome_to_code(&genome, 1000));
        let (simplified, errors) =
            GenomeSimplifier::new(30).simplify(&genome, &baseline, &mut eval, &mut rng);
        assert!(total_error(&errors) <= total_error(&baseline));
        assert!(simplified.len() <= genome.len());
        assert_eq!(eval(&genome_to_code(&simplified, 1000)), errors);
    }
}

#[test]
fn codec_round_trips_translated_programs() {
    let (registry, set) = library();
    let names = set.names();
    let codec = Codec::new(&registry, &set);
    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..CASES {
        let g = random_genome(&mut rng, &set, &names);
        let code = genome_to_code(&g, usize::MAX);
        let text = codec.encode_program(&code).unwrap();
        assert_eq!(codec.decode_program(&text).unwrap(), code, "{text}");
        let genome_text = codec.encode_genome(&g).unwrap();
        assert_eq!(codec.decode_genome(&genome_text).unwrap(), g, "{genome_text}");
    }
}

#[test]
fn codec_output_is_plain_json() {
    let (registry, set) = library();
    let codec = Codec::new(&registry, &set);
    let code = CodeBlock::new(vec![Atom::float(1.5), Atom::block([Atom::Input(1)])]);
    let json: serde_json::Value =
        serde_json::from_str(&codec.encode_program(&code).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"a": "lit", "t": "float", "v": 1.5},
            [{"a": "input", "i": 1}]
        ])
    );
}
