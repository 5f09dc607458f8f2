// Copyright 2026 the Push VM Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use push_vm::{Codec, Interpreter, PushConfig, Value, code_to_genome, genome_to_code};
use push_vm_wind_tunnel::{
    arithmetic_chain, core_library, counted_loop, nested_genome, replace_space_with_newline,
};

/// Entry point for `push_vm` wind-tunnel benchmarks.
///
/// Covers the dispatch loop (flat and looping programs), string instructions, genome translation,
/// and the JSON codec.
fn bench_vm(c: &mut Criterion) {
    bench_arithmetic_chain(c);
    bench_counted_loop(c);
    bench_string_program(c);
    bench_translation(c);
    bench_codec(c);
}

fn unbounded() -> PushConfig {
    PushConfig::default()
        .with_step_limit(1_000_000)
        .with_growth_cap(usize::MAX)
}

/// Raw dispatch cost of literals and a binary instruction.
fn bench_arithmetic_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("arithmetic_chain");
    let mut vm = Interpreter::with_core();
    let config = unbounded();
    for &len in &[10_usize, 100, 1_000] {
        let code = arithmetic_chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                let r = vm.run_code(black_box(&code), &[], &["int"], &config);
                black_box(r.outputs);
            });
        });
    }
    group.finish();
}

/// `exec_do_range` re-expansion on every iteration.
fn bench_counted_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("counted_loop");
    let mut vm = Interpreter::with_core();
    let config = unbounded();
    for &n in &[10_i64, 100, 1_000] {
        let code = counted_loop(vm.instructions(), n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let r = vm.run_code(black_box(&code), &[], &["int"], &config);
                black_box(r.outputs);
            });
        });
    }
    group.finish();
}

fn bench_string_program(c: &mut Criterion) {
    let mut vm = Interpreter::with_core();
    let config = PushConfig::default();
    let code = replace_space_with_newline(vm.instructions());
    let inputs = [Value::from("the quick brown fox jumps over the lazy dog")];
    c.bench_function("replace_space_with_newline", |b| {
        b.iter(|| {
            let r = vm.run_code(&code, black_box(&inputs), &["int"], &config);
            black_box(r.stdout);
        });
    });
}

fn bench_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("genome_to_code");
    let (_, set) = core_library();
    for &blocks in &[10_usize, 100] {
        let genome = nested_genome(&set, blocks);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| black_box(genome_to_code(black_box(&genome), usize::MAX)));
        });
    }
    group.finish();

    let genome = nested_genome(&set, 100);
    let code = genome_to_code(&genome, usize::MAX);
    c.bench_function("code_to_genome/100", |b| {
        b.iter(|| black_box(code_to_genome(black_box(&code))));
    });
}

fn bench_codec(c: &mut Criterion) {
    let (registry, set) = core_library();
    let codec = Codec::new(&registry, &set);
    let code = genome_to_code(&nested_genome(&set, 100), usize::MAX);
    let text = codec.encode_program(&code).unwrap();
    c.bench_function("codec/encode", |b| {
        b.iter(|| black_box(codec.encode_program(black_box(&code)).unwrap()));
    });
    c.bench_function("codec/decode", |b| {
        b.iter(|| black_box(codec.decode_program(black_box(&text)).unwrap()));
    });
}

criterion_group!(benches, bench_vm);
criterion_main!(benches);
