//! Benchmarks for grammar compilation and repeated matching.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tokex::flags::default_flags;
use tokex::tokenizer::DefaultTokenizer;

fn bench_compile(c: &mut Criterion) {
    let grammar = "(root: <x:'a'> *(xs: <v:.> sep { 'b' }))";
    c.bench_function("compile_small_grammar", |b| {
        b.iter(|| {
            let compiled = tokex::compile(black_box(grammar), true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
            black_box(compiled);
        });
    });
}

fn bench_match(c: &mut Criterion) {
    let grammar = "(root: <x:'a'> *(xs: <v:.> sep { 'b' }))";
    let compiled = tokex::compile(grammar, true, Box::new(DefaultTokenizer::default()), default_flags()).unwrap();
    let input = "a p b q b r b s b t";

    c.bench_function("match_small_grammar", |b| {
        b.iter(|| {
            let result = compiled.match_str(black_box(input), true, false);
            black_box(result);
        });
    });
}

criterion_group!(benches, bench_compile, bench_match);
criterion_main!(benches);
