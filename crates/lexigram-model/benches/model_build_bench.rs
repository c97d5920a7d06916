//! Benchmarks `CountModel::build` and `NGramModel::build` on a synthetic
//! large sequence set, to catch quadratic-blowup regressions rather than to
//! assert correctness.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lexigram_common::{Sequence, SequenceKind, SequenceSet, Token};
use lexigram_model::{CountModel, NGramModel, SplitMode};

fn synthetic_sequence_set(sequence_count: usize, tokens_per_sequence: usize) -> SequenceSet {
    let mut set = SequenceSet::new();
    let names = ["alpha", "beta", "gamma", "delta", "epsilon"];
    for i in 0..sequence_count {
        let mut sequence = Sequence::new(format!("bench.module_{i}"), SequenceKind::Def);
        for j in 0..tokens_per_sequence {
            let name = names[j % names.len()];
            sequence.push(Token::call(format!("{name}()"), (j + 1) as u32));
        }
        set.insert(format!("bench.module_{i}"), vec![sequence]);
    }
    set
}

fn bench_count_model_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_model_build");
    for tokens_per_sequence in [16usize, 64, 128] {
        let sequences = synthetic_sequence_set(20, tokens_per_sequence);
        group.bench_with_input(BenchmarkId::from_parameter(tokens_per_sequence), &sequences, |b, sequences| {
            b.iter(|| black_box(CountModel::build("bench", sequences, true, None)));
        });
    }
    group.finish();
}

fn bench_ngram_model_build(c: &mut Criterion) {
    let sequences = synthetic_sequence_set(20, 64);
    let counts = CountModel::build("bench", &sequences, true, None);
    c.bench_function("ngram_model_build", |b| {
        b.iter(|| black_box(NGramModel::build(&counts, 2, 8, 1, SplitMode::Sliding)));
    });
}

criterion_group!(benches, bench_count_model_build, bench_ngram_model_build);
criterion_main!(benches);
