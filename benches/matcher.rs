//! Benchmarks the scorer alone and the full pipeline, over a synthetic
//! path corpus shaped like a large source tree.

use criterion::{criterion_group, criterion_main, Criterion};

use pathmatch::prelude::*;

fn corpus() -> Vec<String> {
    (0..50_000)
        .map(|i| format!("crate_{}/src/module_{}/file_{}.rs", i % 37, i % 211, i))
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let lines = corpus();
    let opts = MatchOptionsBuilder::default().build().unwrap();

    c.bench_function("match_item_50k", |b| {
        let mut matcher = Matcher::new(b"modfile", &opts);
        b.iter(|| {
            let mut count = 0u64;
            for line in &lines {
                if matcher.match_item(line.as_bytes()) {
                    count += 1;
                }
            }
            count
        });
    });

    for nr_threads in [1usize, 4] {
        let opts = MatchOptionsBuilder::default()
            .nr_threads(nr_threads)
            .limit(10usize)
            .build()
            .unwrap();
        c.bench_function(&format!("pipeline_50k_{nr_threads}_threads"), |b| {
            b.iter(|| {
                let source = IterSource::new(lines.iter().map(|s| s.as_str()));
                let mut count = 0u64;
                for_each_match(b"modfile", &opts, source, |_item: &str, _info| count += 1).unwrap();
                count
            });
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_matcher
);
criterion_main!(benches);
