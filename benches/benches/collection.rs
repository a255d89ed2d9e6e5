// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use understory_collection::{Collection, Keyed};

#[derive(Clone)]
struct Row {
    id: String,
    rank: u32,
}

impl Keyed for Row {
    fn id(&self) -> &str {
        &self.id
    }
}

fn rows(start: usize, len: usize) -> Vec<Row> {
    (start..start + len)
        .map(|i| Row {
            id: format!("row-{i}"),
            rank: (i as u32).wrapping_mul(2_654_435_761),
        })
        .collect()
}

fn bench_append_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection/append_pages");

    // Pages of 50 appended one after another, as an infinite list does.
    for pages in [10usize, 100, 400] {
        let batches: Vec<Vec<Row>> = (0..pages).map(|p| rows(p * 50, 50)).collect();
        group.throughput(Throughput::Elements((pages * 50) as u64));

        group.bench_with_input(BenchmarkId::new("add", pages), &batches, |b, batches| {
            b.iter_batched(
                || batches.clone(),
                |batches| {
                    let mut c = Collection::new();
                    for batch in batches {
                        c.add(batch).unwrap();
                    }
                    black_box(c.len());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("upsert", pages), &batches, |b, batches| {
            b.iter_batched(
                || batches.clone(),
                |batches| {
                    let mut c = Collection::new();
                    for batch in batches {
                        c.upsert(batch).unwrap();
                    }
                    black_box(c.len());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_sorted_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection/sorted_read");

    for len in [1_000usize, 10_000] {
        let mut collection = Collection::new();
        collection.add(rows(0, len)).unwrap();
        collection.sort(|a: &Row, b: &Row| a.rank.cmp(&b.rank));
        group.throughput(Throughput::Elements(len as u64));

        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter(|| black_box(collection.items().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append_pages, bench_sorted_read);
criterion_main!(benches);
