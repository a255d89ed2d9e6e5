// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use understory_virtual_list::{ElementPool, compute_visible_range};

fn bench_visible_range(c: &mut Criterion) {
    c.bench_function("virtual_list/compute_visible_range", |b| {
        let mut scroll = 0.0;
        b.iter(|| {
            scroll = (scroll + 37.0) % 4_800_000.0;
            black_box(compute_visible_range(
                black_box(scroll),
                800.0,
                48.0,
                100_000,
                3,
            ))
        });
    });
}

fn bench_scroll_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("virtual_list/scroll_sweep");

    // Each step moves the viewport by `step` pixels over a 100k-row strip.
    for step in [12.0_f64, 240.0, 2_400.0] {
        group.bench_with_input(BenchmarkId::from_parameter(step), &step, |b, &step| {
            let mut pool = ElementPool::<usize>::new();
            let mut scroll = 0.0;
            b.iter(|| {
                scroll = (scroll + step) % 4_800_000.0;
                let range = compute_visible_range(scroll, 800.0, 48.0, 100_000, 3);
                let stats = pool.sync(range.realized(), |i, _| i, |_| {});
                black_box(stats)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_visible_range, bench_scroll_sweep);
criterion_main!(benches);
