// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

/// Benchmark the pure register address resolver.
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use votf_ring::resolver::{RegCandidates, resolve};
use votf_ring::table::EndpointTable;
use votf_ring::test_helpers::test_slots;
use votf_ring::types::{EndpointId, Service};

fn resolve_all_channels(c: &mut Criterion) {
    let table = EndpointTable::build(&test_slots()).unwrap();
    let candidates = RegCandidates::enable();

    c.bench_function("resolve_m16s16_sweep", |b| {
        b.iter(|| {
            for id in 0..16 {
                let tws = EndpointId::new(Service::Tws, 2, id);
                let trs = EndpointId::new(Service::Trs, 5, id);
                black_box(resolve(&table, &tws, &candidates).unwrap());
                black_box(resolve(&table, &trs, &candidates).unwrap());
            }
        });
    });
}

criterion_group!(benches, resolve_all_channels);
criterion_main!(benches);
