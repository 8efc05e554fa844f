//! Benchmarks for property propagation and particle filtering
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::rc::Rc;
use visgraph::adaptor::{
    filtered::{gather, remap_bonds},
    FilteredAdaptor, FrameAdaptor, ProviderExt,
};
use visgraph::frame::{keys, Frame};
use visgraph::property::Property;
use visgraph::types::{Array, BondPair, Vec3};

fn positions(count: usize) -> Array<Vec3> {
    (0..count)
        .map(|i| Vec3::new(i as f32, 0.0, 0.0))
        .collect::<Vec<_>>()
        .into()
}

fn bench_link_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_chain");

    for depth in [1, 16, 128].iter() {
        group.bench_with_input(BenchmarkId::new("set_and_read", depth), depth, |b, &depth| {
            let root: Property<f32> = Property::new();
            let mut chain = vec![root.clone()];
            for _ in 0..depth {
                let next = Property::new();
                if let Some(last) = chain.last() {
                    next.set_linked_source(Some(last)).ok();
                }
                chain.push(next);
            }
            let tail = chain.last().cloned().unwrap_or_else(Property::new);
            let mut value = 0.0f32;
            b.iter(|| {
                value += 1.0;
                root.set_value(black_box(value));
                black_box(tail.value().ok())
            });
        });
    }

    group.finish();
}

fn bench_gather(c: &mut Criterion) {
    let mut group = c.benchmark_group("gather");

    for size in [1_000, 10_000, 100_000].iter() {
        let values = positions(*size);
        let filter: Vec<u32> = (0..*size as u32).step_by(2).collect();
        group.throughput(Throughput::Elements(filter.len() as u64));
        group.bench_with_input(BenchmarkId::new("every_other", size), size, |b, _| {
            b.iter(|| black_box(gather(&values, &filter)));
        });
    }

    group.finish();
}

fn bench_remap_bonds(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap_bonds");

    for size in [1_000, 10_000, 100_000].iter() {
        let bonds: Vec<BondPair> = (0..*size as u32 - 1)
            .map(|i| BondPair::new(i, i + 1))
            .collect();
        let filter: Vec<u32> = (0..*size as u32).filter(|i| i % 3 != 0).collect();
        group.throughput(Throughput::Elements(bonds.len() as u64));
        group.bench_with_input(BenchmarkId::new("chain", size), size, |b, _| {
            b.iter(|| black_box(remap_bonds(&bonds, &filter)));
        });
    }

    group.finish();
}

fn bench_filtered_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_frame");

    for size in [1_000, 10_000, 100_000].iter() {
        let frame_adaptor = Rc::new(FrameAdaptor::new());
        let filtered = FilteredAdaptor::new();
        filtered.set_parent(&frame_adaptor);
        let exposed = filtered
            .get_or_create::<Array<Vec3>>(keys::PARTICLE_POSITIONS)
            .ok();
        filtered
            .particle_filter()
            .set_value((0..*size as u32 / 2).collect::<Vec<_>>().into());
        let frame = Frame::new().with(keys::PARTICLE_POSITIONS, positions(*size));

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("apply_and_read", size), size, |b, _| {
            b.iter(|| {
                frame_adaptor.on_new_frame(black_box(&frame));
                black_box(exposed.as_ref().and_then(|p| p.try_value()))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_link_chain,
    bench_gather,
    bench_remap_bonds,
    bench_filtered_frame,
);

criterion_main!(benches);
