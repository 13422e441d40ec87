//! Cost of copying only the affected layers versus the whole network

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tn_modification::{AdjustSpeed, ModifyStreets};
use tn_network::{Envelope, LayerScope, LinkageParams, TransportNetwork};
use tn_scenario::{Scenario, ScenarioApplicator};
use tn_test_utils::{grid_point, grid_street_layer, two_route_transit_layer};

const LARGE_GRID: usize = 60;

fn large_network() -> TransportNetwork {
    TransportNetwork::build(
        grid_street_layer(LARGE_GRID),
        two_route_transit_layer(),
        LinkageParams::default(),
    )
}

fn bench_scoped_copy(c: &mut Criterion) {
    let network = large_network();
    let mut group = c.benchmark_group("scoped_copy");
    for (name, scope) in [
        ("none", LayerScope::NONE),
        ("transit", LayerScope::TRANSIT),
        ("street", LayerScope::STREET),
        ("all", LayerScope::ALL),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &scope, |b, &scope| {
            b.iter(|| black_box(network.scoped_copy(scope)));
        });
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let network = large_network();
    let applicator = ScenarioApplicator::default();
    let (lat0, lon0) = grid_point(10, 10);
    let (lat1, lon1) = grid_point(12, 12);
    let envelope = Envelope::new(lat0, lon0, lat1, lon1);

    let mut group = c.benchmark_group("apply");
    group.bench_function("transit_only", |b| {
        b.iter(|| {
            let mut scenario = Scenario::new().with_modification(AdjustSpeed::new(["r1"], 1.5));
            black_box(applicator.apply(&mut scenario, &network))
        });
    });
    group.bench_function("street_only", |b| {
        b.iter(|| {
            let mut scenario =
                Scenario::new().with_modification(ModifyStreets::scale_speed(envelope, 0.5));
            black_box(applicator.apply(&mut scenario, &network))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_scoped_copy, bench_apply);
criterion_main!(benches);
