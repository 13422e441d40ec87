//! Many scenarios applied in parallel against one shared baseline
//!
//! Run with: cargo test --package tn-scenario --test concurrency_tests

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tn_modification::{AdjustDwellTime, AdjustSpeed, ModifyStreets, RemoveTrips};
use tn_network::{Envelope, TransportNetwork};
use tn_scenario::telemetry::init_tracing_with_default;
use tn_scenario::{ApplicatorConfig, BaselineCheck, Scenario, ScenarioApplicator, ScenarioCache};
use tn_test_utils::{grid_point, shared_baseline, FEED_CHECKSUM, FEED_ID};

const SCENARIOS: usize = 64;

#[allow(clippy::cast_precision_loss)]
fn nth_scenario(i: usize) -> Scenario {
    let scale = 1.0 + i as f64 / 16.0;
    let scenario = Scenario::new()
        .with_id(format!("s{i}"))
        .with_feed_checksum(FEED_ID, FEED_CHECKSUM);
    match i % 4 {
        0 => scenario.with_modification(AdjustSpeed::new(["r1"], scale)),
        1 => scenario.with_modification(AdjustDwellTime::scale(["r2"], scale)),
        2 => {
            let (lat, lon) = grid_point(i % 4, i % 3);
            let envelope = Envelope::new(lat - 1e-4, lon - 1e-4, lat + 1e-4, lon + 1e-4);
            scenario.with_modification(ModifyStreets::scale_speed(envelope, scale))
        }
        _ => scenario
            .with_modification(RemoveTrips::trips(["r1-0830"]))
            .with_modification(AdjustSpeed::new(["r2"], scale)),
    }
}

fn applicator() -> ScenarioApplicator {
    init_tracing_with_default("warn");
    ScenarioApplicator::new(ApplicatorConfig::new().with_verify_baseline_unchanged(true))
}

#[test]
fn parallel_applications_leave_baseline_intact() {
    let baseline = shared_baseline();
    let before = baseline.checksum();
    let applicator = applicator();

    let results: Vec<_> = (0..SCENARIOS)
        .into_par_iter()
        .map(|i| {
            let applied = applicator.apply(&mut nth_scenario(i), &baseline).unwrap();
            (applied.baseline_check, applied.network.checksum())
        })
        .collect();

    assert_eq!(baseline.checksum(), before);
    assert!(results.iter().all(|(check, _)| *check == BaselineCheck::Unchanged));
    let distinct: BTreeSet<_> = results.iter().map(|(_, checksum)| *checksum).collect();
    assert_eq!(distinct.len(), SCENARIOS);
}

#[test]
fn parallel_results_match_sequential_results() {
    let baseline = shared_baseline();
    let applicator = applicator();

    let parallel: Vec<_> = (0..SCENARIOS)
        .into_par_iter()
        .map(|i| applicator.apply(&mut nth_scenario(i), &baseline).unwrap().network.checksum())
        .collect();
    let sequential: Vec<_> = (0..SCENARIOS)
        .map(|i| applicator.apply(&mut nth_scenario(i), &baseline).unwrap().network.checksum())
        .collect();

    assert_eq!(parallel, sequential);
}

#[test]
fn shared_cache_serves_concurrent_requests() {
    let cache = ScenarioCache::for_baseline(shared_baseline(), 128);
    let applicator = applicator();

    let networks: Vec<Arc<TransportNetwork>> = (0..SCENARIOS * 4)
        .into_par_iter()
        .map(|i| cache.get_or_apply(&applicator, &mut nth_scenario(i % SCENARIOS)).unwrap())
        .collect();

    for (i, network) in networks.iter().enumerate() {
        let expected = cache.get(&format!("s{}", i % SCENARIOS)).unwrap();
        assert_eq!(network.checksum(), expected.checksum());
    }
    assert_eq!(cache.baseline().checksum(), cache.baseline_checksum());
}
