//! Cache behaviour through the public API

use std::sync::Arc;
use tn_modification::{AdjustSpeed, RemoveTrips};
use tn_scenario::telemetry::init_tracing;
use tn_scenario::{
    ApplicatorConfig, Phase, Scenario, ScenarioApplicator, ScenarioCache, ScenarioDocument,
};
use tn_test_utils::{baseline_network, call_log, shared_baseline, RecordingModification};

fn cache() -> ScenarioCache {
    init_tracing();
    ScenarioCache::for_baseline(shared_baseline(), 8)
}

#[test]
fn hit_skips_application() {
    let cache = cache();
    let applicator = ScenarioApplicator::default();
    let log = call_log();

    let mut first = Scenario::new()
        .with_id("recorded")
        .with_modification(RecordingModification::new("m", 1, &log));
    cache.get_or_apply(&applicator, &mut first).unwrap();
    let mut second = Scenario::new()
        .with_id("recorded")
        .with_modification(RecordingModification::new("m", 1, &log));
    cache.get_or_apply(&applicator, &mut second).unwrap();

    assert_eq!(*log.lock(), ["m:resolve", "m:apply"]);
}

#[test]
fn cached_network_reflects_scenario() {
    let cache = cache();
    let applicator = ScenarioApplicator::default();
    let mut scenario = Scenario::new()
        .with_id("fewer-trips")
        .with_modification(RemoveTrips::routes(["r2"]));

    let network = cache.get_or_apply(&applicator, &mut scenario).unwrap();

    assert_eq!(network.transit_layer().trip_count(), 2);
    assert_eq!(cache.baseline().transit_layer().trip_count(), 3);
    assert!(network.shares_street_layer_with(cache.baseline()));
}

#[test]
fn invalidate_all_empties_cache() {
    let cache = cache();
    let applicator = ScenarioApplicator::default();
    for id in ["a", "b", "c"] {
        let mut scenario = Scenario::new()
            .with_id(id)
            .with_modification(AdjustSpeed::new(["r1"], 1.5));
        cache.get_or_apply(&applicator, &mut scenario).unwrap();
    }
    assert!(cache.get("b").is_some());

    cache.invalidate_all();

    assert!(["a", "b", "c"].iter().all(|id| cache.get(id).is_none()));
}

#[test]
fn resolve_failure_is_returned_and_not_cached() {
    let cache = cache();
    let applicator = ScenarioApplicator::default();
    let document = ScenarioDocument::from_json(
        r#"{"id": "broken", "modifications": [{"type": "remove-trips", "trips": ["nope"]}]}"#,
    )
    .unwrap();

    let err = cache
        .get_or_apply(&applicator, &mut Scenario::from(document))
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Resolve);
    assert!(cache.get("broken").is_none());
}

#[test]
fn baseline_checksum_is_captured_once() {
    init_tracing();
    let baseline = Arc::new(baseline_network());
    let checksum = baseline.checksum();
    let cache = ScenarioCache::for_baseline(Arc::clone(&baseline), 8);
    assert_eq!(cache.baseline_checksum(), checksum);
    assert!(Arc::ptr_eq(cache.baseline(), &baseline));

    let verifying = ScenarioApplicator::new(ApplicatorConfig::new().with_verify_baseline_unchanged(true));
    let mut scenario = Scenario::new()
        .with_id("verified")
        .with_modification(AdjustSpeed::new(["r1"], 1.5));
    assert!(cache.get_or_apply(&verifying, &mut scenario).is_ok());
    assert_eq!(baseline.checksum(), checksum);
}
