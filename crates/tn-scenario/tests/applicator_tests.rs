//! End-to-end tests for scenario application

use tn_modification::{
    AddStreets, AddTrips, AdjustDwellTime, AdjustSpeed, ModifyStreets, RemoveStops, RemoveStreets,
    RemoveTrips, StopSpec,
};
use tn_network::{Envelope, LayerScope, Permissions, TransitMode};
use tn_scenario::telemetry::init_tracing;
use tn_scenario::{
    ApplicatorConfig, BaselineCheck, Phase, RebuildPolicy, Scenario, ScenarioApplicator,
    ScenarioDocument, ScenarioError,
};
use tn_test_utils::{
    baseline_network, call_log, grid_point, RecordingModification, FEED_CHECKSUM, FEED_ID,
};

fn applicator(policy: RebuildPolicy) -> ScenarioApplicator {
    init_tracing();
    ScenarioApplicator::new(
        ApplicatorConfig::new()
            .with_verify_baseline_unchanged(true)
            .with_rebuild_policy(policy),
    )
}

fn central_envelope() -> Envelope {
    let (lat0, lon0) = grid_point(1, 1);
    let (lat1, lon1) = grid_point(2, 2);
    Envelope::new(lat0 - 0.0001, lon0 - 0.0001, lat1 + 0.0001, lon1 + 0.0001)
}

fn mixed_scenario() -> Scenario {
    Scenario::new()
        .with_id("mixed")
        .with_feed_checksum(FEED_ID, FEED_CHECKSUM)
        .with_modification(AdjustSpeed::new(["r1"], 1.2))
        .with_modification(ModifyStreets::scale_speed(central_envelope(), 0.5))
        .with_modification(AdjustDwellTime::set(["r2"], 90).at_stops(["c"]))
        .with_modification(AddTrips::uniform(
            "r3",
            TransitMode::Bus,
            vec![StopSpec::existing("a"), StopSpec::new_at("n", 45.0041, 7.0061)],
            240,
            20,
            vec![25_200, 27_000],
        ))
}

#[test]
fn baseline_is_never_modified() {
    let baseline = baseline_network();
    let before = baseline.checksum();
    let street_edges = baseline.street_layer().edge_count();
    let trips = baseline.transit_layer().trip_count();

    let applied = applicator(RebuildPolicy::Scoped)
        .apply(&mut mixed_scenario(), &baseline)
        .unwrap();

    assert_eq!(applied.baseline_check, BaselineCheck::Unchanged);
    assert_eq!(baseline.checksum(), before);
    assert_eq!(baseline.street_layer().edge_count(), street_edges);
    assert_eq!(baseline.transit_layer().trip_count(), trips);
    assert!(baseline.transit_layer().route_index("r3").is_none());
    assert_eq!(applied.network.transit_layer().trip_count(), trips + 2);
}

#[test]
fn application_is_deterministic() {
    let baseline = baseline_network();
    let first = applicator(RebuildPolicy::Scoped)
        .apply(&mut mixed_scenario(), &baseline)
        .unwrap();
    let second = applicator(RebuildPolicy::Scoped)
        .apply(&mut mixed_scenario(), &baseline)
        .unwrap();
    assert_eq!(first.network.checksum(), second.network.checksum());
    assert_eq!(first.network.linkage(), second.network.linkage());
}

#[test]
fn modifications_run_in_sort_order() {
    let baseline = baseline_network();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_modification(RecordingModification::new("three", 3, &log))
        .with_modification(RecordingModification::new("one", 1, &log))
        .with_modification(RecordingModification::new("two", 2, &log));

    applicator(RebuildPolicy::Scoped).apply(&mut scenario, &baseline).unwrap();

    assert_eq!(
        *log.lock(),
        [
            "one:resolve",
            "two:resolve",
            "three:resolve",
            "one:apply",
            "two:apply",
            "three:apply"
        ]
    );
}

#[test]
fn equal_sort_orders_keep_authored_order() {
    let baseline = baseline_network();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_modification(RecordingModification::new("late", 9, &log))
        .with_modification(RecordingModification::new("b", 5, &log))
        .with_modification(RecordingModification::new("a", 5, &log));

    applicator(RebuildPolicy::Scoped).apply(&mut scenario, &baseline).unwrap();

    let applies: Vec<_> = log
        .lock()
        .iter()
        .filter(|call| call.ends_with(":apply"))
        .cloned()
        .collect();
    assert_eq!(applies, ["b:apply", "a:apply", "late:apply"]);
}

#[test]
fn apply_stops_at_first_failure() {
    let baseline = baseline_network();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_modification(RecordingModification::new("first", 1, &log))
        .with_modification(RecordingModification::new("broken", 2, &log).failing_apply())
        .with_modification(RecordingModification::new("never", 3, &log));

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Apply);
    let report = &err.reports()[0];
    assert_eq!(report.position, 1);
    assert_eq!(report.comment.as_deref(), Some("recording broken"));
    assert_eq!(report.reason, "broken refused to apply");
    assert!(log.lock().contains(&"never:resolve".to_string()));
    assert!(!log.lock().contains(&"never:apply".to_string()));
}

#[test]
fn resolve_reports_every_failure() {
    let baseline = baseline_network();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_modification(RecordingModification::new("bad1", 1, &log).failing_resolve())
        .with_modification(RecordingModification::new("good", 2, &log))
        .with_modification(RecordingModification::new("bad2", 3, &log).failing_resolve());

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Resolve);
    let positions: Vec<_> = err.reports().iter().map(|r| r.position).collect();
    assert_eq!(positions, [0, 2]);
    assert_eq!(
        log.lock().iter().filter(|call| call.ends_with(":resolve")).count(),
        3
    );
    assert!(log.lock().iter().all(|call| !call.ends_with(":apply")));
}

#[test]
fn unknown_ids_fail_resolution_with_reasons() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new()
        .with_modification(AdjustSpeed::new(["r9"], 2.0))
        .with_modification(RemoveStops::everywhere(["zz"]));

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    let ScenarioError::Invalid { failures } = &err else {
        panic!("expected resolve failure, got {err}");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].type_name, "remove-stops");
    assert_eq!(failures[0].reason, "stop zz does not exist");
    assert_eq!(failures[1].type_name, "adjust-speed");
    assert_eq!(failures[1].reason, "route r9 does not exist");
    assert_eq!(err.to_string(), "scenario invalid: 2 modification(s) failed to resolve");
}

#[test]
fn removing_too_many_stops_fails_at_apply() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new()
        .with_modification(RemoveStops::everywhere(["x", "c"]).on_routes(["r2"]))
        .with_modification(AdjustSpeed::new(["r1"], 2.0));

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Apply);
    assert_eq!(err.reports()[0].type_name, "remove-stops");
    assert!(err.reports()[0].reason.contains("would keep 1 of 3 stops"));
    assert_eq!(baseline.checksum(), baseline_network().checksum());
}

#[test]
fn failed_apply_after_mutations_leaves_baseline_intact() {
    let baseline = baseline_network();
    let before = baseline.checksum();
    let edge = baseline.street_layer().edges_intersecting(&central_envelope())[0];
    let speed = baseline.street_layer().edge(edge).unwrap().speed_cms();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_modification(ModifyStreets::scale_speed(central_envelope(), 0.5))
        .with_modification(AddTrips::uniform(
            "r3",
            TransitMode::Bus,
            vec![StopSpec::existing("a"), StopSpec::existing("d")],
            240,
            20,
            vec![25_200],
        ))
        .with_modification(RecordingModification::new("late", 100, &log).failing_apply());

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Apply);
    assert_eq!(err.reports()[0].position, 2);
    assert!(log.lock().contains(&"late:apply".to_string()));
    assert_eq!(baseline.checksum(), before);
    assert_eq!(baseline.street_layer().edge(edge).unwrap().speed_cms(), speed);
    assert!(baseline.transit_layer().route_index("r3").is_none());
    assert_eq!(baseline.transit_layer().trip_count(), 3);
}

#[test]
fn oversized_times_fail_resolution_instead_of_overflowing() {
    let baseline = baseline_network();
    let before = baseline.checksum();
    let mut scenario = Scenario::new()
        .with_modification(AdjustDwellTime::set(["r1"], u32::MAX))
        .with_modification(AdjustSpeed::new(["r1"], 1e-9))
        .with_modification(AddTrips::uniform(
            "r3",
            TransitMode::Bus,
            vec![StopSpec::existing("a"), StopSpec::existing("d")],
            240,
            20,
            vec![u32::MAX - 5],
        ));

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    let ScenarioError::Invalid { failures } = &err else {
        panic!("expected resolve failure, got {err}");
    };
    let kinds: Vec<_> = failures.iter().map(|f| f.type_name).collect();
    assert_eq!(kinds, ["adjust-speed", "adjust-dwell-time", "add-trips"]);
    assert!(failures[0].reason.contains("overflows"));
    assert!(failures[1].reason.contains("longer than a day"));
    assert!(failures[2].reason.contains("overflows"));
    assert_eq!(baseline.checksum(), before);
}

#[test]
fn street_only_scenario_shares_transit_layer() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new()
        .with_modification(ModifyStreets::set_permissions(central_envelope(), Permissions::WALK));

    let applied = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap();

    assert_eq!(scenario.layer_scope(), LayerScope::STREET);
    assert!(applied.network.shares_transit_layer_with(&baseline));
    assert!(!applied.network.shares_street_layer_with(&baseline));
    assert!(applied.rebuild.edge_lists);
    assert!(!applied.rebuild.transient_indexes);
}

#[test]
fn transit_only_scenario_shares_street_layer() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new().with_modification(RemoveTrips::trips(["r1-0830"]));

    let applied = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap();

    assert!(applied.network.shares_street_layer_with(&baseline));
    assert_eq!(applied.network.transit_layer().trip_count(), 2);
    assert_eq!(baseline.transit_layer().trip_count(), 3);
}

#[test]
fn feed_mismatch_is_detected_before_resolving() {
    let baseline = baseline_network();
    let log = call_log();
    let mut scenario = Scenario::new()
        .with_feed_checksum("gtfs2", FEED_CHECKSUM)
        .with_modification(RecordingModification::new("m", 1, &log));

    let err = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap_err();

    assert_eq!(err.phase(), Phase::Integrity);
    assert!(err.reports().is_empty());
    assert!(log.lock().is_empty());
}

#[test]
fn missing_checksums_only_degrade() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new().with_modification(AdjustSpeed::new(["r2"], 1.1));

    let applied = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap();

    assert!(!applied.integrity.is_verified());
}

#[test]
fn scoped_rebuild_matches_full_rebuild() {
    let baseline = baseline_network();
    let scoped = applicator(RebuildPolicy::Scoped)
        .apply(&mut mixed_scenario(), &baseline)
        .unwrap();
    let full = applicator(RebuildPolicy::Full)
        .apply(&mut mixed_scenario(), &baseline)
        .unwrap();

    assert_eq!(scoped.network.checksum(), full.network.checksum());
    assert_eq!(scoped.network.linkage(), full.network.linkage());
    assert!(scoped.rebuild.relinked_stops <= full.rebuild.relinked_stops);
}

#[test]
fn added_street_relinks_nearby_stops() {
    let baseline = baseline_network();
    let (lat0, lon0) = grid_point(0, 0);
    let (lat1, lon1) = grid_point(4, 4);
    let mut scenario = Scenario::new()
        .with_modification(AddStreets::new(vec![(lat0, lon0), (45.0035, 7.0045), (lat1, lon1)], 50.0));

    let scoped = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap();
    let mut again = Scenario::new()
        .with_modification(AddStreets::new(vec![(lat0, lon0), (45.0035, 7.0045), (lat1, lon1)], 50.0));
    let full = applicator(RebuildPolicy::Full)
        .apply(&mut again, &baseline)
        .unwrap();

    assert!(scoped.rebuild.region.is_some());
    assert!(scoped.rebuild.relinked_stops > 0);
    assert_eq!(scoped.network.linkage(), full.network.linkage());
    assert_eq!(
        scoped.network.street_layer().vertex_count(),
        baseline.street_layer().vertex_count() + 1
    );
}

#[test]
fn removed_streets_relink_stops_like_a_full_rebuild() {
    let baseline = baseline_network();
    let edges = baseline.street_layer().edge_count();
    let removed = baseline.street_layer().edges_intersecting(&central_envelope()).len();

    let scoped = applicator(RebuildPolicy::Scoped)
        .apply(&mut Scenario::new().with_modification(RemoveStreets::new(central_envelope())), &baseline)
        .unwrap();
    let full = applicator(RebuildPolicy::Full)
        .apply(&mut Scenario::new().with_modification(RemoveStreets::new(central_envelope())), &baseline)
        .unwrap();

    assert!(scoped.rebuild.region.is_some());
    assert!(scoped.rebuild.edge_lists);
    assert_eq!(scoped.network.linkage(), full.network.linkage());
    assert_eq!(scoped.network.street_layer().edge_count(), edges - removed);
    assert!(scoped.network.shares_transit_layer_with(&baseline));
    assert_eq!(baseline.street_layer().edge_count(), edges);
}

#[test]
fn warnings_survive_successful_application() {
    let baseline = baseline_network();
    let mut scenario = Scenario::new()
        .with_modification(RemoveStops::everywhere(["x"]).on_routes(["r1"]))
        .with_modification(AdjustSpeed::new(["r1"], 1.1));

    applicator(RebuildPolicy::Scoped).apply(&mut scenario, &baseline).unwrap();

    let remove = &scenario.modifications()[0];
    assert_eq!(remove.type_name(), "remove-stops");
    assert_eq!(
        remove.diagnostics().warnings,
        ["no pattern calls at the removed stops"]
    );
    assert!(!scenario.modifications()[1].diagnostics().has_warnings());
}

#[test]
fn json_scenario_end_to_end() {
    let json = r#"{
        "id": "weekday-upgrade",
        "description": "Faster r1, longer dwell on r2",
        "feedChecksums": {"gtfs1": 100},
        "modifications": [
            {"type": "adjust-dwell-time", "routes": ["r2"], "scale": 2.0,
             "comment": "boarding works"},
            {"type": "adjust-speed", "routes": ["r1"], "scale": 1.5}
        ]
    }"#;
    let baseline = baseline_network();
    let mut scenario: Scenario = ScenarioDocument::from_json(json).unwrap().into();

    let applied = applicator(RebuildPolicy::Scoped)
        .apply(&mut scenario, &baseline)
        .unwrap();

    assert!(applied.integrity.is_verified());
    assert_eq!(scenario.description(), "Faster r1, longer dwell on r2");
    assert_eq!(scenario.modifications()[0].type_name(), "adjust-speed");
    assert_eq!(
        scenario.modifications()[1].diagnostics().comment.as_deref(),
        Some("boarding works")
    );
    assert!(applied.network.shares_street_layer_with(&baseline));
    assert_ne!(applied.network.checksum(), baseline.checksum());
}
