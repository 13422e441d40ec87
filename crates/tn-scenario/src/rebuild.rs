//! Derived-index rebuild after modifications are applied
//!
//! Street changes invalidate edge lists everywhere and stop trees near the
//! changed edges. Transit changes invalidate the transient transit indexes
//! and any stop tree or transfer touching a new stop. The scoped policy
//! rebuilds exactly those; it may rebuild more than needed, never less.
//! The full policy relinks every stop and recomputes every transfer; layers
//! shared with the baseline are left alone under either policy.

use crate::config::RebuildPolicy;
use tn_network::{Envelope, LayerScope, NetworkError, StopSelection, TransportNetwork};

/// Which rebuild stages ran
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RebuildSummary {
    /// Street edge lists rebuilt
    pub edge_lists: bool,
    /// Transit transient indexes rebuilt
    pub transient_indexes: bool,
    /// Changed street area, buffered by the stop-tree radius
    pub region: Option<Envelope>,
    /// Stops whose link and stop tree were rebuilt
    pub relinked_stops: usize,
    /// Stops whose transfers were recomputed
    pub transfer_stops: usize,
}

/// Rebuild the derived indexes of a freshly modified copy
///
/// # Errors
/// Returns [`NetworkError::LayerShared`] if a stage needs a layer that was
/// not copied; with a scope computed from the applied modifications this
/// means a modification mutated a layer it did not declare.
pub fn rebuild_derived_indexes(
    network: &mut TransportNetwork,
    scope: LayerScope,
    policy: RebuildPolicy,
) -> Result<RebuildSummary, NetworkError> {
    let mut summary = RebuildSummary::default();
    if scope.is_empty() {
        return Ok(summary);
    }

    if scope.street {
        network.build_edge_lists()?;
        summary.edge_lists = true;
        let buffer = network.params().stop_tree_radius_meters;
        summary.region = network.changed_edges_bounding_geometry(buffer);
    }
    if scope.transit {
        network.rebuild_transient_indexes()?;
        summary.transient_indexes = true;
    }

    let selection = match (policy, summary.region) {
        (RebuildPolicy::Full, _) => Some(StopSelection::All),
        (RebuildPolicy::Scoped, Some(region)) => Some(StopSelection::PendingOrWithin(region)),
        (RebuildPolicy::Scoped, None) if scope.transit => Some(StopSelection::Pending),
        (RebuildPolicy::Scoped, None) => None,
    };
    if let Some(selection) = selection {
        let dirty = network.rebuild_stop_trees(selection)?;
        summary.relinked_stops = dirty.len();
        summary.transfer_stops = if policy == RebuildPolicy::Full {
            network.find_all_transfers()?
        } else {
            network.find_transfers(&dirty)?
        };
    }

    tracing::info!(
        "Rebuilt derived indexes: edge lists {}, transient indexes {}, {} stops relinked, {} transfer lists",
        summary.edge_lists,
        summary.transient_indexes,
        summary.relinked_stops,
        summary.transfer_stops
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_network::{Coordinate, Permissions, Stop};
    use tn_test_utils::baseline_network;

    #[test]
    fn nothing_to_do_for_empty_scope() {
        let mut copy = baseline_network().scoped_copy(LayerScope::NONE);
        let summary = rebuild_derived_indexes(&mut copy, LayerScope::NONE, RebuildPolicy::Scoped).unwrap();
        assert_eq!(summary, RebuildSummary::default());
    }

    #[test]
    fn street_change_relinks_stops_in_region() {
        let baseline = baseline_network();
        let mut copy = baseline.scoped_copy(LayerScope::STREET);
        copy.street_layer_mut()
            .unwrap()
            .set_permissions(tn_network::EdgeId(0), Permissions::WALK)
            .unwrap();
        let summary = rebuild_derived_indexes(&mut copy, LayerScope::STREET, RebuildPolicy::Scoped).unwrap();
        assert!(summary.edge_lists);
        assert!(!summary.transient_indexes);
        assert!(summary.region.is_some());
        assert!(summary.relinked_stops > 0);
        assert!(copy.shares_transit_layer_with(&baseline));
    }

    #[test]
    fn unchanged_streets_skip_stop_trees() {
        let baseline = baseline_network();
        let mut copy = baseline.scoped_copy(LayerScope::STREET);
        let summary = rebuild_derived_indexes(&mut copy, LayerScope::STREET, RebuildPolicy::Scoped).unwrap();
        assert!(summary.edge_lists);
        assert!(summary.region.is_none());
        assert_eq!(summary.relinked_stops, 0);
    }

    #[test]
    fn new_stop_is_linked_and_gets_transfers() {
        let baseline = baseline_network();
        let mut copy = baseline.scoped_copy(LayerScope::TRANSIT);
        let new = copy
            .transit_layer_mut()
            .unwrap()
            .add_stop(Stop {
                id: "n".into(),
                name: "New".into(),
                coordinate: Coordinate::from_degrees(45.0021, 7.0031),
            })
            .unwrap();
        let summary = rebuild_derived_indexes(&mut copy, LayerScope::TRANSIT, RebuildPolicy::Scoped).unwrap();
        assert_eq!(summary.relinked_stops, 1);
        assert!(summary.transfer_stops > 1);
        assert!(copy.linkage().linked_vertex(new).is_some());
        assert!(!copy.linkage().transfers(new).is_empty());
    }

    #[test]
    fn transit_only_scope_rejects_street_rebuild() {
        let baseline = baseline_network();
        let mut copy = baseline.scoped_copy(LayerScope::TRANSIT);
        let err = rebuild_derived_indexes(&mut copy, LayerScope::ALL, RebuildPolicy::Scoped).unwrap_err();
        assert_eq!(err, NetworkError::LayerShared(tn_network::LayerKind::Street));
    }
}
