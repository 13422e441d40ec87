//! Cross-layer stop linkage
//!
//! Everything here is derived from the street and transit layers: which
//! street vertex each stop is linked to, the street vertices reachable
//! around each stop ("stop trees"), and stop-to-stop transfers. It is owned
//! separately from both layers so that a street-only scenario can rebuild
//! it without copying the transit layer.

use crate::geometry::Envelope;
use crate::ids::{StopIndex, VertexId};
use crate::street::StreetLayer;
use crate::transit::TransitLayer;
use serde::{Deserialize, Serialize};

/// Radii used when linking stops to streets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageParams {
    /// Maximum stop-to-vertex distance for a link
    pub link_radius_meters: f64,
    /// Radius of street vertices recorded around each stop
    pub stop_tree_radius_meters: f64,
    /// Maximum stop-to-stop transfer distance
    pub transfer_radius_meters: f64,
}

impl Default for LinkageParams {
    fn default() -> Self {
        Self {
            link_radius_meters: 300.0,
            stop_tree_radius_meters: 2000.0,
            transfer_radius_meters: 1000.0,
        }
    }
}

/// Link state of one stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopLink {
    /// Never linked; new stops start here
    Pending,
    /// No connected street vertex within the link radius
    Unlinked,
    /// Linked to a street vertex
    Linked(VertexId),
}

/// Street vertices around a stop with straight-line distances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopTree {
    /// `(vertex, distance in millimetres)`, nearest first
    pub vertices: Vec<(VertexId, u32)>,
}

/// A walking connection between two stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Destination stop
    pub to: StopIndex,
    /// Straight-line distance in millimetres
    pub distance_mm: u32,
}

/// Which stops to relink
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopSelection {
    /// Every stop
    All,
    /// Stops never linked
    Pending,
    /// Stops never linked plus stops inside the envelope
    PendingOrWithin(Envelope),
}

/// Stop links, stop trees and transfers, indexed by stop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopLinkage {
    links: Vec<StopLink>,
    trees: Vec<StopTree>,
    transfers: Vec<Vec<Transfer>>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_mm(meters: f64) -> u32 {
    (meters * 1000.0).round() as u32
}

impl StopLinkage {
    /// Create empty linkage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stops covered
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no stops are covered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link state of a stop; stops beyond the covered range are pending
    #[must_use]
    pub fn link(&self, stop: StopIndex) -> StopLink {
        self.links
            .get(stop.index())
            .copied()
            .unwrap_or(StopLink::Pending)
    }

    /// Linked vertex of a stop, if any
    #[must_use]
    pub fn linked_vertex(&self, stop: StopIndex) -> Option<VertexId> {
        match self.link(stop) {
            StopLink::Linked(v) => Some(v),
            StopLink::Pending | StopLink::Unlinked => None,
        }
    }

    /// Stop tree of a stop
    #[must_use]
    pub fn stop_tree(&self, stop: StopIndex) -> Option<&StopTree> {
        self.trees.get(stop.index())
    }

    /// Transfers leaving a stop
    #[must_use]
    pub fn transfers(&self, stop: StopIndex) -> &[Transfer] {
        self.transfers.get(stop.index()).map_or(&[], Vec::as_slice)
    }

    /// Total number of transfers
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.transfers.iter().map(Vec::len).sum()
    }

    /// Relink the selected stops and rebuild their stop trees
    ///
    /// Returns the relinked stops in index order; they are the starting set
    /// for transfer recomputation.
    pub fn link_stops(
        &mut self,
        street: &StreetLayer,
        transit: &TransitLayer,
        params: &LinkageParams,
        selection: StopSelection,
    ) -> Vec<StopIndex> {
        let n = transit.stop_count();
        self.links.resize(n, StopLink::Pending);
        self.trees.resize(n, StopTree::default());
        self.transfers.resize(n, Vec::new());

        let dirty: Vec<StopIndex> = transit
            .stops()
            .filter(|(index, stop)| match selection {
                StopSelection::All => true,
                StopSelection::Pending => self.links[index.index()] == StopLink::Pending,
                StopSelection::PendingOrWithin(region) => {
                    self.links[index.index()] == StopLink::Pending
                        || region.contains(&stop.coordinate)
                }
            })
            .map(|(index, _)| index)
            .collect();

        for &index in &dirty {
            let Some(stop) = transit.stop(index) else {
                continue;
            };
            let (link, tree) = match street.nearest_vertex(&stop.coordinate, params.link_radius_meters) {
                Some((vertex, _)) => {
                    let vertices = street
                        .vertices_within(&stop.coordinate, params.stop_tree_radius_meters)
                        .into_iter()
                        .map(|(v, d)| (v, to_mm(d)))
                        .collect();
                    (StopLink::Linked(vertex), StopTree { vertices })
                }
                None => (StopLink::Unlinked, StopTree::default()),
            };
            self.links[index.index()] = link;
            self.trees[index.index()] = tree;
        }
        tracing::debug!(relinked = dirty.len(), stops = n, "linked stops to street layer");
        dirty
    }

    pub(crate) fn set_transfers(&mut self, stop: StopIndex, transfers: Vec<Transfer>) {
        if let Some(slot) = self.transfers.get_mut(stop.index()) {
            *slot = transfers;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::street::Permissions;
    use crate::transit::Stop;

    fn fixture() -> (StreetLayer, TransitLayer) {
        let mut street = StreetLayer::new();
        let a = street.add_vertex(Coordinate::from_degrees(45.0, 7.0));
        let b = street.add_vertex(Coordinate::from_degrees(45.002, 7.0));
        street.add_street(a, b, 500, Permissions::ALL).unwrap();

        let mut transit = TransitLayer::new();
        transit
            .add_stop(Stop {
                id: "near".into(),
                name: "Near".into(),
                coordinate: Coordinate::from_degrees(45.0001, 7.0),
            })
            .unwrap();
        transit
            .add_stop(Stop {
                id: "far".into(),
                name: "Far".into(),
                coordinate: Coordinate::from_degrees(46.0, 7.0),
            })
            .unwrap();
        (street, transit)
    }

    #[test]
    fn links_near_stops_and_marks_far_ones_unlinked() {
        let (street, transit) = fixture();
        let mut linkage = StopLinkage::new();
        let dirty = linkage.link_stops(&street, &transit, &LinkageParams::default(), StopSelection::All);
        assert_eq!(dirty, vec![StopIndex(0), StopIndex(1)]);
        assert_eq!(linkage.linked_vertex(StopIndex(0)), Some(VertexId(0)));
        assert_eq!(linkage.link(StopIndex(1)), StopLink::Unlinked);
        assert_eq!(linkage.stop_tree(StopIndex(0)).unwrap().vertices.len(), 2);
        assert!(linkage.stop_tree(StopIndex(1)).unwrap().vertices.is_empty());
    }

    #[test]
    fn pending_selection_only_touches_new_stops() {
        let (street, mut transit) = fixture();
        let params = LinkageParams::default();
        let mut linkage = StopLinkage::new();
        linkage.link_stops(&street, &transit, &params, StopSelection::All);

        transit
            .add_stop(Stop {
                id: "new".into(),
                name: "New".into(),
                coordinate: Coordinate::from_degrees(45.002, 7.0),
            })
            .unwrap();
        assert_eq!(linkage.link(StopIndex(2)), StopLink::Pending);
        let dirty = linkage.link_stops(&street, &transit, &params, StopSelection::Pending);
        assert_eq!(dirty, vec![StopIndex(2)]);
        assert_eq!(linkage.linked_vertex(StopIndex(2)), Some(VertexId(1)));
    }

    #[test]
    fn region_selection_includes_stops_inside() {
        let (street, transit) = fixture();
        let params = LinkageParams::default();
        let mut linkage = StopLinkage::new();
        linkage.link_stops(&street, &transit, &params, StopSelection::All);

        let region = Envelope::of_point(&Coordinate::from_degrees(46.0, 7.0)).buffered(10.0);
        let dirty = linkage.link_stops(&street, &transit, &params, StopSelection::PendingOrWithin(region));
        assert_eq!(dirty, vec![StopIndex(1)]);
    }
}
