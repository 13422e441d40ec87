//! Add a new street connected to the existing graph at both ends

use super::valid_factor;
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use tn_network::{kph_to_cms, Coordinate, Permissions, TransportNetwork, VertexId};

fn default_permissions() -> Permissions {
    Permissions::ALL
}

/// A polyline of new bidirectional street edges
///
/// The first and last points snap to the nearest connected vertex within
/// the network's link radius; intermediate points become new vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStreets {
    /// `[lat, lon]` points in order
    pub coordinates: Vec<(f64, f64)>,
    /// Speed of the new edges
    pub speed_kph: f64,
    /// Modes allowed on the new edges
    #[serde(default = "default_permissions")]
    pub permissions: Permissions,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    endpoints: Option<(VertexId, VertexId)>,
}

impl AddStreets {
    /// New street through `coordinates`
    #[must_use]
    pub fn new(coordinates: Vec<(f64, f64)>, speed_kph: f64) -> Self {
        Self {
            coordinates,
            speed_kph,
            permissions: Permissions::ALL,
            diagnostics: Diagnostics::default(),
            endpoints: None,
        }
    }

    /// Vertices the two ends snapped to during the last resolve
    #[inline]
    #[must_use]
    pub fn endpoints(&self) -> Option<(VertexId, VertexId)> {
        self.endpoints
    }
}

impl Modification for AddStreets {
    fn type_name(&self) -> &'static str {
        "add-streets"
    }

    fn sort_order(&self) -> i32 {
        20
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let mut problems = Vec::new();
        if !valid_factor(self.speed_kph) {
            problems.push(format!("speed must be positive, got {} km/h", self.speed_kph));
        }
        let (Some(&first), Some(&last)) = (self.coordinates.first(), self.coordinates.last()) else {
            return Err(self.diagnostics.fail("street has no coordinates"));
        };
        if self.coordinates.len() < 2 {
            problems.push("street needs at least two coordinates".to_string());
        }

        let radius = network.params().link_radius_meters;
        let mut snap = |(lat, lon): (f64, f64), which: &str| {
            let found = network
                .street_layer()
                .nearest_vertex(&Coordinate::from_degrees(lat, lon), radius);
            if found.is_none() {
                problems.push(format!(
                    "{which} point ({lat}, {lon}) is not within {radius} m of the street network"
                ));
            }
            found.map(|(v, _)| v)
        };
        let start = snap(first, "first");
        let end = snap(last, "last");
        self.endpoints = start.zip(end);
        self.diagnostics.check(problems)
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let Some((start, end)) = self.endpoints else {
            return Err(self.diagnostics.fail("applied before a successful resolve"));
        };
        let speed = kph_to_cms(self.speed_kph);
        let street = network.street_layer_mut()?;

        let interior = self.coordinates.len().saturating_sub(2);
        let mut path = Vec::with_capacity(interior + 2);
        path.push(start);
        for &(lat, lon) in self.coordinates.iter().skip(1).take(interior) {
            path.push(street.add_vertex(Coordinate::from_degrees(lat, lon)));
        }
        path.push(end);

        for pair in path.windows(2) {
            street.add_street(pair[0], pair[1], speed, self.permissions)?;
        }
        tracing::debug!(vertices = interior, edges = 2 * (path.len() - 1), "added street");
        Ok(())
    }

    fn affects_street_layer(&self) -> bool {
        true
    }

    fn affects_transit_layer(&self) -> bool {
        false
    }

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tn_network::LayerScope;
    use tn_test_utils::baseline_network;

    #[test]
    fn adds_polyline_between_snapped_ends() {
        let baseline = baseline_network();
        let mut copy = baseline.scoped_copy(LayerScope::STREET);
        let mut m = AddStreets::new(vec![(45.0001, 7.0), (44.999, 6.995), (45.0081, 7.0)], 50.0);
        m.resolve(&copy).unwrap();
        m.apply(&mut copy).unwrap();

        let before = baseline.street_layer();
        let after = copy.street_layer();
        assert_eq!(after.vertex_count(), before.vertex_count() + 1);
        assert_eq!(after.edge_count(), before.edge_count() + 4);
        assert_eq!(after.changes().added.len(), 4);
        let (start, end) = m.endpoints().unwrap();
        assert_eq!(after.vertex(start), Some(&Coordinate::from_degrees(45.0, 7.0)));
        assert_eq!(after.vertex(end), Some(&Coordinate::from_degrees(45.008, 7.0)));
    }

    #[test]
    fn rejects_unconnected_end_and_bad_speed() {
        let baseline = baseline_network();
        let mut m = AddStreets::new(vec![(45.0, 7.0), (46.0, 7.0)], 0.0);
        assert!(m.resolve(&baseline).is_err());
        assert_eq!(m.diagnostics().warnings.len(), 2);
        assert!(m.endpoints().is_none());
    }

    #[test]
    fn rejects_single_point() {
        let baseline = baseline_network();
        let mut m = AddStreets::new(vec![(45.0, 7.0)], 30.0);
        let err = m.resolve(&baseline).unwrap_err();
        assert_eq!(err.reason, "street needs at least two coordinates");
    }
}
