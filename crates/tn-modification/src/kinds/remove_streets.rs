//! Close streets inside an area

use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use tn_network::{EdgeId, Envelope, TransportNetwork};

/// Remove every street edge touching an envelope
///
/// Removed edges are tombstoned, so edge ids stay stable. Stops near the
/// area are relinked to whatever streets remain when the scenario is
/// rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveStreets {
    /// Area of effect
    pub envelope: Envelope,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    edges: Vec<EdgeId>,
}

impl RemoveStreets {
    /// Remove streets inside `envelope`
    #[must_use]
    pub fn new(envelope: Envelope) -> Self {
        Self {
            envelope,
            diagnostics: Diagnostics::default(),
            edges: Vec::new(),
        }
    }

    /// Edges found by the last resolve
    #[inline]
    #[must_use]
    pub fn resolved_edges(&self) -> &[EdgeId] {
        &self.edges
    }
}

impl Modification for RemoveStreets {
    fn type_name(&self) -> &'static str {
        "remove-streets"
    }

    fn sort_order(&self) -> i32 {
        15
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        if !self.envelope.is_valid() {
            return Err(self.diagnostics.fail("envelope is empty or inverted"));
        }
        self.edges = network.street_layer().edges_intersecting(&self.envelope);
        if self.edges.is_empty() {
            return Err(self.diagnostics.fail("no street edges inside the envelope"));
        }
        Ok(())
    }

    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let street = network.street_layer_mut()?;
        let mut already_gone = 0usize;
        for &id in &self.edges {
            // An overlapping removal earlier in the scenario may have taken it
            if street.edge(id).is_none() {
                already_gone += 1;
                continue;
            }
            street.remove_edge(id)?;
        }
        if already_gone > 0 {
            self.diagnostics
                .warn(format!("{already_gone} edge(s) were already removed"));
        }
        tracing::debug!(
            edges = self.edges.len() - already_gone,
            remaining = street.edge_count(),
            "removed streets"
        );
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
