//! Change speed or permissions of streets inside an area

use super::valid_factor;
use crate::modification::{Diagnostics, Modification, StepFailure};
use serde::{Deserialize, Serialize};
use tn_network::{EdgeId, Envelope, Permissions, TransportNetwork};

/// Scale the speed and/or replace the permissions of every street edge
/// touching an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyStreets {
    /// Area of effect
    pub envelope: Envelope,
    /// Multiplier applied to edge speeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_factor: Option<f64>,
    /// Replacement permissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Comment and warnings
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    edges: Vec<EdgeId>,
}

impl ModifyStreets {
    /// Scale speeds inside `envelope`
    #[must_use]
    pub fn scale_speed(envelope: Envelope, factor: f64) -> Self {
        Self {
            envelope,
            speed_factor: Some(factor),
            permissions: None,
            diagnostics: Diagnostics::default(),
            edges: Vec::new(),
        }
    }

    /// Replace permissions inside `envelope`
    #[must_use]
    pub fn set_permissions(envelope: Envelope, permissions: Permissions) -> Self {
        Self {
            envelope,
            speed_factor: None,
            permissions: Some(permissions),
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

impl Modification for ModifyStreets {
    fn type_name(&self) -> &'static str {
        "modify-streets"
    }

    fn sort_order(&self) -> i32 {
        10
    }

    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure> {
        let mut problems = Vec::new();
        if !self.envelope.is_valid() {
            problems.push("envelope is empty or inverted".to_string());
        }
        match self.speed_factor {
            Some(f) if !valid_factor(f) => {
                problems.push(format!("speed factor must be positive, got {f}"));
            }
            None if self.permissions.is_none() => {
                problems.push("neither a speed factor nor permissions given".to_string());
            }
            _ => {}
        }
        if problems.is_empty() {
            self.edges = network.street_layer().edges_intersecting(&self.envelope);
            if self.edges.is_empty() {
                problems.push("no street edges inside the envelope".to_string());
            }
        }
        self.diagnostics.check(problems)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure> {
        let street = network.street_layer_mut()?;
        for &id in &self.edges {
            if let Some(factor) = self.speed_factor {
                let current = street.edge(id).ok_or_else(|| {
                    self.diagnostics.fail(format!("edge {id} disappeared before apply"))
                })?;
                let scaled = (f64::from(current.speed_cms()) * factor)
                    .round()
                    .clamp(1.0, f64::from(u16::MAX)) as u16;
                street.set_speed(id, scaled)?;
            }
            if let Some(permissions) = self.permissions {
                street.set_permissions(id, permissions)?;
            }
        }
        tracing::debug!(edges = self.edges.len(), "modified streets");
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
