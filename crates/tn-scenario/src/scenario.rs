//! Scenario: an ordered set of modifications plus baseline identity

use crate::ordering;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tn_modification::{Modification, ModificationDocument};
use tn_network::LayerScope;

fn default_description() -> String {
    "no description provided".to_string()
}

/// Modifications to apply together to one baseline network
///
/// Scenarios sharing an `id` are assumed to carry identical modifications;
/// the id is used as a cache key and never checked.
#[derive(Debug)]
pub struct Scenario {
    id: Option<String>,
    description: String,
    modifications: Vec<Box<dyn Modification>>,
    feed_checksums: BTreeMap<String, u64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            id: None,
            description: default_description(),
            modifications: Vec::new(),
            feed_checksums: BTreeMap::new(),
        }
    }
}

impl Scenario {
    /// Empty scenario without id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a stable id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With a description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With the checksum of one baseline feed
    #[inline]
    #[must_use]
    pub fn with_feed_checksum(mut self, feed_id: impl Into<String>, checksum: u64) -> Self {
        self.feed_checksums.insert(feed_id.into(), checksum);
        self
    }

    /// With one more modification
    #[inline]
    #[must_use]
    pub fn with_modification(mut self, modification: impl Modification + 'static) -> Self {
        self.modifications.push(Box::new(modification));
        self
    }

    /// Append a boxed modification
    pub fn push(&mut self, modification: Box<dyn Modification>) {
        self.modifications.push(modification);
    }

    /// Stable id, if any
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Free-text description
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Modifications in their current order
    #[inline]
    #[must_use]
    pub fn modifications(&self) -> &[Box<dyn Modification>] {
        &self.modifications
    }

    pub(crate) fn modifications_mut(&mut self) -> &mut [Box<dyn Modification>] {
        &mut self.modifications
    }

    /// Feed id → checksum of the baseline this scenario was written for
    #[inline]
    #[must_use]
    pub fn feed_checksums(&self) -> &BTreeMap<String, u64> {
        &self.feed_checksums
    }

    /// Number of modifications
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    /// Whether there are no modifications
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    /// Whether any modification changes the street layer
    #[must_use]
    pub fn affects_street_layer(&self) -> bool {
        self.modifications.iter().any(|m| m.affects_street_layer())
    }

    /// Whether any modification changes the transit layer
    #[must_use]
    pub fn affects_transit_layer(&self) -> bool {
        self.modifications.iter().any(|m| m.affects_transit_layer())
    }

    /// Union of the layers every modification declares
    #[must_use]
    pub fn layer_scope(&self) -> LayerScope {
        LayerScope {
            street: self.affects_street_layer(),
            transit: self.affects_transit_layer(),
        }
    }

    /// Sort modifications into canonical order
    pub fn canonicalize(&mut self) {
        ordering::canonicalize(&mut self.modifications);
    }
}

/// Serialized scenario
///
/// ```json
/// {
///   "id": "bus-lanes-v2",
///   "description": "Faster r1",
///   "feedChecksums": { "gtfs1": 100 },
///   "modifications": [ { "type": "adjust-speed", "routes": ["r1"], "scale": 1.25 } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDocument {
    /// Stable id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-text description
    #[serde(default = "default_description")]
    pub description: String,
    /// Modifications in authored order
    #[serde(default)]
    pub modifications: Vec<ModificationDocument>,
    /// Feed id → checksum
    #[serde(default)]
    pub feed_checksums: BTreeMap<String, u64>,
}

impl ScenarioDocument {
    /// Parse from JSON
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error for malformed input
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<ScenarioDocument> for Scenario {
    fn from(document: ScenarioDocument) -> Self {
        Self {
            id: document.id,
            description: document.description,
            modifications: document
                .modifications
                .into_iter()
                .map(ModificationDocument::into_modification)
                .collect(),
            feed_checksums: document.feed_checksums,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "id": "s1",
        "feedChecksums": {"gtfs1": 100},
        "modifications": [
            {"type": "add-trips", "routeId": "r3", "mode": "bus",
             "stops": [{"id": "a"}, {"id": "d"}],
             "hopTimes": [300], "dwellTimes": [0, 0], "departures": [25200]},
            {"type": "modify-streets",
             "envelope": {"min_lat": 45.0, "min_lon": 7.0, "max_lat": 45.01, "max_lon": 7.01},
             "permissions": 1}
        ]
    }"#;

    #[test]
    fn document_converts_to_scenario() {
        let scenario: Scenario = ScenarioDocument::from_json(JSON).unwrap().into();
        assert_eq!(scenario.id(), Some("s1"));
        assert_eq!(scenario.description(), "no description provided");
        assert_eq!(scenario.len(), 2);
        assert_eq!(scenario.feed_checksums().get("gtfs1"), Some(&100));
        assert_eq!(scenario.layer_scope(), LayerScope::ALL);
    }

    #[test]
    fn canonicalize_sorts_by_sort_order() {
        let mut scenario: Scenario = ScenarioDocument::from_json(JSON).unwrap().into();
        scenario.canonicalize();
        let types: Vec<_> = scenario.modifications().iter().map(|m| m.type_name()).collect();
        assert_eq!(types, ["modify-streets", "add-trips"]);
    }

    #[test]
    fn empty_scenario_affects_nothing() {
        let scenario = Scenario::new().with_id("noop");
        assert!(scenario.is_empty());
        assert!(scenario.layer_scope().is_empty());
    }

    #[test]
    fn document_round_trips_through_json() {
        let document = ScenarioDocument::from_json(JSON).unwrap();
        let again = ScenarioDocument::from_json(&document.to_json().unwrap()).unwrap();
        assert_eq!(document, again);
    }
}
