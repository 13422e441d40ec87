//! Serialized form of the built-in modifications

use crate::kinds::{
    AddStreets, AddTrips, AdjustDwellTime, AdjustSpeed, ModifyStreets, RemoveStops, RemoveStreets,
    RemoveTrips,
};
use crate::modification::Modification;
use serde::{Deserialize, Serialize};

/// Any built-in modification, tagged by its `type` field
///
/// ```json
/// { "type": "adjust-speed", "routes": ["r1"], "scale": 1.5, "comment": "bus lanes" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModificationDocument {
    /// See [`ModifyStreets`]
    ModifyStreets(ModifyStreets),
    /// See [`RemoveStreets`]
    RemoveStreets(RemoveStreets),
    /// See [`AddStreets`]
    AddStreets(AddStreets),
    /// See [`RemoveTrips`]
    RemoveTrips(RemoveTrips),
    /// See [`RemoveStops`]
    RemoveStops(RemoveStops),
    /// See [`AdjustSpeed`]
    AdjustSpeed(AdjustSpeed),
    /// See [`AdjustDwellTime`]
    AdjustDwellTime(AdjustDwellTime),
    /// See [`AddTrips`]
    AddTrips(AddTrips),
}

impl ModificationDocument {
    /// Box the contained modification
    #[must_use]
    pub fn into_modification(self) -> Box<dyn Modification> {
        match self {
            Self::ModifyStreets(m) => Box::new(m),
            Self::RemoveStreets(m) => Box::new(m),
            Self::AddStreets(m) => Box::new(m),
            Self::RemoveTrips(m) => Box::new(m),
            Self::RemoveStops(m) => Box::new(m),
            Self::AdjustSpeed(m) => Box::new(m),
            Self::AdjustDwellTime(m) => Box::new(m),
            Self::AddTrips(m) => Box::new(m),
        }
    }

    /// The contained modification
    #[must_use]
    pub fn as_modification(&self) -> &dyn Modification {
        match self {
            Self::ModifyStreets(m) => m,
            Self::RemoveStreets(m) => m,
            Self::AddStreets(m) => m,
            Self::RemoveTrips(m) => m,
            Self::RemoveStops(m) => m,
            Self::AdjustSpeed(m) => m,
            Self::AdjustDwellTime(m) => m,
            Self::AddTrips(m) => m,
        }
    }
}

impl From<ModificationDocument> for Box<dyn Modification> {
    fn from(document: ModificationDocument) -> Self {
        document.into_modification()
    }
}
