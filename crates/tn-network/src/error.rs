//! Network errors

use crate::ids::{EdgeId, PatternIndex, RouteIndex, StopIndex, VertexId};
use std::fmt;

/// One of the independently shared parts of a [`crate::TransportNetwork`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Street graph
    Street,
    /// Transit schedule
    Transit,
    /// Cross-layer stop linkage (derived)
    Linkage,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Street => f.write_str("street layer"),
            Self::Transit => f.write_str("transit layer"),
            Self::Linkage => f.write_str("stop linkage"),
        }
    }
}

/// Network errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Mutable access requested for a layer shared with another network
    #[error("{0} is shared with the baseline and may not be mutated")]
    LayerShared(LayerKind),

    /// Unknown street vertex
    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    /// Unknown or removed street edge
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Unknown stop index
    #[error("stop {0} not found")]
    StopNotFound(StopIndex),

    /// Unknown route index
    #[error("route {0} not found")]
    RouteNotFound(RouteIndex),

    /// Unknown pattern index
    #[error("pattern {0} not found")]
    PatternNotFound(PatternIndex),

    /// Identifier already in use
    #[error("duplicate {kind} id: {id}")]
    DuplicateId {
        /// Record kind
        kind: &'static str,
        /// Offending id
        id: String,
    },

    /// Trip times do not fit the pattern they belong to
    #[error("trip {trip_id}: {reason}")]
    InvalidTrip {
        /// Trip id
        trip_id: String,
        /// What is wrong
        reason: String,
    },
}
