//! Scenario modifications
//!
//! Units of change applied to a [`tn_network::TransportNetwork`].
//!
//! # Core Concepts
//!
//! - [`Modification`]: trait with a sort key, a resolve step, an apply step
//!   and affected-layer flags
//! - [`Diagnostics`]: comment and warnings owned by each modification
//! - [`StepFailure`]: why a resolve or apply step failed
//! - [`ModificationDocument`]: serde form of the built-in kinds
//!
//! # Built-in kinds
//!
//! | type | sort order | layer |
//! |------|-----------:|-------|
//! | [`ModifyStreets`] | 10 | street |
//! | [`RemoveStreets`] | 15 | street |
//! | [`AddStreets`] | 20 | street |
//! | [`RemoveTrips`] | 30 | transit |
//! | [`RemoveStops`] | 40 | transit |
//! | [`AdjustSpeed`] | 50 | transit |
//! | [`AdjustDwellTime`] | 60 | transit |
//! | [`AddTrips`] | 70 | transit |

#![warn(unreachable_pub)]

mod document;
mod kinds;
mod modification;

pub use document::ModificationDocument;
pub use kinds::{
    AddStreets, AddTrips, AdjustDwellTime, AdjustSpeed, ModifyStreets, RemoveStops, RemoveStreets,
    RemoveTrips, StopSpec,
};
pub use modification::{Diagnostics, Modification, StepFailure};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
