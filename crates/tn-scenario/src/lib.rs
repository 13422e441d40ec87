//! Scenario application for layered transport networks
//!
//! Applies an ordered set of modifications to a copy of a baseline network,
//! leaving the baseline untouched so it can be shared by any number of
//! concurrent applications.
//!
//! # Core Concepts
//!
//! - [`Scenario`]: modifications plus the feed checksums of the baseline
//!   they were written for
//! - [`ScenarioApplicator`]: integrity check, canonical ordering, scoped
//!   copy, resolve, apply, derived-index rebuild
//! - [`ScenarioCache`]: modified networks of one baseline keyed by scenario id
//! - [`ScenarioError`]: which phase failed and the diagnostics of every
//!   modification involved
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tn_scenario::{ScenarioApplicator, ScenarioDocument, Scenario};
//!
//! # fn example(baseline: Arc<tn_network::TransportNetwork>, json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scenario: Scenario = ScenarioDocument::from_json(json)?.into();
//! let applied = ScenarioApplicator::default().apply(&mut scenario, &baseline)?;
//!
//! println!("Relinked {} stops", applied.rebuild.relinked_stops);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod applicator;
mod cache;
mod config;
mod error;
mod integrity;
mod ordering;
mod rebuild;
mod scenario;
pub mod telemetry;

pub use applicator::{AppliedScenario, BaselineCheck, ScenarioApplicator};
pub use cache::{CacheStats, ScenarioCache};
pub use config::{ApplicatorConfig, ConfigError, RebuildPolicy};
pub use error::{IntegrityError, InvariantViolation, ModificationReport, Phase, ScenarioError};
pub use integrity::{verify as verify_integrity, IntegrityStatus};
pub use ordering::{canonicalize, is_canonical};
pub use rebuild::{rebuild_derived_indexes, RebuildSummary};
pub use scenario::{Scenario, ScenarioDocument};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for applying scenarios
    pub use crate::{
        ApplicatorConfig, AppliedScenario, RebuildPolicy, Scenario, ScenarioApplicator,
        ScenarioCache, ScenarioDocument, ScenarioError,
    };
    pub use tn_modification::{Modification, ModificationDocument};
    pub use tn_network::{LayerScope, TransportNetwork};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
