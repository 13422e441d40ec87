//! Error types for scenario application
//!
//! One error per failing phase:
//! - integrity check against the baseline's feeds
//! - resolve (every failing modification is reported)
//! - apply (the first failing modification is reported)
//! - derived-index rebuild
//!
//! A mutated baseline is reported as an [`InvariantViolation`] value, not an
//! error, because the modified network is still valid.

use std::fmt;
use tn_modification::Modification;
use tn_network::{ContentHash, NetworkError};

/// Pipeline phase that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Feed checksum verification
    Integrity,
    /// Modification resolve
    Resolve,
    /// Modification apply
    Apply,
    /// Derived-index rebuild
    Rebuild,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integrity => "integrity",
            Self::Resolve => "resolve",
            Self::Apply => "apply",
            Self::Rebuild => "rebuild",
        };
        f.write_str(name)
    }
}

/// Diagnostics of one failed modification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationReport {
    /// Position in canonical order
    pub position: usize,
    /// Modification type
    pub type_name: &'static str,
    /// Author's comment
    pub comment: Option<String>,
    /// Every warning recorded, including the failure reason
    pub warnings: Vec<String>,
    /// Failure reason
    pub reason: String,
}

impl ModificationReport {
    /// Capture the state of a failed modification
    #[must_use]
    pub fn capture(position: usize, modification: &dyn Modification, reason: String) -> Self {
        let diagnostics = modification.diagnostics();
        Self {
            position,
            type_name: modification.type_name(),
            comment: diagnostics.comment.clone(),
            warnings: diagnostics.warnings.clone(),
            reason,
        }
    }

    /// Log the report at error level
    pub fn log(&self) {
        tracing::error!(
            "Modification #{} of type {} failed: {}",
            self.position,
            self.type_name,
            self.reason
        );
        if let Some(comment) = &self.comment {
            tracing::error!("Modification comment is: {}", comment);
        }
        for warning in &self.warnings {
            tracing::error!("  {}", warning);
        }
    }
}

impl fmt::Display for ModificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.position, self.type_name, self.reason)?;
        if let Some(comment) = &self.comment {
            write!(f, " ({comment})")?;
        }
        Ok(())
    }
}

/// The scenario does not belong to the baseline network
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// Different number of feeds
    #[error("scenario names {scenario} feeds but the network has {baseline}")]
    FeedCountMismatch {
        /// Feeds in the scenario
        scenario: usize,
        /// Feeds in the baseline
        baseline: usize,
    },

    /// Scenario feed not in the baseline
    #[error("scenario refers to feed {feed_id} not in the network")]
    UnknownFeed {
        /// Offending feed
        feed_id: String,
    },

    /// Same feed, different content
    #[error("checksum mismatch for feed {feed_id}: network {baseline}, scenario {scenario}")]
    ChecksumMismatch {
        /// Offending feed
        feed_id: String,
        /// Checksum in the scenario
        scenario: u64,
        /// Checksum in the baseline
        baseline: u64,
    },
}

/// Applying a scenario changed the baseline's content checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("baseline checksum changed from {before} to {after}")]
pub struct InvariantViolation {
    /// Checksum captured before copying
    pub before: ContentHash,
    /// Checksum after application
    pub after: ContentHash,
}

/// Scenario application failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    /// Scenario does not match the baseline
    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// One or more modifications failed to resolve; nothing was applied
    #[error("scenario invalid: {} modification(s) failed to resolve", .failures.len())]
    Invalid {
        /// Every failed modification in canonical order
        failures: Vec<ModificationReport>,
    },

    /// A modification failed to apply; the partial copy was dropped
    #[error("scenario application failed at {report}")]
    ApplicationFailed {
        /// The failed modification
        report: ModificationReport,
    },

    /// Derived indexes could not be rebuilt
    #[error("rebuild failed: {0}")]
    Rebuild(#[from] NetworkError),
}

impl ScenarioError {
    /// Phase that failed
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Integrity(_) => Phase::Integrity,
            Self::Invalid { .. } => Phase::Resolve,
            Self::ApplicationFailed { .. } => Phase::Apply,
            Self::Rebuild(_) => Phase::Rebuild,
        }
    }

    /// Reports of the modifications at fault
    #[must_use]
    pub fn reports(&self) -> &[ModificationReport] {
        match self {
            Self::Invalid { failures } => failures,
            Self::ApplicationFailed { report } => std::slice::from_ref(report),
            Self::Integrity(_) | Self::Rebuild(_) => &[],
        }
    }
}
