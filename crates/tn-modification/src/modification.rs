//! Modification trait and diagnostics
//!
//! A [`Modification`] is one unit of change in a scenario. The applicator
//! drives every modification through [`Modification::resolve`] and then
//! [`Modification::apply`], each exactly once. Problems are recorded in the
//! modification's own [`Diagnostics`] so they can be reported together with
//! its type and comment.

use serde::{Deserialize, Serialize};
use std::fmt;
use tn_network::{LayerScope, NetworkError, TransportNetwork};

/// A polymorphic change to a transport network
///
/// # Contract
/// - [`Self::sort_order`] and the `affects_*` flags depend only on the
///   modification's own parameters and may be queried at any time.
/// - [`Self::resolve`] reads the network and caches what [`Self::apply`]
///   needs. It must not mutate anything but `self`.
/// - [`Self::apply`] may only mutate the layers it declared through the
///   `affects_*` flags; other layers are shared with the baseline and
///   refuse mutable access.
pub trait Modification: Send + Sync + fmt::Debug {
    /// Discriminator used in diagnostics
    fn type_name(&self) -> &'static str;

    /// Position in the canonical application order; lower applies first
    fn sort_order(&self) -> i32;

    /// Look up network entities this modification refers to
    ///
    /// # Errors
    /// Returns [`StepFailure`] if the modification cannot apply to this network
    fn resolve(&mut self, network: &TransportNetwork) -> Result<(), StepFailure>;

    /// Mutate the network
    ///
    /// # Errors
    /// Returns [`StepFailure`] on the first change that cannot be made
    fn apply(&mut self, network: &mut TransportNetwork) -> Result<(), StepFailure>;

    /// Whether [`Self::apply`] mutates the street layer
    fn affects_street_layer(&self) -> bool;

    /// Whether [`Self::apply`] mutates the transit layer
    fn affects_transit_layer(&self) -> bool;

    /// Comment and warnings
    fn diagnostics(&self) -> &Diagnostics;

    /// Mutable comment and warnings
    fn diagnostics_mut(&mut self) -> &mut Diagnostics;

    /// Layers this modification will mutate
    fn layer_scope(&self) -> LayerScope {
        LayerScope {
            street: self.affects_street_layer(),
            transit: self.affects_transit_layer(),
        }
    }
}

/// Free-text comment plus warnings accumulated while resolving and applying
///
/// Only the comment is part of the document form; warnings are produced
/// at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Author's description of the modification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Messages recorded so far
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Diagnostics {
    /// Diagnostics with a comment and no warnings
    #[must_use]
    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            warnings: Vec::new(),
        }
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Whether any warning was recorded
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Record `reason` as a warning and return it as a failure
    pub fn fail(&mut self, reason: impl Into<String>) -> StepFailure {
        let reason = reason.into();
        self.warnings.push(reason.clone());
        StepFailure { reason }
    }

    /// Record every problem; fail if there is at least one
    ///
    /// # Errors
    /// Returns a [`StepFailure`] summarizing `problems` when it is non-empty
    pub fn check(&mut self, problems: Vec<String>) -> Result<(), StepFailure> {
        let reason = match problems.as_slice() {
            [] => return Ok(()),
            [only] => only.clone(),
            [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
        };
        self.warnings.extend(problems);
        Err(StepFailure { reason })
    }
}

/// Why a resolve or apply step failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct StepFailure {
    /// Human-readable cause
    pub reason: String,
}

impl StepFailure {
    /// Create a failure
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<NetworkError> for StepFailure {
    fn from(err: NetworkError) -> Self {
        Self::new(err.to_string())
    }
}
