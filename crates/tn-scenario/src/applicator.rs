//! Scenario applicator
//!
//! Produces a modified copy of a baseline network:
//! 1. Verify the scenario's feed checksums against the baseline
//! 2. Sort modifications into canonical order
//! 3. Copy the layers any modification affects; share the rest
//! 4. Resolve every modification, collecting all failures
//! 5. Apply modifications in order, stopping at the first failure
//! 6. Rebuild derived indexes
//! 7. Optionally confirm the baseline checksum did not change
//!
//! The baseline is only ever read, so any number of applications may run
//! against one shared baseline concurrently.

use crate::config::ApplicatorConfig;
use crate::error::{InvariantViolation, ModificationReport, ScenarioError};
use crate::integrity::{self, IntegrityStatus};
use crate::rebuild::{self, RebuildSummary};
use crate::scenario::Scenario;
use tn_network::{ContentHash, TransportNetwork};

/// Result of comparing the baseline checksum before and after application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineCheck {
    /// Checksum unchanged
    Unchanged,
    /// Checksum changed; the baseline was mutated
    Mutated(InvariantViolation),
    /// Verification disabled
    Skipped,
}

/// A successfully applied scenario
#[derive(Debug)]
pub struct AppliedScenario {
    /// The modified network
    pub network: TransportNetwork,
    /// Outcome of the feed checksum comparison
    pub integrity: IntegrityStatus,
    /// Rebuild stages that ran
    pub rebuild: RebuildSummary,
    /// Outcome of the baseline verification
    pub baseline_check: BaselineCheck,
}

/// Applies scenarios to baseline networks
#[derive(Debug, Clone, Default)]
pub struct ScenarioApplicator {
    config: ApplicatorConfig,
}

impl ScenarioApplicator {
    /// Create applicator with configuration
    #[inline]
    #[must_use]
    pub fn new(config: ApplicatorConfig) -> Self {
        Self { config }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ApplicatorConfig {
        &self.config
    }

    /// Apply `scenario` to a copy of `baseline`
    ///
    /// The scenario is reordered in place and each modification's
    /// diagnostics keep the warnings recorded during application.
    /// Each modification is resolved and applied at most once, so a
    /// scenario should be applied once; build a fresh one to apply again.
    ///
    /// Modifications are all resolved against the unmodified copy, before
    /// any is applied; a modification cannot refer to entities another
    /// modification of the same scenario creates.
    ///
    /// # Errors
    /// - [`ScenarioError::Integrity`] if the feeds do not match; nothing is copied
    /// - [`ScenarioError::Invalid`] with every modification that failed to resolve
    /// - [`ScenarioError::ApplicationFailed`] with the first modification that
    ///   failed to apply; the partial copy is dropped
    /// - [`ScenarioError::Rebuild`] if a modification mutated an undeclared layer
    pub fn apply(
        &self,
        scenario: &mut Scenario,
        baseline: &TransportNetwork,
    ) -> Result<AppliedScenario, ScenarioError> {
        self.run(scenario, baseline, None)
    }

    /// Same as [`apply`](Self::apply), comparing the baseline against a
    /// checksum the caller already holds instead of hashing it first
    ///
    /// # Errors
    /// Same as [`apply`](Self::apply)
    pub fn apply_with_baseline_checksum(
        &self,
        scenario: &mut Scenario,
        baseline: &TransportNetwork,
        baseline_checksum: ContentHash,
    ) -> Result<AppliedScenario, ScenarioError> {
        self.run(scenario, baseline, Some(baseline_checksum))
    }

    fn run(
        &self,
        scenario: &mut Scenario,
        baseline: &TransportNetwork,
        known_checksum: Option<ContentHash>,
    ) -> Result<AppliedScenario, ScenarioError> {
        let span = tracing::info_span!("apply_scenario", id = scenario.id().unwrap_or("<none>"));
        let _enter = span.enter();
        tracing::info!("Applying scenario with {} modifications", scenario.len());

        let integrity =
            integrity::verify(scenario.feed_checksums(), baseline.transit_layer().feed_checksums())
                .map_err(|e| {
                    tracing::error!("Scenario does not match network: {}", e);
                    e
                })?;

        scenario.canonicalize();
        let before = self
            .config
            .verify_baseline_unchanged
            .then(|| known_checksum.unwrap_or_else(|| baseline.checksum()));

        let scope = scenario.layer_scope();
        let mut network = baseline.scoped_copy(scope);
        tracing::info!(
            "Copied network (street layer: {}, transit layer: {})",
            scope.street,
            scope.transit
        );

        Self::resolve_all(scenario, &network)?;
        Self::apply_all(scenario, &mut network)?;
        let rebuild = rebuild::rebuild_derived_indexes(&mut network, scope, self.config.rebuild_policy)?;

        let baseline_check = match before {
            None => BaselineCheck::Skipped,
            Some(before) => Self::check_baseline(before, baseline),
        };

        Ok(AppliedScenario {
            network,
            integrity,
            rebuild,
            baseline_check,
        })
    }

    fn resolve_all(scenario: &mut Scenario, network: &TransportNetwork) -> Result<(), ScenarioError> {
        tracing::info!("Resolving modifications against the network");
        let mut failures = Vec::new();
        for (position, modification) in scenario.modifications_mut().iter_mut().enumerate() {
            if let Err(failure) = modification.resolve(network) {
                let report = ModificationReport::capture(position, &**modification, failure.reason);
                report.log();
                failures.push(report);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            tracing::error!("{} modification(s) failed to resolve, bailing out", failures.len());
            Err(ScenarioError::Invalid { failures })
        }
    }

    fn apply_all(scenario: &mut Scenario, network: &mut TransportNetwork) -> Result<(), ScenarioError> {
        tracing::info!("Applying modifications to the network");
        for (position, modification) in scenario.modifications_mut().iter_mut().enumerate() {
            tracing::debug!("Applying modification #{} of type {}", position, modification.type_name());
            if let Err(failure) = modification.apply(network) {
                let report = ModificationReport::capture(position, &**modification, failure.reason);
                report.log();
                return Err(ScenarioError::ApplicationFailed { report });
            }
        }
        Ok(())
    }

    fn check_baseline(before: ContentHash, baseline: &TransportNetwork) -> BaselineCheck {
        let after = baseline.checksum();
        if after == before {
            tracing::info!("Baseline network unchanged after applying scenario");
            BaselineCheck::Unchanged
        } else {
            let violation = InvariantViolation { before, after };
            tracing::error!("Applying a scenario mutated the baseline network: {}", violation);
            BaselineCheck::Mutated(violation)
        }
    }
}
