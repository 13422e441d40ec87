//! Modified-network cache using moka
//!
//! Scenarios with equal ids are assumed to be identical, so the network
//! produced for one can be reused for the next. A cache is bound to one
//! baseline; networks derived from different baselines never mix.

use crate::applicator::{AppliedScenario, ScenarioApplicator};
use crate::error::ScenarioError;
use crate::scenario::Scenario;
use moka::sync::Cache;
use std::sync::Arc;
use tn_network::{ContentHash, TransportNetwork};

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Modified networks of one baseline, keyed by scenario id
#[derive(Debug, Clone)]
pub struct ScenarioCache {
    baseline: Arc<TransportNetwork>,
    baseline_checksum: ContentHash,
    inner: Cache<String, Arc<TransportNetwork>>,
}

impl ScenarioCache {
    /// Create a cache for `baseline` holding at most `max_capacity` networks
    #[must_use]
    pub fn for_baseline(baseline: Arc<TransportNetwork>, max_capacity: u64) -> Self {
        let baseline_checksum = baseline.checksum();
        Self {
            baseline,
            baseline_checksum,
            inner: Cache::new(max_capacity),
        }
    }

    /// The baseline this cache applies scenarios to
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &Arc<TransportNetwork> {
        &self.baseline
    }

    /// Checksum of the baseline, captured at construction
    ///
    /// Applications through the cache verify the baseline against this
    /// value instead of hashing it again.
    #[inline]
    #[must_use]
    pub fn baseline_checksum(&self) -> ContentHash {
        self.baseline_checksum
    }

    /// Cached network for a scenario id
    #[inline]
    #[must_use]
    pub fn get(&self, scenario_id: &str) -> Option<Arc<TransportNetwork>> {
        self.inner.get(scenario_id)
    }

    /// Get the modified network for `scenario`, applying it on a miss
    ///
    /// Scenarios without an id are always applied and never cached. Failed
    /// applications are not cached either.
    ///
    /// # Errors
    /// Returns the [`ScenarioError`] of a failed application
    pub fn get_or_apply(
        &self,
        applicator: &ScenarioApplicator,
        scenario: &mut Scenario,
    ) -> Result<Arc<TransportNetwork>, ScenarioError> {
        let Some(id) = scenario.id().map(str::to_owned) else {
            tracing::debug!("Scenario has no id, bypassing cache");
            return Ok(Arc::new(self.apply(applicator, scenario)?.network));
        };

        // Check cache first
        if let Some(cached) = self.inner.get(&id) {
            tracing::debug!("Modified network for scenario {} found in cache", id);
            return Ok(cached);
        }

        // Apply the scenario
        let network = Arc::new(self.apply(applicator, scenario)?.network);

        // Insert into cache
        self.inner.insert(id, Arc::clone(&network));
        Ok(network)
    }

    fn apply(
        &self,
        applicator: &ScenarioApplicator,
        scenario: &mut Scenario,
    ) -> Result<AppliedScenario, ScenarioError> {
        applicator.apply_with_baseline_checksum(scenario, &self.baseline, self.baseline_checksum)
    }

    /// Invalidate one scenario
    #[inline]
    pub fn invalidate(&self, scenario_id: &str) {
        self.inner.invalidate(scenario_id);
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}
