//! Feed checksum verification
//!
//! A scenario records the checksums of the feeds its baseline was built
//! from. Applying it to a network built from different feeds would resolve
//! ids against the wrong data, so mismatches are fatal. When either side has
//! no checksums the check is skipped with a warning.

use crate::error::IntegrityError;
use std::collections::BTreeMap;

/// Outcome of a successful integrity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Every feed matched
    Verified,
    /// Nothing to compare against
    Unverifiable(String),
}

impl IntegrityStatus {
    /// Whether the feeds were actually compared
    #[inline]
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Compare scenario feed checksums against the baseline's
///
/// # Errors
/// Returns the first [`IntegrityError`] found; feeds are checked in id order
pub fn verify(
    scenario: &BTreeMap<String, u64>,
    baseline: &BTreeMap<String, u64>,
) -> Result<IntegrityStatus, IntegrityError> {
    if scenario.is_empty() {
        let reason = "scenario does not have feed checksums".to_string();
        tracing::warn!("{}, not checking that it applies to this network", reason);
        return Ok(IntegrityStatus::Unverifiable(reason));
    }
    if baseline.is_empty() {
        let reason = "network does not have feed checksums".to_string();
        tracing::warn!("{}, not checking that the scenario applies", reason);
        return Ok(IntegrityStatus::Unverifiable(reason));
    }

    if scenario.len() != baseline.len() {
        return Err(IntegrityError::FeedCountMismatch {
            scenario: scenario.len(),
            baseline: baseline.len(),
        });
    }
    for (feed_id, &expected) in scenario {
        let Some(&actual) = baseline.get(feed_id) else {
            return Err(IntegrityError::UnknownFeed {
                feed_id: feed_id.clone(),
            });
        };
        if actual != expected {
            return Err(IntegrityError::ChecksumMismatch {
                feed_id: feed_id.clone(),
                scenario: expected,
                baseline: actual,
            });
        }
    }
    tracing::info!("All {} feed checksums match the network", scenario.len());
    Ok(IntegrityStatus::Verified)
}
