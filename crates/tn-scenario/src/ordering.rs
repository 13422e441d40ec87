//! Canonical modification order

use tn_modification::Modification;

/// Stable ascending sort on [`Modification::sort_order`]
///
/// Modifications with equal sort orders keep their authored order.
pub fn canonicalize(modifications: &mut [Box<dyn Modification>]) {
    modifications.sort_by_key(|m| m.sort_order());
}

/// Whether `modifications` is already in canonical order
#[must_use]
pub fn is_canonical(modifications: &[Box<dyn Modification>]) -> bool {
    modifications
        .windows(2)
        .all(|w| w[0].sort_order() <= w[1].sort_order())
}
