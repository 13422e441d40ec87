//! Transfer discovery between stops
//!
//! Transfers connect linked stops within walking distance of each other.
//! Recomputation starts from a set of dirty stops and widens it to every
//! stop within the transfer radius of one of them, since those stops may
//! have gained or lost a transfer towards a dirty stop.

use crate::ids::StopIndex;
use crate::linkage::{to_mm, StopLinkage, Transfer};
use crate::transit::TransitLayer;
use std::collections::BTreeSet;

/// Recomputes transfers in a [`StopLinkage`]
#[derive(Debug)]
pub struct TransferFinder<'a> {
    transit: &'a TransitLayer,
    linkage: &'a mut StopLinkage,
    radius_meters: f64,
}

impl<'a> TransferFinder<'a> {
    /// Create a finder over one transit layer and its linkage
    #[must_use]
    pub fn new(transit: &'a TransitLayer, linkage: &'a mut StopLinkage, radius_meters: f64) -> Self {
        Self {
            transit,
            linkage,
            radius_meters,
        }
    }

    /// Recompute transfers for every stop
    pub fn find_all_transfers(&mut self) -> usize {
        let all: Vec<StopIndex> = self.transit.stops().map(|(i, _)| i).collect();
        self.recompute(all)
    }

    /// Recompute transfers touching any of the `dirty` stops
    ///
    /// Returns the number of stops whose transfer list was rebuilt.
    pub fn find_transfers(&mut self, dirty: &[StopIndex]) -> usize {
        if dirty.is_empty() {
            return 0;
        }
        let mut affected: BTreeSet<StopIndex> = dirty.iter().copied().collect();
        for &d in dirty {
            let Some(origin) = self.transit.stop(d) else {
                continue;
            };
            for (index, stop) in self.transit.stops() {
                if stop.coordinate.distance_meters(&origin.coordinate) <= self.radius_meters {
                    affected.insert(index);
                }
            }
        }
        self.recompute(affected.into_iter().collect())
    }

    fn recompute(&mut self, stops: Vec<StopIndex>) -> usize {
        for &from in &stops {
            let transfers = self.transfers_from(from);
            self.linkage.set_transfers(from, transfers);
        }
        tracing::debug!(stops = stops.len(), "recomputed transfers");
        stops.len()
    }

    fn transfers_from(&self, from: StopIndex) -> Vec<Transfer> {
        if self.linkage.linked_vertex(from).is_none() {
            return Vec::new();
        }
        let Some(origin) = self.transit.stop(from) else {
            return Vec::new();
        };
        let mut transfers: Vec<Transfer> = self
            .transit
            .stops()
            .filter(|(to, _)| *to != from && self.linkage.linked_vertex(*to).is_some())
            .map(|(to, stop)| (to, stop.coordinate.distance_meters(&origin.coordinate)))
            .filter(|(_, d)| *d <= self.radius_meters)
            .map(|(to, d)| Transfer {
                to,
                distance_mm: to_mm(d),
            })
            .collect();
        transfers.sort_by_key(|t| (t.distance_mm, t.to));
        transfers
    }
}
