//! Transport network aggregate
//!
//! A [`TransportNetwork`] holds its street layer, transit layer and stop
//! linkage behind separate `Arc`s. A scoped copy deep-copies only the parts
//! a scenario declared it will change and shares the rest with the source
//! network. Mutable access goes through [`Arc::get_mut`], so asking to
//! mutate a shared part fails with [`NetworkError::LayerShared`] instead of
//! silently writing into the baseline.

use crate::error::{LayerKind, NetworkError};
use crate::geometry::Envelope;
use crate::hash::ContentHash;
use crate::ids::StopIndex;
use crate::linkage::{LinkageParams, StopLinkage, StopSelection};
use crate::merkle::DigestTree;
use crate::street::StreetLayer;
use crate::transfer::TransferFinder;
use crate::transit::TransitLayer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which layers a scenario will mutate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerScope {
    /// Street layer will change
    pub street: bool,
    /// Transit layer will change
    pub transit: bool,
}

impl LayerScope {
    /// No layer changes
    pub const NONE: Self = Self {
        street: false,
        transit: false,
    };
    /// Street layer only
    pub const STREET: Self = Self {
        street: true,
        transit: false,
    };
    /// Transit layer only
    pub const TRANSIT: Self = Self {
        street: false,
        transit: true,
    };
    /// Both layers
    pub const ALL: Self = Self {
        street: true,
        transit: true,
    };

    /// Union of two scopes
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            street: self.street || other.street,
            transit: self.transit || other.transit,
        }
    }

    /// Whether nothing will change
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.street && !self.transit
    }
}

/// Street layer, transit layer and the linkage between them
///
/// `Clone` is a shallow handle copy: every part stays shared and therefore
/// read-only. Use [`Self::scoped_copy`] to obtain a mutable network.
#[derive(Debug, Clone)]
pub struct TransportNetwork {
    street: Arc<StreetLayer>,
    transit: Arc<TransitLayer>,
    linkage: Arc<StopLinkage>,
    params: LinkageParams,
}

impl TransportNetwork {
    /// Assemble a baseline network and build every derived index
    #[must_use]
    pub fn build(mut street: StreetLayer, mut transit: TransitLayer, params: LinkageParams) -> Self {
        street.build_edge_lists();
        street.clear_changes();
        transit.rebuild_transient_indexes();

        let mut linkage = StopLinkage::new();
        linkage.link_stops(&street, &transit, &params, StopSelection::All);
        TransferFinder::new(&transit, &mut linkage, params.transfer_radius_meters)
            .find_all_transfers();

        tracing::info!(
            vertices = street.vertex_count(),
            edges = street.edge_count(),
            stops = transit.stop_count(),
            transfers = linkage.transfer_count(),
            "built transport network"
        );
        Self {
            street: Arc::new(street),
            transit: Arc::new(transit),
            linkage: Arc::new(linkage),
            params,
        }
    }

    /// Street layer
    #[inline]
    #[must_use]
    pub fn street_layer(&self) -> &StreetLayer {
        &self.street
    }

    /// Transit layer
    #[inline]
    #[must_use]
    pub fn transit_layer(&self) -> &TransitLayer {
        &self.transit
    }

    /// Stop linkage
    #[inline]
    #[must_use]
    pub fn linkage(&self) -> &StopLinkage {
        &self.linkage
    }

    /// Linkage radii
    #[inline]
    #[must_use]
    pub fn params(&self) -> &LinkageParams {
        &self.params
    }

    /// Mutable street layer
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the layer is shared with another network
    pub fn street_layer_mut(&mut self) -> Result<&mut StreetLayer, NetworkError> {
        Arc::get_mut(&mut self.street).ok_or(NetworkError::LayerShared(LayerKind::Street))
    }

    /// Mutable transit layer
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the layer is shared with another network
    pub fn transit_layer_mut(&mut self) -> Result<&mut TransitLayer, NetworkError> {
        Arc::get_mut(&mut self.transit).ok_or(NetworkError::LayerShared(LayerKind::Transit))
    }

    /// Whether both networks point at the same street layer
    #[inline]
    #[must_use]
    pub fn shares_street_layer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.street, &other.street)
    }

    /// Whether both networks point at the same transit layer
    #[inline]
    #[must_use]
    pub fn shares_transit_layer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.transit, &other.transit)
    }

    /// Whether both networks point at the same linkage
    #[inline]
    #[must_use]
    pub fn shares_linkage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.linkage, &other.linkage)
    }

    /// Content checksum over both layers
    ///
    /// Derived indexes and change tracking do not contribute, so networks
    /// with identical content hash equally regardless of how they were built.
    #[must_use]
    pub fn checksum(&self) -> ContentHash {
        [self.street.digest(), self.transit.digest()]
            .into_iter()
            .collect::<DigestTree>()
            .root()
    }

    /// Copy for scenario application
    ///
    /// Layers flagged in `scope` are deep-copied with a fresh change set;
    /// the linkage is deep-copied whenever any layer is flagged, because
    /// either layer changing may invalidate it. Everything else is shared.
    #[must_use]
    pub fn scoped_copy(&self, scope: LayerScope) -> Self {
        let street = if scope.street {
            let mut copy = StreetLayer::clone(&self.street);
            copy.clear_changes();
            Arc::new(copy)
        } else {
            Arc::clone(&self.street)
        };
        let transit = if scope.transit {
            Arc::new(TransitLayer::clone(&self.transit))
        } else {
            Arc::clone(&self.transit)
        };
        let linkage = if scope.is_empty() {
            Arc::clone(&self.linkage)
        } else {
            Arc::new(StopLinkage::clone(&self.linkage))
        };
        tracing::debug!(
            copy_street = scope.street,
            copy_transit = scope.transit,
            "made scoped network copy"
        );
        Self {
            street,
            transit,
            linkage,
            params: self.params,
        }
    }

    /// Rebuild the transit layer's transient indexes
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the transit layer is shared
    pub fn rebuild_transient_indexes(&mut self) -> Result<(), NetworkError> {
        self.transit_layer_mut()?.rebuild_transient_indexes();
        Ok(())
    }

    /// Rebuild the street layer's edge lists
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the street layer is shared
    pub fn build_edge_lists(&mut self) -> Result<(), NetworkError> {
        self.street_layer_mut()?.build_edge_lists();
        Ok(())
    }

    /// Envelope around street edges changed since the copy, buffered
    #[must_use]
    pub fn changed_edges_bounding_geometry(&self, buffer_meters: f64) -> Option<Envelope> {
        self.street.changed_edges_bounding_geometry(buffer_meters)
    }

    /// Relink the selected stops and rebuild their stop trees
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the linkage is shared
    pub fn rebuild_stop_trees(&mut self, selection: StopSelection) -> Result<Vec<StopIndex>, NetworkError> {
        let linkage =
            Arc::get_mut(&mut self.linkage).ok_or(NetworkError::LayerShared(LayerKind::Linkage))?;
        Ok(linkage.link_stops(&self.street, &self.transit, &self.params, selection))
    }

    /// Recompute transfers around the given stops
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the linkage is shared
    pub fn find_transfers(&mut self, dirty: &[StopIndex]) -> Result<usize, NetworkError> {
        let linkage =
            Arc::get_mut(&mut self.linkage).ok_or(NetworkError::LayerShared(LayerKind::Linkage))?;
        Ok(TransferFinder::new(&self.transit, linkage, self.params.transfer_radius_meters)
            .find_transfers(dirty))
    }

    /// Recompute every transfer
    ///
    /// # Errors
    /// Returns [`NetworkError::LayerShared`] if the linkage is shared
    pub fn find_all_transfers(&mut self) -> Result<usize, NetworkError> {
        let linkage =
            Arc::get_mut(&mut self.linkage).ok_or(NetworkError::LayerShared(LayerKind::Linkage))?;
        Ok(TransferFinder::new(&self.transit, linkage, self.params.transfer_radius_meters)
            .find_all_transfers())
    }
}
