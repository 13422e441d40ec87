//! Street layer (Layer A)
//!
//! A directed street graph with tombstoned edge removal, derived adjacency
//! lists, and a change set recording which edges a scenario touched so that
//! downstream index rebuilds can be limited to the affected area.

use crate::error::NetworkError;
use crate::geometry::{Coordinate, Envelope};
use crate::hash::{ContentHash, RecordHasher};
use crate::ids::{EdgeId, VertexId};
use crate::merkle::DigestTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Travel modes an edge allows, as a small bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permissions(u8);

impl Permissions {
    /// Nothing allowed
    pub const NONE: Self = Self(0);
    /// Pedestrians
    pub const WALK: Self = Self(1);
    /// Bicycles
    pub const BIKE: Self = Self(1 << 1);
    /// Cars
    pub const CAR: Self = Self(1 << 2);
    /// Every mode
    pub const ALL: Self = Self(0b111);

    /// Raw bits
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every mode in `other` is allowed
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two sets
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A directed street edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetEdge {
    from: VertexId,
    to: VertexId,
    length_mm: u32,
    speed_cms: u16,
    permissions: Permissions,
    removed: bool,
}

impl StreetEdge {
    /// Origin vertex
    #[inline]
    #[must_use]
    pub fn from(&self) -> VertexId {
        self.from
    }

    /// Destination vertex
    #[inline]
    #[must_use]
    pub fn to(&self) -> VertexId {
        self.to
    }

    /// Length in millimetres
    #[inline]
    #[must_use]
    pub fn length_mm(&self) -> u32 {
        self.length_mm
    }

    /// Speed in centimetres per second
    #[inline]
    #[must_use]
    pub fn speed_cms(&self) -> u16 {
        self.speed_cms
    }

    /// Speed in kilometres per hour
    #[inline]
    #[must_use]
    pub fn speed_kph(&self) -> f64 {
        f64::from(self.speed_cms) * 0.036
    }

    /// Allowed modes
    #[inline]
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    fn leaf(&self) -> ContentHash {
        RecordHasher::new("street-edge")
            .u32(self.from.0)
            .u32(self.to.0)
            .u32(self.length_mm)
            .u32(u32::from(self.speed_cms))
            .u32(u32::from(self.permissions.bits()))
            .finish()
    }
}

/// Convert kilometres per hour to centimetres per second, saturating
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn kph_to_cms(kph: f64) -> u16 {
    (kph / 0.036).round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Edges touched since the layer was last copied for a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeChangeSet {
    /// Edges created
    pub added: BTreeSet<EdgeId>,
    /// Edges tombstoned
    pub removed: BTreeSet<EdgeId>,
    /// Edges whose speed or permissions changed
    pub altered: BTreeSet<EdgeId>,
}

impl EdgeChangeSet {
    /// Whether nothing changed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.altered.is_empty()
    }

    /// All touched edges, deduplicated and ordered
    #[must_use]
    pub fn all(&self) -> BTreeSet<EdgeId> {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.altered)
            .copied()
            .collect()
    }
}

/// Street graph
#[derive(Debug, Clone, Default)]
pub struct StreetLayer {
    vertices: Vec<Coordinate>,
    edges: Vec<StreetEdge>,
    live_degree: Vec<u32>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    edge_lists_stale: bool,
    changes: EdgeChangeSet,
}

impl StreetLayer {
    /// Create an empty layer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex
    pub fn add_vertex(&mut self, coordinate: Coordinate) -> VertexId {
        let id = VertexId::from_index(self.vertices.len());
        self.vertices.push(coordinate);
        self.live_degree.push(0);
        self.edge_lists_stale = true;
        id
    }

    /// Coordinate of a vertex
    #[inline]
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Coordinate> {
        self.vertices.get(id.index())
    }

    /// Number of vertices
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterate vertices
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Coordinate)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, c)| (VertexId::from_index(i), c))
    }

    /// Add a directed edge; length comes from the endpoint coordinates
    ///
    /// # Errors
    /// Returns [`NetworkError::VertexNotFound`] for unknown endpoints
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        speed_cms: u16,
        permissions: Permissions,
    ) -> Result<EdgeId, NetworkError> {
        let a = *self.vertex(from).ok_or(NetworkError::VertexNotFound(from))?;
        let b = *self.vertex(to).ok_or(NetworkError::VertexNotFound(to))?;
        let length_mm = (a.distance_meters(&b) * 1000.0).round().max(1.0) as u32;
        let id = EdgeId::from_index(self.edges.len());
        self.edges.push(StreetEdge {
            from,
            to,
            length_mm,
            speed_cms,
            permissions,
            removed: false,
        });
        self.live_degree[from.index()] += 1;
        self.live_degree[to.index()] += 1;
        self.edge_lists_stale = true;
        self.changes.added.insert(id);
        Ok(id)
    }

    /// Add a pair of edges in both directions
    ///
    /// # Errors
    /// Returns [`NetworkError::VertexNotFound`] for unknown endpoints
    pub fn add_street(
        &mut self,
        a: VertexId,
        b: VertexId,
        speed_cms: u16,
        permissions: Permissions,
    ) -> Result<(EdgeId, EdgeId), NetworkError> {
        let forward = self.add_edge(a, b, speed_cms, permissions)?;
        let backward = self.add_edge(b, a, speed_cms, permissions)?;
        Ok((forward, backward))
    }

    /// A live edge
    #[inline]
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&StreetEdge> {
        self.edges.get(id.index()).filter(|e| !e.removed)
    }

    /// Iterate live edges
    pub fn live_edges(&self) -> impl Iterator<Item = (EdgeId, &StreetEdge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed)
            .map(|(i, e)| (EdgeId::from_index(i), e))
    }

    /// Number of live edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| !e.removed).count()
    }

    /// Tombstone an edge
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotFound`] if the edge is unknown or already removed
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), NetworkError> {
        let edge = self
            .edges
            .get_mut(id.index())
            .filter(|e| !e.removed)
            .ok_or(NetworkError::EdgeNotFound(id))?;
        edge.removed = true;
        let (from, to) = (edge.from, edge.to);
        self.live_degree[from.index()] -= 1;
        self.live_degree[to.index()] -= 1;
        self.edge_lists_stale = true;
        self.changes.removed.insert(id);
        Ok(())
    }

    /// Change the speed of an edge
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotFound`] if the edge is unknown or removed
    pub fn set_speed(&mut self, id: EdgeId, speed_cms: u16) -> Result<(), NetworkError> {
        self.live_edge_mut(id)?.speed_cms = speed_cms;
        self.changes.altered.insert(id);
        Ok(())
    }

    /// Change the allowed modes of an edge
    ///
    /// # Errors
    /// Returns [`NetworkError::EdgeNotFound`] if the edge is unknown or removed
    pub fn set_permissions(
        &mut self,
        id: EdgeId,
        permissions: Permissions,
    ) -> Result<(), NetworkError> {
        self.live_edge_mut(id)?.permissions = permissions;
        self.changes.altered.insert(id);
        Ok(())
    }

    fn live_edge_mut(&mut self, id: EdgeId) -> Result<&mut StreetEdge, NetworkError> {
        self.edges
            .get_mut(id.index())
            .filter(|e| !e.removed)
            .ok_or(NetworkError::EdgeNotFound(id))
    }

    /// Live edges whose endpoint envelope overlaps `envelope`
    #[must_use]
    pub fn edges_intersecting(&self, envelope: &Envelope) -> Vec<EdgeId> {
        self.live_edges()
            .filter(|(_, e)| {
                let a = &self.vertices[e.from.index()];
                let b = &self.vertices[e.to.index()];
                Envelope::covering([a, b]).is_some_and(|env| env.intersects(envelope))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Vertices with at least one live edge within `radius_meters`,
    /// nearest first, ties by id
    #[must_use]
    pub fn vertices_within(&self, point: &Coordinate, radius_meters: f64) -> Vec<(VertexId, f64)> {
        let mut found: Vec<_> = self
            .vertices()
            .filter(|(id, _)| self.live_degree[id.index()] > 0)
            .map(|(id, c)| (id, c.distance_meters(point)))
            .filter(|(_, d)| *d <= radius_meters)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// Nearest connected vertex within `radius_meters`
    #[must_use]
    pub fn nearest_vertex(&self, point: &Coordinate, radius_meters: f64) -> Option<(VertexId, f64)> {
        self.vertices_within(point, radius_meters).into_iter().next()
    }

    /// Rebuild outgoing and incoming edge lists from live edges
    pub fn build_edge_lists(&mut self) {
        let n = self.vertices.len();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        for (id, edge) in self.live_edges() {
            outgoing[edge.from.index()].push(id);
            incoming[edge.to.index()].push(id);
        }
        self.outgoing = outgoing;
        self.incoming = incoming;
        self.edge_lists_stale = false;
        tracing::debug!(vertices = n, "rebuilt street edge lists");
    }

    /// Whether edge lists lag behind the edges
    #[inline]
    #[must_use]
    pub fn edge_lists_stale(&self) -> bool {
        self.edge_lists_stale
    }

    /// Outgoing edges of a vertex, as of the last [`Self::build_edge_lists`]
    #[must_use]
    pub fn outgoing_edges(&self, vertex: VertexId) -> &[EdgeId] {
        self.outgoing.get(vertex.index()).map_or(&[], Vec::as_slice)
    }

    /// Incoming edges of a vertex, as of the last [`Self::build_edge_lists`]
    #[must_use]
    pub fn incoming_edges(&self, vertex: VertexId) -> &[EdgeId] {
        self.incoming.get(vertex.index()).map_or(&[], Vec::as_slice)
    }

    /// Edges touched since the last scenario copy
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &EdgeChangeSet {
        &self.changes
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changes = EdgeChangeSet::default();
    }

    /// Envelope around every added, removed or altered edge, buffered by
    /// `buffer_meters`; `None` when nothing changed
    #[must_use]
    pub fn changed_edges_bounding_geometry(&self, buffer_meters: f64) -> Option<Envelope> {
        let touched = self.changes.all();
        let points = touched.iter().flat_map(|id| {
            let edge = &self.edges[id.index()];
            [
                &self.vertices[edge.from.index()],
                &self.vertices[edge.to.index()],
            ]
        });
        Envelope::covering(points).map(|env| env.buffered(buffer_meters))
    }

    /// Content digest over vertices and live edges
    ///
    /// Adjacency lists and the change set are derived or historical and do
    /// not contribute.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let mut tree = DigestTree::with_capacity(self.vertices.len() + self.edges.len());
        for c in &self.vertices {
            tree.push(
                RecordHasher::new("street-vertex")
                    .i32(c.lat_fixed)
                    .i32(c.lon_fixed)
                    .finish(),
            );
        }
        for (_, edge) in self.live_edges() {
            tree.push(edge.leaf());
        }
        tree.root()
    }
}
