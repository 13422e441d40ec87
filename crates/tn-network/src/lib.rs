//! Transport network model
//!
//! A two-layer network that scenarios are applied to.
//!
//! # Core Concepts
//!
//! - [`StreetLayer`]: directed street graph with change tracking
//! - [`TransitLayer`]: stops, routes and trip patterns with feed checksums
//! - [`StopLinkage`]: derived stop links, stop trees and transfers
//! - [`TransportNetwork`]: the three parts behind `Arc`s, with
//!   [`TransportNetwork::scoped_copy`] for copy-on-write scenario application
//! - [`ContentHash`]: 32-byte Blake3 digest; [`TransportNetwork::checksum`]
//!   is a Merkle root over the two layers
//!
//! # Example
//!
//! ```rust,ignore
//! use tn_network::{LayerScope, LinkageParams, TransportNetwork};
//!
//! let baseline = TransportNetwork::build(street, transit, LinkageParams::default());
//! let mut copy = baseline.scoped_copy(LayerScope::TRANSIT);
//! copy.transit_layer_mut()?.set_feed_checksum("extra", 1);
//! assert!(copy.shares_street_layer_with(&baseline));
//! ```

#![warn(unreachable_pub)]

mod error;
mod geometry;
mod hash;
mod ids;
mod linkage;
mod network;
mod street;
mod transfer;
mod transit;

/// Merkle digest support
pub mod merkle;

pub use error::{LayerKind, NetworkError};
pub use geometry::{
    fixed_to_floating, floating_to_fixed, Coordinate, Envelope, FIXED_FACTOR, METERS_PER_DEGREE_LAT,
};
pub use hash::{ContentHash, RecordHasher};
pub use ids::{EdgeId, PatternIndex, RouteIndex, StopIndex, VertexId};
pub use linkage::{LinkageParams, StopLink, StopLinkage, StopSelection, StopTree, Transfer};
pub use merkle::{Blake3Hasher, DigestTree};
pub use network::{LayerScope, TransportNetwork};
pub use street::{kph_to_cms, EdgeChangeSet, Permissions, StreetEdge, StreetLayer};
pub use transfer::TransferFinder;
pub use transit::{Route, Stop, TransitLayer, TransitMode, TripPattern, TripSchedule};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
