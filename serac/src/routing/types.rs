// Serac: Distributed Distance-Vector Routing
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module containing all type definitions of the routing core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server Identification
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize,
)]
pub struct ServerId(pub u32);

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Link cost. Unreachability is represented as `f32::INFINITY` in memory; on the wire, the
/// sentinel [`INF_CAP`] is used instead.
pub type LinkWeight = f32;

/// Saturation threshold and wire sentinel for "unreachable". Any cost at or above this value
/// means "no path". Capping computed costs here also bounds the transient inflation of the
/// count-to-infinity problem.
pub const INF_CAP: LinkWeight = 65535.0;

/// Saturate a computed cost: anything at or above [`INF_CAP`] becomes infinite.
pub fn saturate(cost: LinkWeight) -> LinkWeight {
    if cost >= INF_CAP {
        LinkWeight::INFINITY
    } else {
        cost
    }
}

/// Encode an in-memory cost for the wire. Infinite costs are clamped to the [`INF_CAP`]
/// sentinel, so that the encoding stays a finite number.
pub fn to_wire(cost: LinkWeight) -> LinkWeight {
    if cost >= INF_CAP {
        INF_CAP
    } else {
        cost
    }
}

/// Decode a wire cost back into the in-memory representation. The sentinel (and everything
/// above it) becomes infinite.
pub fn from_wire(cost: LinkWeight) -> LinkWeight {
    saturate(cost)
}

/// Lifecycle state of a direct neighbor, as seen by this router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborState {
    /// The link is up, advertisements from the neighbor are accepted.
    Active,
    /// The neighbor missed too many advertisement intervals. The link cost is infinite, but
    /// the configured cost is remembered: a new advertisement from the neighbor reactivates
    /// the link.
    Failed,
    /// The link was disabled by an operator command (or an update to infinite cost). Only an
    /// `update` with a finite cost reactivates it; advertisements are ignored.
    Disabled,
}

/// Router Errors
#[derive(Error, Debug, PartialEq)]
pub enum DeviceError {
    /// The server does not exist in the node table
    #[error("Server {0} is not known in the topology")]
    UnknownServer(ServerId),
    /// The server is not a direct neighbor of this router
    #[error("Server {0} is not a neighbor")]
    NotANeighbor(ServerId),
    /// The two servers are not connected by a link
    #[error("There is no link between server {0} and server {1}")]
    UnknownLink(ServerId, ServerId),
    /// A cost is neither a positive finite number nor infinite
    #[error("Invalid link cost: {0}")]
    InvalidCost(LinkWeight),
    /// The routing state violates one of its invariants. This is a bug.
    #[error("Routing state is corrupt: {0}")]
    CorruptState(&'static str),
}
