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

//! # Routing core
//!
//! This module contains the entire routing core of one router: the shared routing state with
//! the Bellman-Ford engine ([`RoutingTable`]), the wire messages ([`Message`]) with their
//! framing ([`codec`]), and the formatting helpers ([`printer`]).
//!
//! The routing table is pure in-memory state. It never performs I/O; the
//! [daemon](crate::daemon) is responsible for locking it, feeding decoded messages into it,
//! and sending out whatever the mutation produced.

pub mod codec;
pub mod message;
pub mod printer;
pub mod table;
pub mod types;

pub use codec::WireError;
pub use message::{Message, VectorEntry};
pub use table::{RoutingTable, FAILURE_THRESHOLD};
pub use types::{
    from_wire, to_wire, DeviceError, LinkWeight, NeighborState, ServerId, INF_CAP,
};
