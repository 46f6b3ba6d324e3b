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

//! Module containing all error types

use crate::routing::{DeviceError, ServerId};
use crate::topology::TopologyError;
use std::net::IpAddr;
use thiserror::Error;

/// Main error type. All of these errors are fatal at startup: the router cannot come up
/// without a valid topology, a known identity and a bound listening socket.
#[derive(Debug, Error)]
pub enum Error {
    /// The topology file cannot be read or parsed
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
    /// Error propagated from the routing core
    #[error("Device Error: {0}")]
    DeviceError(#[from] DeviceError),
    /// The listening socket cannot be created
    #[error("Cannot bind the listening socket: {0}")]
    BindError(std::io::Error),
    /// No server entry in the topology matches the local address
    #[error("No server entry matches the local address {0}")]
    SelfNotFound(IpAddr),
    /// The server id given on the command line does not exist in the topology
    #[error("Server {0} does not exist in the topology")]
    UnknownServerId(ServerId),
    /// The routing update interval is below the protocol minimum of 5 seconds
    #[error("Routing update interval must be at least 5 seconds (got {0})")]
    IntervalTooSmall(u64),
}
