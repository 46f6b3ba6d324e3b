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

//! Module defining the messages exchanged between routers.
//!
//! All costs inside messages are wire-encoded: finite numbers, with
//! [`INF_CAP`](crate::routing::INF_CAP) as the sentinel for "unreachable" (see
//! [`to_wire`](crate::routing::to_wire) and [`from_wire`](crate::routing::from_wire)).

use crate::routing::types::{LinkWeight, ServerId};

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One entry of an advertised distance vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// The destination the entry talks about
    pub dest: ServerId,
    /// The advertised cost from the sender to the destination (wire-encoded)
    pub cost: LinkWeight,
}

/// A message exchanged between two routers. Messages are self-describing: the receiver learns
/// everything it needs from the payload, never from the transport connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// The periodic advertisement: the full distance vector of the sender, covering every
    /// destination of the node table (including the sender itself, at cost 0). The sender
    /// identifies itself by id, host and port; the receiver verifies this identity against
    /// its own node table and rejects mismatches.
    Advertisement {
        /// Id of the advertising router
        sender: ServerId,
        /// Host address the sender claims to listen on
        host: IpAddr,
        /// Port the sender claims to listen on
        port: u16,
        /// The advertised distance vector. The receiver must not rely on any ordering.
        entries: Vec<VectorEntry>,
    },
    /// Request to set the cost of the link `link_a <-> link_b`. Forwarded through the network
    /// at most once per `(link_a, link_b, cost)` triple per router.
    LinkUpdate {
        /// First endpoint of the link
        link_a: ServerId,
        /// Second endpoint of the link
        link_b: ServerId,
        /// The new cost of the link (wire-encoded)
        cost: LinkWeight,
        /// The router where the operator issued the update
        origin: ServerId,
    },
    /// Request to disable the link `link_a <-> link_b`. Equivalent to a [`Message::LinkUpdate`]
    /// with an infinite cost, but kept as a distinct kind so receivers may free the cached
    /// vector of a disabled neighbor.
    LinkDisable {
        /// First endpoint of the link
        link_a: ServerId,
        /// Second endpoint of the link
        link_b: ServerId,
        /// The router where the operator issued the disable
        origin: ServerId,
    },
    /// Advisory that the origin router is going offline.
    CrashNotify {
        /// The crashing router
        origin: ServerId,
    },
}

impl Message {
    /// Returns a short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Advertisement { .. } => "advertisement",
            Self::LinkUpdate { .. } => "link-update",
            Self::LinkDisable { .. } => "link-disable",
            Self::CrashNotify { .. } => "crash-notify",
        }
    }

    /// Returns the router this message originates from.
    pub fn origin(&self) -> ServerId {
        match self {
            Self::Advertisement { sender, .. } => *sender,
            Self::LinkUpdate { origin, .. } => *origin,
            Self::LinkDisable { origin, .. } => *origin,
            Self::CrashNotify { origin } => *origin,
        }
    }
}
