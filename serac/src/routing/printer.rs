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

//! # Helper (printer) functions for the routing table
//! Module containing helper functions to get formatted strings for the operator and the logs.

use crate::routing::message::Message;
use crate::routing::table::RoutingTable;
use crate::routing::types::{from_wire, LinkWeight};

use itertools::Itertools;

/// Returns the formatted routing table, one line per destination sorted by destination id,
/// with the columns destination, next hop and cost. Unreachable destinations show an infinite
/// cost and no next hop.
pub fn routing_table(table: &RoutingTable) -> String {
    let header = format!("{:<16}{:<16}{}", "Destination", "Next Hop", "Cost");
    let lines = table.routes().map(|(dest, route)| match route {
        Some((next_hop, c)) => format!("{:<16}{:<16}{}", dest, next_hop, cost(c)),
        None => format!("{:<16}{:<16}{}", dest, "-", cost(LinkWeight::INFINITY)),
    });
    std::iter::once(header).chain(lines).join("\n")
}

/// Returns the formatted string for a cost: `infinity` for the unreachable sentinel, and the
/// number with its decimals trimmed otherwise.
pub fn cost(cost: LinkWeight) -> String {
    if !cost.is_finite() {
        String::from("infinity")
    } else if cost.fract() == 0.0 {
        format!("{}", cost as u64)
    } else {
        format!("{}", cost)
    }
}

/// Return a formatted one-line string for a given message, used in the logs.
pub fn message(msg: &Message) -> String {
    match msg {
        Message::Advertisement { sender, entries, .. } => format!(
            "advertisement from {}: [{}]",
            sender,
            entries.iter().map(|e| format!("{}: {}", e.dest, cost(from_wire(e.cost)))).join(", "),
        ),
        Message::LinkUpdate { link_a, link_b, cost: c, origin } => format!(
            "link-update {} <-> {} to cost {} (origin {})",
            link_a,
            link_b,
            cost(from_wire(*c)),
            origin
        ),
        Message::LinkDisable { link_a, link_b, origin } => {
            format!("link-disable {} <-> {} (origin {})", link_a, link_b, origin)
        }
        Message::CrashNotify { origin } => format!("crash-notify from {}", origin),
    }
}
