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

#![deny(missing_docs)]

//! # Serac: Distributed Distance-Vector Routing
//!
//! This is a library implementing a distance-vector routing protocol among a fixed set of
//! servers, each identified by a small integer id and addressed by an IP/port pair. Every
//! process hosts one router. Routers periodically advertise their current distance vector to
//! all direct neighbors, and converge on shortest-path routes using the Bellman-Ford
//! relaxation.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Topology`](topology::Topology)**: The immutable topology descriptor, parsed once at
//!   startup from the topology file. It contains the server table (id, host and port) and the
//!   initial link list.
//!
//! - **[`Routing`](routing)**: The routing core. The central structure is the
//!   [`RoutingTable`](routing::RoutingTable), which holds all shared mutable routing state of
//!   one router and implements the Bellman-Ford recomputation. The [`Message`](routing::Message)
//!   enum together with the [`codec`](routing::codec) define the wire protocol spoken between
//!   the routers.
//!
//! - **[`Daemon`](daemon)**: The concurrent router runtime. The
//!   [`RouterDaemon`](daemon::RouterDaemon) wraps the routing table into an `Arc<Mutex<_>>`,
//!   and spawns the listener thread (accepting neighbor messages) and the periodic advertiser
//!   thread (which doubles as the neighbor failure detector). All network I/O happens outside
//!   of the routing lock.
//!
//! - **[`Command`](command)**: The operator commands (`display`, `step`, `packets`, `update`,
//!   `disable`, `crash`), parsed from a line-oriented shell and executed atomically against
//!   the routing state.
//!
//! ## Example usage
//!
//! The following example parses a three-server topology, creates the router daemon for server
//! 1, and forces a single advertisement round.
//!
//! ```no_run
//! use serac::topology::Topology;
//! use serac::routing::ServerId;
//! use serac::daemon::RouterDaemon;
//! use serac::command::Command;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let topology = Topology::parse(
//!         "3\n\
//!          3\n\
//!          1 127.0.0.1 2741\n\
//!          2 127.0.0.1 2742\n\
//!          3 127.0.0.1 2743\n\
//!          1 2 2\n\
//!          2 3 3\n\
//!          1 3 7\n",
//!     )?;
//!
//!     let daemon = RouterDaemon::new(topology, ServerId(1), Duration::from_secs(10))?;
//!     let handle = daemon.spawn()?;
//!
//!     // force an advertisement round
//!     daemon.execute(Command::Step)?;
//!
//!     // shut the router down again
//!     daemon.stopper().send_stop();
//!     handle.join();
//!
//!     Ok(())
//! }
//! ```

// test modules
mod test;

pub mod command;
pub mod daemon;
mod error;
pub mod routing;
pub mod topology;

pub use error::Error;

use std::sync::{Arc, RwLock};

/// Stopper, to check when to stop, or to send the stop command. Every task of the router
/// daemon observes the stopper at its natural suspension points, and exits within a bounded
/// window after the stop command was sent.
#[derive(Clone, Debug)]
pub struct Stopper {
    b: Arc<RwLock<bool>>,
}

impl Default for Stopper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopper {
    /// Create a new stopper
    pub fn new() -> Self {
        Self { b: Arc::new(RwLock::new(false)) }
    }

    /// Send the stop command. This function will block until the write lock can be acquired.
    pub fn send_stop(&self) {
        *self.b.write().unwrap() = true;
    }

    /// Checks if the stop flag is set. This function will block until the read lock can be
    /// acquired.
    pub fn is_stop(&self) -> bool {
        *self.b.read().unwrap()
    }
}
