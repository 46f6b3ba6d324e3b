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

//! # The concurrent router runtime
//!
//! The [`RouterDaemon`] owns the routing table behind one mutex, and coordinates the three
//! concurrent activities of the router:
//!
//! - the **listener** thread, accepting neighbor connections and decoding one framed message
//!   per connection,
//! - the **periodic advertiser** thread, which also advances the neighbor failure detector,
//! - the **command dispatcher**, driven by whoever owns the operator input (the binary runs
//!   it on the main thread).
//!
//! All three serialize against the routing state through the mutex. Holding the lock is pure
//! in-memory work: every function that mutates the table first computes the set of messages
//! to send, then releases the lock, and only then performs network I/O.

pub(crate) mod advertiser;
pub(crate) mod listener;
pub mod transport;

use crate::command::{Command, CommandError, CommandReport};
use crate::error::Error;
use crate::routing::message::{Message, VectorEntry};
use crate::routing::printer;
use crate::routing::table::RoutingTable;
use crate::routing::types::{from_wire, to_wire, LinkWeight, ServerId};
use crate::topology::{Node, Topology};
use crate::Stopper;

use log::*;

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The router daemon: one router of the distance-vector protocol, with its routing state, its
/// identity, and its view of the topology. Cloning the daemon yields another handle onto the
/// same router; every spawned task holds such a clone.
#[derive(Debug, Clone)]
pub struct RouterDaemon {
    topology: Arc<Topology>,
    local: Node,
    interval: Duration,
    table: Arc<Mutex<RoutingTable>>,
    stop: Stopper,
}

/// Join handles of the spawned router tasks.
#[derive(Debug)]
pub struct DaemonHandle {
    listener: JoinHandle<()>,
    advertiser: JoinHandle<()>,
}

impl DaemonHandle {
    /// Wait for all router tasks to exit. Call this after the stopper fired.
    pub fn join(self) {
        let _ = self.listener.join();
        let _ = self.advertiser.join();
    }
}

impl RouterDaemon {
    /// Create the daemon for the given router. The topology must contain the local id; the
    /// listening socket is not bound yet (see [`RouterDaemon::spawn`]).
    pub fn new(
        topology: Topology,
        local: ServerId,
        interval: Duration,
    ) -> Result<Self, Error> {
        let node = topology.node(local).ok_or(Error::UnknownServerId(local))?.clone();
        let table = RoutingTable::new(&topology, local)?;
        Ok(Self {
            topology: Arc::new(topology),
            local: node,
            interval,
            table: Arc::new(Mutex::new(table)),
            stop: Stopper::new(),
        })
    }

    /// Bind the listening socket and spawn the listener and advertiser threads. Binding
    /// failures are fatal: a router that cannot receive advertisements must not come up.
    pub fn spawn(&self) -> Result<DaemonHandle, Error> {
        let socket = TcpListener::bind(self.local.addr()).map_err(Error::BindError)?;
        socket.set_nonblocking(true).map_err(Error::BindError)?;
        info!("Server {} listening on {}", self.local.id, self.local.addr());

        let l = {
            let daemon = self.clone();
            thread::spawn(move || listener::run(daemon, socket))
        };
        let a = {
            let daemon = self.clone();
            thread::spawn(move || advertiser::run(daemon))
        };
        Ok(DaemonHandle { listener: l, advertiser: a })
    }

    /// The node record of this router
    pub fn local(&self) -> &Node {
        &self.local
    }

    /// The advertisement interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A handle onto the termination flag
    pub fn stopper(&self) -> Stopper {
        self.stop.clone()
    }

    /// Lock the routing table. The lock must never be held across network I/O.
    pub fn table(&self) -> MutexGuard<'_, RoutingTable> {
        self.table.lock().unwrap()
    }

    /// Apply one decoded inbound message and send out whatever it produced.
    pub(crate) fn handle_message(&self, msg: Message) {
        for (addr, msg) in self.process_message(msg) {
            transport::send_best_effort(addr, &msg);
        }
    }

    /// Apply one decoded inbound message under the lock, and return the messages to send
    /// afterwards. Packets that fail validation are dropped without counting; everything
    /// well-formed increments the packet counter, whether or not it changes any state.
    pub(crate) fn process_message(&self, msg: Message) -> Vec<(SocketAddr, Message)> {
        match &msg {
            Message::Advertisement { sender, host, port, entries } => {
                let node = match self.topology.node(*sender) {
                    Some(node) => node,
                    None => {
                        warn!("Dropping advertisement of unknown server {}", sender);
                        return Vec::new();
                    }
                };
                if node.host != *host || node.port != *port {
                    warn!(
                        "Dropping advertisement of server {}: claimed address {}:{} does not match {}",
                        sender, host, port, node.addr()
                    );
                    return Vec::new();
                }
                let mut vector = Vec::with_capacity(entries.len());
                for entry in entries {
                    let cost = from_wire(entry.cost);
                    if self.topology.node(entry.dest).is_none() || cost.is_nan() || cost < 0.0
                    {
                        warn!(
                            "Dropping advertisement of server {}: invalid entry {} -> {}",
                            sender, entry.dest, entry.cost
                        );
                        return Vec::new();
                    }
                    vector.push((entry.dest, cost));
                }

                let mut table = self.table();
                table.record_packet();
                match table.apply_advertisement(*sender, &vector) {
                    Ok(true) => {
                        trace!("Advertisement of server {} changed the routing table", sender);
                        self.advertisement_sends(&table)
                    }
                    Ok(false) => Vec::new(),
                    Err(e) => {
                        warn!("Ignoring advertisement of server {}: {}", sender, e);
                        Vec::new()
                    }
                }
            }
            Message::LinkUpdate { link_a, link_b, cost, origin } => {
                self.apply_link_message(&msg, *link_a, *link_b, from_wire(*cost), *origin)
            }
            Message::LinkDisable { link_a, link_b, origin } => {
                self.apply_link_message(&msg, *link_a, *link_b, LinkWeight::INFINITY, *origin)
            }
            Message::CrashNotify { origin } => {
                if self.topology.node(*origin).is_none() {
                    warn!("Dropping crash-notify of unknown server {}", origin);
                    return Vec::new();
                }
                info!("Server {} is going offline", origin);
                let mut table = self.table();
                table.record_packet();
                match table.mark_failed(*origin) {
                    Ok(true) => self.advertisement_sends(&table),
                    Ok(_) => Vec::new(),
                    Err(_) => {
                        // not a neighbor, nothing to tear down locally
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Apply a link-update or link-disable: deduplicate, mutate the routing state, forward
    /// the message away from its origin, and advertise if anything changed.
    fn apply_link_message(
        &self,
        msg: &Message,
        link_a: ServerId,
        link_b: ServerId,
        cost: LinkWeight,
        origin: ServerId,
    ) -> Vec<(SocketAddr, Message)> {
        for id in &[link_a, link_b, origin] {
            if self.topology.node(*id).is_none() {
                warn!("Dropping {}: unknown server {}", printer::message(msg), id);
                return Vec::new();
            }
        }
        if cost.is_nan() || cost <= 0.0 {
            warn!("Dropping {}: invalid cost", printer::message(msg));
            return Vec::new();
        }

        let mut table = self.table();
        table.record_packet();
        if !table.register_link_update(link_a, link_b, cost) {
            trace!("Already processed {}, skipping", printer::message(msg));
            return Vec::new();
        }
        let changed = match table.set_link_cost(link_a, link_b, cost) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Dropping {}: {}", printer::message(msg), e);
                return Vec::new();
            }
        };
        info!("Applied {}", printer::message(msg));
        let mut sends = self.forward_sends(&table, msg, origin);
        if changed {
            sends.extend(self.advertisement_sends(&table));
        }
        sends
    }

    /// Execute one operator command atomically against the routing state. Network sends
    /// happen after the lock is released.
    pub fn execute(&self, cmd: Command) -> Result<CommandReport, CommandError> {
        match cmd {
            Command::Display => Ok(CommandReport::Table(printer::routing_table(&self.table()))),
            Command::Step => {
                let sends = self.advertisement_sends(&self.table());
                self.send_all(sends);
                Ok(CommandReport::Done("step"))
            }
            Command::Packets => Ok(CommandReport::Packets(self.table().packets_received())),
            Command::Update { link_a, link_b, cost } => {
                let sends = {
                    let mut table = self.table();
                    let changed = table.set_link_cost(link_a, link_b, cost)?;
                    // our own update must not be re-applied when neighbors echo it back
                    table.register_link_update(link_a, link_b, cost);
                    let msg = if cost.is_finite() {
                        Message::LinkUpdate {
                            link_a,
                            link_b,
                            cost: to_wire(cost),
                            origin: self.local.id,
                        }
                    } else {
                        Message::LinkDisable { link_a, link_b, origin: self.local.id }
                    };
                    let mut sends = self.forward_sends(&table, &msg, self.local.id);
                    if changed {
                        sends.extend(self.advertisement_sends(&table));
                    }
                    sends
                };
                self.send_all(sends);
                Ok(CommandReport::Done("update"))
            }
            Command::Disable { server } => {
                let sends = {
                    let mut table = self.table();
                    let changed = table.disable_neighbor(server)?;
                    table.register_link_update(self.local.id, server, LinkWeight::INFINITY);
                    let msg = Message::LinkDisable {
                        link_a: self.local.id,
                        link_b: server,
                        origin: self.local.id,
                    };
                    let mut sends = self.forward_sends(&table, &msg, self.local.id);
                    if changed {
                        sends.extend(self.advertisement_sends(&table));
                    }
                    sends
                };
                self.send_all(sends);
                Ok(CommandReport::Done("disable"))
            }
            Command::Crash => {
                let sends: Vec<(SocketAddr, Message)> = {
                    let table = self.table();
                    let msg = Message::CrashNotify { origin: self.local.id };
                    self.neighbor_sends(&table, &msg, None)
                };
                self.send_all(sends);
                self.stop.send_stop();
                Ok(CommandReport::Done("crash"))
            }
        }
    }

    /// Build the advertisement of the current distance vector, addressed to every active
    /// neighbor.
    pub(crate) fn advertisement_sends(
        &self,
        table: &RoutingTable,
    ) -> Vec<(SocketAddr, Message)> {
        let entries: Vec<VectorEntry> = table
            .advertisement()
            .into_iter()
            .map(|(dest, cost)| VectorEntry { dest, cost: to_wire(cost) })
            .collect();
        let msg = Message::Advertisement {
            sender: self.local.id,
            host: self.local.host,
            port: self.local.port,
            entries,
        };
        self.neighbor_sends(table, &msg, None)
    }

    /// Address the given message to every active neighbor except the origin of the message.
    fn forward_sends(
        &self,
        table: &RoutingTable,
        msg: &Message,
        origin: ServerId,
    ) -> Vec<(SocketAddr, Message)> {
        self.neighbor_sends(table, msg, Some(origin))
    }

    /// Address the given message to every active neighbor, optionally excluding one.
    fn neighbor_sends(
        &self,
        table: &RoutingTable,
        msg: &Message,
        exclude: Option<ServerId>,
    ) -> Vec<(SocketAddr, Message)> {
        table
            .active_neighbors()
            .into_iter()
            .filter(|n| Some(*n) != exclude)
            .filter_map(|n| self.topology.node(n))
            .map(|node| (node.addr(), msg.clone()))
            .collect()
    }

    /// Send all given messages, treating failures as dropped sends.
    fn send_all(&self, sends: Vec<(SocketAddr, Message)>) {
        for (addr, msg) in sends {
            transport::send_best_effort(addr, &msg);
        }
    }
}
