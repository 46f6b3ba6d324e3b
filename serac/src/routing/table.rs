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

//! Module defining the routing state of one router, together with the Bellman-Ford engine.
//!
//! The [`RoutingTable`] is the single shared mutable structure of the router. The daemon
//! protects it with one mutex; every function here is pure in-memory computation, so holders
//! of the lock return it promptly.

use crate::routing::types::{
    saturate, to_wire, DeviceError, LinkWeight, NeighborState, ServerId,
};
use crate::topology::Topology;

use log::*;
use petgraph::graph::{NodeIndex, UnGraph};

use std::collections::{BTreeMap, HashSet, VecDeque};

/// Number of consecutive missed advertisement intervals after which a neighbor is considered
/// failed.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Capacity of the at-most-once deduplication set for link updates.
const DEDUP_CAP: usize = 128;

/// The complete routing state of one router.
///
/// The forwarding map has the shape `destination -> Option<(next_hop, cost)>`, where `None`
/// means the destination is unreachable. The entry for the router itself is always
/// `Some((self, 0))`.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    /// Id of this router
    local: ServerId,
    /// Every destination of the node table, in ascending id order
    destinations: Vec<ServerId>,
    /// Current cost of the direct link to each neighbor. Infinite when the neighbor is failed
    /// or the link is disabled.
    link_cost: BTreeMap<ServerId, LinkWeight>,
    /// Lifecycle state of each neighbor
    neighbor_state: BTreeMap<ServerId, NeighborState>,
    /// The distance vector most recently advertised by each neighbor. An absent entry means
    /// the neighbor never advertised (or its vector was cleared), which reads as infinite.
    neighbor_view: BTreeMap<ServerId, BTreeMap<ServerId, LinkWeight>>,
    /// The forwarding map: destination to next hop and cost
    fw_table: BTreeMap<ServerId, Option<(ServerId, LinkWeight)>>,
    /// This router's view of all link costs in the network, kept up to date by `link-update`
    /// propagation. The configured cost of a failed neighbor lives here, for reactivation.
    view: TopologyView,
    /// Number of well-formed messages consumed so far
    packets_received: u64,
    /// Advertisement intervals elapsed since the last message of each neighbor
    missed_intervals: BTreeMap<ServerId, u32>,
    /// At-most-once set of already applied `(a, b, cost)` link updates
    applied_updates: UpdateDedup,
}

impl RoutingTable {
    /// Create the routing state for the given router from the topology descriptor.
    pub fn new(topology: &Topology, local: ServerId) -> Result<Self, DeviceError> {
        if topology.node(local).is_none() {
            return Err(DeviceError::UnknownServer(local));
        }

        let mut link_cost = BTreeMap::new();
        let mut neighbor_state = BTreeMap::new();
        let mut missed_intervals = BTreeMap::new();
        for link in topology.incident_links(local) {
            let n = link.other(local).unwrap_or(local);
            link_cost.insert(n, link.cost);
            neighbor_state.insert(n, NeighborState::Active);
            missed_intervals.insert(n, 0);
        }

        let mut table = Self {
            local,
            destinations: topology.server_ids().collect(),
            link_cost,
            neighbor_state,
            neighbor_view: BTreeMap::new(),
            fw_table: BTreeMap::new(),
            view: TopologyView::new(topology),
            packets_received: 0,
            missed_intervals,
            applied_updates: UpdateDedup::new(DEDUP_CAP),
        };
        table.recompute();
        Ok(table)
    }

    /// Id of this router
    pub fn local(&self) -> ServerId {
        self.local
    }

    /// Every destination of the node table, in ascending id order
    pub fn destinations(&self) -> &[ServerId] {
        &self.destinations
    }

    /// The current best cost towards the given destination (infinite when unreachable).
    pub fn best(&self, dest: ServerId) -> LinkWeight {
        match self.fw_table.get(&dest) {
            Some(Some((_, cost))) => *cost,
            _ => LinkWeight::INFINITY,
        }
    }

    /// The first hop of the current best path towards the given destination, or `None` when
    /// the destination is unreachable.
    pub fn next_hop(&self, dest: ServerId) -> Option<ServerId> {
        match self.fw_table.get(&dest) {
            Some(Some((next_hop, _))) => Some(*next_hop),
            _ => None,
        }
    }

    /// The complete forwarding map, ordered by destination id.
    pub fn routes(
        &self,
    ) -> impl Iterator<Item = (ServerId, Option<(ServerId, LinkWeight)>)> + '_ {
        self.fw_table.iter().map(|(d, r)| (*d, *r))
    }

    /// The current cost of the direct link to the given neighbor.
    pub fn link_cost(&self, neighbor: ServerId) -> Option<LinkWeight> {
        self.link_cost.get(&neighbor).copied()
    }

    /// The lifecycle state of the given neighbor.
    pub fn neighbor_state(&self, neighbor: ServerId) -> Option<NeighborState> {
        self.neighbor_state.get(&neighbor).copied()
    }

    /// The cached distance vector of the given neighbor.
    pub fn neighbor_view(&self, neighbor: ServerId) -> Option<&BTreeMap<ServerId, LinkWeight>> {
        self.neighbor_view.get(&neighbor)
    }

    /// All neighbors whose link is currently active (finite cost).
    pub fn active_neighbors(&self) -> Vec<ServerId> {
        self.neighbor_state
            .iter()
            .filter(|(_, s)| **s == NeighborState::Active)
            .map(|(n, _)| *n)
            .collect()
    }

    /// Number of advertisement intervals elapsed since the given neighbor was last heard.
    pub fn missed_intervals(&self, neighbor: ServerId) -> Option<u32> {
        self.missed_intervals.get(&neighbor).copied()
    }

    /// Number of well-formed messages consumed so far. The counter never resets.
    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Count one well-formed inbound message.
    pub fn record_packet(&mut self) {
        self.packets_received += 1;
    }

    /// Snapshot the current distance vector for an advertisement, covering every destination
    /// of the node table (this router included, at cost 0).
    pub fn advertisement(&self) -> Vec<(ServerId, LinkWeight)> {
        self.destinations.iter().map(|d| (*d, self.best(*d))).collect()
    }

    /// Recompute the forwarding map from the neighbor link costs and the cached neighbor
    /// vectors. This applies the Bellman-Ford relaxation exactly once across all
    /// destinations; iteration to the fixed point is left to the protocol itself, since every
    /// advertisement round refines the vectors further. Returns true iff any route changed.
    pub fn recompute(&mut self) -> bool {
        let mut new_table = BTreeMap::new();
        for dest in &self.destinations {
            new_table.insert(*dest, self.compute_route(*dest));
        }
        let changed = new_table != self.fw_table;
        self.fw_table = new_table;
        debug_assert!(
            self.check_invariants().is_ok(),
            "routing state is corrupt after recompute: {:?}",
            self.check_invariants()
        );
        changed
    }

    /// Compute the best route towards one destination: the minimum over all active neighbors
    /// `n` of `link_cost[n] + view[n][dest]`, with ties broken towards the lowest neighbor
    /// id. A neighbor that never advertised counts as infinite, except for the direct-link
    /// shortcut towards the neighbor itself.
    fn compute_route(&self, dest: ServerId) -> Option<(ServerId, LinkWeight)> {
        if dest == self.local {
            return Some((self.local, 0.0));
        }
        let mut best: Option<(ServerId, LinkWeight)> = None;
        for (n, lc) in &self.link_cost {
            if !lc.is_finite() {
                continue;
            }
            let advertised = match self.neighbor_view.get(n).and_then(|v| v.get(&dest)) {
                Some(c) => *c,
                None if *n == dest => 0.0,
                None => LinkWeight::INFINITY,
            };
            let cost = saturate(lc + advertised);
            if !cost.is_finite() {
                continue;
            }
            match best {
                Some((_, b)) if b <= cost => {}
                _ => best = Some((*n, cost)),
            }
        }
        best
    }

    /// Apply an advertisement received from a neighbor: cache the vector, reset the missed
    /// interval counter, reactivate a failed neighbor, and recompute. Advertisements from
    /// disabled neighbors are ignored. Returns true iff any route changed.
    pub fn apply_advertisement(
        &mut self,
        sender: ServerId,
        entries: &[(ServerId, LinkWeight)],
    ) -> Result<bool, DeviceError> {
        if !self.neighbor_state.contains_key(&sender) {
            return Err(DeviceError::NotANeighbor(sender));
        }
        for (dest, cost) in entries {
            if !self.destinations.contains(dest) {
                return Err(DeviceError::UnknownServer(*dest));
            }
            if cost.is_nan() || *cost < 0.0 {
                return Err(DeviceError::InvalidCost(*cost));
            }
        }

        match self.neighbor_state.get(&sender) {
            Some(NeighborState::Disabled) => {
                trace!("Ignoring the advertisement of disabled neighbor {}", sender);
                return Ok(false);
            }
            Some(NeighborState::Failed) => match self.view.cost(self.local, sender) {
                Some(cost) if cost.is_finite() => {
                    info!("Neighbor {} is reachable again, restoring cost {}", sender, cost);
                    self.link_cost.insert(sender, cost);
                    self.neighbor_state.insert(sender, NeighborState::Active);
                }
                _ => {
                    trace!("Neighbor {} has no configured link cost, staying failed", sender);
                    return Ok(false);
                }
            },
            _ => {}
        }

        self.neighbor_view.insert(sender, entries.iter().copied().collect());
        self.missed_intervals.insert(sender, 0);
        Ok(self.recompute())
    }

    /// Set the cost of the link `a <-> b` bi-directionally. If this router is an endpoint,
    /// the direct link is adjusted: a finite cost (re)activates the neighbor, an infinite
    /// cost disables it and clears its cached vector. Otherwise, only the topology view is
    /// adjusted. Returns true iff any route changed.
    pub fn set_link_cost(
        &mut self,
        a: ServerId,
        b: ServerId,
        cost: LinkWeight,
    ) -> Result<bool, DeviceError> {
        if !(cost > 0.0) {
            return Err(DeviceError::InvalidCost(cost));
        }
        self.view.set_cost(a, b, cost)?;

        let neighbor = if a == self.local {
            Some(b)
        } else if b == self.local {
            Some(a)
        } else {
            None
        };
        if let Some(n) = neighbor {
            if cost.is_finite() {
                self.link_cost.insert(n, cost);
                self.neighbor_state.insert(n, NeighborState::Active);
                self.missed_intervals.insert(n, 0);
            } else {
                self.link_cost.insert(n, LinkWeight::INFINITY);
                self.neighbor_state.insert(n, NeighborState::Disabled);
                self.neighbor_view.remove(&n);
            }
        }
        Ok(self.recompute())
    }

    /// Disable the link to the given neighbor (operator command). The link cost becomes
    /// infinite, the cached vector is cleared, and only an `update` with a finite cost can
    /// reactivate the link. Returns true iff any route changed.
    pub fn disable_neighbor(&mut self, neighbor: ServerId) -> Result<bool, DeviceError> {
        if !self.neighbor_state.contains_key(&neighbor) {
            return Err(DeviceError::NotANeighbor(neighbor));
        }
        self.set_link_cost(self.local, neighbor, LinkWeight::INFINITY)
    }

    /// Mark a neighbor as failed (failure detector or crash notification). The link cost
    /// becomes infinite and the cached vector is cleared, but the configured cost is kept in
    /// the topology view: a later advertisement from the neighbor reactivates the link.
    /// Returns true iff any route changed.
    pub fn mark_failed(&mut self, neighbor: ServerId) -> Result<bool, DeviceError> {
        match self.neighbor_state.get(&neighbor) {
            None => return Err(DeviceError::NotANeighbor(neighbor)),
            // a disabled link stays disabled, only an update can reactivate it
            Some(NeighborState::Disabled) => return Ok(false),
            Some(_) => {}
        }
        self.link_cost.insert(neighbor, LinkWeight::INFINITY);
        self.neighbor_state.insert(neighbor, NeighborState::Failed);
        self.neighbor_view.remove(&neighbor);
        Ok(self.recompute())
    }

    /// Advance the failure detector by one advertisement interval: increment the missed
    /// interval counter of every active neighbor, and fail all neighbors that reached
    /// [`FAILURE_THRESHOLD`]. Returns the newly failed neighbors.
    pub fn tick_misses(&mut self) -> Vec<ServerId> {
        let mut newly_failed = Vec::new();
        for (n, state) in self.neighbor_state.clone() {
            if state != NeighborState::Active {
                continue;
            }
            let missed = self.missed_intervals.entry(n).or_insert(0);
            *missed += 1;
            if *missed >= FAILURE_THRESHOLD {
                newly_failed.push(n);
            }
        }
        for n in &newly_failed {
            warn!(
                "Neighbor {} missed {} advertisement intervals, marking as failed",
                n, FAILURE_THRESHOLD
            );
            let _ = self.mark_failed(*n);
        }
        newly_failed
    }

    /// Register a link update for at-most-once processing. Returns true if the triple
    /// `(a, b, cost)` was not seen before (and the update should be applied and forwarded),
    /// false if it is a repeat.
    pub fn register_link_update(&mut self, a: ServerId, b: ServerId, cost: LinkWeight) -> bool {
        self.applied_updates.insert(a, b, cost)
    }

    /// Verify the internal invariants: the self entry is pinned at cost 0, every forwarding
    /// entry is exactly the Bellman-Ford minimum over the neighbor vectors, the next hop
    /// achieves that minimum with the lowest neighbor id, and no cost is negative.
    pub(crate) fn check_invariants(&self) -> Result<(), DeviceError> {
        if self.fw_table.get(&self.local) != Some(&Some((self.local, 0.0))) {
            return Err(DeviceError::CorruptState("self entry must be (self, 0)"));
        }
        for dest in &self.destinations {
            let stored = self.fw_table.get(dest).copied().flatten();
            let expected = self.compute_route(*dest);
            if stored != expected {
                return Err(DeviceError::CorruptState(
                    "forwarding entry does not match the Bellman-Ford minimum",
                ));
            }
            if let Some((_, cost)) = stored {
                if cost < 0.0 {
                    return Err(DeviceError::CorruptState("negative cost"));
                }
            }
        }
        Ok(())
    }
}

/// This router's view of all link costs in the network, as an undirected weighted graph. One
/// edge per undirected link keeps the costs symmetric by construction.
#[derive(Debug, Clone)]
struct TopologyView {
    graph: UnGraph<ServerId, LinkWeight>,
    indices: BTreeMap<ServerId, NodeIndex<u32>>,
}

impl TopologyView {
    fn new(topology: &Topology) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut indices = BTreeMap::new();
        for id in topology.server_ids() {
            indices.insert(id, graph.add_node(id));
        }
        for link in topology.links() {
            graph.add_edge(indices[&link.a], indices[&link.b], link.cost);
        }
        Self { graph, indices }
    }

    /// The currently known cost of the link `a <-> b`, or `None` if there is no such link.
    fn cost(&self, a: ServerId, b: ServerId) -> Option<LinkWeight> {
        let (a, b) = (self.indices.get(&a)?, self.indices.get(&b)?);
        let edge = self.graph.find_edge(*a, *b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Set the cost of the link `a <-> b`. The link must already exist; the set of links is
    /// fixed after startup.
    fn set_cost(
        &mut self,
        a: ServerId,
        b: ServerId,
        cost: LinkWeight,
    ) -> Result<(), DeviceError> {
        let ia = *self.indices.get(&a).ok_or(DeviceError::UnknownServer(a))?;
        let ib = *self.indices.get(&b).ok_or(DeviceError::UnknownServer(b))?;
        let edge = self.graph.find_edge(ia, ib).ok_or(DeviceError::UnknownLink(a, b))?;
        self.graph[edge] = cost;
        Ok(())
    }
}

/// At-most-once set of applied link updates, bounded by dropping the oldest entries.
#[derive(Debug, Clone)]
struct UpdateDedup {
    cap: usize,
    seen: HashSet<(u32, u32, u32)>,
    order: VecDeque<(u32, u32, u32)>,
}

impl UpdateDedup {
    fn new(cap: usize) -> Self {
        Self { cap, seen: HashSet::new(), order: VecDeque::new() }
    }

    /// Insert the normalized triple. Returns true if it was not present.
    fn insert(&mut self, a: ServerId, b: ServerId, cost: LinkWeight) -> bool {
        let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let key = (lo, hi, to_wire(cost).to_bits());
        if !self.seen.insert(key) {
            return false;
        }
        self.order.push_back(key);
        if self.order.len() > self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}
