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

//! Whole-protocol convergence tests: several routing tables exchanging advertisements in
//! synchronous rounds, without any sockets in between.

use crate::routing::types::{LinkWeight, NeighborState, ServerId};
use crate::routing::RoutingTable;
use crate::topology::Topology;

use assert_approx_eq::assert_approx_eq;
use lazy_static::lazy_static;
use maplit::btreemap;

use std::collections::BTreeMap;

const INF: LinkWeight = LinkWeight::INFINITY;

lazy_static! {
    /// The T3 topology: nodes {1, 2, 3} with links {(1,2,2), (2,3,3), (1,3,7)}
    static ref T3: Topology = Topology::parse(
        "3\n3\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n3 10.0.0.3 2743\n1 2 2\n2 3 3\n1 3 7\n",
    )
    .unwrap();
}

fn id(x: u32) -> ServerId {
    ServerId(x)
}

/// Build one routing table per server of the topology.
fn network(topology: &Topology) -> BTreeMap<ServerId, RoutingTable> {
    topology
        .server_ids()
        .map(|id| (id, RoutingTable::new(topology, id).unwrap()))
        .collect()
}

/// Run one synchronous advertisement round: every router snapshots its vector, then every
/// active neighbor applies it. Returns true iff any routing table changed.
fn advertisement_round(net: &mut BTreeMap<ServerId, RoutingTable>) -> bool {
    let mut deliveries = Vec::new();
    for (sender, table) in net.iter() {
        let vector = table.advertisement();
        for neighbor in table.active_neighbors() {
            deliveries.push((*sender, neighbor, vector.clone()));
        }
    }
    let mut changed = false;
    for (sender, receiver, vector) in deliveries {
        if let Some(table) = net.get_mut(&receiver) {
            table.record_packet();
            changed |= table.apply_advertisement(sender, &vector).unwrap_or(false);
        }
    }
    changed
}

/// Run advertisement rounds until nothing changes anymore (or the round limit is hit).
/// Returns the number of rounds needed to reach the fixed point.
fn converge(net: &mut BTreeMap<ServerId, RoutingTable>, max_rounds: usize) -> usize {
    for round in 1..=max_rounds {
        if !advertisement_round(net) {
            return round;
        }
    }
    panic!("no convergence within {} rounds", max_rounds);
}

/// Walk the next hops from `from` to `dest` across all tables and return the traversed
/// per-hop link costs. Panics on a forwarding loop.
fn walk_path(
    net: &BTreeMap<ServerId, RoutingTable>,
    from: ServerId,
    dest: ServerId,
) -> Vec<LinkWeight> {
    let mut costs = Vec::new();
    let mut current = from;
    let mut visited = vec![from];
    while current != dest {
        let table = &net[&current];
        let hop = table.next_hop(dest).expect("path must exist");
        costs.push(table.link_cost(hop).expect("next hop must be a neighbor"));
        assert!(!visited.contains(&hop), "forwarding loop through {}", hop);
        visited.push(hop);
        current = hop;
    }
    costs
}

#[test]
fn initial_convergence() {
    let mut net = network(&T3);
    converge(&mut net, 10);

    let best: BTreeMap<ServerId, Vec<LinkWeight>> = net
        .iter()
        .map(|(id, t)| (*id, vec![t.best(ServerId(1)), t.best(ServerId(2)), t.best(ServerId(3))]))
        .collect();
    assert_eq!(
        best,
        btreemap! {
            id(1) => vec![0.0, 2.0, 5.0],
            id(2) => vec![2.0, 0.0, 3.0],
            id(3) => vec![5.0, 3.0, 0.0],
        }
    );

    assert_eq!(net[&id(1)].next_hop(id(3)), Some(id(2)));
    assert_eq!(net[&id(2)].next_hop(id(1)), Some(id(1)));
    assert_eq!(net[&id(2)].next_hop(id(3)), Some(id(3)));
    assert_eq!(net[&id(3)].next_hop(id(1)), Some(id(2)));

    for table in net.values() {
        table.check_invariants().unwrap();
    }
}

#[test]
fn fixed_point_within_node_count_rounds() {
    let mut net = network(&T3);
    // with 3 nodes, at most 2 rounds change anything; one more confirms the fixed point
    let rounds = converge(&mut net, 10);
    assert!(rounds <= T3.num_servers());
    // further rounds change nothing
    assert!(!advertisement_round(&mut net));
    assert!(!advertisement_round(&mut net));
}

#[test]
fn path_costs_sum_to_best() {
    let mut net = network(&T3);
    converge(&mut net, 10);
    for from in T3.server_ids() {
        for dest in T3.server_ids() {
            let best = net[&from].best(dest);
            assert!(best.is_finite());
            let path: LinkWeight = walk_path(&net, from, dest).iter().sum();
            assert_approx_eq!(path, best);
        }
    }
}

#[test]
fn packet_counter_counts_deliveries() {
    let mut net = network(&T3);
    advertisement_round(&mut net);
    // each of the two neighbors sent one advertisement
    assert_eq!(net[&id(1)].packets_received(), 2);
    advertisement_round(&mut net);
    assert_eq!(net[&id(1)].packets_received(), 4);
}

#[test]
fn cost_change_propagates() {
    let mut net = network(&T3);
    converge(&mut net, 10);

    // the operator issues `update 1 3 1` on node 1; the link-update message makes node 3
    // apply the same change
    net.get_mut(&id(1)).unwrap().set_link_cost(id(1), id(3), 1.0).unwrap();
    net.get_mut(&id(3)).unwrap().set_link_cost(id(1), id(3), 1.0).unwrap();
    net.get_mut(&id(2)).unwrap().set_link_cost(id(1), id(3), 1.0).unwrap();
    converge(&mut net, 10);

    // both endpoints see the new cost on their direct link
    assert_approx_eq!(net[&id(1)].link_cost(id(3)).unwrap(), 1.0);
    assert_approx_eq!(net[&id(3)].link_cost(id(1)).unwrap(), 1.0);

    assert_approx_eq!(net[&id(1)].best(id(3)), 1.0);
    assert_eq!(net[&id(1)].next_hop(id(3)), Some(id(3)));
    assert_approx_eq!(net[&id(3)].best(id(1)), 1.0);
    // node 3 reaches 2 either directly (cost 3) or via 1 (also cost 3); the tie breaks
    // towards the lower neighbor id
    assert_approx_eq!(net[&id(3)].best(id(2)), 3.0);
    assert_eq!(net[&id(3)].next_hop(id(2)), Some(id(1)));
}

#[test]
fn disable_reroutes_over_remaining_link() {
    let mut net = network(&T3);
    converge(&mut net, 10);

    // the operator issues `disable 3` on node 2; node 3 learns it via link-disable
    net.get_mut(&id(2)).unwrap().disable_neighbor(id(3)).unwrap();
    net.get_mut(&id(3)).unwrap().set_link_cost(id(2), id(3), INF).unwrap();
    net.get_mut(&id(1)).unwrap().set_link_cost(id(2), id(3), INF).unwrap();
    converge(&mut net, 10);

    // the only remaining path between 2 and 3 goes over node 1
    assert_approx_eq!(net[&id(2)].best(id(3)), 9.0);
    assert_eq!(net[&id(2)].next_hop(id(3)), Some(id(1)));
    assert_approx_eq!(net[&id(3)].best(id(2)), 9.0);
    assert_eq!(net[&id(3)].next_hop(id(2)), Some(id(1)));
    assert_eq!(net[&id(2)].neighbor_state(id(3)), Some(NeighborState::Disabled));
}

#[test]
fn crash_notify_cuts_all_routes_through_the_node() {
    let topology = Topology::parse(
        // a line 1 - 2 - 3, so that the crash of 2 partitions the network
        "3\n2\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n3 10.0.0.3 2743\n1 2 2\n2 3 3\n",
    )
    .unwrap();
    let mut net = network(&topology);
    converge(&mut net, 10);
    assert_approx_eq!(net[&id(1)].best(id(3)), 5.0);

    // node 2 crashes and notifies its neighbors
    net.remove(&id(2));
    net.get_mut(&id(1)).unwrap().mark_failed(id(2)).unwrap();
    net.get_mut(&id(3)).unwrap().mark_failed(id(2)).unwrap();
    converge(&mut net, 10);

    for table in net.values() {
        assert_eq!(table.best(id(2)), INF);
        assert_eq!(table.next_hop(id(2)), None);
        table.check_invariants().unwrap();
    }
    assert_eq!(net[&id(1)].best(id(3)), INF);
    assert_eq!(net[&id(3)].best(id(1)), INF);
}

#[test]
fn count_to_infinity_saturates_at_the_cap() {
    // in T3, nodes 1 and 3 stay connected after node 2 dies. Plain distance-vector inflates
    // the mutual routes towards 2 round by round, until the cap declares them unreachable.
    let mut net = network(&T3);
    converge(&mut net, 10);

    net.remove(&id(2));
    net.get_mut(&id(1)).unwrap().mark_failed(id(2)).unwrap();
    net.get_mut(&id(3)).unwrap().mark_failed(id(2)).unwrap();
    let rounds = converge(&mut net, 50_000);

    assert_eq!(net[&id(1)].best(id(2)), INF);
    assert_eq!(net[&id(3)].best(id(2)), INF);
    // the route between 1 and 3 survives
    assert_approx_eq!(net[&id(1)].best(id(3)), 7.0);
    assert_approx_eq!(net[&id(3)].best(id(1)), 7.0);
    // the routes kept inflating for thousands of rounds before the cap cut them off
    assert!(rounds > 100);
}

#[test]
fn vector_from_non_neighbor_is_rejected() {
    let mut net = network(&T3);
    converge(&mut net, 10);
    let before: Vec<_> = net[&id(1)].routes().collect();

    let err = net
        .get_mut(&id(1))
        .unwrap()
        .apply_advertisement(id(9), &[(id(1), 1.0)])
        .unwrap_err();
    assert_eq!(err, crate::routing::DeviceError::NotANeighbor(id(9)));
    assert_eq!(net[&id(1)].routes().collect::<Vec<_>>(), before);
}
