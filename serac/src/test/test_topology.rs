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

use crate::routing::ServerId;
use crate::topology::{Topology, TopologyError};

#[test]
fn parse_simple() {
    let t = Topology::parse(
        "3\n3\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n3 10.0.0.3 2743\n1 2 2\n2 3 3\n1 3 7\n",
    )
    .unwrap();
    assert_eq!(t.num_servers(), 3);
    assert_eq!(t.links().len(), 3);
    let n2 = t.node(ServerId(2)).unwrap();
    assert_eq!(n2.host, "10.0.0.2".parse::<std::net::IpAddr>().unwrap());
    assert_eq!(n2.port, 2742);
    assert_eq!(n2.addr().to_string(), "10.0.0.2:2742");
    assert_eq!(t.node(ServerId(4)), None);
    assert_eq!(
        t.server_ids().collect::<Vec<_>>(),
        vec![ServerId(1), ServerId(2), ServerId(3)]
    );
}

#[test]
fn parse_comments_and_blank_lines() {
    let t = Topology::parse(
        "# the T3 topology\n\
         3       # servers\n\
         \n\
         2       # links\n\
         1 10.0.0.1 2741\n\
         \n\
         2 10.0.0.2 2742  # second server\n\
         3 10.0.0.3 2743\n\
         1 2 2\n\
         2 3 3\n\
         # done\n",
    )
    .unwrap();
    assert_eq!(t.num_servers(), 3);
    assert_eq!(t.links().len(), 2);
}

#[test]
fn incident_links() {
    let t = Topology::parse(
        "3\n2\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n3 10.0.0.3 2743\n1 2 2\n2 3 3\n",
    )
    .unwrap();
    let incident: Vec<_> =
        t.incident_links(ServerId(2)).map(|l| l.other(ServerId(2)).unwrap()).collect();
    assert_eq!(incident, vec![ServerId(1), ServerId(3)]);
    assert_eq!(t.incident_links(ServerId(1)).count(), 1);
}

#[test]
fn find_by_host() {
    let t = Topology::parse("2\n1\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n1 2 1\n").unwrap();
    let node = t.find_by_host("10.0.0.2".parse().unwrap()).unwrap();
    assert_eq!(node.id, ServerId(2));
    assert!(t.find_by_host("10.0.0.9".parse().unwrap()).is_none());
}

#[test]
fn reject_bad_count() {
    assert_eq!(
        Topology::parse("x\n0\n"),
        Err(TopologyError::InvalidCount {
            line: 1,
            what: "number of servers",
            content: "x".to_string()
        })
    );
}

#[test]
fn reject_truncated_file() {
    assert_eq!(
        Topology::parse("2\n1\n1 10.0.0.1 2741\n"),
        Err(TopologyError::UnexpectedEnd)
    );
}

#[test]
fn reject_bad_server_line() {
    // port 0 is not a valid port
    let r = Topology::parse("1\n0\n1 10.0.0.1 0\n");
    assert!(matches!(r, Err(TopologyError::InvalidServerLine { line: 3, .. })));
    // id 0 is not a valid server id
    let r = Topology::parse("1\n0\n0 10.0.0.1 2741\n");
    assert!(matches!(r, Err(TopologyError::InvalidServerLine { .. })));
    // not an address
    let r = Topology::parse("1\n0\n1 localhost 2741\n");
    assert!(matches!(r, Err(TopologyError::InvalidServerLine { .. })));
}

#[test]
fn reject_bad_link() {
    let nodes = "2\n1\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n";
    // negative cost
    let r = Topology::parse(&format!("{}1 2 -3\n", nodes));
    assert!(matches!(r, Err(TopologyError::InvalidLinkLine { .. })));
    // zero cost
    let r = Topology::parse(&format!("{}1 2 0\n", nodes));
    assert!(matches!(r, Err(TopologyError::InvalidLinkLine { .. })));
    // unknown endpoint
    let r = Topology::parse(&format!("{}1 7 3\n", nodes));
    assert_eq!(r, Err(TopologyError::UnknownEndpoint { line: 5, id: ServerId(7) }));
    // self loop
    let r = Topology::parse(&format!("{}1 1 3\n", nodes));
    assert_eq!(r, Err(TopologyError::SelfLoop { line: 5, id: ServerId(1) }));
}

#[test]
fn reject_duplicates() {
    let r = Topology::parse("2\n1\n1 10.0.0.1 2741\n1 10.0.0.2 2742\n1 1 1\n");
    assert_eq!(r, Err(TopologyError::DuplicateServer { line: 4, id: ServerId(1) }));
    let r = Topology::parse(
        "2\n2\n1 10.0.0.1 2741\n2 10.0.0.2 2742\n1 2 1\n2 1 4\n",
    );
    assert_eq!(
        r,
        Err(TopologyError::DuplicateLink { line: 6, a: ServerId(2), b: ServerId(1) })
    );
}

#[test]
fn reject_trailing_content() {
    let r = Topology::parse("1\n0\n1 10.0.0.1 2741\nsomething else\n");
    assert!(matches!(r, Err(TopologyError::UnexpectedToken { line: 4, .. })));
}
