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

//! Module for parsing the topology file into the immutable topology descriptor.
//!
//! The file format is plain text. The first meaningful line holds the number of servers, the
//! second the number of links. Then, one line per server follows (`id host port`), and one
//! line per link (`idA idB cost`, undirected). Blank lines and `#` line-end comments are
//! tolerated everywhere.

use crate::routing::{LinkWeight, ServerId};

use log::*;

use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::path::Path;
use thiserror::Error;

/// A single server of the fixed node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identity of the server
    pub id: ServerId,
    /// IP address the server listens on
    pub host: IpAddr,
    /// Port the server listens on
    pub port: u16,
}

impl Node {
    /// Returns the socket address of this server
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// An undirected link between two servers, with its initial cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// First endpoint
    pub a: ServerId,
    /// Second endpoint
    pub b: ServerId,
    /// Initial link cost (positive and finite)
    pub cost: LinkWeight,
}

impl Link {
    /// Returns the other endpoint, if the given server is an endpoint of this link.
    pub fn other(&self, id: ServerId) -> Option<ServerId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The immutable topology descriptor, parsed once at startup. The set of servers and links is
/// fixed for the entire lifetime of the router.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    nodes: BTreeMap<ServerId, Node>,
    links: Vec<Link>,
}

impl Topology {
    /// Read and parse the topology from a file.
    pub fn from_file(filename: impl AsRef<Path>) -> Result<Self, TopologyError> {
        Self::parse(&read_to_string(filename.as_ref())?)
    }

    /// Parse the topology from a string.
    pub fn parse(s: &str) -> Result<Self, TopologyError> {
        // keep only meaningful lines, remembering their position in the file
        let mut lines = s
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.split('#').next().unwrap_or("").trim()))
            .filter(|(_, l)| !l.is_empty());

        let num_servers = parse_count(lines.next(), "number of servers")?;
        let num_links = parse_count(lines.next(), "number of links")?;

        let mut nodes: BTreeMap<ServerId, Node> = BTreeMap::new();
        for _ in 0..num_servers {
            let (line, content) = lines.next().ok_or(TopologyError::UnexpectedEnd)?;
            let node = parse_node(line, content)?;
            if nodes.insert(node.id, node.clone()).is_some() {
                return Err(TopologyError::DuplicateServer { line, id: node.id });
            }
        }

        let mut links: Vec<Link> = Vec::with_capacity(num_links);
        for _ in 0..num_links {
            let (line, content) = lines.next().ok_or(TopologyError::UnexpectedEnd)?;
            let link = parse_link(line, content)?;
            for id in &[link.a, link.b] {
                if !nodes.contains_key(id) {
                    return Err(TopologyError::UnknownEndpoint { line, id: *id });
                }
            }
            if link.a == link.b {
                return Err(TopologyError::SelfLoop { line, id: link.a });
            }
            if links.iter().any(|l| l.other(link.a) == Some(link.b)) {
                return Err(TopologyError::DuplicateLink { line, a: link.a, b: link.b });
            }
            links.push(link);
        }

        if let Some((line, content)) = lines.next() {
            return Err(TopologyError::UnexpectedToken { line, content: content.to_string() });
        }

        Ok(Self { nodes, links })
    }

    /// Get the server with the given id
    pub fn node(&self, id: ServerId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Iterate over all servers, ordered by id
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over all server ids, in ascending order
    pub fn server_ids(&self) -> impl Iterator<Item = ServerId> + '_ {
        self.nodes.keys().copied()
    }

    /// The number of servers in the topology
    pub fn num_servers(&self) -> usize {
        self.nodes.len()
    }

    /// All links of the topology
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Iterate over all links incident to the given server
    pub fn incident_links(&self, id: ServerId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.other(id).is_some())
    }

    /// Find the server listening on the given host address. This is used to infer the local
    /// identity when no explicit server id is given.
    pub fn find_by_host(&self, host: IpAddr) -> Option<&Node> {
        self.nodes.values().find(|n| n.host == host)
    }

    /// Determine the local IP address, by opening a UDP socket towards a public address and
    /// reading back the local endpoint. No packet is actually sent. Falls back to the loopback
    /// address if the host has no route.
    pub fn local_ip() -> IpAddr {
        let localhost = IpAddr::from([127, 0, 0, 1]);
        let probe = || -> std::io::Result<IpAddr> {
            let socket = UdpSocket::bind("0.0.0.0:0")?;
            socket.connect("8.8.8.8:80")?;
            Ok(socket.local_addr()?.ip())
        };
        match probe() {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Cannot determine the local IP address ({}), using {}", e, localhost);
                localhost
            }
        }
    }
}

fn parse_count(
    line: Option<(usize, &str)>,
    what: &'static str,
) -> Result<usize, TopologyError> {
    let (line, content) = line.ok_or(TopologyError::UnexpectedEnd)?;
    content
        .parse::<usize>()
        .map_err(|_| TopologyError::InvalidCount { line, what, content: content.to_string() })
}

fn parse_node(line: usize, content: &str) -> Result<Node, TopologyError> {
    let bad = || TopologyError::InvalidServerLine { line, content: content.to_string() };
    let mut fields = content.split_whitespace();
    let id = fields.next().and_then(|f| f.parse::<u32>().ok()).filter(|id| *id > 0);
    let host = fields.next().and_then(|f| f.parse::<IpAddr>().ok());
    let port = fields.next().and_then(|f| f.parse::<u16>().ok()).filter(|p| *p > 0);
    match (id, host, port, fields.next()) {
        (Some(id), Some(host), Some(port), None) => Ok(Node { id: ServerId(id), host, port }),
        _ => Err(bad()),
    }
}

fn parse_link(line: usize, content: &str) -> Result<Link, TopologyError> {
    let bad = || TopologyError::InvalidLinkLine { line, content: content.to_string() };
    let mut fields = content.split_whitespace();
    let a = fields.next().and_then(|f| f.parse::<u32>().ok());
    let b = fields.next().and_then(|f| f.parse::<u32>().ok());
    let cost = fields.next().and_then(|f| f.parse::<LinkWeight>().ok());
    match (a, b, cost, fields.next()) {
        (Some(a), Some(b), Some(cost), None) if cost > 0.0 && cost.is_finite() => {
            Ok(Link { a: ServerId(a), b: ServerId(b), cost })
        }
        _ => Err(bad()),
    }
}

/// Topology file error. All variants carry the (1-based) line number in the file, so that the
/// operator can fix the file without guessing.
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    /// The file cannot be read
    #[error("Cannot read the topology file: {0}")]
    IoError(String),
    /// A count line (number of servers / links) is not a valid number
    #[error("Invalid {what} on line {line}: {content}")]
    InvalidCount {
        /// Line in the file
        line: usize,
        /// Which count was expected
        what: &'static str,
        /// The offending content
        content: String,
    },
    /// The file ended before all declared servers and links were read
    #[error("Unexpected end of the topology file")]
    UnexpectedEnd,
    /// A server line does not have the form `id host port`
    #[error("Invalid server line {line}: {content}")]
    InvalidServerLine {
        /// Line in the file
        line: usize,
        /// The offending content
        content: String,
    },
    /// The same server id is declared twice
    #[error("Server {id} is declared twice (line {line})")]
    DuplicateServer {
        /// Line in the file
        line: usize,
        /// The duplicated id
        id: ServerId,
    },
    /// A link line does not have the form `idA idB cost` with a positive, finite cost
    #[error("Invalid link line {line}: {content}")]
    InvalidLinkLine {
        /// Line in the file
        line: usize,
        /// The offending content
        content: String,
    },
    /// A link references a server that is not declared in the server table
    #[error("Link endpoint {id} is not a declared server (line {line})")]
    UnknownEndpoint {
        /// Line in the file
        line: usize,
        /// The undeclared endpoint
        id: ServerId,
    },
    /// A link connects a server to itself
    #[error("Link on line {line} connects server {id} to itself")]
    SelfLoop {
        /// Line in the file
        line: usize,
        /// The server id
        id: ServerId,
    },
    /// The same undirected link is declared twice
    #[error("Link {a} <-> {b} is declared twice (line {line})")]
    DuplicateLink {
        /// Line in the file
        line: usize,
        /// First endpoint
        a: ServerId,
        /// Second endpoint
        b: ServerId,
    },
    /// The file contains content after the declared servers and links
    #[error("Unexpected content on line {line}: {content}")]
    UnexpectedToken {
        /// Line in the file
        line: usize,
        /// The offending content
        content: String,
    },
}

impl From<std::io::Error> for TopologyError {
    fn from(cause: std::io::Error) -> Self {
        Self::IoError(cause.to_string())
    }
}
