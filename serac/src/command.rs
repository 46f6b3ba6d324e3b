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

//! Module defining the operator commands.
//!
//! Commands are line-oriented and case-insensitive. Parsing is separated from execution: the
//! shell parses a line into a [`Command`] and hands it to
//! [`RouterDaemon::execute`](crate::daemon::RouterDaemon::execute), which runs it atomically
//! against the routing state and answers with a [`CommandReport`].

use crate::routing::types::{DeviceError, LinkWeight, ServerId};

use thiserror::Error;

/// An operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the routing table, sorted by destination id
    Display,
    /// Force an immediate advertisement round
    Step,
    /// Print the number of well-formed messages received so far
    Packets,
    /// Change the cost of the link `link_a <-> link_b` bi-directionally. An infinite cost
    /// disables the link.
    Update {
        /// First endpoint of the link
        link_a: ServerId,
        /// Second endpoint of the link
        link_b: ServerId,
        /// The new cost (positive, or infinite to disable)
        cost: LinkWeight,
    },
    /// Disable the link to the given neighbor
    Disable {
        /// The neighbor to cut off
        server: ServerId,
    },
    /// Notify all neighbors and terminate the router
    Crash,
}

impl Command {
    /// The name of the command, as typed by the operator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Step => "step",
            Self::Packets => "packets",
            Self::Update { .. } => "update",
            Self::Disable { .. } => "disable",
            Self::Crash => "crash",
        }
    }

    /// Parse one input line into a command. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut fields = line.split_whitespace();
        let cmd = match fields.next() {
            Some(c) => c.to_ascii_lowercase(),
            None => return Ok(None),
        };
        let args: Vec<&str> = fields.collect();
        let exactly = |n: usize, usage: &'static str| -> Result<(), CommandError> {
            if args.len() == n {
                Ok(())
            } else {
                Err(CommandError::BadUsage(usage))
            }
        };
        match cmd.as_str() {
            "display" => exactly(0, "display").map(|_| Some(Self::Display)),
            "step" => exactly(0, "step").map(|_| Some(Self::Step)),
            "packets" => exactly(0, "packets").map(|_| Some(Self::Packets)),
            "crash" => exactly(0, "crash").map(|_| Some(Self::Crash)),
            "update" => {
                exactly(3, "update <server1> <server2> <cost>")?;
                Ok(Some(Self::Update {
                    link_a: parse_server_id(args[0])?,
                    link_b: parse_server_id(args[1])?,
                    cost: parse_cost(args[2])?,
                }))
            }
            "disable" => {
                exactly(1, "disable <server>")?;
                Ok(Some(Self::Disable { server: parse_server_id(args[0])? }))
            }
            _ => Err(CommandError::UnknownCommand(cmd)),
        }
    }
}

fn parse_server_id(field: &str) -> Result<ServerId, CommandError> {
    field
        .parse::<u32>()
        .ok()
        .filter(|id| *id > 0)
        .map(ServerId)
        .ok_or_else(|| CommandError::InvalidServerId(field.to_string()))
}

fn parse_cost(field: &str) -> Result<LinkWeight, CommandError> {
    if field.eq_ignore_ascii_case("inf") || field.eq_ignore_ascii_case("infinity") {
        return Ok(LinkWeight::INFINITY);
    }
    field
        .parse::<LinkWeight>()
        .ok()
        .filter(|c| *c > 0.0 && c.is_finite())
        .ok_or_else(|| CommandError::InvalidCost(field.to_string()))
}

/// The answer of a successfully executed command, presented to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReport {
    /// The command completed, nothing else to show
    Done(&'static str),
    /// The formatted routing table
    Table(String),
    /// The current packet counter
    Packets(u64),
}

impl std::fmt::Display for CommandReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done(cmd) => write!(f, "{} SUCCESS", cmd),
            Self::Table(table) => write!(f, "{}\ndisplay SUCCESS", table),
            Self::Packets(n) => {
                write!(f, "packets SUCCESS\nTotal packets received: {}", n)
            }
        }
    }
}

/// Operator errors. None of them are fatal: the command is rejected, the routing state stays
/// untouched, and the shell continues.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// The command does not exist
    #[error("Unknown command: {0}. Available commands: display, step, packets, update, disable, crash")]
    UnknownCommand(String),
    /// The command has the wrong number of arguments
    #[error("Usage: {0}")]
    BadUsage(&'static str),
    /// A server id argument is not a positive integer
    #[error("Invalid server id: {0}")]
    InvalidServerId(String),
    /// A cost argument is neither a positive number nor `inf`
    #[error("Invalid link cost: {0}")]
    InvalidCost(String),
    /// The command refers to servers or links this router does not have
    #[error("{0}")]
    DeviceError(#[from] DeviceError),
}
