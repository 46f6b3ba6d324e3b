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

use crate::command::{Command, CommandError, CommandReport};
use crate::routing::types::{LinkWeight, ServerId};

#[test]
fn parse_plain_commands() {
    assert_eq!(Command::parse("display").unwrap(), Some(Command::Display));
    assert_eq!(Command::parse("step").unwrap(), Some(Command::Step));
    assert_eq!(Command::parse("packets").unwrap(), Some(Command::Packets));
    assert_eq!(Command::parse("crash").unwrap(), Some(Command::Crash));
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(Command::parse("DISPLAY").unwrap(), Some(Command::Display));
    assert_eq!(
        Command::parse("Update 1 2 INF").unwrap(),
        Some(Command::Update {
            link_a: ServerId(1),
            link_b: ServerId(2),
            cost: LinkWeight::INFINITY
        })
    );
}

#[test]
fn parse_update() {
    assert_eq!(
        Command::parse("update 1 3 7.5").unwrap(),
        Some(Command::Update { link_a: ServerId(1), link_b: ServerId(3), cost: 7.5 })
    );
    assert_eq!(
        Command::parse("update 1 3 infinity").unwrap(),
        Some(Command::Update {
            link_a: ServerId(1),
            link_b: ServerId(3),
            cost: LinkWeight::INFINITY
        })
    );
}

#[test]
fn parse_disable() {
    assert_eq!(
        Command::parse("disable 2").unwrap(),
        Some(Command::Disable { server: ServerId(2) })
    );
}

#[test]
fn blank_lines_are_no_commands() {
    assert_eq!(Command::parse("").unwrap(), None);
    assert_eq!(Command::parse("   \t ").unwrap(), None);
}

#[test]
fn reject_bad_input() {
    assert_eq!(
        Command::parse("route"),
        Err(CommandError::UnknownCommand("route".to_string()))
    );
    assert!(matches!(Command::parse("display now"), Err(CommandError::BadUsage(_))));
    assert!(matches!(Command::parse("update 1 2"), Err(CommandError::BadUsage(_))));
    assert!(matches!(Command::parse("disable"), Err(CommandError::BadUsage(_))));
    assert_eq!(
        Command::parse("update 1 two 3"),
        Err(CommandError::InvalidServerId("two".to_string()))
    );
    assert_eq!(
        Command::parse("update 0 2 3"),
        Err(CommandError::InvalidServerId("0".to_string()))
    );
    assert_eq!(
        Command::parse("update 1 2 -4"),
        Err(CommandError::InvalidCost("-4".to_string()))
    );
    assert_eq!(
        Command::parse("update 1 2 0"),
        Err(CommandError::InvalidCost("0".to_string()))
    );
}

#[test]
fn report_formatting() {
    assert_eq!(format!("{}", CommandReport::Done("step")), "step SUCCESS");
    assert_eq!(
        format!("{}", CommandReport::Packets(17)),
        "packets SUCCESS\nTotal packets received: 17"
    );
    let table = CommandReport::Table("Destination     Next Hop        Cost".to_string());
    assert!(format!("{}", table).ends_with("display SUCCESS"));
}
