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

use serac::command::Command;
use serac::daemon::RouterDaemon;
use serac::routing::ServerId;
use serac::topology::Topology;

use clap::Parser;
use log::*;

use std::io::{self, BufRead, Write};
use std::time::Duration;

/// One router of the distributed distance-vector routing protocol. The router loads the
/// topology file, infers its own identity from the local address (unless `--id` is given),
/// and then exchanges its distance vector with all direct neighbors every update interval.
/// Operator commands are read line by line from standard input.
#[derive(Parser, Debug)]
#[clap(name = "server", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Topology file with the server table and the initial links
    #[clap(short = 't', long = "topology")]
    topology: String,
    /// Routing update interval in seconds (at least 5)
    #[clap(short = 'i', long = "interval")]
    interval: u64,
    /// Use this server id instead of inferring it from the local address
    #[clap(long)]
    id: Option<u32>,
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), serac::Error> {
    let args = CommandLineArguments::parse();
    if args.interval < 5 {
        return Err(serac::Error::IntervalTooSmall(args.interval));
    }

    let topology = Topology::from_file(&args.topology)?;
    info!(
        "Loaded topology with {} servers and {} links",
        topology.num_servers(),
        topology.links().len()
    );

    let local_id = match args.id {
        Some(id) => {
            let id = ServerId(id);
            topology.node(id).ok_or(serac::Error::UnknownServerId(id))?;
            id
        }
        None => {
            let ip = Topology::local_ip();
            topology.find_by_host(ip).ok_or(serac::Error::SelfNotFound(ip))?.id
        }
    };
    info!("Starting as server {}", local_id);

    let daemon = RouterDaemon::new(topology, local_id, Duration::from_secs(args.interval))?;
    let handle = daemon.spawn()?;

    shell(&daemon);

    // graceful shutdown, also on end of input
    daemon.stopper().send_stop();
    handle.join();
    info!("Server {} stopped", local_id);
    Ok(())
}

/// The command dispatcher loop: read operator commands line by line until `crash` or end of
/// input. Operator errors are reported and the loop continues.
fn shell(daemon: &RouterDaemon) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Cannot read the operator input: {}", e);
                break;
            }
        };
        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                let name = cmd.name();
                let is_crash = matches!(cmd, Command::Crash);
                match daemon.execute(cmd) {
                    Ok(report) => println!("{}", report),
                    Err(e) => println!("{} ERROR: {}", name, e),
                }
                if is_crash {
                    return;
                }
            }
            Err(e) => println!("ERROR: {}", e),
        }
        let _ = io::stdout().flush();
    }
}
