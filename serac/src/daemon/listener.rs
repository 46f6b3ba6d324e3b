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

//! The listener task: accept neighbor connections, read one framed message each, and hand the
//! decoded message to the daemon.
//!
//! The listening socket is non-blocking; the accept loop polls the stopper with a small sleep
//! in between, so the task unblocks within a bounded window after a crash command.

use crate::daemon::{transport, RouterDaemon};
use crate::routing::{codec, printer};

use log::*;

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// Sleep between accept attempts while no connection is pending.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// The accept loop. Runs until the stopper fires.
pub(crate) fn run(daemon: RouterDaemon, listener: TcpListener) {
    let stop = daemon.stopper();
    while !stop.is_stop() {
        match listener.accept() {
            Ok((stream, peer)) => handle_connection(&daemon, stream, peer),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                warn!("Listener error: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
    debug!("Listener of server {} exits", daemon.local().id);
}

/// Read one framed message from the connection and dispatch it. Unparseable payloads reduce
/// to a dropped message.
fn handle_connection(daemon: &RouterDaemon, mut stream: TcpStream, peer: SocketAddr) {
    if let Err(e) = stream.set_read_timeout(Some(transport::READ_TIMEOUT)) {
        warn!("Cannot configure the connection from {}: {}", peer, e);
        return;
    }
    match codec::read_message(&mut stream) {
        Ok(msg) => {
            trace!("Received {} from {}", printer::message(&msg), peer);
            daemon.handle_message(msg);
        }
        Err(e) => warn!("Dropping malformed message from {}: {}", peer, e),
    }
}
