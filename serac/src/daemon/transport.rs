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

//! Outbound transport: one short-lived TCP connection per message.
//!
//! A failed send reduces to a dropped message. The protocol is self-healing through the next
//! advertisement round, and only the receive-side failure detector may mark a neighbor as
//! failed, so send errors are logged at debug level and swallowed.

use crate::routing::codec::{self, WireError};
use crate::routing::message::Message;

use log::*;

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Timeout for establishing the outbound connection.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Timeout for reading one inbound frame.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for writing one outbound frame.
pub(crate) const WRITE_TIMEOUT: Duration = Duration::from_secs(3);

/// Open a connection to the given address, write exactly one framed message, and close.
pub fn send_message(addr: SocketAddr, msg: &Message) -> Result<(), WireError> {
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
    codec::write_message(&mut stream, msg)
}

/// Send a message, treating any failure as a dropped send.
pub(crate) fn send_best_effort(addr: SocketAddr, msg: &Message) {
    if let Err(e) = send_message(addr, msg) {
        debug!("Dropped {} to {}: {}", msg.kind(), addr, e);
    }
}
