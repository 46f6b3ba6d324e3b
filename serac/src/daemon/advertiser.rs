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

//! The periodic advertiser task, which doubles as the neighbor failure detector.
//!
//! Every update interval, the task advances the missed-interval counters, fails the neighbors
//! that stayed silent for too long, snapshots the distance vector under the lock, and then
//! sends the advertisement to every active neighbor with the lock released.

use crate::daemon::{transport, RouterDaemon};
use crate::Stopper;

use log::*;

use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which the interval sleep observes the stopper.
const STOP_POLL: Duration = Duration::from_millis(100);

/// The advertiser loop. Runs until the stopper fires.
pub(crate) fn run(daemon: RouterDaemon) {
    let stop = daemon.stopper();
    loop {
        if wait(&stop, daemon.interval()) {
            break;
        }
        let sends = {
            let mut table = daemon.table();
            table.tick_misses();
            daemon.advertisement_sends(&table)
        };
        trace!("Advertising to {} neighbors", sends.len());
        for (addr, msg) in sends {
            transport::send_best_effort(addr, &msg);
        }
    }
    debug!("Advertiser of server {} exits", daemon.local().id);
}

/// Sleep for the given duration, observing the stopper. Returns true if the stopper fired.
fn wait(stop: &Stopper, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.is_stop() {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.as_nanos() == 0 {
            return false;
        }
        thread::sleep(remaining.min(STOP_POLL));
    }
}
