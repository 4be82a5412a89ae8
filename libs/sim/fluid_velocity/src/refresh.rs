// This file is part of USV Sailing.
//
// USV Sailing is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// USV Sailing is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with USV Sailing.  If not, see <http://www.gnu.org/licenses/>.
use crate::{estimate::FluidVelocityHandle, service::VelocityService};
use anyhow::Result;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, warn};
use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

/// How often a local estimate is refreshed, and how long to back off when the
/// service fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RefreshTiming {
    pub period: Duration,
    pub backoff: Duration,
}

impl Default for RefreshTiming {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            backoff: Duration::from_secs(1),
        }
    }
}

/// Owns the background thread that keeps a local estimate fresh.
///
/// The thread holds the receiving half of a stop channel and does all of its
/// waiting on it, so dropping the `Refresher` wakes it immediately. A query that
/// is already in flight is allowed to finish. Drop joins the thread.
pub(crate) struct Refresher {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Refresher {
    pub(crate) fn spawn(
        name: &str,
        service: Box<dyn VelocityService>,
        handle: FluidVelocityHandle,
        timing: RefreshTiming,
    ) -> Result<Self> {
        let (stop, stopped) = bounded(1);
        let label = name.to_owned();
        let thread = thread::Builder::new()
            .name(format!("refresh-{name}"))
            .spawn(move || refresh_loop(&label, service, handle, timing, stopped))?;
        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        // Disconnecting the channel is the stop signal.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("fluid velocity refresh thread panicked");
            }
        }
    }
}

fn wait_or_stop(stopped: &Receiver<()>, wait: Duration) -> bool {
    match stopped.recv_timeout(wait) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

fn refresh_loop(
    name: &str,
    mut service: Box<dyn VelocityService>,
    handle: FluidVelocityHandle,
    timing: RefreshTiming,
    stopped: Receiver<()>,
) {
    debug!("{name}: refreshing {} velocity every {:?}", handle.medium(), timing.period);
    while let Err(TryRecvError::Empty) = stopped.try_recv() {
        let position = handle.position();
        match service.query(position) {
            Ok(velocity) => handle.set_horizontal(velocity),
            Err(e) => {
                warn!("{name}: failed to query {} velocity: {e}", handle.medium());
                if wait_or_stop(&stopped, timing.backoff) {
                    break;
                }
            }
        }
        if wait_or_stop(&stopped, timing.period) {
            break;
        }
    }
    debug!("{name}: refresh stopped");
}
