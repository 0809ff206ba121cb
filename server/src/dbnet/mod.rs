/*
 * Created on Sat Aug 27 2022
 *
 * This file is a part of Arbordb
 * Arbordb is a free and open-source concurrent in-memory tree database
 * written by Sayan Nandan ("the Author") with the vision to provide
 * a simple, safe and concurrent alternative for ordered key/value storage.
 *
 * Copyright (c) 2022, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # Client networking
//!
//! One task per connection. A worker's life looks like this: enroll with the
//! supervisor and the registry (or be turned away if the server is
//! draining), then loop reading a command line, waiting at the pause gate,
//! executing, and writing the reply. The connection read and the pause-gate
//! wait are the two cancellation points: both are raced against the fleet
//! termination signal. On *any* exit — clean, I/O error or panic — the
//! [`WorkerGuard`] withdraws the worker from the registry and reports its
//! departure to the supervisor, which is what lets the drain barrier make
//! progress.

use {
    self::tcp::Connection,
    crate::{
        arbiter::Supervisor,
        corestore::Corestore,
        protocol::{self, responses, Response},
        queryengine,
        registry::{ClientId, Registry},
        IoResult,
    },
    std::{
        net::SocketAddr,
        sync::{
            atomic::{AtomicU8, Ordering},
            Arc,
        },
        time::Duration,
    },
    tokio::{
        sync::{broadcast, watch, Semaphore},
        time,
    },
};

pub use self::listener::{BaseListener, Listener};

mod listener;
mod tcp;

pub const MAXIMUM_CONNECTION_LIMIT: usize = 50000;

/// A backoff implementation that is meant to be used in connection loops
pub(self) struct NetBackoff {
    c: AtomicU8,
}

impl NetBackoff {
    /// The maximum backoff duration
    const MAX_BACKOFF: u8 = 64;
    /// Create a new [`NetBackoff`] instance
    pub const fn new() -> Self {
        Self {
            c: AtomicU8::new(1),
        }
    }
    /// Wait for the current backoff duration
    pub async fn spin(&self) {
        let c = self.c.load(Ordering::Relaxed);
        time::sleep(Duration::from_secs(c as _)).await;
        self.c.store(c << 1, Ordering::Relaxed);
    }
    /// Should we disconnect the stream?
    pub fn should_disconnect(&self) -> bool {
        self.c.load(Ordering::Relaxed) > Self::MAX_BACKOFF
    }
}

/// A worker's view of the fleet termination signal. The signal latches: once
/// seen, every later check reports it too
pub struct Terminator {
    terminate: bool,
    signal: broadcast::Receiver<()>,
}

impl Terminator {
    /// Create a new `Terminator` instance
    pub const fn new(signal: broadcast::Receiver<()>) -> Self {
        Terminator {
            terminate: false,
            signal,
        }
    }
    /// Check if the signal is a termination signal
    pub const fn is_termination_signal(&self) -> bool {
        self.terminate
    }
    /// Wait to receive the termination signal
    pub async fn receive_signal(&mut self) {
        if self.terminate {
            return;
        }
        let _ = self.signal.recv().await;
        self.terminate = true;
    }
    /// A non-suspending check for the termination signal, for code that is
    /// between cancellation points (the `f` command polls this between the
    /// lines of a file)
    pub fn poll_termination(&mut self) -> bool {
        use broadcast::error::TryRecvError;
        if self.terminate {
            return true;
        }
        match self.signal.try_recv() {
            Err(TryRecvError::Empty) => false,
            // a lagged or closed channel means a purge we missed the details
            // of; either way, we're done
            Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => {
                self.terminate = true;
                true
            }
        }
    }
}

/// The pause gate: a single flag that, while set, holds every worker at the
/// top of its command loop. The operator console sets it with `s` and clears
/// it with `g`, which releases all waiters at once
pub struct PauseGate {
    paused: watch::Sender<bool>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        PauseGate { paused }
    }
    /// Make every worker block at its next [`PauseGate::wait`]
    pub fn stop(&self) {
        self.paused.send_replace(true);
    }
    /// Release all blocked workers
    pub fn release(&self) {
        self.paused.send_replace(false);
    }
    /// Block while the gate is closed. Returns immediately if it is open.
    /// Suspends without holding anything, so it is safe to race against the
    /// termination signal
    pub async fn wait(&self) {
        let mut recv = self.paused.subscribe();
        // the sender lives inside `self`, so the channel cannot close under us
        let _ = recv.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The worker's membership in the fleet, as an RAII handle: dropping it
/// withdraws the client record and reports the departure to the supervisor.
/// A worker holds one of these for exactly as long as it can be the target
/// of a fleet cancel
pub struct WorkerGuard {
    supervisor: Arc<Supervisor>,
    registry: Arc<Registry>,
    id: ClientId,
}

impl WorkerGuard {
    /// Enroll with the supervisor and the registry. Returns `None` if the
    /// supervisor is not accepting workers (a purge or a shutdown is in
    /// progress)
    pub fn try_enroll(
        supervisor: &Arc<Supervisor>,
        registry: &Arc<Registry>,
        peer: SocketAddr,
    ) -> Option<Self> {
        if !supervisor.try_enroll() {
            return None;
        }
        let id = registry.enroll(peer);
        Some(WorkerGuard {
            supervisor: Arc::clone(supervisor),
            registry: Arc::clone(registry),
            id,
        })
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.registry.withdraw(self.id);
        self.supervisor.depart();
    }
}

/// A connection handler: the per-client worker
pub struct ConnectionHandler {
    /// an atomic reference to the shared in-memory tree
    db: Corestore,
    /// the connection
    con: Connection,
    /// the semaphore used to impose limits on the number of connections
    climit: Arc<Semaphore>,
    /// the pause gate shared with the operator console
    pause: Arc<PauseGate>,
    /// check for fleet termination signals
    terminator: Terminator,
    /// the roster of live workers
    registry: Arc<Registry>,
    /// worker accounting and the drain barrier
    supervisor: Arc<Supervisor>,
    /// the address of the peer (only used in logs)
    peer: SocketAddr,
}

impl ConnectionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Corestore,
        con: Connection,
        climit: Arc<Semaphore>,
        pause: Arc<PauseGate>,
        terminator: Terminator,
        registry: Arc<Registry>,
        supervisor: Arc<Supervisor>,
        peer: SocketAddr,
    ) -> Self {
        Self {
            db,
            con,
            climit,
            pause,
            terminator,
            registry,
            supervisor,
            peer,
        }
    }
    pub async fn run(&mut self) -> IoResult<()> {
        log::debug!("ConnectionHandler initialized to handle {}", self.peer);
        // enrollment comes before the first read so that this worker can
        // never block a purge it wasn't cancellable by; the subscription
        // inside `terminator` predates the enrollment, so a cancel broadcast
        // to an enrolled worker is never missed
        let _enrollment = match WorkerGuard::try_enroll(&self.supervisor, &self.registry, self.peer)
        {
            Some(enrollment) => enrollment,
            None => {
                log::debug!("Turning away {}: the fleet is draining", self.peer);
                return Ok(());
            }
        };
        while !self.terminator.is_termination_signal() {
            // the connection read: cancellation point #1
            let read = tokio::select! {
                ret = self.con.read_line() => ret?,
                _ = self.terminator.receive_signal() => break,
            };
            let line = match read {
                Some(line) => line,
                // the peer hung up
                None => break,
            };
            // the pause gate: cancellation point #2
            tokio::select! {
                _ = self.pause.wait() => {}
                _ = self.terminator.receive_signal() => break,
            }
            let response = match protocol::parse(&line) {
                Ok(query) => queryengine::execute(&self.db, &mut self.terminator, query).await,
                Err(_) => Response::Group(responses::ILL_FORMED),
            };
            if self.terminator.is_termination_signal() {
                // cancelled mid-command (inside an `f` file); no reply
                break;
            }
            self.con.write_response(&response).await?;
        }
        Ok(())
    }
}

impl Drop for ConnectionHandler {
    fn drop(&mut self) {
        // Make sure that the permit is returned to the semaphore
        // in the case that there is a panic inside
        self.climit.add_permits(1);
    }
}
