/*
 * Created on Sat Sep 17 2022
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

//! # The arbiter
//!
//! Everything that decides when workers live and die: the supervisor (the
//! worker count, the `accepting` flag and the drain barrier), the purge
//! procedure shared by the interrupt path and the shutdown path, the
//! interrupt monitor, and the `run` function that wires the whole server
//! together.

use crate::admin::console;
use crate::config::ServerConfig;
use crate::corestore::Corestore;
use crate::dbnet::{BaseListener, Listener, PauseGate, MAXIMUM_CONNECTION_LIMIT};
use crate::registry::Registry;
use crate::util::error::ArborResult;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};

#[derive(Debug, Clone, Copy)]
struct SupervisorState {
    /// the number of workers that have enrolled and not yet departed
    live_workers: usize,
    /// false while a purge is draining the fleet
    accepting: bool,
    /// once set, `accepting` can never go back to true: an interrupt purge
    /// racing the shutdown must not reopen the fleet
    shutdown: bool,
}

/// Worker accounting. The state lives in a watch channel, which is the
/// mutex-plus-condition of this design: mutators use the send hooks, and the
/// drain barrier waits for the count to hit zero
pub struct Supervisor {
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SupervisorState {
            live_workers: 0,
            accepting: true,
            shutdown: false,
        });
        Supervisor { state }
    }
    /// Count a worker in, unless the fleet is draining
    pub fn try_enroll(&self) -> bool {
        let mut enrolled = false;
        self.state.send_if_modified(|state| {
            if state.accepting {
                state.live_workers += 1;
                enrolled = true;
            }
            enrolled
        });
        enrolled
    }
    /// Count a worker out. The last departure wakes the drain barrier
    pub fn depart(&self) {
        self.state.send_modify(|state| state.live_workers -= 1);
    }
    pub fn set_accepting(&self, accepting: bool) {
        self.state
            .send_modify(|state| state.accepting = accepting && !state.shutdown);
    }
    /// Refuse workers for good; later purge resumptions cannot reopen the
    /// fleet
    pub fn shut_down(&self) {
        self.state.send_modify(|state| {
            state.shutdown = true;
            state.accepting = false;
        });
    }
    pub fn live_workers(&self) -> usize {
        self.state.borrow().live_workers
    }
    /// The drain barrier: resolves once every enrolled worker has departed
    pub async fn drained(&self) {
        let mut recv = self.state.subscribe();
        // the sender lives inside `self`, so the channel cannot close under us
        let _ = recv.wait_for(|state| state.live_workers == 0).await;
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Purge the client fleet: refuse new workers, cancel every enrolled one,
/// and wait at the drain barrier until all of them have departed. With
/// `resume` the server goes back to accepting workers afterwards (the
/// interrupt path); without it the fleet stays closed for good (the
/// shutdown path)
pub async fn purge(supervisor: &Supervisor, registry: &Registry, resume: bool) {
    supervisor.set_accepting(false);
    registry.broadcast_cancel();
    supervisor.drained().await;
    debug_assert!(registry.is_empty());
    log::info!("All workers have exited");
    if resume {
        supervisor.set_accepting(true);
    }
}

/// The interrupt monitor: the single task in the process that listens for
/// the interrupt signal. Each receipt purges the fleet; the server itself
/// carries on serving
#[cfg(unix)]
async fn monitor_interrupt(supervisor: Arc<Supervisor>, registry: Arc<Registry>) {
    use tokio::signal::unix::{signal, SignalKind};
    // one persistent stream, so interrupts arriving mid-purge stay pending
    // instead of getting lost between waits
    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(interrupt) => interrupt,
        Err(e) => {
            log::error!("Failed to bind to the interrupt signal: {}", e);
            return;
        }
    };
    while interrupt.recv().await.is_some() {
        log::warn!("Interrupt received, cancelling all clients");
        purge(&supervisor, &registry, true).await;
    }
}

#[cfg(not(unix))]
async fn monitor_interrupt(supervisor: Arc<Supervisor>, registry: Arc<Registry>) {
    // Non-unix, usually Windows specific signal handling: ctrl+c is the
    // only interrupt we get to see
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for the interrupt signal: {}", e);
            return;
        }
        log::warn!("Interrupt received, cancelling all clients");
        purge(&supervisor, &registry, true).await;
    }
}

/// Start the server and hand the foreground to the operator console; when
/// the console sees end-of-input, run the shutdown path. The returned store
/// handle is the only one left alive
pub async fn run(cfg: ServerConfig) -> ArborResult<Corestore> {
    let db = Corestore::new();
    let registry = Arc::new(Registry::new());
    let supervisor = Arc::new(Supervisor::new());
    let pause = Arc::new(PauseGate::new());
    let climit = Arc::new(Semaphore::new(MAXIMUM_CONNECTION_LIMIT));
    let base = BaseListener::init(
        &db,
        cfg.host,
        cfg.port,
        climit,
        registry.clone(),
        supervisor.clone(),
        pause.clone(),
    )
    .await?;
    log::info!("Server started on arbor://{}", base.local_addr()?);
    let mut listener = Listener::new(base);
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            log::error!("The listener failed with: {}", e);
        }
    });
    let signal_handle = tokio::spawn(monitor_interrupt(supervisor.clone(), registry.clone()));

    // the operator console owns the foreground; it returns at end-of-input
    console::run(&db, &pause).await;

    log::info!("Signalling all workers to shut down");
    supervisor.shut_down();
    purge(&supervisor, &registry, false).await;
    debug_assert_eq!(supervisor.live_workers(), 0);
    // the fleet is drained for good, so the signal monitor and the listener
    // can go; the tree itself is torn down by the caller once its handle is
    // the last one standing
    signal_handle.abort();
    listener_handle.abort();
    let _ = signal_handle.await;
    let _ = listener_handle.await;
    Ok(db)
}
