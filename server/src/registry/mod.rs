/*
 * Created on Sat Sep 10 2022
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

//! # The client registry
//!
//! The roster of live workers. A worker is enrolled here for exactly the
//! interval during which it can be the target of a fleet cancel; the cancel
//! itself travels over the broadcast channel the registry owns, so
//! cancelling the fleet is one send, not one wakeup per worker. The roster
//! map is guarded by its own mutex and no other lock is ever held while
//! taking it

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

pub type ClientId = u64;

/// What the registry remembers about an enrolled worker
#[derive(Debug)]
struct ClientRecord {
    peer: SocketAddr,
}

pub struct Registry {
    /// the roster, keyed by enrollment id
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
    /// the next enrollment id
    next_id: AtomicU64,
    /// the fleet cancel channel
    signal: broadcast::Sender<()>,
}

impl Registry {
    pub fn new() -> Self {
        let (signal, _) = broadcast::channel(1);
        Registry {
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            signal,
        }
    }
    /// Get a receiver for the fleet cancel channel. A worker subscribes
    /// *before* enrolling so that no cancel can slip past it
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.signal.subscribe()
    }
    /// Add a worker to the roster
    pub fn enroll(&self, peer: SocketAddr) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients.lock().insert(id, ClientRecord { peer });
        id
    }
    /// Remove a worker from the roster
    pub fn withdraw(&self, id: ClientId) {
        self.clients.lock().remove(&id);
    }
    /// Deliver a cancel to every enrolled worker
    pub fn broadcast_cancel(&self) {
        {
            let clients = self.clients.lock();
            log::info!("Cancelling {} connected client(s)", clients.len());
            for (id, client) in clients.iter() {
                log::debug!("Cancelling client #{} from {}", id, client.peer);
            }
        }
        // an empty fleet means nobody is subscribed, which is fine
        let _ = self.signal.send(());
    }
    /// The number of enrolled workers
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
