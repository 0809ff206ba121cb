/*
 * Created on Sat Sep 03 2022
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

use {
    super::{tcp::Connection, ConnectionHandler, NetBackoff, PauseGate, Terminator},
    crate::{
        arbiter::Supervisor,
        corestore::Corestore,
        registry::Registry,
        util::error::{ArborResult, Error},
        IoResult,
    },
    std::net::{IpAddr, SocketAddr},
    std::sync::Arc,
    tokio::net::{TcpListener, TcpStream},
    tokio::sync::Semaphore,
};

/// The base TCP listener: the binding plus every shared handle a worker
/// needs
pub struct BaseListener {
    /// An atomic reference to the shared tree
    pub db: Corestore,
    /// The incoming connection listener (binding)
    pub listener: TcpListener,
    /// The maximum number of connections
    pub climit: Arc<Semaphore>,
    /// The roster of live workers (and the fleet cancel channel)
    pub registry: Arc<Registry>,
    /// Worker accounting and the drain barrier
    pub supervisor: Arc<Supervisor>,
    /// The pause gate
    pub pause: Arc<PauseGate>,
}

impl BaseListener {
    pub async fn init(
        db: &Corestore,
        host: IpAddr,
        port: u16,
        semaphore: Arc<Semaphore>,
        registry: Arc<Registry>,
        supervisor: Arc<Supervisor>,
        pause: Arc<PauseGate>,
    ) -> ArborResult<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::ioerror_extra(e, format!("binding to port {port}")))?;
        Ok(Self {
            db: db.clone(),
            listener,
            climit: semaphore,
            registry,
            supervisor,
            pause,
        })
    }
    /// The address we actually bound to (the port is kernel-assigned when
    /// the configuration asked for port 0)
    pub fn local_addr(&self) -> IoResult<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A listener
pub struct Listener {
    pub base: BaseListener,
}

impl Listener {
    pub fn new(base: BaseListener) -> Self {
        Self { base }
    }
    /// Accept an incoming connection
    async fn accept(&mut self) -> IoResult<(TcpStream, SocketAddr)> {
        let backoff = NetBackoff::new();
        loop {
            match self.base.listener.accept().await {
                Ok((stream, peer)) => return Ok((stream, peer)),
                Err(e) => {
                    if backoff.should_disconnect() {
                        // Too many retries, goodbye user
                        return Err(e);
                    }
                }
            }
            // spin to wait for the backoff duration
            backoff.spin().await;
        }
    }
    /// Run the accept loop
    pub async fn run(&mut self) -> IoResult<()> {
        loop {
            // Take the permit first, but we won't use it right now
            // that's why we will forget it
            self.base.climit.acquire().await.unwrap().forget();
            /*
             SECURITY: Ignore any errors that may arise in the accept loop.
             If we apply the try operator here, we will immediately
             terminate the run loop causing the entire server to go down.
             Also, do not log any errors because many connection errors can
             arise and it will flood the log and might also result in a
             crash
            */
            let (stream, peer) = match self.accept().await {
                Ok(accepted) => accepted,
                Err(_) => continue,
            };
            // subscribe *before* the handler enrolls: an enrolled worker
            // must never be able to miss a fleet cancel
            let terminator = Terminator::new(self.base.registry.subscribe());
            let mut chandle = ConnectionHandler::new(
                self.base.db.clone(),
                Connection::new(stream),
                self.base.climit.clone(),
                self.base.pause.clone(),
                terminator,
                self.base.registry.clone(),
                self.base.supervisor.clone(),
                peer,
            );
            tokio::spawn(async move {
                if let Err(e) = chandle.run().await {
                    log::error!("Error while handling {}: {}", peer, e);
                }
            });
        }
    }
}
