/*
 * Created on Sat Oct 08 2022
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

//! End-to-end tests: a real listener on an ephemeral port, real TCP
//! clients, and direct handles on the supervisor/registry/pause gate so the
//! tests can drive the purge paths the way the interrupt monitor and the
//! operator console do

use crate::arbiter::{purge, Supervisor};
use crate::corestore::Corestore;
use crate::dbnet::{BaseListener, Listener, PauseGate, MAXIMUM_CONNECTION_LIMIT};
use crate::registry::Registry;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time;

struct TestServer {
    addr: SocketAddr,
    db: Corestore,
    registry: Arc<Registry>,
    supervisor: Arc<Supervisor>,
    pause: Arc<PauseGate>,
    listener: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let db = Corestore::new();
        let registry = Arc::new(Registry::new());
        let supervisor = Arc::new(Supervisor::new());
        let pause = Arc::new(PauseGate::new());
        let climit = Arc::new(Semaphore::new(MAXIMUM_CONNECTION_LIMIT));
        let base = BaseListener::init(
            &db,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            climit,
            registry.clone(),
            supervisor.clone(),
            pause.clone(),
        )
        .await
        .unwrap();
        let addr = base.local_addr().unwrap();
        let mut listener = Listener::new(base);
        let listener = tokio::spawn(async move {
            let _ = listener.run().await;
        });
        TestServer {
            addr,
            db,
            registry,
            supervisor,
            pause,
            listener,
        }
    }
    async fn connect(&self) -> Client {
        Client::new(TcpStream::connect(self.addr).await.unwrap())
    }
    fn stop(self) {
        self.listener.abort();
    }
}

struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    fn new(stream: TcpStream) -> Self {
        Client {
            stream: BufReader::new(stream),
        }
    }
    /// Fire a command without waiting for the reply
    async fn send_only(&mut self, command: &str) {
        self.stream.write_all(command.as_bytes()).await.unwrap();
        self.stream.write_all(b"\n").await.unwrap();
    }
    /// Read one reply line; `None` once the server has closed the connection
    async fn read_reply(&mut self) -> Option<String> {
        let mut reply = String::new();
        let read = self.stream.read_line(&mut reply).await.unwrap();
        if read == 0 {
            None
        } else {
            Some(reply.trim_end_matches(['\r', '\n']).to_owned())
        }
    }
    /// Fire a command and wait for its reply
    async fn send(&mut self, command: &str) -> String {
        self.send_only(command).await;
        self.read_reply()
            .await
            .expect("the server closed the connection mid-command")
    }
}

#[tokio::test]
async fn test_basic_round_trip() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.send("a cat meow").await, "added");
    assert_eq!(client.send("a dog bark").await, "added");
    assert_eq!(client.send("q cat").await, "meow");
    assert_eq!(client.send("q bird").await, "not found");
    assert_eq!(client.send("d cat").await, "removed");
    assert_eq!(client.send("q cat").await, "not found");
    assert_eq!(client.send("gibberish").await, "ill-formed command");
    server.stop();
}

#[tokio::test]
async fn test_pause_gate_defers_replies() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.send("a cat meow").await, "added");
    // close the gate, then issue a command: the reply must not arrive
    server.pause.stop();
    client.send_only("q x").await;
    let deferred = time::timeout(Duration::from_millis(300), client.read_reply()).await;
    assert!(deferred.is_err(), "a paused worker must not reply");
    // open the gate: the reply comes through
    server.pause.release();
    assert_eq!(client.read_reply().await.unwrap(), "not found");
    server.stop();
}

#[tokio::test]
async fn test_purge_retains_server() {
    let server = TestServer::start().await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    // a full round trip each, so both workers are enrolled
    assert_eq!(first.send("a cat meow").await, "added");
    assert_eq!(second.send("a dog bark").await, "added");
    // the signal path: purge and resume
    purge(&server.supervisor, &server.registry, true).await;
    assert_eq!(server.supervisor.live_workers(), 0);
    assert!(server.registry.is_empty());
    // both old connections are gone
    assert_eq!(first.read_reply().await, None);
    assert_eq!(second.read_reply().await, None);
    // but the server lives on, with its data intact
    let mut third = server.connect().await;
    assert_eq!(third.send("a k v").await, "added");
    assert_eq!(third.send("q cat").await, "meow");
    server.stop();
}

#[tokio::test]
async fn test_purge_cancels_workers_blocked_at_the_pause_gate() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.send("a cat meow").await, "added");
    // park the worker at the gate
    server.pause.stop();
    client.send_only("q cat").await;
    time::sleep(Duration::from_millis(100)).await;
    // the gate wait is a cancellation point, so the purge must drain
    purge(&server.supervisor, &server.registry, true).await;
    assert_eq!(server.supervisor.live_workers(), 0);
    assert_eq!(client.read_reply().await, None);
    server.pause.release();
    server.stop();
}

#[tokio::test]
async fn test_shutdown_drains_all_workers() {
    let server = TestServer::start().await;
    let mut clients = Vec::new();
    for i in 0..10 {
        let mut client = server.connect().await;
        assert_eq!(client.send(&format!("a key-{i} v")).await, "added");
        clients.push(client);
    }
    assert_eq!(server.supervisor.live_workers(), 10);
    // the shutdown path: purge without resuming
    purge(&server.supervisor, &server.registry, false).await;
    assert_eq!(server.supervisor.live_workers(), 0);
    assert!(server.registry.is_empty());
    for client in clients.iter_mut() {
        assert_eq!(client.read_reply().await, None);
    }
    // a latecomer is turned away: its connection is closed before any
    // command gets served
    let mut late = server.connect().await;
    assert_eq!(late.read_reply().await, None);
    assert_eq!(server.supervisor.live_workers(), 0);
    server.stop();
}

#[tokio::test]
async fn test_broken_pipe_does_not_take_the_server_down() {
    let server = TestServer::start().await;
    {
        // fire a command and slam the connection shut without reading
        let mut rude = server.connect().await;
        rude.send_only("q x").await;
    }
    time::sleep(Duration::from_millis(100)).await;
    // the server is still accepting and still serving
    let mut client = server.connect().await;
    assert_eq!(client.send("a cat meow").await, "added");
    assert_eq!(client.send("q cat").await, "meow");
    server.stop();
}

#[tokio::test]
async fn test_file_command_over_the_wire() {
    let server = TestServer::start().await;
    let path = std::env::temp_dir().join(format!(
        "arbord-e2e-test-{}-{}.txt",
        std::process::id(),
        rand::random::<u32>()
    ));
    std::fs::write(&path, "a cat meow\na dog bark\nd dog\n").unwrap();
    let mut client = server.connect().await;
    assert_eq!(
        client.send(&format!("f {}", path.display())).await,
        "file processed"
    );
    assert_eq!(client.send("q cat").await, "meow");
    assert_eq!(client.send("q dog").await, "not found");
    assert_eq!(client.send("f /no/such/file").await, "bad file name");
    std::fs::remove_file(path).unwrap();
    server.stop();
}

#[tokio::test]
async fn test_print_snapshot_of_live_server() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.send("a dog bark").await, "added");
    assert_eq!(client.send("a cat meow").await, "added");
    // the operator's `p` boils down to this
    let mut sink: Vec<u8> = Vec::new();
    server.db.print_to(&mut sink).unwrap();
    let rendered = String::from_utf8(sink).unwrap();
    assert!(rendered.starts_with("(root)\n"));
    assert!(rendered.contains(" dog bark\n"));
    assert!(rendered.contains("  cat meow\n"));
    server.stop();
}
