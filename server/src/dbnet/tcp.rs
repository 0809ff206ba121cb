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

use crate::protocol::Response;
use crate::IoResult;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// The longest command line we will buffer before serving it as-is. An
/// unterminated line longer than this is handed to the parser in bounded
/// chunks, which then (rightly) rejects it
pub const MAX_LINE: usize = 512;

/// A buffered client connection: a read buffer over the socket and a
/// buffered writer onto it
pub struct Connection {
    /// the connection stream
    stream: BufWriter<TcpStream>,
    /// the read buffer
    buffer: BytesMut,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Connection {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(libarbor::BUF_CAP),
        }
    }
    /// Read one command line, without its line terminator. Returns
    /// `Ok(None)` once the peer has shut down its side cleanly
    pub async fn read_line(&mut self) -> IoResult<Option<Bytes>> {
        loop {
            if let Some(at) = self.buffer.iter().position(|b| *b == b'\n') {
                let mut line = self.buffer.split_to(at + 1);
                line.truncate(at);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                return Ok(Some(line.freeze()));
            }
            if self.buffer.len() >= MAX_LINE - 1 {
                // no newline within the bound; serve the chunk
                return Ok(Some(self.buffer.split_to(MAX_LINE - 1).freeze()));
            }
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                // the peer left a final unterminated line behind; serve it,
                // the next read will report the EOF
                let line = self.buffer.split_to(self.buffer.len());
                return Ok(Some(line.freeze()));
            }
        }
    }
    /// Write a single reply line. A vanished peer surfaces here as an
    /// ordinary broken-pipe I/O error, never as a signal
    pub async fn write_response(&mut self, response: &Response) -> IoResult<()> {
        self.stream.write_all(response.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }
}
