/*
 * Created on Sat Oct 01 2022
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

//! # The query engine
//!
//! Runs parsed commands against the store and produces the reply. The only
//! interesting case is `f`, which replays a server-local command file:
//! replies of replayed commands are discarded, the file may itself contain
//! `f` commands, and a fleet cancel is honoured between lines (a worker
//! stuck in a huge command file must not be able to stall a purge).

use crate::corestore::Corestore;
use crate::dbnet::Terminator;
use crate::protocol::{self, responses, Query, Response};
use std::future::Future;
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Execute one command against the store
pub async fn execute(db: &Corestore, terminator: &mut Terminator, query: Query) -> Response {
    match query {
        Query::Get(name) => match db.query(&name) {
            Some(value) => Response::Value(value),
            None => Response::Group(responses::NOT_FOUND),
        },
        Query::Add(name, value) => match db.add(&name, &value) {
            Ok(true) => Response::Group(responses::ADDED),
            Ok(false) => Response::Group(responses::ALREADY_IN_DATABASE),
            // the wire token bound is tighter than the store bound, but the
            // store still enforces its own
            Err(_) => Response::Group(responses::ILL_FORMED),
        },
        Query::Del(name) => {
            if db.remove(&name) {
                Response::Group(responses::REMOVED)
            } else {
                Response::Group(responses::NOT_IN_DATABASE)
            }
        }
        Query::File(path) => execute_file(db, terminator, path).await,
    }
}

/// Replay a command file. Replies are discarded; ill-formed lines are
/// skipped; nested `f` commands recurse
///
/// Returns a boxed future (rather than being declared `async fn`) so that
/// the mutual recursion with `execute` has a concrete, already-`Send` type
/// to bottom out on instead of an opaque future whose `Send`-ness would
/// otherwise depend circularly on `execute`'s own.
fn execute_file<'a>(
    db: &'a Corestore,
    terminator: &'a mut Terminator,
    path: String,
) -> Pin<Box<dyn Future<Output = Response> + Send + 'a>> {
    Box::pin(async move {
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(_) => return Response::Group(responses::BAD_FILE_NAME),
        };
        let mut lines = BufReader::new(file).lines();
        loop {
            // a fleet cancel must be honoured between lines
            if terminator.poll_termination() {
                break;
            }
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                // end of the file, or a read error cutting the replay short
                _ => break,
            };
            if let Ok(query) = protocol::parse(line.as_bytes()) {
                let _ = execute(db, terminator, query).await;
            }
        }
        Response::Group(responses::FILE_PROCESSED)
    })
}
