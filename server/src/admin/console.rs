/*
 * Created on Sat Sep 24 2022
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

//! # The operator console
//!
//! Administrative commands read from the server's own stdin, tokens split on
//! spaces and tabs:
//!
//! - `p [path]` — dump the tree, to stdout if no path is given
//! - `s` — stop all clients at the pause gate
//! - `g` — let them go again
//! - end-of-input — shut the server down
//!
//! The console deliberately knows nothing about purging: it returns at
//! end-of-input and the arbiter runs the shutdown path.

use crate::corestore::Corestore;
use crate::dbnet::PauseGate;
use std::fs;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task;

/// Serve the operator until end-of-input
pub async fn run(db: &Corestore, pause: &PauseGate) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // end-of-input: the operator asked for a shutdown
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read from stdin: {}", e);
                break;
            }
        };
        let mut tokens = line.split([' ', '\t']).filter(|token| !token.is_empty());
        match tokens.next() {
            Some("p") => {
                let path = tokens.next().map(str::to_owned);
                print_tree(db, path).await;
            }
            Some("s") => {
                log::info!("Stopping all clients");
                pause.stop();
            }
            Some("g") => {
                log::info!("Releasing all clients");
                pause.release();
            }
            Some(unknown) => log::error!("Unknown console command '{}'", unknown),
            None => {}
        }
    }
}

/// Dump the tree to stdout or to `path`. The dump holds read locks while it
/// writes, so it runs on a blocking task instead of stalling the runtime
/// workers
async fn print_tree(db: &Corestore, path: Option<String>) {
    let db = db.clone();
    let printed = task::spawn_blocking(move || -> io::Result<()> {
        match path {
            Some(path) => {
                let mut file = fs::File::create(path)?;
                db.print_to(&mut file)?;
                file.flush()
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                db.print_to(&mut handle)?;
                handle.flush()
            }
        }
    })
    .await;
    match printed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Error printing: {}", e),
        Err(e) => log::error!("The print task did not complete: {}", e),
    }
}
