/*
 * Created on Thu Jul 14 2022
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

//! # Arbordb
//!
//! The `arbord` crate (or the `server` folder) is Arbordb's database server.
//! The data plane is an unbalanced binary search tree with one reader/writer
//! lock per node, traversed hand-over-hand so that clients touching disjoint
//! parts of the tree never serialize against each other. The control plane is
//! the operator console on stdin and a dedicated interrupt monitor; see the
//! modules for their respective documentation.

use crate::config::ServerConfig;
use env_logger::Builder;
use libarbor::util::terminal;
use libarbor::{URL, VERSION};
use std::env;
use std::process;
use std::sync::Arc;

mod admin;
mod arbiter;
mod config;
mod corestore;
mod dbnet;
mod protocol;
mod queryengine;
mod registry;
mod util;
#[cfg(test)]
mod tests;

/// A shorthand for `std::io::Result`
pub type IoResult<T> = std::io::Result<T>;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
use jemallocator::Jemalloc;

#[cfg(all(not(target_env = "msvc"), not(miri)))]
#[global_allocator]
/// Jemallocator - this is the default memory allocator for platforms other than msvc
static GLOBAL: Jemalloc = Jemalloc;

fn main() {
    Builder::new()
        .parse_filters(&env::var("ARBOR_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    let cfg: ServerConfig = match config::parse_cli(env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e) => {
            // this is operator misuse, not a server fault; say so on stderr
            // instead of going through the logger
            let _ = terminal::write_error(format!("Startup failure: {}\n", e));
            process::exit(0x100);
        }
    };
    println!("Arbordb v{} | {}", VERSION, URL);
    // Start the server. The returned handle to the tree is the last one
    // standing once the runtime has been torn down
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("server")
        .enable_all()
        .build()
        .unwrap();
    let db = match runtime.block_on(arbiter::run(cfg)) {
        Ok(db) => db,
        Err(e) => {
            log::error!("The server failed with: {}", e);
            process::exit(0x100);
        }
    };
    // Make sure all workers have actually terminated
    drop(runtime);
    assert_eq!(
        Arc::strong_count(&db.shared),
        1,
        "Maybe the compiler reordered the drop causing more than one instance of the tree to live at this point"
    );
    log::info!("Stopped accepting incoming connections");
    // the store is dropped here, after the drain barrier has done its job
    drop(db);
    terminal::write_info("Goodbye :)\n").unwrap();
}
