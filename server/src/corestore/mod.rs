/*
 * Created on Tue Aug 02 2022
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

pub mod tree;
#[cfg(test)]
mod tests;

use self::tree::{Tree, TreeResult};
use std::io::{self, Write};
use std::sync::Arc;

/// A shared handle to the in-memory store. Cloning is cheap (an atomic
/// reference bump); every worker, the listener and the operator console hold
/// one of these. The tree itself is torn down when the last handle goes,
/// which the shutdown path arranges to happen only after the drain barrier
#[derive(Debug, Clone)]
pub struct Corestore {
    /// an atomic reference to the tree
    pub shared: Arc<Tree>,
}

impl Corestore {
    pub fn new() -> Self {
        Corestore {
            shared: Arc::new(Tree::new()),
        }
    }
    /// Look up a name, returning a copy of the stored value
    pub fn query(&self, name: &str) -> Option<String> {
        self.shared.query(name)
    }
    /// Add a name/value pair; `Ok(false)` means the name was already there
    pub fn add(&self, name: &str, value: &str) -> TreeResult<bool> {
        self.shared.add(name, value)
    }
    /// Remove a name; false means it wasn't there
    pub fn remove(&self, name: &str) -> bool {
        self.shared.remove(name)
    }
    /// Dump the tree into `out` (see [`Tree::print`] for the format)
    pub fn print_to(&self, out: &mut dyn Write) -> io::Result<()> {
        self.shared.print(out)
    }
}

impl Default for Corestore {
    fn default() -> Self {
        Self::new()
    }
}
