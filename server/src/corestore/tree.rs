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

//! # The tree
//!
//! This module implements the store proper: an unbalanced binary search tree
//! keyed by byte-lexicographic name order, with one reader/writer lock per
//! node. All traversals are hand-over-hand ("lock coupling"): a child's lock
//! is always acquired *before* the parent's lock is released, so a descent
//! never observes a half-applied mutation and never holds more than two
//! locks at a time.
//!
//! The root is a sentinel carrying no data. It is never unlinked, which
//! guarantees that every real node has a locked parent during any descent
//! and makes insertion at the top of the tree no different from insertion
//! anywhere else.

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};
use std::fmt;
use std::io::{self, Write};
use std::mem;
use std::sync::Arc;

/// The maximum length (in bytes) of a name or a value
pub const MAX_DATA_LEN: usize = 256;

type NodeRef = Arc<RwLock<Node>>;
type Link = Option<NodeRef>;
// owned guards: these keep their node alive on their own, which is what lets
// a descent release the parent while continuing through the child
type ReadGuard = ArcRwLockReadGuard<RawRwLock, Node>;
type WriteGuard = ArcRwLockWriteGuard<RawRwLock, Node>;

#[derive(Debug, PartialEq)]
pub enum TreeError {
    /// The name is longer than [`MAX_DATA_LEN`] bytes
    NameTooLong,
    /// The value is longer than [`MAX_DATA_LEN`] bytes
    ValueTooLong,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooLong => write!(f, "the name exceeds {} bytes", MAX_DATA_LEN),
            Self::ValueTooLong => write!(f, "the value exceeds {} bytes", MAX_DATA_LEN),
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

/// A single element of the tree. The lock guarding a node is the `RwLock`
/// that wraps it; each link exclusively owns its subtree
#[derive(Debug)]
struct Node {
    name: String,
    value: String,
    left: Link,
    right: Link,
}

impl Node {
    fn new(name: &str, value: &str) -> NodeRef {
        Arc::new(RwLock::new(Node {
            name: name.to_owned(),
            value: value.to_owned(),
            left: None,
            right: None,
        }))
    }
    /// The child a descent for `name` continues through. Names comparing
    /// less go left; everything else goes right (equality terminates the
    /// descent before this is consulted)
    fn next_towards(&self, name: &str) -> Link {
        if name < self.name.as_str() {
            self.left.clone()
        } else {
            self.right.clone()
        }
    }
    /// Overwrite the child slot a descent for `name` would continue through
    fn set_child_towards(&mut self, name: &str, link: Link) {
        if name < self.name.as_str() {
            self.left = link;
        } else {
            self.right = link;
        }
    }
}

/// The store: a sentinel root and the locking protocol around it
#[derive(Debug)]
pub struct Tree {
    root: NodeRef,
}

impl Tree {
    /// Create an empty tree (just the sentinel)
    pub fn new() -> Self {
        Tree {
            root: Node::new("", ""),
        }
    }

    /// Descend towards `name` under read locks. Returns the target's guard
    /// (if the name is present) and the guard of its parent — or of the node
    /// that would adopt the name if it were added. Every other node touched
    /// on the way down has already been released
    fn locate(&self, name: &str) -> (Option<ReadGuard>, ReadGuard) {
        let mut parent = self.root.read_arc();
        loop {
            let child = match parent.next_towards(name) {
                Some(child) => child,
                None => return (None, parent),
            };
            let child = child.read_arc();
            if child.name == name {
                return (Some(child), parent);
            }
            // the child is locked, so the parent can be let go
            parent = child;
        }
    }

    /// Exactly [`Tree::locate`], but the locks taken are write locks
    fn locate_mut(&self, name: &str) -> (Option<WriteGuard>, WriteGuard) {
        let mut parent = self.root.write_arc();
        loop {
            let child = match parent.next_towards(name) {
                Some(child) => child,
                None => return (None, parent),
            };
            let child = child.write_arc();
            if child.name == name {
                return (Some(child), parent);
            }
            parent = child;
        }
    }

    /// Look up `name`, returning a copy of its value
    pub fn query(&self, name: &str) -> Option<String> {
        let (target, _parent) = self.locate(name);
        target.map(|node| node.value.clone())
    }

    /// Add a `name`/`value` pair. Returns `Ok(false)` if the name is already
    /// in the tree (the stored value is left untouched)
    pub fn add(&self, name: &str, value: &str) -> TreeResult<bool> {
        if name.len() > MAX_DATA_LEN {
            return Err(TreeError::NameTooLong);
        }
        if value.len() > MAX_DATA_LEN {
            return Err(TreeError::ValueTooLong);
        }
        let (target, mut parent) = self.locate_mut(name);
        if target.is_some() {
            return Ok(false);
        }
        // publication is this single link assignment under the parent's
        // write lock; the new node's own lock is not taken before the node
        // becomes reachable
        parent.set_child_towards(name, Some(Node::new(name, value)));
        Ok(true)
    }

    /// Remove `name` from the tree. Returns false if it wasn't there
    pub fn remove(&self, name: &str) -> bool {
        let (target, mut parent) = self.locate_mut(name);
        let mut target = match target {
            Some(target) => target,
            None => return false,
        };
        match (target.left.is_some(), target.right.clone()) {
            // no right child: the left subtree takes the target's place
            (_, None) => {
                let splice = target.left.take();
                parent.set_child_towards(name, splice);
            }
            // no left child: ditto, with the right subtree
            (false, Some(_)) => {
                let splice = target.right.take();
                parent.set_child_towards(name, splice);
            }
            // two children: the in-order successor (the leftmost node of the
            // right subtree) replaces the target in place, and is itself
            // unlinked. The target stays write-locked throughout, so no
            // reader can see the tree between the overwrite and the unlink
            (true, Some(right)) => {
                let mut succ = right.write_arc();
                if succ.left.is_none() {
                    // the right child is the successor; its slot is owned by
                    // the target itself
                    target.name = mem::take(&mut succ.name);
                    target.value = mem::take(&mut succ.value);
                    target.right = succ.right.take();
                } else {
                    // walk the left spine. The successor's parent is kept
                    // locked (released only once its child is locked) so
                    // that the unlink below happens under the lock of the
                    // node owning the slot
                    let mut succ_parent = succ;
                    loop {
                        let next = match succ_parent.left.clone() {
                            Some(next) => next,
                            None => break,
                        };
                        let mut next = next.write_arc();
                        if next.left.is_some() {
                            succ_parent = next;
                            continue;
                        }
                        // `next` is the successor: no left child
                        target.name = mem::take(&mut next.name);
                        target.value = mem::take(&mut next.value);
                        succ_parent.left = next.right.take();
                        break;
                    }
                }
            }
        }
        true
    }

    /// Dump the tree pre-order into `out`: one node per line, indented by
    /// depth, the sentinel as `(root)`, absent children as `(null)`.
    ///
    /// The traversal extends lock coupling to siblings: both children are
    /// read-locked before the current node's lock is released
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        let root = self.root.read_arc();
        Self::print_subtree(root, 0, out)
    }

    fn print_subtree(node: ReadGuard, depth: usize, out: &mut dyn Write) -> io::Result<()> {
        print_spaces(depth, out)?;
        if depth == 0 {
            // only the sentinel lives at depth 0
            writeln!(out, "(root)")?;
        } else {
            writeln!(out, "{} {}", node.name, node.value)?;
        }
        let left = node.left.as_ref().map(|child| child.read_arc());
        let right = node.right.as_ref().map(|child| child.read_arc());
        drop(node);
        match left {
            Some(child) => Self::print_subtree(child, depth + 1, out)?,
            None => print_null(depth + 1, out)?,
        }
        match right {
            Some(child) => Self::print_subtree(child, depth + 1, out)?,
            None => print_null(depth + 1, out)?,
        }
        Ok(())
    }
}

fn print_spaces(depth: usize, out: &mut dyn Write) -> io::Result<()> {
    for _ in 0..depth {
        out.write_all(b" ")?;
    }
    Ok(())
}

fn print_null(depth: usize, out: &mut dyn Write) -> io::Result<()> {
    print_spaces(depth, out)?;
    writeln!(out, "(null)")
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        // detach iteratively: the naive recursive drop through the links
        // would be stack-depth-bound by the height of the tree
        let mut pending: Vec<NodeRef> = Vec::new();
        {
            let mut root = self.root.write();
            pending.extend(root.left.take());
            pending.extend(root.right.take());
        }
        while let Some(node) = pending.pop() {
            let mut node = node.write();
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

#[cfg(test)]
impl Tree {
    /// Collect `(name, value)` pairs in-order. Takes plain read locks for
    /// the whole walk; only meant for assertions
    pub(crate) fn collect_in_order(&self) -> Vec<(String, String)> {
        fn walk(link: &Link, out: &mut Vec<(String, String)>) {
            if let Some(node) = link {
                let node = node.read();
                walk(&node.left, out);
                out.push((node.name.clone(), node.value.clone()));
                walk(&node.right, out);
            }
        }
        let mut out = Vec::new();
        let root = self.root.read();
        walk(&root.left, &mut out);
        walk(&root.right, &mut out);
        out
    }
}
