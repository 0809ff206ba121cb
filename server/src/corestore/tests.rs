/*
 * Created on Sat Aug 06 2022
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

use super::tree::{Tree, TreeError, MAX_DATA_LEN};
use super::Corestore;
use std::sync::Arc;
use std::thread;

#[test]
fn test_query_returns_last_add() {
    let tree = Tree::new();
    assert_eq!(tree.query("cat"), None);
    assert!(tree.add("cat", "meow").unwrap());
    assert_eq!(tree.query("cat"), Some("meow".to_owned()));
    assert!(tree.remove("cat"));
    assert_eq!(tree.query("cat"), None);
}

#[test]
fn test_duplicate_add_keeps_first_value() {
    let tree = Tree::new();
    assert!(tree.add("cat", "meow").unwrap());
    // the second add is refused and the first value stays
    assert!(!tree.add("cat", "purr").unwrap());
    assert_eq!(tree.query("cat"), Some("meow".to_owned()));
}

#[test]
fn test_remove_absent_is_a_noop() {
    let tree = Tree::new();
    assert!(tree.add("dog", "bark").unwrap());
    assert!(!tree.remove("cat"));
    assert_eq!(tree.collect_in_order().len(), 1);
}

#[test]
fn test_in_order_is_sorted() {
    let tree = Tree::new();
    for name in ["m", "c", "t", "a", "f", "p", "z", "b", "x", "n"] {
        assert!(tree.add(name, "v").unwrap());
    }
    tree.remove("c");
    tree.remove("x");
    let names: Vec<String> = tree
        .collect_in_order()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(names, sorted);
    assert_eq!(names, ["a", "b", "f", "m", "n", "p", "t", "z"]);
}

#[test]
fn test_remove_single_child_splices_subtree() {
    let tree = Tree::new();
    for name in ["m", "c", "a", "t", "z"] {
        assert!(tree.add(name, "v").unwrap());
    }
    // "c" has only a left child, "t" has only a right child; both splices
    // hand the lone subtree to "m"
    assert!(tree.remove("c"));
    assert!(tree.remove("t"));
    assert_eq!(tree.query("c"), None);
    assert_eq!(tree.query("t"), None);
    let names: Vec<String> = tree
        .collect_in_order()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["a", "m", "z"]);
}

#[test]
fn test_remove_node_with_two_children_promotes_successor() {
    let tree = Tree::new();
    // "m" ends up as the root's only child, with both subtrees populated
    for (name, value) in [
        ("m", "em"),
        ("c", "see"),
        ("t", "tee"),
        ("a", "ay"),
        ("f", "ef"),
        ("p", "pee"),
        ("z", "zed"),
    ] {
        assert!(tree.add(name, value).unwrap());
    }
    assert!(tree.remove("m"));
    assert_eq!(tree.query("m"), None);
    // the in-order successor ("p") was promoted and kept its value
    assert_eq!(tree.query("p"), Some("pee".to_owned()));
    let names: Vec<String> = tree
        .collect_in_order()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["a", "c", "f", "p", "t", "z"]);
}

#[test]
fn test_remove_successor_is_deep_in_the_spine() {
    let tree = Tree::new();
    // the right subtree of "d" has a left spine: t -> h -> f -> e
    for name in ["d", "b", "t", "h", "f", "e", "g"] {
        assert!(tree.add(name, &format!("v-{name}")).unwrap());
    }
    assert!(tree.remove("d"));
    // "e" is the successor; its right child slot was empty
    assert_eq!(tree.query("e"), Some("v-e".to_owned()));
    assert_eq!(tree.query("d"), None);
    let names: Vec<String> = tree
        .collect_in_order()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, ["b", "e", "f", "g", "h", "t"]);
}

#[test]
fn test_data_length_bounds() {
    let tree = Tree::new();
    let long = "x".repeat(MAX_DATA_LEN + 1);
    let fits = "x".repeat(MAX_DATA_LEN);
    assert_eq!(tree.add(&long, "v").unwrap_err(), TreeError::NameTooLong);
    assert_eq!(tree.add("k", &long).unwrap_err(), TreeError::ValueTooLong);
    // nothing was committed
    assert!(tree.collect_in_order().is_empty());
    assert!(tree.add(&fits, &fits).unwrap());
}

#[test]
fn test_print_format() {
    let store = Corestore::new();
    store.add("dog", "bark").unwrap();
    store.add("cat", "meow").unwrap();
    let mut out: Vec<u8> = Vec::new();
    store.print_to(&mut out).unwrap();
    let rendered = String::from_utf8(out).unwrap();
    let expected = "\
(root)
 (null)
 dog bark
  cat meow
   (null)
   (null)
  (null)
";
    assert_eq!(rendered, expected);
}

#[test]
fn test_concurrent_workers_keep_the_tree_consistent() {
    const WORKERS: usize = 8;
    const PER_WORKER: usize = 64;
    let tree = Arc::new(Tree::new());
    let handles: Vec<_> = (0..WORKERS)
        .map(|widx| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                for i in 0..PER_WORKER {
                    let name = format!("key-{widx:02}-{i:03}");
                    assert!(tree.add(&name, "value").unwrap());
                    assert_eq!(tree.query(&name), Some("value".to_owned()));
                    // drop every other key again to exercise the splices
                    if i % 2 == 0 {
                        assert!(tree.remove(&name));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let pairs = tree.collect_in_order();
    // the survivors are exactly the odd-indexed keys, in sorted order
    assert_eq!(pairs.len(), WORKERS * PER_WORKER / 2);
    let names: Vec<&String> = pairs.iter().map(|(name, _)| name).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    for (name, _) in &pairs {
        assert_eq!(tree.query(name), Some("value".to_owned()));
    }
}

#[test]
fn test_concurrent_print_with_writers() {
    let tree = Arc::new(Tree::new());
    for i in 0..32 {
        tree.add(&format!("seed-{i:02}"), "v").unwrap();
    }
    let writer = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || {
            for i in 0..32 {
                tree.add(&format!("extra-{i:02}"), "v").unwrap();
                tree.remove(&format!("seed-{i:02}"));
            }
        })
    };
    // printing while the writer churns must neither deadlock nor observe a
    // torn node
    for _ in 0..8 {
        let mut sink: Vec<u8> = Vec::new();
        tree.print(&mut sink).unwrap();
        assert!(sink.starts_with(b"(root)\n"));
    }
    writer.join().unwrap();
}
