//! Name-indexed trie used as the in-memory write buffer.
//!
//! One node per name component, children held in a `BTreeMap` so iteration
//! follows canonical component order. A node's own value yields before its
//! descendants, which makes a prefix scan return a name before every name
//! it is a prefix of.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::mem;

use namestore_core::{Component, Name};

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    children: BTreeMap<Component, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<V> Node<V> {
    fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

/// An ordered trie mapping [`Name`]s to values.
#[derive(Debug)]
pub struct NameTrie<V> {
    root: Node<V>,
    len: usize,
}

impl<V> Default for NameTrie<V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<V> NameTrie<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value under `name`, returning the previous value if any.
    pub fn insert(&mut self, name: Name, value: V) -> Option<V> {
        let mut node = &mut self.root;
        for component in name.components() {
            node = node.children.entry(component.clone()).or_default();
        }
        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Exact lookup.
    pub fn get(&self, name: &Name) -> Option<&V> {
        self.node_at(name).and_then(|node| node.value.as_ref())
    }

    /// Remove the exact entry for `name`, pruning branches left empty.
    pub fn remove(&mut self, name: &Name) -> Option<V> {
        let removed = Self::remove_rec(&mut self.root, name.components());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn remove_rec(node: &mut Node<V>, components: &[Component]) -> Option<V> {
        match components.split_first() {
            None => node.value.take(),
            Some((head, rest)) => {
                let child = node.children.get_mut(head)?;
                let removed = Self::remove_rec(child, rest);
                if removed.is_some() && child.is_empty() {
                    node.children.remove(head);
                }
                removed
            }
        }
    }

    /// Lazily iterate all entries whose name has `prefix` as a leading
    /// subsequence, in trie order.
    pub fn prefix_iter<'a>(&'a self, prefix: &Name) -> PrefixIter<'a, V> {
        match self.node_at(prefix) {
            Some(node) => PrefixIter {
                path: prefix.components().to_vec(),
                stack: vec![Frame {
                    value: node.value.as_ref(),
                    children: node.children.iter(),
                    entered: false,
                }],
            },
            None => PrefixIter {
                path: Vec::new(),
                stack: Vec::new(),
            },
        }
    }

    /// Empty the trie wholesale, returning every entry in trie order. The
    /// trie is replaced by a fresh one, never merged in place.
    pub fn drain(&mut self) -> Vec<(Name, V)> {
        let snapshot = mem::take(self);
        let mut entries = Vec::with_capacity(snapshot.len);
        Self::collect(snapshot.root, &mut Vec::new(), &mut entries);
        entries
    }

    fn collect(node: Node<V>, path: &mut Vec<Component>, entries: &mut Vec<(Name, V)>) {
        if let Some(value) = node.value {
            entries.push((Name::from_components(path.clone()), value));
        }
        for (component, child) in node.children {
            path.push(component);
            Self::collect(child, path, entries);
            path.pop();
        }
    }

    fn node_at(&self, name: &Name) -> Option<&Node<V>> {
        let mut node = &self.root;
        for component in name.components() {
            node = node.children.get(component)?;
        }
        Some(node)
    }
}

struct Frame<'a, V> {
    value: Option<&'a V>,
    children: btree_map::Iter<'a, Component, Node<V>>,
    /// Whether entering this frame pushed a component onto the path.
    entered: bool,
}

/// Lazy depth-first iterator over a name prefix. See
/// [`NameTrie::prefix_iter`].
pub struct PrefixIter<'a, V> {
    path: Vec<Component>,
    stack: Vec<Frame<'a, V>>,
}

impl<'a, V> Iterator for PrefixIter<'a, V> {
    type Item = (Name, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if let Some(value) = frame.value.take() {
                return Some((Name::from_components(self.path.clone()), value));
            }
            match frame.children.next() {
                Some((component, child)) => {
                    self.path.push(component.clone());
                    self.stack.push(Frame {
                        value: child.value.as_ref(),
                        children: child.children.iter(),
                        entered: true,
                    });
                }
                None => {
                    let finished = self.stack.pop()?;
                    if finished.entered {
                        self.path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn insert_get_overwrite() {
        let mut trie = NameTrie::new();
        assert_eq!(trie.insert(name("/a/b"), 1), None);
        assert_eq!(trie.insert(name("/a"), 2), None);
        assert_eq!(trie.len(), 2);

        assert_eq!(trie.get(&name("/a/b")), Some(&1));
        assert_eq!(trie.get(&name("/a")), Some(&2));
        assert_eq!(trie.get(&name("/a/b/c")), None);
        assert_eq!(trie.get(&name("/b")), None);

        // last write wins, length unchanged
        assert_eq!(trie.insert(name("/a/b"), 9), Some(1));
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.get(&name("/a/b")), Some(&9));
    }

    #[test]
    fn remove_is_exact_and_prunes() {
        let mut trie = NameTrie::new();
        trie.insert(name("/a/b/c"), 1);
        trie.insert(name("/a"), 2);

        // removing a prefix does not touch descendants
        assert_eq!(trie.remove(&name("/a")), Some(2));
        assert_eq!(trie.get(&name("/a/b/c")), Some(&1));

        assert_eq!(trie.remove(&name("/a/b")), None);
        assert_eq!(trie.remove(&name("/a/b/c")), Some(1));
        assert_eq!(trie.remove(&name("/a/b/c")), None);
        assert!(trie.is_empty());

        // pruning removed the whole branch
        assert!(trie.root.children.is_empty());
    }

    #[test]
    fn prefix_iteration_in_trie_order() {
        let mut trie = NameTrie::new();
        trie.insert(name("/a/b/c"), 1);
        trie.insert(name("/a/b"), 2);
        trie.insert(name("/a/b/d"), 3);
        trie.insert(name("/a/x"), 4);
        trie.insert(name("/z"), 5);

        let under_ab: Vec<_> = trie
            .prefix_iter(&name("/a/b"))
            .map(|(n, v)| (n.to_string(), *v))
            .collect();
        assert_eq!(
            under_ab,
            vec![
                ("/a/b".to_string(), 2),
                ("/a/b/c".to_string(), 1),
                ("/a/b/d".to_string(), 3),
            ]
        );

        let all: Vec<_> = trie.prefix_iter(&Name::new()).map(|(_, v)| *v).collect();
        assert_eq!(all, vec![2, 1, 3, 4, 5]);

        assert_eq!(trie.prefix_iter(&name("/nope")).count(), 0);
    }

    #[test]
    fn drain_empties_and_returns_everything() {
        let mut trie = NameTrie::new();
        trie.insert(name("/a/b"), 1);
        trie.insert(name("/a"), 2);
        trie.insert(name("/c"), 3);

        let drained = trie.drain();
        assert_eq!(drained.len(), 3);
        assert!(trie.is_empty());
        assert_eq!(trie.prefix_iter(&Name::new()).count(), 0);

        let names: Vec<_> = drained.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["/a", "/a/b", "/c"]);

        // drained trie is usable again
        trie.insert(name("/a"), 7);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn empty_name_entry() {
        let mut trie = NameTrie::new();
        trie.insert(Name::new(), 1);
        trie.insert(name("/a"), 2);
        assert_eq!(trie.get(&Name::new()), Some(&1));
        let all: Vec<_> = trie.prefix_iter(&Name::new()).map(|(_, v)| *v).collect();
        assert_eq!(all, vec![1, 2]);
        assert_eq!(trie.remove(&Name::new()), Some(1));
        assert_eq!(trie.len(), 1);
    }
}
