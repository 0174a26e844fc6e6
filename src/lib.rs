//! # fanout-trie
//!
//! A flat (uncompressed) trie map with a constant fan-out per node.
//!
//! Keys are sequences of small symbols (bytes by default). Each node owns
//! exactly `RANGE` child slots, selected by `symbol & (RANGE - 1)`, plus an
//! optional value, so a stored key may also be a prefix of another stored key.
//! Nodes carry a back-reference to their parent, which lets a [`Cursor`]
//! resume a key-ordered walk from any position without recursion, and lets
//! erasure prune exactly the chain of nodes that only served the erased key.
//!
//! ## Example
//!
//! ```rust
//! use fanout_trie::TrieMap;
//!
//! let mut trie: TrieMap<u64> = TrieMap::new();
//! trie.insert(b"hello", 1);
//! trie.insert(b"help", 2);
//!
//! assert_eq!(trie.get(b"hello"), Some(&1));
//! assert_eq!(trie.get(b"hel"), None);
//!
//! // First insert wins.
//! let (value, inserted) = trie.insert(b"help", 3);
//! assert_eq!((*value, inserted), (2, false));
//!
//! assert!(trie.erase(b"hello"));
//! assert_eq!(trie.get(b"help"), Some(&2));
//!
//! let keys: Vec<Vec<u8>> = trie.iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, vec![b"help".to_vec()]);
//! ```
//!
//! The fan-out must be a power of two. Anything else is rejected when the map
//! type is instantiated:
//!
//! ```compile_fail
//! use fanout_trie::TrieMap;
//!
//! let trie: TrieMap<u32, u8, 100> = TrieMap::new();
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod arena;
mod cursor;
mod error;
mod symbol;
mod visit;

use std::marker::PhantomData;

use tracing::{debug, warn};

use arena::{NodeArena, NodeId};

pub use cursor::{Cursor, Iter, IterMut};
pub use error::{Result, TrieError};
pub use symbol::Symbol;

/// An ordered map from symbol sequences to values, stored as a trie with
/// `RANGE` child slots per node.
///
/// - Insertion creates missing nodes along the key and never overwrites.
/// - Erasure removes the value and prunes the nodes that existed only for it.
/// - Iteration (by [`Cursor`], [`Iter`], [`IterMut`] or [`TrieMap::for_each`])
///   is pre-order in ascending symbol order: `"a"`, `"ab"`, `"b"`, `"ba"`.
pub struct TrieMap<V, S = u8, const RANGE: usize = 256> {
    nodes: NodeArena<V, RANGE>,
    /// Number of stored values.
    len: usize,
    _symbol: PhantomData<S>,
}

impl<V, S: Symbol, const RANGE: usize> TrieMap<V, S, RANGE> {
    const RANGE_IS_POWER_OF_TWO: () = assert!(
        RANGE.is_power_of_two(),
        "trie fan-out must be a power of two"
    );

    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Create an empty map whose arena has room for `nodes` nodes (root included).
    pub fn with_capacity(nodes: usize) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::RANGE_IS_POWER_OF_TWO;
        Self {
            nodes: NodeArena::with_capacity(nodes),
            len: 0,
            _symbol: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, root included. An empty map has exactly one.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Approximate heap bytes held by the node arena.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity_bytes()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Rebuild the node arena without the holes left behind by erasure.
    ///
    /// Returns the number of nodes rewritten (root excluded).
    pub fn compact(&mut self) -> usize {
        let rewritten = self.nodes.compact();
        debug!(rewritten, "compacted trie arena");
        rewritten
    }

    #[inline]
    fn slot(symbol: S) -> usize {
        symbol.to_index() & (RANGE - 1)
    }

    /// Node reached by following `key` from the root, if the whole path exists.
    fn locate(&self, key: &[S]) -> Option<NodeId> {
        key.iter().try_fold(NodeId::ROOT, |id, &symbol| {
            self.nodes.get(id).children[Self::slot(symbol)]
        })
    }

    /// Length of the longest prefix of `key` whose nodes already exist.
    fn existing_depth(&self, key: &[S]) -> usize {
        let mut id = NodeId::ROOT;
        for (depth, &symbol) in key.iter().enumerate() {
            match self.nodes.get(id).children[Self::slot(symbol)] {
                Some(child) => id = child,
                None => return depth,
            }
        }
        key.len()
    }

    /// Walk `key`, creating any missing node on the way.
    fn descend_or_create(&mut self, key: &[S]) -> NodeId {
        let mut id = NodeId::ROOT;
        for &symbol in key {
            let index = Self::slot(symbol);
            id = match self.nodes.get(id).children[index] {
                Some(child) => child,
                None => self.nodes.attach_child(id, index),
            };
        }
        id
    }

    pub fn get(&self, key: &[S]) -> Option<&V> {
        self.nodes.get(self.locate(key)?).value.as_ref()
    }

    pub fn get_mut(&mut self, key: &[S]) -> Option<&mut V> {
        let id = self.locate(key)?;
        self.nodes.get_mut(id).value.as_mut()
    }

    pub fn contains_key(&self, key: &[S]) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` under `key` unless the key already has a value.
    ///
    /// Returns the value now stored under `key` and whether it is the one just
    /// passed in. An existing value is never replaced; erase the key first to
    /// overwrite it.
    pub fn insert(&mut self, key: &[S], value: V) -> (&mut V, bool) {
        let id = self.descend_or_create(key);
        let node = self.nodes.get_mut(id);
        let inserted = node.value.is_none();
        if inserted {
            self.len += 1;
        }
        (node.value.get_or_insert(value), inserted)
    }

    /// Like [`insert`](Self::insert), but reports allocation failure instead of
    /// aborting. On error the map is unchanged.
    pub fn try_insert(&mut self, key: &[S], value: V) -> Result<(&mut V, bool)> {
        let missing = key.len() - self.existing_depth(key);
        if let Err(err) = self.nodes.try_reserve(missing) {
            warn!(key_len = key.len(), missing, %err, "trie insert failed");
            return Err(err);
        }
        Ok(self.insert(key, value))
    }

    /// Value under `key`, inserting `default()` first if there is none.
    pub fn get_or_insert_with<F>(&mut self, key: &[S], default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = self.descend_or_create(key);
        let node = self.nodes.get_mut(id);
        if node.value.is_none() {
            self.len += 1;
        }
        node.value.get_or_insert_with(default)
    }

    /// Remove `key`, returning whether it was stored.
    pub fn erase(&mut self, key: &[S]) -> bool {
        self.remove(key).is_some()
    }

    /// Remove `key` and return its value.
    ///
    /// One pass down the key records the last fork point: the deepest node on
    /// the path that either has more than one child or holds a value of its
    /// own. Branching alone is not enough: a stored prefix of `key` is also a
    /// fork point, so erasing `"abc"` keeps `"a"`. Everything below the fork
    /// on the path exists only for `key` and is released in one go.
    ///
    /// If the key's node still has children (a stored extension such as
    /// `"ab"` under `"a"`), only its value is taken and no node is released.
    ///
    /// A path that exists only because a longer key runs through it is not a
    /// stored key; it is reported as absent and nothing changes.
    pub fn remove(&mut self, key: &[S]) -> Option<V> {
        let mut fork = NodeId::ROOT;
        let mut fork_pos = 0;
        let mut id = NodeId::ROOT;
        for (pos, &symbol) in key.iter().enumerate() {
            let node = self.nodes.get(id);
            if node.child_count > 1 || node.value.is_some() {
                fork = id;
                fork_pos = pos;
            }
            id = node.children[Self::slot(symbol)]?;
        }

        let target = self.nodes.get_mut(id);
        let value = target.value.take()?;
        self.len -= 1;
        if target.child_count > 0 || id == NodeId::ROOT {
            return Some(value);
        }

        let cut = self
            .nodes
            .detach_child(fork, Self::slot(key[fork_pos]))
            .expect("fork point must own the erased path");
        let released = self.nodes.free_subtree(cut);
        debug!(fork_depth = fork_pos, released, "pruned erased key");
        Some(value)
    }

    /// Remove every key and release every node but the root.
    pub fn clear(&mut self) {
        let released = self.nodes.live() - 1;
        self.nodes.reset();
        self.len = 0;
        debug!(released, "cleared trie");
    }
}

impl<V, S: Symbol, const RANGE: usize> Default for TrieMap<V, S, RANGE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy. Node links are arena indices, so the copy's parent links point
/// into the copy.
impl<V: Clone, S, const RANGE: usize> Clone for TrieMap<V, S, RANGE> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            len: self.len,
            _symbol: PhantomData,
        }
    }
}

/// Structural equality: both maps have the same occupied slots at every node
/// and equal values wherever a value is stored. Arena layout is irrelevant.
impl<V: PartialEq, S, const RANGE: usize> PartialEq for TrieMap<V, S, RANGE> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }

        let mut stack = vec![(NodeId::ROOT, NodeId::ROOT)];
        while let Some((a, b)) = stack.pop() {
            let (a, b) = (self.nodes.get(a), other.nodes.get(b));
            if a.child_count != b.child_count || a.value != b.value {
                return false;
            }
            for (x, y) in a.children.iter().zip(b.children.iter()) {
                match (x, y) {
                    (Some(x), Some(y)) => stack.push((*x, *y)),
                    (None, None) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl<V: Eq, S, const RANGE: usize> Eq for TrieMap<V, S, RANGE> {}

impl<V: std::fmt::Debug, S: Symbol, const RANGE: usize> std::fmt::Debug for TrieMap<V, S, RANGE> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, const RANGE: usize> Extend<(K, V)> for TrieMap<V, S, RANGE>
where
    K: AsRef<[S]>,
    S: Symbol,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl<K, V, S, const RANGE: usize> FromIterator<(K, V)> for TrieMap<V, S, RANGE>
where
    K: AsRef<[S]>,
    S: Symbol,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}


#[cfg(test)]
mod proptests;
