//! Resumable, key-ordered iteration.
//!
//! A [`Cursor`] names a position as `(map, parent node, slot)`. Advancing never
//! recurses and keeps no stack: when a subtree is exhausted the cursor climbs
//! one parent link and resumes the slot scan just past the slot it came from.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::arena::{Links, NodeId, SplitArena};
use crate::{Symbol, TrieMap};

/// First value-bearing node in pre-order after having visited `id` itself and
/// `id`'s slots before `from`, as `(parent, slot)`. `None` past the last key.
fn seek_from<'n, const RANGE: usize>(
    links: impl Fn(NodeId) -> Links<'n, RANGE>,
    mut id: NodeId,
    mut from: usize,
) -> Option<(NodeId, usize)> {
    loop {
        let node = links(id);
        if let Some((index, child)) = node.next_child(from) {
            if links(child).has_value {
                return Some((id, index));
            }
            // Value-less nodes always have children.
            id = child;
            from = 0;
            continue;
        }
        from = node.symbol + 1;
        id = node.parent?;
    }
}

/// Key of the node in `parent`'s slot `symbol`, rebuilt by climbing parent links.
fn climb_key<'n, S: Symbol, const RANGE: usize>(
    links: impl Fn(NodeId) -> Links<'n, RANGE>,
    mut parent: Option<NodeId>,
    mut symbol: usize,
) -> Vec<S> {
    let mut key = Vec::new();
    while let Some(id) = parent {
        key.push(S::from_index(symbol));
        let node = links(id);
        parent = node.parent;
        symbol = node.symbol;
    }
    key.reverse();
    key
}

/// A position in a [`TrieMap`]'s key order.
///
/// Obtained from [`TrieMap::begin`], [`TrieMap::end`] or
/// [`TrieMap::find_cursor`]. Two cursors are equal when they refer to the same
/// map, parent node and slot. The end sentinel has no parent and slot zero.
///
/// The root (empty key) is never a cursor position.
pub struct Cursor<'a, V, S = u8, const RANGE: usize = 256> {
    top: &'a TrieMap<V, S, RANGE>,
    parent: Option<NodeId>,
    symbol: usize,
}

impl<'a, V, S: Symbol, const RANGE: usize> Cursor<'a, V, S, RANGE> {
    fn end_of(top: &'a TrieMap<V, S, RANGE>) -> Self {
        Self {
            top,
            parent: None,
            symbol: 0,
        }
    }

    fn at(top: &'a TrieMap<V, S, RANGE>, id: NodeId) -> Self {
        let node = top.nodes.get(id);
        Self {
            top,
            parent: node.parent,
            symbol: node.symbol,
        }
    }

    fn seek(top: &'a TrieMap<V, S, RANGE>, id: NodeId, from: usize) -> Self {
        match seek_from(move |id| top.nodes.get(id).links(), id, from) {
            Some((parent, symbol)) => Self {
                top,
                parent: Some(parent),
                symbol,
            },
            None => Self::end_of(top),
        }
    }

    #[inline]
    fn node_id(&self) -> Option<NodeId> {
        self.top.nodes.get(self.parent?).children[self.symbol]
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.parent.is_none()
    }

    /// Value at this position; `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        let top = self.top;
        top.nodes.get(self.node_id()?).value.as_ref()
    }

    /// Key of this position, rebuilt by climbing parent links. Empty at the end.
    pub fn key(&self) -> Vec<S> {
        let top = self.top;
        climb_key(move |id| top.nodes.get(id).links(), self.parent, self.symbol)
    }

    /// Move to the next stored key. The end cursor stays at the end.
    ///
    /// The node under the cursor is searched first (its children follow it in
    /// pre-order), then its later siblings, then the later siblings of each
    /// ancestor in turn.
    pub fn advance(&mut self) {
        if let Some(id) = self.node_id() {
            *self = Self::seek(self.top, id, 0);
        }
    }
}

impl<V, S, const RANGE: usize> Clone for Cursor<'_, V, S, RANGE> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, S, const RANGE: usize> Copy for Cursor<'_, V, S, RANGE> {}

impl<V, S, const RANGE: usize> PartialEq for Cursor<'_, V, S, RANGE> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.top, other.top)
            && self.parent == other.parent
            && self.symbol == other.symbol
    }
}

impl<V, S, const RANGE: usize> Eq for Cursor<'_, V, S, RANGE> {}

impl<V, S, const RANGE: usize> fmt::Debug for Cursor<'_, V, S, RANGE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("parent", &self.parent)
            .field("symbol", &self.symbol)
            .finish()
    }
}

impl<V, S: Symbol, const RANGE: usize> TrieMap<V, S, RANGE> {
    /// Cursor at the smallest non-empty stored key, or [`end`](Self::end).
    pub fn begin(&self) -> Cursor<'_, V, S, RANGE> {
        Cursor::seek(self, NodeId::ROOT, 0)
    }

    pub fn end(&self) -> Cursor<'_, V, S, RANGE> {
        Cursor::end_of(self)
    }

    /// Cursor at `key` if it is stored (and non-empty), else [`end`](Self::end).
    /// Advancing it continues in key order from there.
    pub fn find_cursor(&self, key: &[S]) -> Cursor<'_, V, S, RANGE> {
        match self.locate(key) {
            Some(id) if id != NodeId::ROOT && self.nodes.get(id).value.is_some() => {
                Cursor::at(self, id)
            }
            _ => self.end(),
        }
    }

    /// Entries in key order. The empty key, if stored, comes first.
    pub fn iter(&self) -> Iter<'_, V, S, RANGE> {
        Iter {
            root: self.nodes.get(NodeId::ROOT).value.as_ref(),
            cursor: self.begin(),
            remaining: self.len,
        }
    }

    /// Entries in key order with mutable values. The empty key, if stored,
    /// comes first.
    pub fn iter_mut(&mut self) -> IterMut<'_, V, S, RANGE> {
        let remaining = self.len;
        let mut nodes = self.nodes.split();
        let root = nodes.take_value(NodeId::ROOT);
        let next = seek_from(|id| nodes.links(id), NodeId::ROOT, 0);
        IterMut {
            nodes,
            root,
            next,
            remaining,
            _symbol: PhantomData,
        }
    }
}

/// Iterator over `(key, &value)` in key order, driven by a [`Cursor`].
pub struct Iter<'a, V, S = u8, const RANGE: usize = 256> {
    root: Option<&'a V>,
    cursor: Cursor<'a, V, S, RANGE>,
    remaining: usize,
}

impl<'a, V, S: Symbol, const RANGE: usize> Iterator for Iter<'a, V, S, RANGE> {
    type Item = (Vec<S>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.root.take() {
            self.remaining -= 1;
            return Some((Vec::new(), value));
        }

        let value = self.cursor.value()?;
        let key = self.cursor.key();
        self.cursor.advance();
        self.remaining -= 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S: Symbol, const RANGE: usize> ExactSizeIterator for Iter<'_, V, S, RANGE> {}

impl<V, S: Symbol, const RANGE: usize> FusedIterator for Iter<'_, V, S, RANGE> {}

impl<'a, V, S: Symbol, const RANGE: usize> IntoIterator for &'a TrieMap<V, S, RANGE> {
    type Item = (Vec<S>, &'a V);
    type IntoIter = Iter<'a, V, S, RANGE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(key, &mut value)` in key order.
///
/// Walks the same parent-link climb as [`Cursor`]; the position after an entry
/// is found before its value is lent out.
pub struct IterMut<'a, V, S = u8, const RANGE: usize = 256> {
    nodes: SplitArena<'a, V, RANGE>,
    root: Option<&'a mut V>,
    /// `(parent, slot)` of the next entry.
    next: Option<(NodeId, usize)>,
    remaining: usize,
    _symbol: PhantomData<S>,
}

impl<'a, V, S: Symbol, const RANGE: usize> Iterator for IterMut<'a, V, S, RANGE> {
    type Item = (Vec<S>, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.root.take() {
            self.remaining -= 1;
            return Some((Vec::new(), value));
        }

        let (parent, symbol) = self.next?;
        let nodes = &self.nodes;
        let id = nodes.links(parent).children[symbol]?;
        let key = climb_key(|id| nodes.links(id), Some(parent), symbol);
        self.next = seek_from(|id| nodes.links(id), id, 0);

        let value = self.nodes.take_value(id)?;
        self.remaining -= 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S: Symbol, const RANGE: usize> ExactSizeIterator for IterMut<'_, V, S, RANGE> {}

impl<V, S: Symbol, const RANGE: usize> FusedIterator for IterMut<'_, V, S, RANGE> {}

impl<'a, V, S: Symbol, const RANGE: usize> IntoIterator for &'a mut TrieMap<V, S, RANGE> {
    type Item = (Vec<S>, &'a mut V);
    type IntoIter = IterMut<'a, V, S, RANGE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
