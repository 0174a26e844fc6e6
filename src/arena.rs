//! Node arena.
//!
//! Every node of a map lives in one `Vec` of slots owned by the map. Child and
//! parent links are slot indices, so a parent link can never keep a node alive
//! and cloning the arena re-links the copy to itself for free.
//!
//! The root always occupies the first slot and is never released.

use std::num::NonZeroU32;

use crate::error::{Result, TrieError};

/// Slots addressable by a [`NodeId`].
const MAX_SLOTS: usize = u32::MAX as usize;

/// Index of a node slot. Stored as `slot + 1` so `Option<NodeId>` stays 4 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(NonZeroU32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(NonZeroU32::MIN);

    #[inline]
    fn from_slot(slot: usize) -> Option<Self> {
        u32::try_from(slot + 1).ok().and_then(NonZeroU32::new).map(NodeId)
    }

    #[inline]
    fn slot(self) -> usize {
        self.0.get() as usize - 1
    }
}

#[derive(Clone)]
pub(crate) struct Node<V, const RANGE: usize> {
    pub(crate) children: [Option<NodeId>; RANGE],
    pub(crate) parent: Option<NodeId>,
    /// Masked slot index under `parent`. Zero for the root.
    pub(crate) symbol: usize,
    /// Number of occupied `children` slots.
    pub(crate) child_count: usize,
    pub(crate) value: Option<V>,
}

impl<V, const RANGE: usize> Node<V, RANGE> {
    fn new(parent: Option<NodeId>, symbol: usize) -> Self {
        Self {
            children: [None; RANGE],
            parent,
            symbol,
            child_count: 0,
            value: None,
        }
    }

    #[inline]
    pub(crate) fn links(&self) -> Links<'_, RANGE> {
        Links {
            children: &self.children,
            parent: self.parent,
            symbol: self.symbol,
            child_count: self.child_count,
            has_value: self.value.is_some(),
        }
    }
}

/// The shape of a node without its value.
#[derive(Clone, Copy)]
pub(crate) struct Links<'a, const RANGE: usize> {
    pub(crate) children: &'a [Option<NodeId>; RANGE],
    pub(crate) parent: Option<NodeId>,
    pub(crate) symbol: usize,
    pub(crate) child_count: usize,
    pub(crate) has_value: bool,
}

impl<const RANGE: usize> Links<'_, RANGE> {
    /// First occupied child slot at or after `from`.
    #[inline]
    pub(crate) fn next_child(&self, from: usize) -> Option<(usize, NodeId)> {
        if self.child_count == 0 {
            return None;
        }
        self.children
            .get(from..)?
            .iter()
            .enumerate()
            .find_map(|(i, child)| child.map(|id| (from + i, id)))
    }
}

/// An arena borrowed for mutable iteration: node links stay readable while
/// each value can be handed out exclusively, once.
pub(crate) struct SplitArena<'a, V, const RANGE: usize> {
    links: Vec<Option<Links<'a, RANGE>>>,
    values: Vec<Option<&'a mut V>>,
}

impl<'a, V, const RANGE: usize> SplitArena<'a, V, RANGE> {
    #[inline]
    pub(crate) fn links(&self, id: NodeId) -> Links<'a, RANGE> {
        self.links[id.slot()].expect("node id must refer to a live slot")
    }

    /// Value of `id`, unless already taken.
    #[inline]
    pub(crate) fn take_value(&mut self, id: NodeId) -> Option<&'a mut V> {
        self.values[id.slot()].take()
    }
}

#[derive(Clone)]
pub(crate) struct NodeArena<V, const RANGE: usize> {
    slots: Vec<Option<Node<V, RANGE>>>,
    /// Released slots, reused before the `Vec` grows.
    free: Vec<NodeId>,
    live: usize,
    /// Upper bound on `slots.len()`.
    slot_limit: usize,
}

impl<V, const RANGE: usize> NodeArena<V, RANGE> {
    pub(crate) fn with_capacity(nodes: usize) -> Self {
        let mut slots = Vec::with_capacity(nodes.max(1));
        slots.push(Some(Node::new(None, 0)));
        Self {
            slots,
            free: Vec::new(),
            live: 1,
            slot_limit: MAX_SLOTS,
        }
    }

    /// Lower the slot bound so id-space exhaustion can be reached in tests.
    #[cfg(test)]
    pub(crate) fn limit_slots(&mut self, limit: usize) {
        self.slot_limit = limit.min(MAX_SLOTS);
    }

    /// Live nodes, root included.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<V, RANGE> {
        self.slots[id.slot()]
            .as_ref()
            .expect("node id must refer to a live slot")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<V, RANGE> {
        self.slots[id.slot()]
            .as_mut()
            .expect("node id must refer to a live slot")
    }

    /// Make sure `additional` nodes can be attached without the arena allocating.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let grow = additional.saturating_sub(self.free.len());
        if grow == 0 {
            return Ok(());
        }
        let fits = self
            .slots
            .len()
            .checked_add(grow)
            .is_some_and(|end| end <= self.slot_limit);
        if !fits {
            return Err(TrieError::CapacityOverflow {
                live: self.live,
                additional,
            });
        }
        self.slots
            .try_reserve(grow)
            .map_err(|source| TrieError::Alloc { additional, source })
    }

    /// Borrow every live node as `(links, value)` so values can be lent out
    /// one by one while the links are walked.
    pub(crate) fn split(&mut self) -> SplitArena<'_, V, RANGE> {
        let mut links = Vec::with_capacity(self.slots.len());
        let mut values = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter_mut() {
            match slot {
                Some(Node {
                    children,
                    parent,
                    symbol,
                    child_count,
                    value,
                }) => {
                    links.push(Some(Links {
                        children: &*children,
                        parent: *parent,
                        symbol: *symbol,
                        child_count: *child_count,
                        has_value: value.is_some(),
                    }));
                    values.push(value.as_mut());
                }
                None => {
                    links.push(None);
                    values.push(None);
                }
            }
        }
        SplitArena { links, values }
    }

    /// Create an empty node in `parent`'s slot `index` and return its id.
    pub(crate) fn attach_child(&mut self, parent: NodeId, index: usize) -> NodeId {
        debug_assert!(index < RANGE);
        debug_assert!(self.get(parent).children[index].is_none());

        let node = Node::new(Some(parent), index);
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.slot()] = Some(node);
                id
            }
            None => {
                let id = NodeId::from_slot(self.slots.len()).expect("trie node id space exhausted");
                self.slots.push(Some(node));
                id
            }
        };
        self.live += 1;

        let parent = self.get_mut(parent);
        parent.children[index] = Some(id);
        parent.child_count += 1;
        id
    }

    /// Unlink `parent`'s slot `index`, leaving the subtree allocated.
    pub(crate) fn detach_child(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let parent = self.get_mut(parent);
        let child = parent.children[index].take()?;
        parent.child_count -= 1;
        Some(child)
    }

    /// Release a detached subtree, dropping its payloads. Returns the number of
    /// nodes released.
    pub(crate) fn free_subtree(&mut self, top: NodeId) -> usize {
        debug_assert_ne!(top, NodeId::ROOT);

        let mut stack = vec![top];
        let mut released = 0;
        while let Some(id) = stack.pop() {
            let node = self.slots[id.slot()]
                .take()
                .expect("subtree must not share nodes");
            stack.extend(node.children.iter().flatten());
            self.free.push(id);
            released += 1;
        }
        self.live -= released;
        tracing::trace!(released, live = self.live, "released trie subtree");
        released
    }

    /// Drop every node except a fresh, empty root.
    pub(crate) fn reset(&mut self) {
        self.slots.truncate(1);
        self.slots[0] = Some(Node::new(None, 0));
        self.free.clear();
        self.live = 1;
    }

    /// Rebuild the live nodes into a hole-free arena, in key order. Returns the
    /// number of non-root nodes rewritten.
    pub(crate) fn compact(&mut self) -> usize {
        let live = self.live;
        let mut old = std::mem::replace(self, Self::with_capacity(live));
        self.slot_limit = old.slot_limit;
        let root = old.slots[0]
            .take()
            .expect("root slot is always live");
        self.get_mut(NodeId::ROOT).value = root.value;

        // (node in `old`, parent in `self`, slot index)
        let mut stack: Vec<(NodeId, NodeId, usize)> = Vec::new();
        fn push_children(
            stack: &mut Vec<(NodeId, NodeId, usize)>,
            children: &[Option<NodeId>],
            parent: NodeId,
        ) {
            for (index, child) in children.iter().enumerate().rev() {
                if let Some(child) = *child {
                    stack.push((child, parent, index));
                }
            }
        }
        push_children(&mut stack, &root.children[..], NodeId::ROOT);

        while let Some((old_id, parent, index)) = stack.pop() {
            let node = old.slots[old_id.slot()]
                .take()
                .expect("subtree must not share nodes");
            let id = self.attach_child(parent, index);
            self.get_mut(id).value = node.value;
            push_children(&mut stack, &node.children[..], id);
        }
        debug_assert_eq!(self.live, old.live);
        self.live - 1
    }

    pub(crate) fn capacity_bytes(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<V, RANGE>>>()
            + self.free.capacity() * std::mem::size_of::<NodeId>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing released slots can go; interior holes stay until `compact`.
        while self.slots.len() > 1 && self.slots.last().is_some_and(Option::is_none) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.slot() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }
}
