//! Callback traversal for bulk dumps.

use crate::arena::NodeId;
use crate::{Symbol, TrieMap};

impl<V, S: Symbol, const RANGE: usize> TrieMap<V, S, RANGE> {
    /// Visit every stored non-empty key in pre-order, ascending symbol order.
    ///
    /// Keys are assembled in `buffer`; the visitor gets the filled prefix and
    /// the value. Returning `false` from the visitor stops the walk and makes
    /// `for_each` return `false`. Keys at least `buffer.len()` long do not fit
    /// and are skipped along with everything below them.
    ///
    /// The walk recurses once per key symbol, so its stack depth is bounded by
    /// `buffer.len()`. For very long keys use [`begin`](Self::begin) or
    /// [`iter`](Self::iter), which climb parent links instead of recursing.
    pub fn for_each<F>(&self, buffer: &mut [S], mut visitor: F) -> bool
    where
        F: FnMut(&[S], &V) -> bool,
    {
        self.visit(NodeId::ROOT, buffer, 0, &mut visitor)
    }

    fn visit<F>(&self, id: NodeId, buffer: &mut [S], depth: usize, visitor: &mut F) -> bool
    where
        F: FnMut(&[S], &V) -> bool,
    {
        if depth >= buffer.len() {
            return true;
        }

        let node = self.nodes.get(id);
        if depth > 0 {
            if let Some(value) = &node.value {
                if !visitor(&buffer[..depth], value) {
                    return false;
                }
            }
        }

        for (index, child) in node.children.iter().enumerate() {
            let Some(child) = *child else {
                continue;
            };
            buffer[depth] = S::from_index(index);
            if !self.visit(child, buffer, depth + 1, visitor) {
                return false;
            }
        }
        true
    }
}
