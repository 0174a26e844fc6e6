use std::collections::TryReserveError;

/// Errors reported by the fallible mutation paths of [`TrieMap`](crate::TrieMap).
///
/// Lookups and erasure never fail: a missing key is reported as `None`/`false`.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    /// The node arena could not grow to hold the nodes a key needs.
    #[error("failed to reserve room for {additional} trie nodes")]
    Alloc {
        additional: usize,
        #[source]
        source: TryReserveError,
    },
    /// Node ids are 32-bit; the arena has no ids left to hand out.
    #[error("trie node id space exhausted ({live} live nodes, {additional} more requested)")]
    CapacityOverflow { live: usize, additional: usize },
}

pub type Result<T> = std::result::Result<T, TrieError>;
