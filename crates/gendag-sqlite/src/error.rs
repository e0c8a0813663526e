/// Errors produced by storage-backed sorts.
use std::fmt;

use gendag_core::CycleError;

/// All error conditions a [`SqliteTopsort`](crate::SqliteTopsort) iteration
/// can yield.
///
/// Plain storage operations (`add`, `remove`, `contains`, …) return
/// [`rusqlite::Error`] directly; this enum exists for the sort, whose
/// iteration can fail either way: the backend can error mid-peel, or the
/// peel can stall on a cycle exactly as the in-memory sorter does.
#[derive(Debug)]
pub enum SortError<N: Ord> {
    /// The underlying database reported an error.
    Storage(rusqlite::Error),
    /// The peel stalled with edges remaining; the graph is cyclic.
    Cycle(CycleError<N>),
}

impl<N: Clone + Ord + fmt::Debug> fmt::Display for SortError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Cycle(err) => write!(f, "{err}"),
        }
    }
}

impl<N: Clone + Ord + fmt::Debug> std::error::Error for SortError<N> {}

impl<N: Ord> From<rusqlite::Error> for SortError<N> {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err)
    }
}

impl<N: Ord> From<CycleError<N>> for SortError<N> {
    fn from(err: CycleError<N>) -> Self {
        Self::Cycle(err)
    }
}
