/// Cycle reporting for stalled sorts.
///
/// When a peel stalls with edges remaining, those residual edges contain at
/// least one cycle. [`CycleError`] carries the residual set and can extract
/// one concrete cycle from it as a closed node walk.
///
/// # Determinism
///
/// The extraction is fully deterministic for a given residual set, so the
/// same input graph always produces the same report: the walk starts at the
/// minimum node under `Ord`, and wherever a node has several outgoing
/// residual edges it follows the one with the minimum sink. The reported
/// cycle is *some* cycle of the residual subgraph, not necessarily the
/// shortest one.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CycleError
// ---------------------------------------------------------------------------

/// A sort failed because the edges listed in `members` admit no topological
/// order.
///
/// `members` is the full residual edge set at the moment the peel stalled;
/// it may include acyclic tails hanging off the cycles (edges that could not
/// be peeled only because they descend from a cycle). [`CycleError::cycle`]
/// narrows this down to one concrete closed walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<N: Ord> {
    members: BTreeSet<(N, N)>,
}

impl<N: Ord> CycleError<N> {
    /// Wraps the residual edge set left behind by a stalled sort.
    pub fn new(members: impl IntoIterator<Item = (N, N)>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// The residual edges, in ascending order.
    pub fn members(&self) -> &BTreeSet<(N, N)> {
        &self.members
    }
}

impl<N: Clone + Ord> CycleError<N> {
    /// Extracts one cycle from the residual edges as a closed walk: the
    /// first and last element are the same node, and every consecutive pair
    /// is a residual edge.
    ///
    /// The walk is chosen deterministically (minimum start node, minimum
    /// sink on branches); see the module documentation. Returns an empty
    /// vector only for an empty residual set, which no stalled sort
    /// produces.
    pub fn cycle(&self) -> Vec<N> {
        let core = self.cyclic_core();

        // Ascending iteration makes the first sink recorded per source the
        // minimum one, and the first map entry the minimum start node.
        let mut successor: BTreeMap<&N, &N> = BTreeMap::new();
        for (source, sink) in &core {
            successor.entry(source).or_insert(sink);
        }
        let Some((&start, _)) = successor.first_key_value() else {
            return Vec::new();
        };

        // Follow the successor map until a node recurs. The map is total on
        // the core, so the walk is bounded by the number of core nodes. The
        // walk may re-enter itself past its first node; closing at the first
        // repeat handles that.
        let mut path: Vec<&N> = Vec::new();
        let mut seen: BTreeMap<&N, usize> = BTreeMap::new();
        let mut current = start;
        loop {
            if let Some(&first_visit) = seen.get(current) {
                let mut cycle: Vec<N> = path[first_visit..].iter().map(|&n| n.clone()).collect();
                cycle.push(current.clone());
                return cycle;
            }
            seen.insert(current, path.len());
            path.push(current);
            match successor.get(current) {
                Some(&next) => current = next,
                // Unreachable: every core node keeps an outgoing edge.
                None => return Vec::new(),
            }
        }
    }

    /// Trims the residual set down to its cyclic core by repeatedly
    /// discarding edges whose sink has no outgoing edge left.
    ///
    /// A stalled forward peel guarantees every residual source still has an
    /// incoming edge, so after this bottom-up trim every remaining node has
    /// both an incoming and an outgoing edge and the cycles survive intact.
    fn cyclic_core(&self) -> BTreeSet<(N, N)> {
        let mut core = self.members.clone();
        loop {
            let sources: BTreeSet<&N> = core.iter().map(|(source, _)| source).collect();
            let dead_ends: Vec<(N, N)> = core
                .iter()
                .filter(|(_, sink)| !sources.contains(sink))
                .cloned()
                .collect();
            if dead_ends.is_empty() {
                return core;
            }
            for edge in &dead_ends {
                core.remove(edge);
            }
        }
    }
}

impl<N: Clone + Ord + fmt::Debug> fmt::Display for CycleError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle detected: ")?;
        for (position, node) in self.cycle().iter().enumerate() {
            if position > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node:?}")?;
        }
        Ok(())
    }
}

impl<N: Clone + Ord + fmt::Debug> std::error::Error for CycleError<N> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
