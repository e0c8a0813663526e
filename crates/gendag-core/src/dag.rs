/// The edge-set graph container.
///
/// A [`Dag`] *is* a set of directed `(source, sink)` edges: nodes have no
/// standalone existence and no per-node attributes — a node is in the graph
/// exactly when it appears as an endpoint of some edge. The container is
/// named for its intended use, not for a constraint it polices: nothing
/// stops a caller from inserting a cycle, and acyclicity is only checked
/// when a sort is asked to linearize the graph.
///
/// # Set semantics
///
/// Edges are unique: re-adding an existing edge is a no-op, as is removing
/// an absent one. There is no parallel-edge multiplicity and no edge
/// payload beyond the pair itself.
///
/// # Sorting
///
/// [`Dag::sort_forward`] and [`Dag::sort_reverse`] return a lazy
/// [`Topsort`] iterator over node generations; see the [`sort`](crate::sort)
/// module. Each call snapshots the (optionally restricted) edge set, so an
/// in-progress sort never observes later mutations of the `Dag` and
/// concurrent sorts over one graph cannot interfere.
use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::sort::{Direction, Topsort};
use crate::subgraph;

// ---------------------------------------------------------------------------
// Dag
// ---------------------------------------------------------------------------

/// A directed graph stored as a set of `(source, sink)` edge pairs.
///
/// `N` is an opaque node identifier; the container itself only needs
/// equality and hashing. The sort entry points additionally require `Ord`,
/// which the cycle reporter uses for its deterministic tie-breaks.
///
/// Serializes transparently as the bare edge list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dag<N: Eq + Hash> {
    edges: HashSet<(N, N)>,
}

impl<N: Eq + Hash> Default for Dag<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Eq + Hash> Dag<N> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            edges: HashSet::new(),
        }
    }

    /// Inserts the edge `source -> sink`.
    ///
    /// Returns `true` if the edge was not already present. Self-loops are
    /// accepted; a self-loop is a one-node cycle and will surface as such
    /// only if the node is ever subjected to a sort.
    pub fn add(&mut self, source: N, sink: N) -> bool {
        self.edges.insert((source, sink))
    }

    /// Returns the number of edges in the graph.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph contains no edges.
    ///
    /// An edge-free graph also contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over all edges in arbitrary order.
    pub fn edges(&self) -> impl Iterator<Item = &(N, N)> {
        self.edges.iter()
    }
}

impl<N: Clone + Eq + Hash> Dag<N> {
    /// Removes the edge `source -> sink` if present.
    ///
    /// Returns `true` if the edge was present. Removing an absent edge is a
    /// no-op, not an error.
    pub fn remove(&mut self, source: &N, sink: &N) -> bool {
        self.edges.remove(&(source.clone(), sink.clone()))
    }

    /// Returns `true` if the edge `source -> sink` is present.
    pub fn contains(&self, source: &N, sink: &N) -> bool {
        self.edges.contains(&(source.clone(), sink.clone()))
    }

    /// Returns every node in the graph: the union of all sources and sinks.
    pub fn nodes(&self) -> HashSet<N> {
        let mut nodes = HashSet::with_capacity(self.edges.len());
        for (source, sink) in &self.edges {
            nodes.insert(source.clone());
            nodes.insert(sink.clone());
        }
        nodes
    }

    /// Returns all edges whose source is one of `nodes`.
    pub fn edges_from(&self, nodes: &[N]) -> HashSet<(N, N)> {
        self.edges
            .iter()
            .filter(|(source, _)| nodes.contains(source))
            .cloned()
            .collect()
    }

    /// Returns all edges whose sink is one of `nodes`.
    pub fn edges_to(&self, nodes: &[N]) -> HashSet<(N, N)> {
        self.edges
            .iter()
            .filter(|(_, sink)| nodes.contains(sink))
            .cloned()
            .collect()
    }
}

impl<N: Clone + Eq + Hash + Ord> Dag<N> {
    /// Starts a forward topological sort: generations are yielded
    /// dependency-first, and every edge points from an earlier generation to
    /// a later one.
    ///
    /// `starts` restricts the sort to the subgraph reachable from the given
    /// nodes; `endpoints` restricts it to the subgraph feeding into the
    /// given nodes. Either may be empty (unrestricted); when both are given
    /// the sort covers edges lying on some start-to-endpoint path. A
    /// restriction that matches no edges yields an empty iteration, not an
    /// error.
    ///
    /// The returned [`Topsort`] owns an independent working copy of the
    /// restricted edge set; dropping it early is always safe.
    pub fn sort_forward(&self, starts: &[N], endpoints: &[N]) -> Topsort<N> {
        let working = subgraph::restrict(&self.edges, starts, endpoints);
        Topsort::new(working, Direction::Forward)
    }

    /// Starts a reverse topological sort: generations are discovered from
    /// the sink end (nodes with no outgoing edges first).
    ///
    /// Accepts the same `starts`/`endpoints` restriction as
    /// [`Dag::sort_forward`] — the restriction is applied to the edge set
    /// before the direction is taken into account. Note that the reverse
    /// sequence is not in general the exact reverse of the forward one when
    /// path lengths to different sinks are uneven.
    pub fn sort_reverse(&self, starts: &[N], endpoints: &[N]) -> Topsort<N> {
        let working = subgraph::restrict(&self.edges, starts, endpoints);
        Topsort::new(working, Direction::Reverse)
    }
}

impl<N: Eq + Hash> FromIterator<(N, N)> for Dag<N> {
    fn from_iter<I: IntoIterator<Item = (N, N)>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

impl<N: Eq + Hash> Extend<(N, N)> for Dag<N> {
    fn extend<I: IntoIterator<Item = (N, N)>>(&mut self, iter: I) {
        self.edges.extend(iter);
    }
}

impl<'a, N: Eq + Hash> IntoIterator for &'a Dag<N> {
    type Item = &'a (N, N);
    type IntoIter = std::collections::hash_set::Iter<'a, (N, N)>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn diamond() -> Dag<&'static str> {
        // a ---> b
        //  \      \
        //   v      v
        //   c ---> d
        Dag::from_iter([("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")])
    }

    /// A fresh graph has no edges and no nodes.
    #[test]
    fn test_new_graph_is_empty() {
        let dag: Dag<u32> = Dag::new();
        assert!(dag.is_empty());
        assert_eq!(dag.len(), 0);
        assert!(dag.nodes().is_empty());
    }

    /// `add` is idempotent: re-adding an existing edge changes nothing.
    #[test]
    fn test_add_is_idempotent() {
        let mut dag = Dag::new();
        assert!(dag.add("a", "b"));
        assert!(!dag.add("a", "b"));
        assert_eq!(dag.len(), 1);
    }

    /// Removing an edge that was never added is a no-op, not an error.
    #[test]
    fn test_remove_absent_edge_is_noop() {
        let mut dag = diamond();
        assert!(!dag.remove(&"d", &"a"));
        assert_eq!(dag.len(), 4);
        assert!(dag.remove(&"a", &"b"));
        assert_eq!(dag.len(), 3);
    }

    /// `contains` distinguishes edge direction.
    #[test]
    fn test_contains_is_directional() {
        let dag = diamond();
        assert!(dag.contains(&"a", &"b"));
        assert!(!dag.contains(&"b", &"a"));
    }

    /// `nodes` is the union of all edge endpoints.
    #[test]
    fn test_nodes_unions_sources_and_sinks() {
        let dag = diamond();
        let nodes = dag.nodes();
        assert_eq!(nodes, HashSet::from(["a", "b", "c", "d"]));
    }

    /// `edges_from` selects on the source endpoint only.
    #[test]
    fn test_edges_from_selects_by_source() {
        let dag = diamond();
        assert_eq!(
            dag.edges_from(&["a"]),
            HashSet::from([("a", "b"), ("a", "c")])
        );
        assert_eq!(
            dag.edges_from(&["b", "c"]),
            HashSet::from([("b", "d"), ("c", "d")])
        );
        assert!(dag.edges_from(&["d"]).is_empty());
    }

    /// `edges_to` selects on the sink endpoint only.
    #[test]
    fn test_edges_to_selects_by_sink() {
        let dag = diamond();
        assert_eq!(
            dag.edges_to(&["d"]),
            HashSet::from([("b", "d"), ("c", "d")])
        );
        assert!(dag.edges_to(&["a"]).is_empty());
    }

    /// A self-loop is a valid edge; inserting one does not fail.
    #[test]
    fn test_self_loop_is_a_valid_edge() {
        let mut dag = Dag::new();
        assert!(dag.add("a", "a"));
        assert!(dag.contains(&"a", &"a"));
        assert_eq!(dag.nodes(), HashSet::from(["a"]));
    }

    /// `Extend` and `IntoIterator` round-trip the edge set.
    #[test]
    fn test_extend_and_iteration() {
        let mut dag = Dag::new();
        dag.extend([(1, 2), (2, 3)]);
        dag.extend([(2, 3)]);
        assert_eq!(dag.len(), 2);
        let collected: HashSet<(i32, i32)> = (&dag).into_iter().copied().collect();
        assert_eq!(collected, HashSet::from([(1, 2), (2, 3)]));
    }

    /// The graph serializes transparently as its edge list.
    #[test]
    fn test_serde_round_trip() {
        let dag = diamond();
        let json = serde_json::to_string(&dag).expect("graph should serialize");
        let back: Dag<String> = serde_json::from_str(&json).expect("graph should deserialize");
        let expected: Dag<String> = dag
            .edges()
            .map(|(s, t)| ((*s).to_owned(), (*t).to_owned()))
            .collect();
        assert_eq!(back, expected);
    }
}
