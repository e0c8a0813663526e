/// Start/endpoint restriction of an edge set.
///
/// A sort may be limited to the subgraph reachable from a set of start
/// nodes, to the subgraph feeding into a set of endpoint nodes, or to the
/// intersection of the two (edges lying on some start-to-endpoint path).
/// Both restrictions are monotone — each only removes edges — so applying
/// them in sequence is order-independent.
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use crate::sort::Direction;

/// Restricts `edges` to the subgraph relevant to `starts` and `endpoints`.
///
/// An empty `starts` (resp. `endpoints`) slice means no restriction on that
/// side. The result is an owned working copy, suitable for handing to the
/// peeling iterator.
pub(crate) fn restrict<N>(edges: &HashSet<(N, N)>, starts: &[N], endpoints: &[N]) -> HashSet<(N, N)>
where
    N: Clone + Eq + Hash,
{
    let mut working = edges.clone();
    if !starts.is_empty() {
        let reachable = closure(&working, starts, Direction::Forward);
        working.retain(|(source, _)| reachable.contains(source));
    }
    if !endpoints.is_empty() {
        let reaching = closure(&working, endpoints, Direction::Reverse);
        working.retain(|(_, sink)| reaching.contains(sink));
    }
    working
}

/// Computes the reachability closure of `seeds` over `edges`.
///
/// [`Direction::Forward`] follows edges source-to-sink (everything the
/// seeds can reach); [`Direction::Reverse`] follows them sink-to-source
/// (everything that can reach the seeds). The seeds themselves are always
/// included, whether or not any edge touches them.
fn closure<N>(edges: &HashSet<(N, N)>, seeds: &[N], direction: Direction) -> HashSet<N>
where
    N: Clone + Eq + Hash,
{
    // One adjacency pass up front so the BFS does not rescan the edge set
    // per visited node.
    let mut neighbours: HashMap<&N, Vec<&N>> = HashMap::new();
    for edge in edges {
        neighbours
            .entry(direction.lead(edge))
            .or_default()
            .push(direction.trail(edge));
    }

    let mut visited: HashSet<&N> = HashSet::new();
    let mut queue: VecDeque<&N> = seeds.iter().collect();
    while let Some(node) = queue.pop_front() {
        if !visited.insert(node) {
            continue;
        }
        if let Some(next) = neighbours.get(node) {
            for &neighbour in next {
                if !visited.contains(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    visited.into_iter().cloned().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
