/// Forward topological sorting by repeated set-difference queries.
///
/// The peel works entirely in SQL, against a working table snapshotted from
/// the edge relation when the iterator is constructed:
///
/// 1. One row per edge, plus one *marker* row per distinct sink. A marker
///    row puts its node in the `source` column with no sink, so nodes that
///    only ever appear as sinks still surface as sources in the final
///    rounds — without markers the pure sinks would vanish with the last
///    real edge instead of forming the closing generations.
/// 2. Each round selects the distinct sources that do not appear as the
///    sink of any remaining real edge — the ready set — then deletes their
///    rows (marker rows included).
/// 3. When no source qualifies, any remaining real rows are the residue of
///    a cycle and are reported through the shared [`CycleError`].
///
/// Rescanning the working table every round is quadratic in the number of
/// generations; each round stays a self-contained statement pair in
/// exchange.
use std::collections::HashSet;
use std::hash::Hash;

use gendag_core::CycleError;
use rusqlite::types::FromSql;

use crate::dag::{SqliteDag, quote_ident};
use crate::error::SortError;

// ---------------------------------------------------------------------------
// SqliteTopsort
// ---------------------------------------------------------------------------

/// Lazy generation iterator over a snapshot of a [`SqliteDag`] relation.
///
/// Yields `Ok(generation)` per peel round and `Err` exactly once on either
/// a storage failure or a detected cycle; fused afterwards. Generations
/// yielded before a cycle failure stand, exactly as with the in-memory
/// sorter. Dropping the iterator drops its working table.
#[derive(Debug)]
pub struct SqliteTopsort<'a, N> {
    dag: &'a SqliteDag<N>,
    working: String,
    done: bool,
}

impl<'a, N> SqliteTopsort<'a, N> {
    /// Snapshots the relation into a working table named uniquely for this
    /// sort invocation.
    pub(crate) fn new(dag: &'a SqliteDag<N>, invocation: u64) -> Result<Self, rusqlite::Error> {
        let working = quote_ident(&format!("gendag_working_{invocation}"));
        dag.conn.execute(
            &format!(
                "CREATE TEMPORARY TABLE {working} (
                    source NOT NULL, sink, marker INT NOT NULL DEFAULT 0
                )"
            ),
            [],
        )?;
        let topsort = Self {
            dag,
            working,
            done: false,
        };
        topsort.populate()?;
        Ok(topsort)
    }

    /// Copies the edge rows and seeds the sink marker rows.
    fn populate(&self) -> Result<(), rusqlite::Error> {
        self.dag.conn.execute(
            &format!(
                "INSERT INTO {working} (source, sink) SELECT {source}, {sink} FROM {table}",
                working = self.working,
                source = self.dag.qsource,
                sink = self.dag.qsink,
                table = self.dag.qtable,
            ),
            [],
        )?;
        self.dag.conn.execute(
            &format!(
                "INSERT INTO {working} (source, marker) SELECT DISTINCT {sink}, 1 FROM {table}",
                working = self.working,
                sink = self.dag.qsink,
                table = self.dag.qtable,
            ),
            [],
        )?;
        Ok(())
    }
}

impl<N: FromSql + Eq + Hash + Ord> SqliteTopsort<'_, N> {
    /// Runs one peel round. `Ok(None)` means the working set drained
    /// cleanly; a stall with real rows remaining is a cycle.
    fn advance(&self) -> Result<Option<HashSet<N>>, SortError<N>> {
        let ready = self.ready()?;
        if ready.is_empty() {
            let residual = self.residual()?;
            if residual.is_empty() {
                return Ok(None);
            }
            return Err(CycleError::new(residual).into());
        }
        self.peel()?;
        Ok(Some(ready))
    }

    /// The sources that no remaining real edge still blocks.
    ///
    /// Marker rows carry a null sink, but the `marker = 0` filter keeps
    /// them out of the subquery, so the `NOT IN` never meets a null.
    fn ready(&self) -> Result<HashSet<N>, rusqlite::Error> {
        let mut statement = self.dag.conn.prepare(&format!(
            "SELECT DISTINCT source FROM {working}
             WHERE source NOT IN (SELECT sink FROM {working} WHERE marker = 0)",
            working = self.working,
        ))?;
        let rows = statement.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Deletes every row of the ready sources, marker rows included.
    fn peel(&self) -> Result<(), rusqlite::Error> {
        self.dag.conn.execute(
            &format!(
                "DELETE FROM {working}
                 WHERE source NOT IN (SELECT sink FROM {working} WHERE marker = 0)",
                working = self.working,
            ),
            [],
        )?;
        Ok(())
    }

    /// The real edges left after a stall.
    fn residual(&self) -> Result<Vec<(N, N)>, rusqlite::Error> {
        let mut statement = self.dag.conn.prepare(&format!(
            "SELECT source, sink FROM {} WHERE marker = 0",
            self.working,
        ))?;
        let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }
}

impl<N: FromSql + Eq + Hash + Ord> Iterator for SqliteTopsort<'_, N> {
    type Item = Result<HashSet<N>, SortError<N>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(generation)) => Some(Ok(generation)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<N> Drop for SqliteTopsort<'_, N> {
    fn drop(&mut self) {
        // Best effort: an undropped working table only lives until the
        // connection closes.
        drop(
            self.dag
                .conn
                .execute(&format!("DROP TABLE IF EXISTS {}", self.working), []),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use rusqlite::Connection;

    fn memory_dag(edges: &[(&str, &str)]) -> SqliteDag<String> {
        let conn = Connection::open_in_memory().expect("in-memory database");
        let dag = SqliteDag::new(conn, "edges", "source", "sink").expect("schema creation");
        for (source, sink) in edges {
            dag.add(&(*source).to_owned(), &(*sink).to_owned())
                .expect("insert");
        }
        dag
    }

    fn generation(nodes: &[&str]) -> HashSet<String> {
        nodes.iter().map(|node| (*node).to_owned()).collect()
    }

    fn generations(dag: &SqliteDag<String>) -> Vec<HashSet<String>> {
        dag.sort_forward()
            .expect("snapshot")
            .collect::<Result<_, _>>()
            .expect("graph should be acyclic")
    }

    /// The diamond groups into the same three generations as the in-memory
    /// sorter.
    #[test]
    fn test_forward_sort_of_diamond() {
        let dag = memory_dag(&[("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")]);
        assert_eq!(
            generations(&dag),
            vec![generation(&["a"]), generation(&["b", "c"]), generation(&["d"])]
        );
    }

    /// Pure sinks surface as the closing generation via the marker rows.
    #[test]
    fn test_chain_yields_its_sink() {
        let dag = memory_dag(&[("a", "b"), ("b", "c")]);
        assert_eq!(
            generations(&dag),
            vec![generation(&["a"]), generation(&["b"]), generation(&["c"])]
        );
    }

    /// An empty relation sorts to an empty sequence.
    #[test]
    fn test_empty_relation_yields_nothing() {
        let dag = memory_dag(&[]);
        assert_eq!(dag.sort_forward().expect("snapshot").count(), 0);
    }

    /// A cycle behind an acyclic prefix: prefix generations stand, then the
    /// sort fails over exactly the cyclic residue.
    #[test]
    fn test_cycle_detected_after_valid_prefix() {
        let dag = memory_dag(&[("a", "b"), ("b", "d"), ("a", "c"), ("c", "d"), ("d", "c")]);
        let mut sort = dag.sort_forward().expect("snapshot");
        assert_eq!(
            sort.next().expect("first generation").expect("not yet stuck"),
            generation(&["a"])
        );
        assert_eq!(
            sort.next().expect("second generation").expect("not yet stuck"),
            generation(&["b"])
        );
        let err = sort
            .next()
            .expect("the stall is reported before iteration ends")
            .expect_err("c and d form a cycle");
        match err {
            SortError::Cycle(cycle) => {
                assert_eq!(cycle.cycle(), vec!["c".to_owned(), "d".to_owned(), "c".to_owned()]);
            }
            SortError::Storage(err) => panic!("unexpected storage failure: {err}"),
        }
        assert!(sort.next().is_none(), "failed sorts are fused");
    }

    /// A self-loop stalls the first round.
    #[test]
    fn test_self_loop_is_a_one_node_cycle() {
        let dag = memory_dag(&[("a", "a")]);
        let outcome = dag
            .sort_forward()
            .expect("snapshot")
            .next()
            .expect("the stall is reported");
        assert!(outcome.is_err());
    }

    /// The sort runs against its snapshot: mutations made while the
    /// iterator is live do not change its output.
    #[test]
    fn test_snapshot_isolation_from_later_mutations() {
        let dag = memory_dag(&[("a", "b")]);
        let mut sort = dag.sort_forward().expect("snapshot");
        dag.add(&"z".to_owned(), &"a".to_owned()).expect("insert");
        assert_eq!(
            sort.next().expect("generation").expect("acyclic"),
            generation(&["a"]),
            "the pre-mutation snapshot starts at a, not z"
        );
        assert_eq!(
            sort.next().expect("generation").expect("acyclic"),
            generation(&["b"])
        );
        assert!(sort.next().is_none());
    }

    /// Overlapping sorts on one connection use distinct working tables.
    #[test]
    fn test_overlapping_sorts_do_not_collide() {
        let dag = memory_dag(&[("a", "b")]);
        let mut first = dag.sort_forward().expect("snapshot");
        let mut second = dag.sort_forward().expect("snapshot");
        assert_eq!(
            first.next().expect("generation").expect("acyclic"),
            generation(&["a"])
        );
        assert_eq!(
            second.next().expect("generation").expect("acyclic"),
            generation(&["a"])
        );
        drop(first);
        assert_eq!(
            second.next().expect("generation").expect("acyclic"),
            generation(&["b"])
        );
    }

    /// Abandoning a sort and starting over works; the working table is
    /// cleaned up in between.
    #[test]
    fn test_sorts_are_restartable_from_scratch() {
        let dag = memory_dag(&[("a", "b"), ("b", "c")]);
        let mut abandoned = dag.sort_forward().expect("snapshot");
        abandoned.next();
        drop(abandoned);
        assert_eq!(generations(&dag).len(), 3);
    }
}
