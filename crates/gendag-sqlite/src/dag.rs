/// The SQLite-backed edge relation.
///
/// [`SqliteDag`] keeps the same "graph is a set of edges" model as the
/// in-memory [`gendag_core::Dag`], persisted in a two-column relation of the
/// caller's choosing. Every set operation translates into a query or
/// mutation against that relation; nothing is cached in memory. Acyclicity
/// is, as in the core, a property checked by sorting, not enforced on
/// insert.
///
/// Table and column names are spliced into SQL with identifier quoting
/// (double-quote doubling), never as bound parameters, so any name SQLite
/// accepts is usable.
use std::cell::Cell;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::Path;

use rusqlite::types::FromSql;
use rusqlite::{Connection, OptionalExtension, ToSql, params};

use crate::sort::SqliteTopsort;

/// Quotes an arbitrary string as a SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ---------------------------------------------------------------------------
// SqliteDag
// ---------------------------------------------------------------------------

/// A directed graph stored as a `(source, sink)` edge relation in SQLite.
///
/// `N` is the node identifier type as seen through the connection; it must
/// convert to and from SQL values. The relation carries a uniqueness
/// constraint over the pair, so edge-set semantics (idempotent add, no
/// parallel edges) hold at the storage layer.
#[derive(Debug)]
pub struct SqliteDag<N> {
    pub(crate) conn: Connection,
    table: String,
    source_col: String,
    sink_col: String,
    pub(crate) qtable: String,
    pub(crate) qsource: String,
    pub(crate) qsink: String,
    sorts_started: Cell<u64>,
    node_type: PhantomData<N>,
}

impl<N> SqliteDag<N> {
    /// Wraps an open connection, creating the edge relation if it does not
    /// exist yet.
    ///
    /// Duplicate inserts are silently ignored by the relation's uniqueness
    /// constraint, which is what gives `add` its set semantics.
    pub fn new(
        conn: Connection,
        table: &str,
        source_col: &str,
        sink_col: &str,
    ) -> Result<Self, rusqlite::Error> {
        let dag = Self {
            conn,
            table: table.to_owned(),
            source_col: source_col.to_owned(),
            sink_col: sink_col.to_owned(),
            qtable: quote_ident(table),
            qsource: quote_ident(source_col),
            qsink: quote_ident(sink_col),
            sorts_started: Cell::new(0),
            node_type: PhantomData,
        };
        dag.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    {source} NOT NULL, {sink} NOT NULL,
                    UNIQUE ({source}, {sink}) ON CONFLICT IGNORE
                )",
                table = dag.qtable,
                source = dag.qsource,
                sink = dag.qsink,
            ),
            [],
        )?;
        Ok(dag)
    }

    /// Opens (or creates) a database file and wraps it via [`SqliteDag::new`].
    pub fn open<P: AsRef<Path>>(
        path: P,
        table: &str,
        source_col: &str,
        sink_col: &str,
    ) -> Result<Self, rusqlite::Error> {
        Self::new(Connection::open(path)?, table, source_col, sink_col)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The edge relation's table name, unquoted.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The source column name, unquoted.
    pub fn source_column(&self) -> &str {
        &self.source_col
    }

    /// The sink column name, unquoted.
    pub fn sink_column(&self) -> &str {
        &self.sink_col
    }

    /// Returns the number of edges in the relation.
    pub fn len(&self) -> Result<usize, rusqlite::Error> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.qtable),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Returns `true` if the relation contains no edges.
    pub fn is_empty(&self) -> Result<bool, rusqlite::Error> {
        Ok(self.len()? == 0)
    }

    /// Starts a forward topological sort against a point-in-time snapshot
    /// of the relation.
    ///
    /// The snapshot is taken here, into a working table private to this
    /// sort, so edges added or removed afterwards — including while the
    /// returned iterator is still being consumed — do not affect the
    /// ordering. Each invocation gets its own working table; overlapping
    /// sorts on one connection do not collide. Dropping the iterator
    /// discards the working table.
    pub fn sort_forward(&self) -> Result<SqliteTopsort<'_, N>, rusqlite::Error> {
        let id = self.sorts_started.get();
        self.sorts_started.set(id + 1);
        SqliteTopsort::new(self, id)
    }
}

impl<N: ToSql> SqliteDag<N> {
    /// Inserts the edge `source -> sink`; returns `true` if it was new.
    pub fn add(&self, source: &N, sink: &N) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
                self.qtable, self.qsource, self.qsink
            ),
            params![source, sink],
        )?;
        Ok(changed > 0)
    }

    /// Removes the edge `source -> sink`; returns `true` if it was present.
    pub fn remove(&self, source: &N, sink: &N) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                self.qtable, self.qsource, self.qsink
            ),
            params![source, sink],
        )?;
        Ok(changed > 0)
    }

    /// Returns `true` if the edge `source -> sink` is present.
    pub fn contains(&self, source: &N, sink: &N) -> Result<bool, rusqlite::Error> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2 LIMIT 1",
                    self.qtable, self.qsource, self.qsink
                ),
                params![source, sink],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl<N: FromSql + Eq + Hash> SqliteDag<N> {
    /// Returns every node in the relation: the union of both columns.
    pub fn nodes(&self) -> Result<HashSet<N>, rusqlite::Error> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {source} FROM {table} UNION SELECT {sink} FROM {table}",
            source = self.qsource,
            sink = self.qsink,
            table = self.qtable,
        ))?;
        let rows = statement.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Returns the full edge set.
    pub fn edges(&self) -> Result<HashSet<(N, N)>, rusqlite::Error> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {}, {} FROM {}",
            self.qsource, self.qsink, self.qtable
        ))?;
        let rows = statement.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
