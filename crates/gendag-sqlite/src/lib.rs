/// SQLite-backed edge storage for the gendag sorter.
///
/// This crate keeps a [`gendag_core::Dag`]-shaped edge set in a relational
/// table and recomputes the generational topological order with repeated
/// set-difference queries instead of in-memory set operations. Grouping,
/// intra-generation order irrelevance, and cycle detection are observably
/// identical to the in-memory engine; the cycle report is the shared
/// [`gendag_core::CycleError`]. The `rusqlite` dependency is confined to
/// this crate and does not bleed into `gendag-core`.
///
/// # Snapshots
///
/// Each sort invocation copies the relation into a private working table
/// and peels that, so a sort never observes edges added or removed by
/// other writers on the connection mid-traversal.
pub mod dag;
pub mod error;
pub mod sort;

pub use dag::SqliteDag;
pub use error::SortError;
pub use sort::SqliteTopsort;
