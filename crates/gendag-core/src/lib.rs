#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cycle;
pub mod dag;
pub mod sort;
mod subgraph;

pub use cycle::CycleError;
pub use dag::Dag;
pub use sort::{Direction, Topsort};

/// Returns the current version of the gendag-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
