//! Fluent SQL string builder.
//!
//! ## Design
//!
//! - The builder is an append-only accumulator: every clause method formats
//!   one fragment and appends it to the in-progress text.
//! - Clause order is the caller's responsibility. Nothing is reordered,
//!   validated or removed; out-of-grammar call sequences produce out-of-grammar
//!   SQL.
//! - Values are interpolated as literals, not bound as parameters. They are
//!   **not escaped**: sanitize them first (see [`crate::sanitize`]).

mod format;
mod query;

pub use query::QueryBuilder;
