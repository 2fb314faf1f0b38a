//! Query input shapes and matching.
//!
//! The matcher decides whether a stored node satisfies a query document,
//! recursing into relation sub-queries via the repository's traversal. The
//! selector module parses the polymorphic id / id-list / query / query-list
//! inputs accepted by `find`, `update` and `delete`.

/// Value-operator evaluation and node-query matching.
pub mod matcher;

/// Polymorphic selector shapes and their dispatch rules.
pub mod selector;

pub use matcher::match_value;
pub use selector::{NodeQuery, Selector};
