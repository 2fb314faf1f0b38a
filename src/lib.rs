//! # Grafo - Schema-Driven In-Memory Graph Repository
//!
//! Grafo stores typed nodes and directed edges entirely in memory and lets a
//! caller declare, up front, the named relations between node kinds. The
//! repository then accepts nested create / find / update / delete operations
//! that traverse those relations, and hands back lazy "node model" views
//! whose relation attributes are resolved against the current edge set on
//! every access.
//!
//! ## Quick Start
//!
//! ```rust
//! use grafo::{GraphRepository, GraphSnapshot};
//! use serde_json::json;
//!
//! let snapshot: GraphSnapshot = serde_json::from_value(json!({
//!     "relations": {
//!         "user": {"authors": {"to": "author", "edge_kind": "is"}},
//!         "author": {"users": {"from": "user", "edge_kind": "is"}},
//!     },
//! })).expect("well-formed snapshot");
//! let mut repo = GraphRepository::from_snapshot(snapshot)?;
//!
//! // Nested create: the author node and the linking edge come along.
//! let user = repo.create(json!({
//!     "kind": "user",
//!     "username": "steve",
//!     "authors": {"name": "Steve O"},
//! }))?;
//! let authors = user.related("authors")?;
//! assert_eq!(authors.len(), 1);
//!
//! // The reciprocal relation resolves back to the user.
//! let users = authors[0].related("users")?;
//! assert_eq!(users[0].id(), user.id());
//! # Ok::<(), grafo::RepoError>(())
//! ```
//!
//! ## Design
//!
//! - **Schema-driven**: every operation input is partitioned into value
//!   fields and relation fields against the schema's relations map, at call
//!   time.
//! - **Single logical actor**: mutation goes through `&mut self`; node-model
//!   views borrow the repository immutably, so reads never observe a
//!   half-applied mutation and cyclic relation graphs cannot form owning
//!   cycles.
//! - **No persistence**: the snapshot accepted by the constructor is the
//!   sole serialized form, and it is only consumed, never emitted.

pub mod error;
pub mod flat;
pub mod model;
pub mod query;
pub mod repo;
pub mod schema;
pub mod view;

// Re-export the main public API
pub use crate::error::{RepoError, Result};
pub use crate::flat::{Entity, EntityRepository, EntityRepositoryOptions};
pub use crate::model::{edge_key, Edge, Node, NodeId};
pub use crate::query::{match_value, NodeQuery, Selector};
pub use crate::repo::{GraphRepository, RepoOptions};
pub use crate::schema::{Direction, GraphSnapshot, Relation, RelationMap, RelationRef, Schema};
pub use crate::view::{Attr, NodeModel};
