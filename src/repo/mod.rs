//! The graph repository engine.
//!
//! [`GraphRepository`] owns the node and edge stores, the id counter, and the
//! schema, and exposes the nested create / find / update / delete operations.
//! Each operation family lives in its own file; this module holds the struct,
//! the constructors, and the small shared surface they build on.

mod config;
mod create;
mod delete;
mod find;
mod traversal;
mod update;

#[cfg(test)]
mod tests;

pub use config::RepoOptions;

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde_json::Value;
use tracing::debug;

use crate::error::{RepoError, Result};
use crate::model::{Edge, Node, NodeId};
use crate::schema::{GraphSnapshot, Schema};
use crate::view::NodeModel;

/// Insertion-ordered map with the fast non-cryptographic hasher.
pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// In-memory, schema-driven graph repository.
///
/// The repository runs as a single logical actor: mutation goes through
/// `&mut self`, and the [`NodeModel`] views handed back by operations borrow
/// the repository immutably, so no mutation can interleave with view reads.
///
/// # Examples
///
/// ```rust
/// use grafo::{GraphRepository, GraphSnapshot};
/// use serde_json::json;
///
/// let snapshot: GraphSnapshot = serde_json::from_value(json!({
///     "relations": {
///         "user": {"authors": {"to": "author", "edge_kind": "is"}},
///         "author": {"users": {"from": "user", "edge_kind": "is"}},
///     },
/// })).expect("well-formed snapshot");
/// let mut repo = GraphRepository::from_snapshot(snapshot)?;
///
/// let id = repo
///     .create(json!({"kind": "user", "username": "steve", "authors": {"name": "Steve O"}}))?
///     .id()
///     .to_string();
/// let user = repo.find_by_id(&id)?;
/// assert_eq!(user.related("authors")?.len(), 1);
/// # Ok::<(), grafo::RepoError>(())
/// ```
#[derive(Debug)]
pub struct GraphRepository {
    schema: Schema,
    nodes: FxIndexMap<NodeId, Node>,
    edges: FxIndexMap<String, Edge>,
    next_id: u64,
    options: RepoOptions,
}

impl Default for GraphRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphRepository {
    /// Creates an empty repository with an empty relations map.
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
            nodes: FxIndexMap::default(),
            edges: FxIndexMap::default(),
            next_id: 1,
            options: RepoOptions::default(),
        }
    }

    /// Creates an empty repository over the given schema.
    pub fn with_schema(schema: Schema) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            schema,
            ..Self::new()
        })
    }

    /// Loads an initial snapshot: relations, then nodes, then edges. Snapshot
    /// ids are taken verbatim; edge endpoints must reference snapshot nodes.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        Self::from_snapshot_with_options(snapshot, RepoOptions::default())
    }

    /// [`GraphRepository::from_snapshot`] with explicit options.
    pub fn from_snapshot_with_options(
        snapshot: GraphSnapshot,
        options: RepoOptions,
    ) -> Result<Self> {
        let mut repo = Self::with_schema(Schema::new(snapshot.relations))?;
        repo.options = options;

        for node in snapshot.nodes {
            if node.id.is_empty() {
                return Err(RepoError::validation(
                    "nodes",
                    "non-empty node id",
                    &node.to_value(),
                ));
            }
            if repo.nodes.contains_key(&node.id) {
                return Err(RepoError::validation(
                    "nodes",
                    "unique node id",
                    &Value::String(node.id),
                ));
            }
            repo.nodes.insert(node.id.clone(), node);
        }
        for edge in snapshot.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !repo.nodes.contains_key(endpoint) {
                    return Err(RepoError::validation(
                        "edges",
                        "edge endpoints referencing snapshot nodes",
                        &Value::String(edge.key()),
                    ));
                }
            }
            repo.edges.insert(edge.key(), edge);
        }

        debug!(
            nodes = repo.nodes.len(),
            edges = repo.edges.len(),
            "loaded snapshot"
        );
        Ok(repo)
    }

    /// The schema registry this repository resolves relations against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of stored nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the repository holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node record, failing with `NotFound` for unknown ids.
    pub fn node(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| RepoError::not_found("node", id))
    }

    /// Whether a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterates node records in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates edge records in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Wraps a stored node in its lazy model view.
    pub fn get_model(&self, id: &str) -> Result<NodeModel<'_>> {
        Ok(NodeModel::new(self, self.node(id)?))
    }

    pub(crate) fn options(&self) -> &RepoOptions {
        &self.options
    }

    /// Allocates the next node id, skipping any id the store already holds
    /// (snapshot-loaded ids can collide with the counter).
    pub(crate) fn allocate_id(&mut self) -> NodeId {
        loop {
            let id = self.next_id.to_string();
            self.next_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Inserts an edge, idempotently: the canonical key `(from, kind, to)`
    /// already present leaves the store unchanged.
    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.edges.entry(edge.key()).or_insert(edge);
    }

    /// Removes an edge by its canonical key. Missing edges are a no-op.
    pub(crate) fn remove_edge(&mut self, key: &str) {
        self.edges.shift_remove(key);
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| RepoError::not_found("node", id))
    }

    pub(crate) fn take_node(&mut self, id: &str) -> Option<Node> {
        self.nodes.shift_remove(id)
    }
}
