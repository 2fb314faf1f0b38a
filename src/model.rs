//! Data models for graph entities.
//!
//! This module defines the core data structures used to represent nodes and
//! edges in a grafo repository.
//!
//! # Key Types
//!
//! - [`Node`] - A typed record with a kind tag and a bag of value fields
//! - [`Edge`] - A directed, typed link between two nodes
//! - [`NodeId`] - Opaque string identifier generated by the engine
//!
//! # Examples
//!
//! ```rust
//! use grafo::model::{Edge, Node};
//! use serde_json::json;
//!
//! let mut node = Node::new("1", "user");
//! node.fields.insert("username".into(), json!("steve"));
//!
//! let edge = Edge::new("1", "2", "is");
//! assert_eq!(edge.key(), "1::is::2");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque identifier for nodes. Generated by the engine as stringified
/// monotone integers; callers never synthesise ids.
pub type NodeId = String;

/// A node in the graph: an immutable id and kind plus any number of
/// kind-specific value fields.
///
/// The field bag is a JSON object so the repository can store whatever the
/// schema describes without a per-kind struct; validation happens at call
/// time against the schema's relations map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node. Immutable.
    pub id: NodeId,
    /// Category tag. Fixed for the node's lifetime.
    pub kind: String,
    /// Value fields as key-value pairs.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Node {
    /// Creates a new node with the given id and kind and no value fields.
    pub fn new(id: impl Into<NodeId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Looks up an attribute by name. `id` and `kind` resolve to the record's
    /// own tags; everything else resolves against the value fields.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "kind" => Some(Value::String(self.kind.clone())),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Projects the record as a JSON object `{id, kind, ...fields}`.
    pub fn to_value(&self) -> Value {
        let mut out = Map::with_capacity(self.fields.len() + 2);
        out.insert("id".into(), Value::String(self.id.clone()));
        out.insert("kind".into(), Value::String(self.kind.clone()));
        for (k, v) in &self.fields {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

/// A directed edge between two nodes, identified by the tuple
/// `(from, kind, to)`. Inserting the same tuple twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the source node.
    pub from: NodeId,
    /// Id of the target node.
    pub to: NodeId,
    /// Edge kind. Empty when the relation declares no edge kind.
    #[serde(default)]
    pub kind: String,
}

impl Edge {
    /// Creates a new edge between the given endpoints.
    pub fn new(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: kind.into(),
        }
    }

    /// Canonical edge id. The endpoints are the edge's declared source and
    /// target, independent of the direction it was traversed or created from.
    pub fn key(&self) -> String {
        edge_key(&self.from, &self.kind, &self.to)
    }
}

/// Formats the canonical edge id `{from}::{kind}::{to}`.
pub fn edge_key(from: &str, kind: &str, to: &str) -> String {
    format!("{from}::{kind}::{to}")
}
