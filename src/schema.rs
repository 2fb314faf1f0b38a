//! Schema model: named relations between node kinds and the read-only
//! registry the engines resolve them against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{RepoError, Result};
use crate::model::{Edge, Node};

/// Traversal direction from the perspective of the source node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The source node's edges go outbound to the related kind (`to`).
    Out,
    /// The source node is reached by inbound edges from the related kind
    /// (`from`).
    In,
}

/// A schema entry associating a relation name on a source node kind with a
/// related kind and a traversal direction, optionally constrained to a
/// particular edge kind.
///
/// Exactly one of `from`/`to` must be present; `to` declares an outbound
/// relation, `from` an inbound one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Related kind reached by inbound edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Related kind reached by outbound edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Edge kind constraint. When absent, edges are created with an empty
    /// kind and traversal accepts any edge kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_kind: Option<String>,
}

impl Relation {
    /// Declares an outbound relation to `kind`.
    pub fn outbound(kind: impl Into<String>) -> Self {
        Self {
            from: None,
            to: Some(kind.into()),
            edge_kind: None,
        }
    }

    /// Declares an inbound relation from `kind`.
    pub fn inbound(kind: impl Into<String>) -> Self {
        Self {
            from: Some(kind.into()),
            to: None,
            edge_kind: None,
        }
    }

    /// Constrains the relation to a particular edge kind.
    pub fn with_edge_kind(mut self, kind: impl Into<String>) -> Self {
        self.edge_kind = Some(kind.into());
        self
    }

    /// Resolves the declared direction and related kind. Fails with
    /// `Validation` unless exactly one of `from`/`to` is present.
    pub fn parse(&self) -> Result<RelationRef> {
        match (&self.from, &self.to) {
            (None, Some(kind)) => Ok(RelationRef {
                direction: Direction::Out,
                related_kind: kind.clone(),
                edge_kind: self.edge_kind.clone(),
            }),
            (Some(kind), None) => Ok(RelationRef {
                direction: Direction::In,
                related_kind: kind.clone(),
                edge_kind: self.edge_kind.clone(),
            }),
            _ => Err(RepoError::validation(
                "relation",
                "exactly one of 'from' or 'to'",
                &json!({"from": self.from, "to": self.to}),
            )),
        }
    }
}

/// A parsed [`Relation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRef {
    /// Traversal direction from the source node.
    pub direction: Direction,
    /// Kind of the related nodes.
    pub related_kind: String,
    /// Edge kind constraint, if any.
    pub edge_kind: Option<String>,
}

impl RelationRef {
    /// The edge kind written on edges this relation creates. Empty when the
    /// schema declares none.
    pub fn edge_kind_or_empty(&self) -> &str {
        self.edge_kind.as_deref().unwrap_or("")
    }
}

/// Relations declared for one node kind, keyed by relation name.
pub type RelationMap = BTreeMap<String, Relation>;

/// Read-only accessor over the two-level relations map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    relations: BTreeMap<String, RelationMap>,
}

impl Schema {
    /// Wraps a relations map. Use [`Schema::validate`] (or the repository
    /// constructors, which call it) to check every entry parses.
    pub fn new(relations: BTreeMap<String, RelationMap>) -> Self {
        Self { relations }
    }

    /// Returns the relations declared for `kind`, if any.
    pub fn relations_for(&self, kind: &str) -> Option<&RelationMap> {
        self.relations.get(kind)
    }

    /// Resolves `(kind, name)` to its relation entry.
    pub fn get_relation(&self, kind: &str, name: &str) -> Option<&Relation> {
        self.relations.get(kind).and_then(|rels| rels.get(name))
    }

    /// Whether `name` is a declared relation for `kind`. This is the
    /// partition test splitting query/create/patch entries into value fields
    /// and relation fields.
    pub fn has_relation(&self, kind: &str, name: &str) -> bool {
        self.get_relation(kind, name).is_some()
    }

    /// Checks that every relation entry declares exactly one direction.
    pub fn validate(&self) -> Result<()> {
        for rels in self.relations.values() {
            for rel in rels.values() {
                rel.parse()?;
            }
        }
        Ok(())
    }
}

/// Initial state accepted by the repository constructor: a set of nodes and
/// edges to load plus the relations map. Consumed once; the repository never
/// emits this form back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes to load verbatim (ids included).
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges to load. Endpoints must reference snapshot nodes.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Relations map, keyed by source node kind then relation name.
    #[serde(default)]
    pub relations: BTreeMap<String, RelationMap>,
}
