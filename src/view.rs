//! Lazy node-model views.
//!
//! A [`NodeModel`] wraps a stored node and exposes, next to its value fields,
//! one attribute per relation declared for the node's kind. Relation
//! attributes are recomputed against the edge store on every access, so a
//! view never observes a stale related-node list. Views are read-only and
//! borrow the repository: mutation requires exclusive access to the
//! repository, which ends every outstanding view first, and cyclic relation
//! graphs never materialise as owning cycles.

use serde_json::Value;

use crate::error::Result;
use crate::model::Node;
use crate::repo::GraphRepository;

/// One attribute of a node model.
#[derive(Debug)]
pub enum Attr<'a> {
    /// A value field, passed through from the record.
    Value(&'a Value),
    /// A relation attribute: the related nodes, wrapped as models.
    Models(Vec<NodeModel<'a>>),
    /// Neither a value field nor a declared relation.
    Absent,
}

/// A reflective, read-only view over a stored node.
#[derive(Debug, Clone, Copy)]
pub struct NodeModel<'a> {
    repo: &'a GraphRepository,
    node: &'a Node,
}

impl<'a> NodeModel<'a> {
    pub(crate) fn new(repo: &'a GraphRepository, node: &'a Node) -> Self {
        Self { repo, node }
    }

    /// The underlying node's id.
    pub fn id(&self) -> &'a str {
        &self.node.id
    }

    /// The underlying node's kind.
    pub fn kind(&self) -> &'a str {
        &self.node.kind
    }

    /// The underlying node record.
    pub fn record(&self) -> &'a Node {
        self.node
    }

    /// Reads a value field. Relation names are not value fields; use
    /// [`NodeModel::related`] or [`NodeModel::attr`] for those.
    pub fn value(&self, name: &str) -> Option<&'a Value> {
        self.node.fields.get(name)
    }

    /// Resolves a relation attribute, recomputing the related-node list from
    /// the current edge store. An undeclared relation name resolves to an
    /// empty list.
    pub fn related(&self, name: &str) -> Result<Vec<NodeModel<'a>>> {
        let related = self.repo.related_nodes(self.node, name)?;
        Ok(related
            .into_iter()
            .map(|node| NodeModel::new(self.repo, node))
            .collect())
    }

    /// Looks up an attribute by name. Relation names declared for the node's
    /// kind take precedence over value fields, mirroring the query
    /// partition; anything else that is not a value field is absent.
    pub fn attr(&self, name: &str) -> Result<Attr<'a>> {
        if self.repo.schema().has_relation(&self.node.kind, name) {
            return Ok(Attr::Models(self.related(name)?));
        }
        match self.node.fields.get(name) {
            Some(value) => Ok(Attr::Value(value)),
            None => Ok(Attr::Absent),
        }
    }

    /// The attribute names this view advertises: the node's value fields
    /// plus the relation names declared for its kind.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self.node.fields.keys().map(String::as_str).collect();
        if let Some(relations) = self.repo.schema().relations_for(&self.node.kind) {
            for name in relations.keys() {
                if !keys.contains(&name.as_str()) {
                    keys.push(name);
                }
            }
        }
        keys
    }
}
