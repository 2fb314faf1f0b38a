//! Polymorphic selector inputs.
//!
//! `find`, `update` and `delete` accept a single id, an id list, a query, or
//! a list of queries. [`Selector`] is the tagged-variant rendition of that
//! polymorphism; [`Selector::parse`] applies the shape rules to a raw JSON
//! document.

use serde_json::{Map, Value};

use crate::error::{RepoError, Result};
use crate::model::NodeId;

/// A query object: a `kind` tag plus value-field predicates and
/// relation-field sub-queries.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    /// Node kind the query ranges over.
    pub kind: String,
    /// Remaining query entries, partitioned into value and relation fields
    /// at match time against the kind's declared relations.
    pub fields: Map<String, Value>,
}

impl NodeQuery {
    /// Builds a query over `kind` with no field predicates.
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Adds a field predicate.
    pub fn field(mut self, name: impl Into<String>, query: Value) -> Self {
        self.fields.insert(name.into(), query);
        self
    }

    /// Parses a query document: an object carrying a string `kind` tag. The
    /// tag is lifted out of the field map.
    pub fn parse(value: &Value, path: &str) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RepoError::validation(path, "query object", value))?;
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RepoError::validation(format!("{path}.kind"), "node kind string", value)
            })?
            .to_string();
        let mut fields = object.clone();
        fields.remove("kind");
        Ok(Self { kind, fields })
    }
}

/// The polymorphic first argument to `find`/`update`/`delete`.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// A single node id.
    Id(NodeId),
    /// A list of node ids, resolved in order.
    Ids(Vec<NodeId>),
    /// A single query.
    Query(NodeQuery),
    /// A disjunction of queries; results concatenate per branch.
    Queries(Vec<NodeQuery>),
}

impl Selector {
    /// Applies the dispatch shape rules to a raw document:
    ///
    /// - a string is a single id;
    /// - a list whose first element is a string (or an empty list) is an id
    ///   list;
    /// - a list of objects is a query disjunction;
    /// - an object is a single query.
    ///
    /// Anything else, including mixed lists, fails with `Validation`.
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::String(id) => Ok(Selector::Id(id.clone())),
            Value::Object(_) => Ok(Selector::Query(NodeQuery::parse(value, "$")?)),
            Value::Array(items) => match items.first() {
                None => Ok(Selector::Ids(Vec::new())),
                Some(Value::String(_)) => {
                    let mut ids = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        let id = item.as_str().ok_or_else(|| {
                            RepoError::validation(format!("$[{idx}]"), "id string", item)
                        })?;
                        ids.push(id.to_string());
                    }
                    Ok(Selector::Ids(ids))
                }
                Some(Value::Object(_)) => {
                    let mut queries = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        queries.push(NodeQuery::parse(item, &format!("$[{idx}]"))?);
                    }
                    Ok(Selector::Queries(queries))
                }
                Some(other) => Err(RepoError::validation(
                    "$[0]",
                    "id string or query object",
                    other,
                )),
            },
            other => Err(RepoError::validation(
                "$",
                "id, id list, query, or query list",
                other,
            )),
        }
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<Vec<String>> for Selector {
    fn from(ids: Vec<String>) -> Self {
        Selector::Ids(ids)
    }
}

impl From<&[&str]> for Selector {
    fn from(ids: &[&str]) -> Self {
        Selector::Ids(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl From<NodeQuery> for Selector {
    fn from(query: NodeQuery) -> Self {
        Selector::Query(query)
    }
}

impl From<Vec<NodeQuery>> for Selector {
    fn from(queries: Vec<NodeQuery>) -> Self {
        Selector::Queries(queries)
    }
}
