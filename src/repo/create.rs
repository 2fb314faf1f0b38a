use serde_json::{Map, Value};
use tracing::debug;

use super::GraphRepository;
use crate::error::{RepoError, Result};
use crate::model::{Edge, Node, NodeId};
use crate::schema::{Direction, RelationRef};
use crate::view::NodeModel;

impl GraphRepository {
    /// Materialises a tree of create inputs into nodes and the edges linking
    /// them.
    ///
    /// The input is an object carrying a `kind` tag, value fields, and
    /// relation entries. A relation entry holds either nested create inputs
    /// (the related kind is injected) or node refs `{id}` linking to existing
    /// nodes. Children are created before the edges reaching them; there is
    /// no rollback, so a failure mid-tree leaves earlier inserts in place.
    pub fn create(&mut self, input: Value) -> Result<NodeModel<'_>> {
        let object = input
            .as_object()
            .ok_or_else(|| RepoError::validation("$", "create input object", &input))?;
        let id = self.create_node(object, None, "$")?;
        self.get_model(&id)
    }

    /// Maps [`create`](GraphRepository::create) over an array of inputs.
    /// Side effects follow array order, element by element.
    pub fn create_many(&mut self, inputs: Vec<Value>) -> Result<Vec<NodeModel<'_>>> {
        let mut ids = Vec::with_capacity(inputs.len());
        for (idx, input) in inputs.iter().enumerate() {
            let path = format!("$[{idx}]");
            let object = input
                .as_object()
                .ok_or_else(|| RepoError::validation(&path, "create input object", input))?;
            ids.push(self.create_node(object, None, &path)?);
        }
        ids.iter().map(|id| self.get_model(id)).collect()
    }

    fn create_node(
        &mut self,
        input: &Map<String, Value>,
        forced_kind: Option<&str>,
        path: &str,
    ) -> Result<NodeId> {
        let kind = self.resolve_kind(input, forced_kind, path)?;

        let mut node = Node::new(self.allocate_id(), kind.clone());
        let mut relation_entries = Vec::new();
        for (key, value) in input {
            if key == "kind" || key == "id" {
                continue;
            }
            if self.schema().has_relation(&kind, key) {
                relation_entries.push((key.clone(), value.clone()));
            } else {
                node.fields.insert(key.clone(), value.clone());
            }
        }
        let id = node.id.clone();
        self.insert_node(node);
        debug!(id = %id, kind = %kind, "created node");

        for (name, entry) in relation_entries {
            let rel = self
                .schema()
                .get_relation(&kind, &name)
                .ok_or_else(|| {
                    RepoError::validation(
                        format!("{path}.{name}"),
                        "declared relation name",
                        &Value::String(name.clone()),
                    )
                })?
                .parse()?;
            self.create_relation_entry(&id, &rel, &entry, &format!("{path}.{name}"))?;
        }

        Ok(id)
    }

    fn create_relation_entry(
        &mut self,
        node_id: &str,
        rel: &RelationRef,
        entry: &Value,
        path: &str,
    ) -> Result<()> {
        let elements: Vec<(&Value, String)> = match entry {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| (item, format!("{path}[{idx}]")))
                .collect(),
            other => vec![(other, path.to_string())],
        };

        for (element, element_path) in elements {
            let object = element.as_object().ok_or_else(|| {
                RepoError::validation(&element_path, "nested create input or node ref", element)
            })?;
            let related_id = if is_node_ref(object) {
                self.resolve_node_ref(object, rel, &element_path)?
            } else {
                self.create_node(object, Some(&rel.related_kind), &element_path)?
            };
            self.link(node_id, &related_id, rel);
        }
        Ok(())
    }

    /// A node ref is an object holding exactly one key, `id`.
    fn resolve_node_ref(
        &self,
        object: &Map<String, Value>,
        rel: &RelationRef,
        path: &str,
    ) -> Result<NodeId> {
        let id_value = &object["id"];
        let id = id_value
            .as_str()
            .ok_or_else(|| RepoError::validation(format!("{path}.id"), "id string", id_value))?;
        let Ok(node) = self.node(id) else {
            return Err(RepoError::validation(
                format!("{path}.id"),
                "reference to an existing node",
                id_value,
            ));
        };
        if node.kind != rel.related_kind {
            return Err(RepoError::validation(
                format!("{path}.id"),
                "node ref of the relation's related kind",
                id_value,
            ));
        }
        Ok(node.id.clone())
    }

    fn resolve_kind(
        &self,
        input: &Map<String, Value>,
        forced_kind: Option<&str>,
        path: &str,
    ) -> Result<String> {
        let declared = match input.get("kind") {
            Some(value) => Some(value.as_str().ok_or_else(|| {
                RepoError::validation(format!("{path}.kind"), "node kind string", value)
            })?),
            None => None,
        };
        match (forced_kind, declared) {
            (Some(forced), Some(declared)) if forced != declared => Err(RepoError::validation(
                format!("{path}.kind"),
                "the relation's related kind",
                &Value::String(declared.to_string()),
            )),
            (Some(forced), _) => Ok(forced.to_string()),
            (None, Some(declared)) => Ok(declared.to_string()),
            (None, None) => Err(RepoError::validation(
                format!("{path}.kind"),
                "node kind string",
                &Value::Object(input.clone()),
            )),
        }
    }

    /// Inserts the edge for one resolved relation target, endpoints oriented
    /// by the relation's direction.
    pub(crate) fn link(&mut self, node_id: &str, related_id: &str, rel: &RelationRef) {
        let kind = rel.edge_kind_or_empty();
        let edge = match rel.direction {
            Direction::Out => Edge::new(node_id, related_id, kind),
            Direction::In => Edge::new(related_id, node_id, kind),
        };
        self.insert_edge(edge);
    }
}

fn is_node_ref(object: &Map<String, Value>) -> bool {
    object.len() == 1 && object.contains_key("id")
}
