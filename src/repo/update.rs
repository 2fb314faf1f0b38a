use serde_json::{Map, Value};
use tracing::debug;

use super::GraphRepository;
use crate::error::{RepoError, Result};
use crate::model::{edge_key, NodeId};
use crate::query::selector::{NodeQuery, Selector};
use crate::schema::{Direction, RelationRef};
use crate::view::NodeModel;

impl GraphRepository {
    /// Patches every node the selector resolves to.
    ///
    /// Value fields shallow-merge over the stored record (`id` and `kind` in
    /// the patch are ignored). Relation fields hold `{add, remove}`
    /// directives whose elements are sub-queries against the related kind;
    /// `add` inserts edges idempotently, `remove` deletes them by canonical
    /// key. Directives resolving to no nodes are a no-op.
    pub fn update<S: Into<Selector>>(
        &mut self,
        selector: S,
        patch: Value,
    ) -> Result<Vec<NodeModel<'_>>> {
        let patch = patch
            .as_object()
            .ok_or_else(|| RepoError::validation("$", "patch object", &patch))?;
        let ids: Vec<NodeId> = self
            .find_nodes(&selector.into())?
            .into_iter()
            .map(|node| node.id.clone())
            .collect();

        for id in &ids {
            self.apply_patch(id, patch)?;
        }
        debug!(count = ids.len(), "updated nodes");
        ids.iter().map(|id| self.get_model(id)).collect()
    }

    fn apply_patch(&mut self, id: &NodeId, patch: &Map<String, Value>) -> Result<()> {
        let kind = self.node(id)?.kind.clone();

        for (key, value) in patch {
            if key == "id" || key == "kind" {
                continue;
            }
            if self.schema().has_relation(&kind, key) {
                let rel = self
                    .schema()
                    .get_relation(&kind, key)
                    .ok_or_else(|| {
                        RepoError::validation(
                            format!("$.{key}"),
                            "declared relation name",
                            &Value::String(key.clone()),
                        )
                    })?
                    .parse()?;
                self.apply_relation_directive(id, &rel, value, &format!("$.{key}"))?;
            } else {
                self.node_mut(id)?.fields.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// A relation patch entry is an object carrying `add` and/or `remove`
    /// lists of sub-queries. `add` runs before `remove`.
    fn apply_relation_directive(
        &mut self,
        id: &NodeId,
        rel: &RelationRef,
        directive: &Value,
        path: &str,
    ) -> Result<()> {
        let object = directive.as_object().ok_or_else(|| {
            RepoError::validation(path, "relation directive {add, remove}", directive)
        })?;
        for key in object.keys() {
            if key != "add" && key != "remove" {
                return Err(RepoError::validation(
                    format!("{path}.{key}"),
                    "'add' or 'remove' directive",
                    directive,
                ));
            }
        }

        if let Some(add) = object.get("add") {
            let targets = self.resolve_directive_targets(rel, add, &format!("{path}.add"))?;
            for target in targets {
                self.link(id, &target, rel);
            }
        }
        if let Some(remove) = object.get("remove") {
            let targets =
                self.resolve_directive_targets(rel, remove, &format!("{path}.remove"))?;
            let kind = rel.edge_kind_or_empty();
            for target in targets {
                let key = match rel.direction {
                    Direction::Out => edge_key(id, kind, &target),
                    Direction::In => edge_key(&target, kind, id),
                };
                self.remove_edge(&key);
            }
        }
        Ok(())
    }

    /// Normalises a directive to a list of partial sub-queries, injects the
    /// related kind, and resolves each through the query engine.
    fn resolve_directive_targets(
        &self,
        rel: &RelationRef,
        directive: &Value,
        path: &str,
    ) -> Result<Vec<NodeId>> {
        let elements: Vec<(&Value, String)> = match directive {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| (item, format!("{path}[{idx}]")))
                .collect(),
            other => vec![(other, path.to_string())],
        };

        let mut targets = Vec::new();
        for (element, element_path) in elements {
            let fields = element.as_object().ok_or_else(|| {
                RepoError::validation(&element_path, "node sub-query object", element)
            })?;
            if let Some(declared) = fields.get("kind") {
                if declared.as_str() != Some(rel.related_kind.as_str()) {
                    return Err(RepoError::validation(
                        format!("{element_path}.kind"),
                        "the relation's related kind",
                        declared,
                    ));
                }
            }
            let mut fields = fields.clone();
            fields.remove("kind");
            let query = NodeQuery {
                kind: rel.related_kind.clone(),
                fields,
            };
            let resolved = self.find_nodes(&Selector::Query(query))?;
            targets.extend(resolved.into_iter().map(|node| node.id.clone()));
        }
        Ok(targets)
    }
}
