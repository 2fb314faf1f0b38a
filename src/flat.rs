//! Flat entity repository.
//!
//! A thin collaborator next to the graph core: an id-keyed store of plain
//! entities with the same id / id-list / query / query-list selectors, whose
//! query fields use the shared value-operator vocabulary of
//! [`match_value`](crate::query::match_value). There is no schema and no
//! relation traversal; every query entry is a value field.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RepoError, Result};
use crate::query::matcher::match_value;
use crate::repo::FxIndexMap;

/// A stored entity: a JSON object carrying its `id`.
pub type Entity = Map<String, Value>;

/// Tunable behaviour for an [`EntityRepository`].
#[derive(Debug, Clone)]
pub struct EntityRepositoryOptions {
    /// Reject `create` inputs whose explicit id is already present with
    /// `AlreadyExists`. When off, the insert replaces the stored entity.
    pub error_on_duplicate_id: bool,
}

impl Default for EntityRepositoryOptions {
    fn default() -> Self {
        Self {
            error_on_duplicate_id: true,
        }
    }
}

/// In-memory id-keyed entity store with value-operator queries.
#[derive(Debug)]
pub struct EntityRepository {
    entities: FxIndexMap<String, Entity>,
    next_id: u64,
    options: EntityRepositoryOptions,
}

impl Default for EntityRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRepository {
    /// Creates an empty repository with default options.
    pub fn new() -> Self {
        Self {
            entities: FxIndexMap::default(),
            next_id: 1,
            options: EntityRepositoryOptions::default(),
        }
    }

    /// Creates an empty repository with explicit options.
    pub fn with_options(options: EntityRepositoryOptions) -> Self {
        Self {
            options,
            ..Self::new()
        }
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Inserts an entity. Inputs without an `id` get a generated one
    /// (stringified monotone counter); an explicit duplicate id fails with
    /// `AlreadyExists` unless the repository is configured to replace.
    pub fn create(&mut self, input: Value) -> Result<Entity> {
        let mut entity = input
            .as_object()
            .cloned()
            .ok_or_else(|| RepoError::validation("$", "entity object", &input))?;

        let id = match entity.get("id") {
            Some(value) => {
                let id = value
                    .as_str()
                    .ok_or_else(|| RepoError::validation("$.id", "id string", value))?
                    .to_string();
                if self.options.error_on_duplicate_id && self.entities.contains_key(&id) {
                    return Err(RepoError::AlreadyExists(id));
                }
                id
            }
            None => self.allocate_id(),
        };
        entity.insert("id".into(), Value::String(id.clone()));
        self.entities.insert(id.clone(), entity.clone());
        debug!(id = %id, "created entity");
        Ok(entity)
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &str) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| RepoError::not_found("entity", id))
    }

    /// Resolves a selector (id, id list, query, or query list) to entities.
    /// A query is `{field: valueQueryField, ...}`, all entries conjoined; a
    /// query list is a disjunction, concatenated per branch.
    pub fn find(&self, selector: &Value) -> Result<Vec<Entity>> {
        Ok(self.resolve(selector)?.into_iter().cloned().collect())
    }

    /// Shallow-merges a patch over every selected entity. `id` in the patch
    /// is ignored.
    pub fn update(&mut self, selector: &Value, patch: &Value) -> Result<Vec<Entity>> {
        let patch = patch
            .as_object()
            .ok_or_else(|| RepoError::validation("$", "patch object", patch))?;
        let ids: Vec<String> = self
            .resolve(selector)?
            .into_iter()
            .map(|entity| entity_id(entity))
            .collect();

        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let entity = self
                .entities
                .get_mut(&id)
                .ok_or_else(|| RepoError::not_found("entity", &id))?;
            for (key, value) in patch {
                if key == "id" {
                    continue;
                }
                entity.insert(key.clone(), value.clone());
            }
            updated.push(entity.clone());
        }
        Ok(updated)
    }

    /// Removes every selected entity and returns the removed records.
    pub fn delete(&mut self, selector: &Value) -> Result<Vec<Entity>> {
        let ids: Vec<String> = self
            .resolve(selector)?
            .into_iter()
            .map(|entity| entity_id(entity))
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.entities.shift_remove(&id) {
                removed.push(entity);
            }
        }
        debug!(count = removed.len(), "deleted entities");
        Ok(removed)
    }

    fn resolve(&self, selector: &Value) -> Result<Vec<&Entity>> {
        match selector {
            Value::String(id) => Ok(vec![self.get(id)?]),
            Value::Object(query) => self.find_by_query(query),
            Value::Array(items) => match items.first() {
                None => Ok(Vec::new()),
                Some(Value::String(_)) => {
                    let mut found = Vec::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        let id = item.as_str().ok_or_else(|| {
                            RepoError::validation(format!("$[{idx}]"), "id string", item)
                        })?;
                        found.push(self.get(id)?);
                    }
                    Ok(found)
                }
                Some(Value::Object(_)) => {
                    let mut found = Vec::new();
                    for (idx, item) in items.iter().enumerate() {
                        let query = item.as_object().ok_or_else(|| {
                            RepoError::validation(format!("$[{idx}]"), "query object", item)
                        })?;
                        found.extend(self.find_by_query(query)?);
                    }
                    Ok(found)
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

    fn find_by_query(&self, query: &Map<String, Value>) -> Result<Vec<&Entity>> {
        let mut matched = Vec::new();
        for entity in self.entities.values() {
            if matches_entity(entity, query)? {
                matched.push(entity);
            }
        }
        Ok(matched)
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = self.next_id.to_string();
            self.next_id += 1;
            if !self.entities.contains_key(&id) {
                return id;
            }
        }
    }
}

fn matches_entity(entity: &Entity, query: &Map<String, Value>) -> Result<bool> {
    for (key, query_field) in query {
        if !match_value(entity.get(key), query_field, key)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn entity_id(entity: &Entity) -> String {
    entity
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_generates_monotone_string_ids() {
        let mut repo = EntityRepository::new();
        let first = repo.create(json!({"name": "a"})).expect("create");
        let second = repo.create(json!({"name": "b"})).expect("create");
        assert_eq!(first.get("id"), Some(&json!("1")));
        assert_eq!(second.get("id"), Some(&json!("2")));
    }

    #[test]
    fn duplicate_explicit_id_is_rejected_by_default() {
        let mut repo = EntityRepository::new();
        repo.create(json!({"id": "x", "name": "a"})).expect("create");
        let err = repo.create(json!({"id": "x", "name": "b"})).unwrap_err();
        assert_eq!(err, RepoError::AlreadyExists("x".into()));

        let mut relaxed = EntityRepository::with_options(EntityRepositoryOptions {
            error_on_duplicate_id: false,
        });
        relaxed.create(json!({"id": "x", "name": "a"})).expect("create");
        let replaced = relaxed
            .create(json!({"id": "x", "name": "b"}))
            .expect("replacement insert");
        assert_eq!(replaced.get("name"), Some(&json!("b")));
        assert_eq!(relaxed.len(), 1);
    }

    #[test]
    fn find_supports_all_selector_shapes() {
        let mut repo = EntityRepository::new();
        repo.create(json!({"name": "alice", "age": 30})).expect("create");
        repo.create(json!({"name": "bob", "age": 41})).expect("create");

        assert_eq!(repo.find(&json!("1")).expect("by id").len(), 1);
        assert_eq!(repo.find(&json!(["1", "2"])).expect("by ids").len(), 2);
        assert_eq!(
            repo.find(&json!({"age": {"gt": 35}})).expect("by query").len(),
            1
        );
        let disjunction = repo
            .find(&json!([{"name": "alice"}, {"age": {"gt": 35}}]))
            .expect("by queries");
        assert_eq!(disjunction.len(), 2);
        assert!(repo.find(&json!("9")).is_err());
    }

    #[test]
    fn update_merges_shallow_and_keeps_id() {
        let mut repo = EntityRepository::new();
        repo.create(json!({"name": "alice", "age": 30})).expect("create");
        let updated = repo
            .update(&json!("1"), &json!({"age": 31, "id": "evil"}))
            .expect("update");
        assert_eq!(updated[0].get("age"), Some(&json!(31)));
        assert_eq!(updated[0].get("id"), Some(&json!("1")));
        assert_eq!(updated[0].get("name"), Some(&json!("alice")));
    }

    #[test]
    fn delete_returns_removed_entities() {
        let mut repo = EntityRepository::new();
        repo.create(json!({"name": "alice"})).expect("create");
        repo.create(json!({"name": "bob"})).expect("create");
        let removed = repo.delete(&json!({"name": "alice"})).expect("delete");
        assert_eq!(removed.len(), 1);
        assert_eq!(repo.len(), 1);
    }
}
