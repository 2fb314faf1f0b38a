use super::*;
use crate::schema::Relation;
use serde_json::json;
use std::collections::BTreeMap;

fn library_schema() -> Schema {
    let mut relations = BTreeMap::new();

    let mut user = BTreeMap::new();
    user.insert(
        "authors".to_string(),
        Relation::outbound("author").with_edge_kind("is"),
    );
    relations.insert("user".to_string(), user);

    let mut author = BTreeMap::new();
    author.insert(
        "users".to_string(),
        Relation::inbound("user").with_edge_kind("is"),
    );
    author.insert(
        "documents".to_string(),
        Relation::outbound("document").with_edge_kind("owns"),
    );
    relations.insert("author".to_string(), author);

    let mut document = BTreeMap::new();
    document.insert(
        "authors".to_string(),
        Relation::inbound("author").with_edge_kind("owns"),
    );
    relations.insert("document".to_string(), document);

    Schema::new(relations)
}

fn empty_repo() -> GraphRepository {
    GraphRepository::with_schema(library_schema()).expect("valid schema")
}

#[test]
fn create_allocates_monotone_string_ids() {
    let mut repo = empty_repo();
    let first = repo
        .create(json!({"kind": "user", "username": "a"}))
        .expect("create")
        .id()
        .to_string();
    let second = repo
        .create(json!({"kind": "user", "username": "b"}))
        .expect("create")
        .id()
        .to_string();
    assert_eq!(first, "1");
    assert_eq!(second, "2");
}

#[test]
fn create_stores_value_fields_verbatim() {
    let mut repo = empty_repo();
    let id = repo
        .create(json!({"kind": "user", "username": "steve", "logins": 3}))
        .expect("create")
        .id()
        .to_string();
    let node = repo.node(&id).expect("node");
    assert_eq!(node.kind, "user");
    assert_eq!(node.fields.get("username"), Some(&json!("steve")));
    assert_eq!(node.fields.get("logins"), Some(&json!(3)));
}

#[test]
fn create_orients_edges_by_relation_direction() {
    let mut repo = empty_repo();
    // outbound: user --is--> author
    let user_id = repo
        .create(json!({"kind": "user", "authors": {"name": "S"}}))
        .expect("create")
        .id()
        .to_string();
    let edge = repo.edges().next().expect("one edge").clone();
    assert_eq!(edge.from, user_id);
    assert_eq!(edge.kind, "is");

    // inbound: author <--owns-- is declared from document's perspective,
    // so creating a document with an authors entry links author -> document
    let doc = repo
        .create(json!({"kind": "document", "title": "W", "authors": {"name": "T"}}))
        .expect("create");
    let doc_id = doc.id().to_string();
    let owns = repo
        .edges()
        .find(|e| e.kind == "owns")
        .expect("owns edge")
        .clone();
    assert_eq!(owns.to, doc_id);
}

#[test]
fn create_links_node_refs_instead_of_creating() {
    let mut repo = empty_repo();
    let author_id = repo
        .create(json!({"kind": "author", "name": "S"}))
        .expect("create")
        .id()
        .to_string();
    repo.create(json!({"kind": "user", "authors": {"id": author_id}}))
        .expect("create with ref");
    assert_eq!(repo.node_count(), 2);
    assert_eq!(repo.edge_count(), 1);
}

#[test]
fn create_rejects_bad_node_refs() {
    let mut repo = empty_repo();
    let doc_id = repo
        .create(json!({"kind": "document", "title": "W"}))
        .expect("create")
        .id()
        .to_string();

    let dangling = repo
        .create(json!({"kind": "user", "authors": {"id": "99"}}))
        .unwrap_err();
    assert_eq!(dangling.code(), "Validation");

    let wrong_kind = repo
        .create(json!({"kind": "user", "authors": {"id": doc_id}}))
        .unwrap_err();
    assert_eq!(wrong_kind.code(), "Validation");
}

#[test]
fn create_rejects_conflicting_nested_kind() {
    let mut repo = empty_repo();
    let err = repo
        .create(json!({"kind": "user", "authors": {"kind": "document", "title": "W"}}))
        .unwrap_err();
    assert_eq!(err.code(), "Validation");
}

#[test]
fn create_ignores_caller_supplied_id() {
    let mut repo = empty_repo();
    let model = repo
        .create(json!({"kind": "user", "id": "custom", "username": "u"}))
        .expect("create");
    assert_eq!(model.id(), "1");
    assert!(model.value("id").is_none());
}

#[test]
fn create_many_processes_in_input_order() {
    let mut repo = empty_repo();
    let models = repo
        .create_many(vec![
            json!({"kind": "user", "username": "a"}),
            json!({"kind": "user", "username": "b"}),
        ])
        .expect("create many");
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id(), "1");
    assert_eq!(models[1].id(), "2");
}

#[test]
fn duplicate_edges_are_idempotent() {
    let mut repo = empty_repo();
    let author_id = repo
        .create(json!({"kind": "author", "name": "S"}))
        .expect("create")
        .id()
        .to_string();
    repo.create(json!({
        "kind": "user",
        "authors": [{"id": author_id}, {"id": author_id}],
    }))
    .expect("create");
    assert_eq!(repo.edge_count(), 1);
}

#[test]
fn update_merges_value_fields_and_protects_tags() {
    let mut repo = empty_repo();
    let id = repo
        .create(json!({"kind": "user", "username": "steve", "logins": 3}))
        .expect("create")
        .id()
        .to_string();
    let updated = repo
        .update(
            id.as_str(),
            json!({"username": "steve2", "id": "evil", "kind": "document"}),
        )
        .expect("update");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].value("username"), Some(&json!("steve2")));
    assert_eq!(updated[0].value("logins"), Some(&json!(3)));

    let node = repo.node(&id).expect("node");
    assert_eq!(node.id, id);
    assert_eq!(node.kind, "user");
}

#[test]
fn update_add_and_remove_edit_the_edge_set() {
    let mut repo = empty_repo();
    let author_id = repo
        .create(json!({"kind": "author", "name": "S", "documents": [{"title": "a"}, {"title": "b"}]}))
        .expect("create")
        .id()
        .to_string();
    let docs = repo
        .get_related_nodes(&author_id, "documents")
        .expect("docs");
    let (a, b) = (docs[0].id.clone(), docs[1].id.clone());

    repo.update(
        author_id.as_str(),
        json!({"documents": {"remove": {"id": a}}}),
    )
    .expect("remove");
    let docs = repo
        .get_related_nodes(&author_id, "documents")
        .expect("docs");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, b);

    // re-running an add twice leaves a single edge
    for _ in 0..2 {
        repo.update(
            author_id.as_str(),
            json!({"documents": {"add": {"title": "a"}}}),
        )
        .expect("add");
    }
    assert_eq!(
        repo.get_related_nodes(&author_id, "documents")
            .expect("docs")
            .len(),
        2
    );
}

#[test]
fn update_rejects_unknown_directive_keys() {
    let mut repo = empty_repo();
    let id = repo
        .create(json!({"kind": "author", "name": "S"}))
        .expect("create")
        .id()
        .to_string();
    let err = repo
        .update(id.as_str(), json!({"documents": {"attach": {"title": "a"}}}))
        .unwrap_err();
    assert_eq!(err.code(), "Validation");
}

#[test]
fn delete_cascades_incident_edges() {
    let mut repo = empty_repo();
    let user_id = repo
        .create(json!({"kind": "user", "authors": {"name": "S"}}))
        .expect("create")
        .id()
        .to_string();
    let author_id = repo
        .get_related_nodes(&user_id, "authors")
        .expect("authors")[0]
        .id
        .clone();

    let removed = repo.delete(author_id.as_str()).expect("delete");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kind, "author");
    assert_eq!(repo.edge_count(), 0);
    assert!(repo.node(&user_id).is_ok());
    assert!(repo.node(&author_id).is_err());
}

#[test]
fn snapshot_rejects_duplicate_ids_and_dangling_edges() {
    let snapshot: GraphSnapshot = serde_json::from_value(json!({
        "nodes": [{"id": "a", "kind": "user"}, {"id": "a", "kind": "user"}],
    }))
    .expect("snapshot");
    assert!(GraphRepository::from_snapshot(snapshot).is_err());

    let snapshot: GraphSnapshot = serde_json::from_value(json!({
        "nodes": [{"id": "a", "kind": "user"}],
        "edges": [{"from": "a", "to": "missing", "kind": "is"}],
    }))
    .expect("snapshot");
    assert!(GraphRepository::from_snapshot(snapshot).is_err());
}

#[test]
fn id_allocation_skips_snapshot_collisions() {
    let snapshot: GraphSnapshot = serde_json::from_value(json!({
        "nodes": [{"id": "1", "kind": "user"}],
    }))
    .expect("snapshot");
    let mut repo = GraphRepository::from_snapshot(snapshot).expect("load");
    let id = repo
        .create(json!({"kind": "user"}))
        .expect("create")
        .id()
        .to_string();
    assert_eq!(id, "2");
}
