//! Query matching.
//!
//! [`match_value`] evaluates a value-query field (scalar equality, list
//! membership, or a single-key operator object) against a stored value.
//! [`matches_node_query`] applies a whole node query: value fields go through
//! the value matcher, relation fields recurse into sub-queries against the
//! related-node list produced by traversal.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{RepoError, Result};
use crate::model::Node;
use crate::repo::GraphRepository;

/// Evaluates a value-query field against a stored value.
///
/// `actual` is `None` when the node has no such field; a missing field
/// compares like JSON `null`. The query field is one of:
///
/// - a scalar: equality (numbers compare by value, so `1` equals `1.0`);
/// - a list of scalars: membership;
/// - an object with exactly one operator key out of `eq`, `ne`, `lt`, `lte`,
///   `gt`, `gte`, `re`, `empty`, `length`, `includes`.
///
/// `empty` mirrors the conjoined semantics of the source system: the result
/// is `len == 0 && argument`, so `empty: false` matches nothing. Use
/// `{length: {gt: 0}}` for "must not be empty".
///
/// Unknown operator keys fail with `NotImplemented`; operator objects with
/// zero or several keys fail with `Validation`.
pub fn match_value(actual: Option<&Value>, query: &Value, path: &str) -> Result<bool> {
    match query {
        Value::Object(op) => match_operator(actual, op, path),
        Value::Array(list) => Ok(list.iter().any(|wanted| values_equal(actual, wanted))),
        scalar => Ok(values_equal(actual, scalar)),
    }
}

fn match_operator(actual: Option<&Value>, op: &Map<String, Value>, path: &str) -> Result<bool> {
    let mut entries = op.iter();
    let (key, arg) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(RepoError::validation(
                path,
                "operator object with exactly one key",
                &Value::Object(op.clone()),
            ))
        }
    };
    let arg_path = format!("{path}.{key}");

    let hit = match key.as_str() {
        "eq" => values_equal(actual, arg),
        "ne" => !values_equal(actual, arg),
        "lt" | "lte" | "gt" | "gte" => {
            let rhs = arg
                .as_f64()
                .ok_or_else(|| RepoError::validation(&arg_path, "number", arg))?;
            match actual.and_then(Value::as_f64) {
                Some(lhs) => match key.as_str() {
                    "lt" => lhs < rhs,
                    "lte" => lhs <= rhs,
                    "gt" => lhs > rhs,
                    _ => lhs >= rhs,
                },
                None => false,
            }
        }
        "re" => {
            let pattern = arg
                .as_str()
                .ok_or_else(|| RepoError::validation(&arg_path, "regex pattern string", arg))?;
            let re = Regex::new(pattern)
                .map_err(|_| RepoError::validation(&arg_path, "valid regex pattern", arg))?;
            actual
                .and_then(Value::as_str)
                .map(|s| re.is_match(s))
                .unwrap_or(false)
        }
        "empty" => {
            let wanted = arg
                .as_bool()
                .ok_or_else(|| RepoError::validation(&arg_path, "boolean", arg))?;
            wanted && value_len(actual) == Some(0)
        }
        "length" => match value_len(actual) {
            Some(len) => match_value(Some(&Value::from(len as u64)), arg, &arg_path)?,
            None => false,
        },
        "includes" => includes(actual, arg),
        other => return Err(RepoError::NotImplemented(other.to_string())),
    };

    trace!(operator = %key, hit, "evaluated value operator");
    Ok(hit)
}

/// Strict equality with missing treated as null and numbers compared by
/// value.
fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    let actual = actual.unwrap_or(&Value::Null);
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return a == b;
    }
    actual == expected
}

/// Length of a collection value: character count for strings, element count
/// for arrays. Other values have no length.
fn value_len(actual: Option<&Value>) -> Option<usize> {
    match actual? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn includes(actual: Option<&Value>, needle: &Value) -> bool {
    match actual {
        Some(Value::Array(items)) => items.iter().any(|item| values_equal(Some(item), needle)),
        Some(Value::String(s)) => needle.as_str().map(|sub| s.contains(sub)).unwrap_or(false),
        _ => false,
    }
}

/// Decides whether `node` satisfies the query's field entries. The `kind`
/// tag is dispatched before this point and skipped here.
///
/// Entries naming a declared relation of the node's kind are relation fields;
/// everything else is a value field. The node matches iff all entries match.
pub(crate) fn matches_node_query(
    repo: &GraphRepository,
    node: &Node,
    fields: &Map<String, Value>,
    path: &str,
) -> Result<bool> {
    for (key, query_field) in fields {
        if key == "kind" {
            continue;
        }
        let child_path = format!("{path}.{key}");
        let hit = if repo.schema().has_relation(&node.kind, key) {
            match_relation_field(repo, node, key, query_field, &child_path)?
        } else {
            match_value(node.attribute(key).as_ref(), query_field, &child_path)?
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A relation field is either a list of node sub-queries (the node matches
/// iff some related node satisfies some sub-query) or an operator object
/// applied to the related-node list as a whole.
fn match_relation_field(
    repo: &GraphRepository,
    node: &Node,
    relation: &str,
    query_field: &Value,
    path: &str,
) -> Result<bool> {
    let related = repo.related_nodes(node, relation)?;
    match query_field {
        Value::Array(sub_queries) => {
            for (idx, sub_query) in sub_queries.iter().enumerate() {
                let sub_fields = sub_query.as_object().ok_or_else(|| {
                    RepoError::validation(
                        format!("{path}[{idx}]"),
                        "node sub-query object",
                        sub_query,
                    )
                })?;
                for related_node in related.iter().copied() {
                    if matches_node_query(
                        repo,
                        related_node,
                        sub_fields,
                        &format!("{path}[{idx}]"),
                    )? {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
        Value::Object(_) => {
            let list = Value::Array(related.iter().map(|n| n.to_value()).collect());
            match_value(Some(&list), query_field, path)
        }
        other => Err(RepoError::validation(
            path,
            "sub-query list or operator object",
            other,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(actual: Value, query: Value) -> Result<bool> {
        match_value(Some(&actual), &query, "$")
    }

    #[test]
    fn scalar_query_is_equality() {
        assert!(check(json!("steve"), json!("steve")).unwrap());
        assert!(!check(json!("steve"), json!("bob")).unwrap());
        assert!(check(json!(1), json!(1.0)).unwrap());
        assert!(!match_value(None, &json!("x"), "$").unwrap());
        assert!(match_value(None, &json!(null), "$").unwrap());
    }

    #[test]
    fn list_query_is_membership() {
        assert!(check(json!(2), json!([1, 2, 3])).unwrap());
        assert!(!check(json!(4), json!([1, 2, 3])).unwrap());
        assert!(!check(json!(4), json!([])).unwrap());
    }

    #[test]
    fn comparison_operators() {
        assert!(check(json!(5), json!({"gt": 4})).unwrap());
        assert!(!check(json!(5), json!({"gt": 5})).unwrap());
        assert!(check(json!(5), json!({"gte": 5})).unwrap());
        assert!(check(json!(5), json!({"lt": 6})).unwrap());
        assert!(check(json!(5), json!({"lte": 5})).unwrap());
        assert!(check(json!(5), json!({"ne": 4})).unwrap());
        assert!(check(json!(5), json!({"eq": 5})).unwrap());
        // ordered comparison against a non-number never matches
        assert!(!check(json!("five"), json!({"gt": 4})).unwrap());
    }

    #[test]
    fn comparison_argument_must_be_numeric() {
        let err = check(json!(5), json!({"gt": "4"})).unwrap_err();
        assert_eq!(err.code(), "Validation");
    }

    #[test]
    fn regex_operator_matches_strings_only() {
        assert!(check(json!("steve"), json!({"re": "^st"})).unwrap());
        assert!(!check(json!("steve"), json!({"re": "^ts"})).unwrap());
        assert!(!check(json!(42), json!({"re": "^st"})).unwrap());
        let err = check(json!("x"), json!({"re": "("})).unwrap_err();
        assert_eq!(err.code(), "Validation");
    }

    #[test]
    fn empty_operator_conjoins_its_argument() {
        assert!(check(json!([]), json!({"empty": true})).unwrap());
        assert!(!check(json!([1]), json!({"empty": true})).unwrap());
        // `empty: false` never matches, including against non-empty lists
        assert!(!check(json!([]), json!({"empty": false})).unwrap());
        assert!(!check(json!([1]), json!({"empty": false})).unwrap());
        assert!(check(json!(""), json!({"empty": true})).unwrap());
    }

    #[test]
    fn length_operator_applies_recursively() {
        assert!(check(json!([1, 2]), json!({"length": 2})).unwrap());
        assert!(check(json!("ab"), json!({"length": {"lt": 3}})).unwrap());
        assert!(!check(json!(7), json!({"length": 1})).unwrap());
    }

    #[test]
    fn includes_operator_tests_collection_membership() {
        assert!(check(json!(["a", "b"]), json!({"includes": "a"})).unwrap());
        assert!(!check(json!(["a", "b"]), json!({"includes": "c"})).unwrap());
        assert!(check(json!("abc"), json!({"includes": "bc"})).unwrap());
        assert!(!check(json!(42), json!({"includes": 4})).unwrap());
    }

    #[test]
    fn unknown_operator_is_not_implemented() {
        let err = check(json!(1), json!({"between": [1, 2]})).unwrap_err();
        assert_eq!(err, RepoError::NotImplemented("between".into()));
    }

    #[test]
    fn malformed_operator_objects_are_rejected() {
        assert_eq!(
            check(json!(1), json!({})).unwrap_err().code(),
            "Validation"
        );
        assert_eq!(
            check(json!(1), json!({"gt": 1, "lt": 3})).unwrap_err().code(),
            "Validation"
        );
    }
}
