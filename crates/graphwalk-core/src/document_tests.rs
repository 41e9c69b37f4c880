//! Tests for `document` module

use super::document::*;
use super::id::{Direction, EdgeId, VertexId};
use serde_json::json;

fn vid(raw: &str) -> VertexId {
    VertexId::parse(raw).unwrap()
}

fn edge(key: &str, from: &str, to: &str) -> EdgeDocument {
    EdgeDocument::new(
        EdgeId::from_parts("knows", key).unwrap(),
        vid(from),
        vid(to),
        json!({"since": 2020}),
    )
}

#[test]
fn test_document_body_has_system_attributes() {
    let doc = Document::new(vid("persons/alice"), json!({"age": 31}));
    assert_eq!(doc.body()[ATTR_ID], "persons/alice");
    assert_eq!(doc.body()[ATTR_KEY], "alice");
    assert_eq!(doc.body()["age"], 31);
}

#[test]
fn test_document_null_and_scalar_bodies() {
    let empty = Document::new(vid("persons/a"), serde_json::Value::Null);
    assert_eq!(empty.body().as_object().unwrap().len(), 2);

    let scalar = Document::new(vid("persons/b"), json!(42));
    assert_eq!(scalar.body()["value"], 42);
}

#[test]
fn test_edge_body_has_endpoints() {
    let e = edge("e1", "persons/a", "persons/b");
    assert_eq!(e.attribute(ATTR_FROM), Some(&json!("persons/a")));
    assert_eq!(e.attribute(ATTR_TO), Some(&json!("persons/b")));
    assert_eq!(e.attribute(ATTR_ID), Some(&json!("knows/e1")));
    assert_eq!(e.attribute("since"), Some(&json!(2020)));
    assert_eq!(e.source().as_str(), "persons/a");
    assert_eq!(e.target().as_str(), "persons/b");
}

#[test]
fn test_opposite_by_direction() {
    let e = edge("e1", "persons/a", "persons/b");
    let a = vid("persons/a");
    let b = vid("persons/b");

    assert_eq!(e.opposite(&a, Direction::Outbound), &b);
    assert_eq!(e.opposite(&b, Direction::Inbound), &a);
    assert_eq!(e.opposite(&a, Direction::Any), &b);
    assert_eq!(e.opposite(&b, Direction::Any), &a);
}

#[test]
fn test_opposite_of_self_loop_is_same_vertex() {
    let e = edge("loop", "persons/a", "persons/a");
    let a = vid("persons/a");
    assert_eq!(e.opposite(&a, Direction::Any), &a);
}
