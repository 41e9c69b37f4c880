//! Tests for `id` module

use super::error::Error;
use super::id::*;

// -------------------------------------------------------------------------
// VertexId / EdgeId
// -------------------------------------------------------------------------

#[test]
fn test_vertex_id_parse_splits_parts() {
    let id = VertexId::parse("persons/alice").unwrap();
    assert_eq!(id.collection(), "persons");
    assert_eq!(id.key(), "alice");
    assert_eq!(id.as_str(), "persons/alice");
    assert_eq!(id.to_string(), "persons/alice");
}

#[test]
fn test_vertex_id_rejects_malformed() {
    for raw in ["", "alice", "/alice", "persons/", "a/b/c", "/"] {
        let err = VertexId::parse(raw).unwrap_err();
        assert!(
            matches!(err, Error::MalformedIdentifier(_)),
            "{raw:?} gave {err:?}"
        );
    }
}

#[test]
fn test_from_parts_rejects_separator_in_key() {
    assert!(VertexId::from_parts("persons", "a/b").is_err());
    assert!(EdgeId::from_parts("", "e1").is_err());
    assert_eq!(
        EdgeId::from_parts("knows", "e1").unwrap().as_str(),
        "knows/e1"
    );
}

#[test]
fn test_parse_in_collection_qualifies_bare_key() {
    let id = VertexId::parse_in_collection("persons", "bob").unwrap();
    assert_eq!(id.as_str(), "persons/bob");
}

#[test]
fn test_parse_in_collection_accepts_matching_handle() {
    let id = VertexId::parse_in_collection("persons", "persons/bob").unwrap();
    assert_eq!(id.key(), "bob");
}

#[test]
fn test_parse_in_collection_detects_mismatch() {
    let err = VertexId::parse_in_collection("persons", "cities/berlin").unwrap_err();
    assert_eq!(
        err,
        Error::CollectionMismatch {
            declared: "persons".into(),
            actual: "cities".into(),
        }
    );
}

#[test]
fn test_vertex_id_serde_as_string() {
    let id = VertexId::parse("persons/alice").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"persons/alice\"");

    let bad: Result<VertexId, _> = serde_json::from_str("\"no-separator\"");
    assert!(bad.is_err());
}

#[test]
fn test_vertex_id_from_str() {
    let id: VertexId = "cities/berlin".parse().unwrap();
    assert_eq!(id.collection(), "cities");
}

// -------------------------------------------------------------------------
// Direction
// -------------------------------------------------------------------------

#[test]
fn test_direction_parse_is_case_insensitive() {
    assert_eq!("OUTBOUND".parse::<Direction>().unwrap(), Direction::Outbound);
    assert_eq!("Inbound".parse::<Direction>().unwrap(), Direction::Inbound);
    assert_eq!("any".parse::<Direction>().unwrap(), Direction::Any);
}

#[test]
fn test_direction_parse_rejects_unknown() {
    let err = "sideways".parse::<Direction>().unwrap_err();
    assert_eq!(err, Error::InvalidDirection("sideways".into()));
}

#[test]
fn test_direction_reverse() {
    assert_eq!(Direction::Outbound.reverse(), Direction::Inbound);
    assert_eq!(Direction::Inbound.reverse(), Direction::Outbound);
    assert_eq!(Direction::Any.reverse(), Direction::Any);
}

#[test]
fn test_direction_default_and_display() {
    assert_eq!(Direction::default(), Direction::Outbound);
    assert_eq!(Direction::Any.to_string(), "any");
    assert_eq!(
        serde_json::to_value(Direction::Inbound).unwrap(),
        serde_json::json!("inbound")
    );
}
