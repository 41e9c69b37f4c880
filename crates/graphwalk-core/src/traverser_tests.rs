//! Tests for `traverser` module

use super::error::Error;
use super::filter::FilterPredicate;
use super::id::{Direction, VertexId};
use super::options::TraverserOptions;
use super::storage::{CollectionKind, MemoryStorage};
use super::traverser::*;
use serde_json::{json, Value};

fn vid(raw: &str) -> VertexId {
    VertexId::parse(raw).unwrap()
}

/// a -> b (friend), a -> c (foe), b -> d (friend), plus a self-loop on c.
fn graph() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.create_collection("v", CollectionKind::Document).unwrap();
    storage.create_collection("e", CollectionKind::Edge).unwrap();
    for (key, age) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
        storage.insert_document("v", key, json!({"age": age})).unwrap();
    }
    storage.insert_edge("e", "ab", "v/a", "v/b", json!({"type": "friend"})).unwrap();
    storage.insert_edge("e", "ac", "v/a", "v/c", json!({"type": "foe"})).unwrap();
    storage.insert_edge("e", "bd", "v/b", "v/d", json!({"type": "friend"})).unwrap();
    storage.insert_edge("e", "cc", "v/c", "v/c", json!({"type": "self"})).unwrap();
    storage
}

fn filter(example: Value) -> FilterPredicate {
    FilterPredicate::from_example(&example).unwrap().unwrap()
}

fn render(path: &TraversalPath) -> String {
    path.vertices()
        .iter()
        .map(VertexId::key)
        .collect::<Vec<_>>()
        .join("")
}

fn run(
    storage: &MemoryStorage,
    options: TraverserOptions,
    conditions: DepthConditions,
    start: &str,
) -> Vec<String> {
    let mut traverser = DepthFirstTraverser::new(storage, &["e"], options, conditions).unwrap();
    traverser.set_start_vertex(vid(start)).unwrap();
    let mut paths = Vec::new();
    while let Some(path) = traverser.next().unwrap() {
        paths.push(render(&path));
    }
    paths
}

#[test]
fn test_depth_first_order_and_depth_range() {
    let storage = graph();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 1, 2),
        DepthConditions::new(),
        "v/a",
    );
    assert_eq!(paths, ["ab", "abd", "ac"]);
}

#[test]
fn test_min_depth_zero_reports_start() {
    let storage = graph();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 0, 1),
        DepthConditions::new(),
        "v/a",
    );
    assert_eq!(paths, ["a", "ab", "ac"]);
}

#[test]
fn test_min_depth_hides_short_paths() {
    let storage = graph();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 2, 3),
        DepthConditions::new(),
        "v/a",
    );
    assert_eq!(paths, ["abd"]);
}

#[test]
fn test_inbound_direction() {
    let storage = graph();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Inbound, 1, 3),
        DepthConditions::new(),
        "v/d",
    );
    assert_eq!(paths, ["db", "dba"]);
}

#[test]
fn test_edge_condition_prunes_candidates() {
    // Arrange
    let storage = graph();
    let conditions = DepthConditions::from([(
        1,
        vec![TraversalCondition::Edge(filter(json!({"type": "friend"})))],
    )]);

    // Act
    let mut traverser = DepthFirstTraverser::new(
        &storage,
        &["e"],
        TraverserOptions::new(Direction::Outbound, 1, 2),
        conditions,
    )
    .unwrap();
    traverser.set_start_vertex(vid("v/a")).unwrap();
    let mut paths = Vec::new();
    while let Some(path) = traverser.next().unwrap() {
        paths.push(render(&path));
    }

    // Assert
    assert_eq!(paths, ["ab", "abd"]);
    assert_eq!(traverser.stats().filtered_paths, 1);
    assert_eq!(traverser.stats().read_documents, 0);
}

#[test]
fn test_vertex_condition_reads_documents() {
    let storage = graph();
    let conditions = DepthConditions::from([(
        1,
        vec![TraversalCondition::Vertex(filter(json!({"age": 30})))],
    )]);

    let mut traverser = DepthFirstTraverser::new(
        &storage,
        &["e"],
        TraverserOptions::new(Direction::Outbound, 1, 2),
        conditions,
    )
    .unwrap();
    traverser.set_start_vertex(vid("v/a")).unwrap();
    let first = traverser.next().unwrap().unwrap();
    assert_eq!(render(&first), "ac");
    assert!(traverser.next().unwrap().is_none());

    let stats = traverser.stats();
    assert_eq!(stats.read_documents, 2);
    assert_eq!(stats.filtered_paths, 1);
}

#[test]
fn test_never_matching_vertex_condition_at_depth_one() {
    // Arrange
    let storage = graph();
    let conditions = DepthConditions::from([(
        1,
        vec![TraversalCondition::Vertex(FilterPredicate::NeverMatches)],
    )]);
    let mut traverser = DepthFirstTraverser::new(
        &storage,
        &["e"],
        TraverserOptions::new(Direction::Any, 1, 5),
        conditions,
    )
    .unwrap();

    // Act
    traverser.set_start_vertex(vid("v/a")).unwrap();
    let next = traverser.next().unwrap();

    // Assert
    assert!(next.is_none());
    assert_eq!(storage.call_counts().edge_lookups, 0);
}

#[test]
fn test_deeper_never_matching_condition_only_stops_descent() {
    let storage = graph();
    let conditions = DepthConditions::from([(
        2,
        vec![TraversalCondition::Edge(FilterPredicate::NeverMatches)],
    )]);
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 1, 3),
        conditions,
        "v/a",
    );
    assert_eq!(paths, ["ab", "ac"]);
}

#[test]
fn test_start_vertex_condition() {
    let storage = graph();
    let conditions = DepthConditions::from([(
        0,
        vec![TraversalCondition::Vertex(filter(json!({"age": 99})))],
    )]);
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 0, 2),
        conditions,
        "v/a",
    );
    assert!(paths.is_empty());
}

#[test]
fn test_self_loop_with_any_is_finite() {
    let storage = graph();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Any, 1, 1),
        DepthConditions::new(),
        "v/c",
    );
    assert_eq!(paths, ["ca"]);
}

#[test]
fn test_cycles_are_not_followed() {
    let storage = graph();
    storage.insert_edge("e", "da", "v/d", "v/a", json!({})).unwrap();
    let paths = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 1, 10),
        DepthConditions::new(),
        "v/a",
    );
    assert_eq!(paths, ["ab", "abd", "ac"]);
}

#[test]
fn test_next_before_start_is_none() {
    let storage = graph();
    let mut traverser =
        DepthFirstTraverser::new(&storage, &["e"], TraverserOptions::default(), DepthConditions::new())
            .unwrap();
    assert!(traverser.next().unwrap().is_none());
}

#[test]
fn test_set_start_vertex_restarts() {
    let storage = graph();
    let mut traverser =
        DepthFirstTraverser::new(&storage, &["e"], TraverserOptions::default(), DepthConditions::new())
            .unwrap();

    traverser.set_start_vertex(vid("v/a")).unwrap();
    assert_eq!(render(&traverser.next().unwrap().unwrap()), "ab");

    traverser.set_start_vertex(vid("v/b")).unwrap();
    assert_eq!(render(&traverser.next().unwrap().unwrap()), "bd");
    assert!(traverser.next().unwrap().is_none());
    assert!(traverser.next().unwrap().is_none());
}

#[test]
fn test_edge_collections_resolved_once() {
    let storage = graph();
    let _ = run(
        &storage,
        TraverserOptions::new(Direction::Outbound, 1, 3),
        DepthConditions::new(),
        "v/a",
    );
    let counts = storage.call_counts();
    assert_eq!(counts.resolves, 1);
    assert!(counts.edge_lookups > 1);
}

#[test]
fn test_missing_collection_fails_then_exhausts() {
    let storage = graph();
    let mut traverser =
        DepthFirstTraverser::new(&storage, &["nope"], TraverserOptions::default(), DepthConditions::new())
            .unwrap();
    traverser.set_start_vertex(vid("v/a")).unwrap();

    assert_eq!(
        traverser.next().unwrap_err(),
        Error::CollectionNotFound("nope".into())
    );
    assert!(traverser.next().unwrap().is_none());
}

#[test]
fn test_inverted_depth_range_rejected() {
    let storage = graph();
    let result = DepthFirstTraverser::new(
        &storage,
        &["e"],
        TraverserOptions::new(Direction::Outbound, 3, 1),
        DepthConditions::new(),
    );
    assert!(matches!(result, Err(Error::InvalidOptions(_))));
}

#[test]
fn test_edge_getter_caches_resolution() {
    let storage = graph();
    let mut getter = EdgeGetter::new(&storage);
    for _ in 0..3 {
        getter.get_edges("e", Direction::Outbound, &vid("v/a")).unwrap();
    }
    assert_eq!(getter.resolved_count(), 1);
    assert_eq!(storage.call_counts().resolves, 1);
}

// -------------------------------------------------------------------------
// TraversalPath views
// -------------------------------------------------------------------------

fn longest_path(storage: &MemoryStorage) -> TraversalPath {
    let mut traverser = DepthFirstTraverser::new(
        storage,
        &["e"],
        TraverserOptions::new(Direction::Outbound, 2, 2),
        DepthConditions::new(),
    )
    .unwrap();
    traverser.set_start_vertex(vid("v/a")).unwrap();
    traverser.next().unwrap().unwrap()
}

#[test]
fn test_path_views() {
    let storage = graph();
    let path = longest_path(&storage);

    let full = path.path_to_value(&storage).unwrap();
    assert_eq!(full["vertices"].as_array().unwrap().len(), 3);
    assert_eq!(full["edges"][1]["_key"], "bd");
    assert_eq!(full["vertices"][2]["age"], 40);

    assert_eq!(path.last_edge_to_value()["_id"], "e/bd");
    assert_eq!(path.last_vertex_to_value(&storage).unwrap()["_id"], "v/d");
}

#[test]
fn test_last_vertex_view_matches_full_path() {
    let storage = graph();
    let path = longest_path(&storage);

    let full = path.path_to_value(&storage).unwrap();
    let vertices = full["vertices"].as_array().unwrap();
    assert_eq!(
        vertices.last().unwrap(),
        &path.last_vertex_to_value(&storage).unwrap()
    );
    let edges = full["edges"].as_array().unwrap();
    assert_eq!(edges.last().unwrap(), &path.last_edge_to_value());
}

#[test]
fn test_dangling_vertex_renders_null() {
    let storage = graph();
    let path = longest_path(&storage);
    storage.remove_document("v", "d").unwrap();

    assert_eq!(path.last_vertex_to_value(&storage).unwrap(), Value::Null);
    let full = path.path_to_value(&storage).unwrap();
    assert_eq!(full["vertices"][2], Value::Null);
}
