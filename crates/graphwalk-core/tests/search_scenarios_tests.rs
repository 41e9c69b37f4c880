//! End-to-end scenarios over an in-memory graph.
//!
//! Each module builds a small graph through the public API and runs the
//! search drivers the way a query layer would.

use graphwalk_core::traverser::TraversalCondition;
use graphwalk_core::{
    run_edges_search, run_neighbors_search, run_neighbors_search_with_documents,
    run_shortest_path_search, run_simple_shortest_path_search, CollectionKind, DepthConditions,
    DepthFirstTraverser, Direction, EdgeCollectionInfo, EngineConfig, FilterPredicate,
    MemoryStorage, NeighborsOptions, ShortestPathOptions, TraverserOptions, VertexId,
};
use serde_json::json;

fn vid(raw: &str) -> VertexId {
    VertexId::parse(raw).expect("valid vertex id")
}

// =============================================================================
// Weighted routing: A-[2]->B-[3]->C versus A-[10]->C
// =============================================================================

mod weighted_routing {
    use super::*;

    fn roads() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.create_collection("cities", CollectionKind::Document).expect("create");
        storage.create_collection("roads", CollectionKind::Edge).expect("create");
        for city in ["A", "B", "C"] {
            storage
                .insert_document("cities", city, json!({"name": city}))
                .expect("insert");
        }
        storage
            .insert_edge("roads", "e1", "cities/A", "cities/B", json!({"weight": 2}))
            .expect("insert");
        storage
            .insert_edge("roads", "e2", "cities/B", "cities/C", json!({"weight": 3}))
            .expect("insert");
        storage
            .insert_edge("roads", "e3", "cities/A", "cities/C", json!({"weight": 10}))
            .expect("insert");
        storage
    }

    #[test]
    fn test_detour_is_cheaper() {
        let storage = roads();
        let options = ShortestPathOptions::new(vid("cities/A"), vid("cities/C")).with_weight("weight", 1.0);
        let collections = [EdgeCollectionInfo::with_weight(&storage, "roads", options.edge_weight())];

        let result = run_shortest_path_search(&collections, &options)
            .expect("search")
            .expect("path");

        let edges: Vec<&str> = result.path.edges().iter().map(|e| e.id().as_str()).collect();
        assert_eq!(edges, ["roads/e1", "roads/e2"]);
        assert!((result.distance - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fewest_hops_takes_direct_road() {
        let storage = roads();
        let options = ShortestPathOptions::new(vid("cities/A"), vid("cities/C"));
        let collections = [EdgeCollectionInfo::new(&storage, "roads")];

        let result = run_simple_shortest_path_search(&collections, &options)
            .expect("search")
            .expect("path");

        assert_eq!(result.path.len(), 1);
        assert_eq!(result.path.edges()[0].id().key(), "e3");
    }

    #[test]
    fn test_configured_weight_attribute() {
        let storage = roads();
        let config = EngineConfig::from_toml(
            "[shortest_path]\nweight_attribute = \"weight\"\nmulti_threaded = false\n",
        )
        .expect("config");
        config.validate().expect("valid");
        let options = ShortestPathOptions::from_config(vid("cities/A"), vid("cities/C"), &config);
        let collections = [EdgeCollectionInfo::with_weight(&storage, "roads", options.edge_weight())];

        let result = run_shortest_path_search(&collections, &options)
            .expect("search")
            .expect("path");

        assert!((result.distance - 5.0).abs() < f64::EPSILON);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["path"]["vertices"], json!(["cities/A", "cities/B", "cities/C"]));
    }
}

// =============================================================================
// Star graph: hub connected to five leaves
// =============================================================================

mod star_graph {
    use super::*;

    fn star() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.create_collection("nodes", CollectionKind::Document).expect("create");
        storage.create_collection("links", CollectionKind::Edge).expect("create");
        storage.insert_document("nodes", "hub", json!({})).expect("insert");
        for i in 1..=5 {
            let leaf = format!("L{i}");
            storage.insert_document("nodes", &leaf, json!({"leaf": i})).expect("insert");
            storage
                .insert_edge("links", &format!("h{i}"), "nodes/hub", &format!("nodes/{leaf}"), json!({}))
                .expect("insert");
        }
        storage
    }

    #[test]
    fn test_hub_neighbors_are_exactly_the_leaves() {
        let storage = star();
        let collections = [EdgeCollectionInfo::new(&storage, "links")];
        let options = NeighborsOptions::new(vid("nodes/hub"));

        let result = run_neighbors_search(&collections, &options).expect("search");

        let keys: Vec<&str> = result.iter().map(VertexId::key).collect();
        assert_eq!(keys, ["L1", "L2", "L3", "L4", "L5"]);
    }

    #[test]
    fn test_isolated_vertex_has_no_neighbors() {
        let storage = star();
        storage.insert_document("nodes", "alone", json!({})).expect("insert");
        let collections = [EdgeCollectionInfo::new(&storage, "links")];
        let options = NeighborsOptions::new(vid("nodes/alone"))
            .with_direction(Direction::Any)
            .with_depth(1, 5);

        let result = run_neighbors_search(&collections, &options).expect("search");

        assert!(result.is_empty());
    }

    #[test]
    fn test_leaf_reaches_siblings_through_hub() {
        let storage = star();
        let collections = [EdgeCollectionInfo::new(&storage, "links")];
        let mut options = NeighborsOptions::new(vid("nodes/L1")).with_direction(Direction::Any);
        let include_data = options
            .apply_json_options(&json!({"minDepth": 2, "includeData": true}))
            .expect("options");
        assert!(include_data);

        let documents =
            run_neighbors_search_with_documents(&storage, &collections, &options).expect("search");

        let leaves: Vec<i64> = documents
            .iter()
            .filter_map(|doc| doc.body()["leaf"].as_i64())
            .collect();
        assert_eq!(leaves, [2, 3, 4, 5]);
    }

    #[test]
    fn test_hub_edges_search() {
        let storage = star();
        let links = EdgeCollectionInfo::new(&storage, "links");
        let only_l3 = FilterPredicate::from_example(&json!({"_to": "nodes/L3"}))
            .expect("filter")
            .expect("non-empty");

        let matches =
            run_edges_search(&links, "nodes/hub", Direction::Outbound, Some(&only_l3), true).expect("search");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].vertex.as_ref().expect("vertex")["leaf"], 3);
    }
}

// =============================================================================
// Traversal behaviour
// =============================================================================

mod traversal {
    use super::*;

    fn chain_with_loop() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.create_collection("v", CollectionKind::Document).expect("create");
        storage.create_collection("e", CollectionKind::Edge).expect("create");
        for key in ["a", "b", "c"] {
            storage.insert_document("v", key, json!({"key": key})).expect("insert");
        }
        storage.insert_edge("e", "ab", "v/a", "v/b", json!({})).expect("insert");
        storage.insert_edge("e", "bc", "v/b", "v/c", json!({})).expect("insert");
        storage.insert_edge("e", "aa", "v/a", "v/a", json!({})).expect("insert");
        storage
    }

    #[test]
    fn test_never_matching_depth_one_condition_yields_nothing() {
        let storage = chain_with_loop();
        let conditions = DepthConditions::from([(
            1,
            vec![TraversalCondition::Vertex(FilterPredicate::NeverMatches)],
        )]);
        let mut traverser = DepthFirstTraverser::new(
            &storage,
            &["e"],
            TraverserOptions::new(Direction::Outbound, 1, 3),
            conditions,
        )
        .expect("traverser");

        traverser.set_start_vertex(vid("v/a")).expect("start");

        assert!(traverser.next().expect("next").is_none());
    }

    #[test]
    fn test_self_loop_with_any_terminates() {
        let storage = chain_with_loop();
        let mut traverser = DepthFirstTraverser::new(
            &storage,
            &["e"],
            TraverserOptions::new(Direction::Any, 1, 1),
            DepthConditions::new(),
        )
        .expect("traverser");
        traverser.set_start_vertex(vid("v/a")).expect("start");

        let mut count = 0;
        while traverser.next().expect("next").is_some() {
            count += 1;
            assert!(count < 100, "traversal does not terminate");
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn test_last_vertex_view_matches_full_path() {
        let storage = chain_with_loop();
        let mut traverser = DepthFirstTraverser::new(
            &storage,
            &["e"],
            TraverserOptions::new(Direction::Outbound, 1, 2),
            DepthConditions::new(),
        )
        .expect("traverser");
        traverser.set_start_vertex(vid("v/a")).expect("start");

        while let Some(path) = traverser.next().expect("next") {
            let full = path.path_to_value(&storage).expect("full");
            let last_hop = full["vertices"]
                .as_array()
                .and_then(|vertices| vertices.last())
                .cloned()
                .expect("last vertex");
            assert_eq!(path.last_vertex_to_value(&storage).expect("last"), last_hop);
        }
    }

    #[test]
    fn test_traversal_defaults_from_config() {
        let storage = chain_with_loop();
        let config = EngineConfig::default();
        let mut traverser = DepthFirstTraverser::new(
            &storage,
            &["e"],
            TraverserOptions::from_config(&config),
            DepthConditions::new(),
        )
        .expect("traverser");
        traverser.set_start_vertex(vid("v/a")).expect("start");

        let mut lengths = Vec::new();
        while let Some(path) = traverser.next().expect("next") {
            lengths.push(path.len());
        }
        assert_eq!(lengths, [1, 2]);
    }
}
