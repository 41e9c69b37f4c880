//! Search parameters for neighbors, shortest-path and depth-first searches.
//!
//! Each options value owns its compiled filters. Edge filters are registered
//! per edge collection and vertex filters per vertex collection; a filter that
//! can never match makes its collection contribute nothing instead of failing
//! the search.

use crate::config::EngineConfig;
use crate::document::EdgeDocument;
use crate::edge_collection::EdgeWeight;
use crate::error::{Error, Result};
use crate::filter::FilterPredicate;
use crate::id::{Direction, VertexId};
use crate::storage::GraphStorage;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Options shared by all searches.
#[derive(Debug, Clone)]
pub struct BasicOptions {
    /// Start vertex.
    pub start: VertexId,
    /// Whether edge filters are consulted.
    pub use_edge_filter: bool,
    /// Whether vertex filters are consulted.
    pub use_vertex_filter: bool,
    edge_filters: HashMap<String, FilterPredicate>,
    vertex_filters: HashMap<String, FilterPredicate>,
}

impl BasicOptions {
    /// Creates options without any filters.
    #[must_use]
    pub fn new(start: VertexId) -> Self {
        Self {
            start,
            use_edge_filter: false,
            use_vertex_filter: false,
            edge_filters: HashMap::new(),
            vertex_filters: HashMap::new(),
        }
    }

    /// Compiles `example` into the edge filter for `collection`.
    ///
    /// An empty example array leaves the collection unfiltered.
    ///
    /// # Errors
    ///
    /// `Error::InvalidFilter` if the example has an unsupported shape.
    pub fn add_edge_filter(&mut self, example: &Value, collection: &str) -> Result<()> {
        if let Some(predicate) = FilterPredicate::from_example(example)? {
            self.set_edge_filter(collection, predicate);
        }
        Ok(())
    }

    /// Compiles `example` into the vertex filter for `collection`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidFilter` if the example has an unsupported shape.
    pub fn add_vertex_filter(&mut self, example: &Value, collection: &str) -> Result<()> {
        if let Some(predicate) = FilterPredicate::from_example(example)? {
            self.set_vertex_filter(collection, predicate);
        }
        Ok(())
    }

    /// Installs a compiled edge filter and enables edge filtering.
    pub fn set_edge_filter(&mut self, collection: &str, predicate: FilterPredicate) {
        self.edge_filters.insert(collection.to_string(), predicate);
        self.use_edge_filter = true;
    }

    /// Installs a compiled vertex filter and enables vertex filtering.
    pub fn set_vertex_filter(&mut self, collection: &str, predicate: FilterPredicate) {
        self.vertex_filters.insert(collection.to_string(), predicate);
        self.use_vertex_filter = true;
    }

    /// Returns the edge filter registered for `collection`.
    #[must_use]
    pub fn edge_filter(&self, collection: &str) -> Option<&FilterPredicate> {
        if !self.use_edge_filter {
            return None;
        }
        self.edge_filters.get(collection)
    }

    /// Returns true if `collection` cannot contribute any edge.
    #[must_use]
    pub fn edge_collection_excluded(&self, collection: &str) -> bool {
        self.edge_filter(collection)
            .is_some_and(FilterPredicate::is_never)
    }

    /// Checks an edge against the filter of its collection.
    ///
    /// Edges of collections without a filter always pass.
    #[must_use]
    pub fn matches_edge(&self, edge: &EdgeDocument) -> bool {
        self.edge_filter(edge.id().collection())
            .is_none_or(|filter| filter.matches(edge.body()))
    }

    /// Checks a vertex against the filter of its collection.
    ///
    /// With vertex filtering enabled, vertices from collections without a
    /// registered filter are rejected, and so are missing documents.
    ///
    /// # Errors
    ///
    /// Storage errors other than `DocumentNotFound` are propagated.
    pub fn matches_vertex<S>(&self, storage: &S, vertex: &VertexId) -> Result<bool>
    where
        S: GraphStorage + ?Sized,
    {
        if !self.use_vertex_filter {
            return Ok(true);
        }
        let Some(filter) = self.vertex_filters.get(vertex.collection()) else {
            return Ok(false);
        };
        if filter.is_never() {
            return Ok(false);
        }
        match storage.fetch_document(vertex.collection(), vertex.key()) {
            Ok(document) => Ok(filter.matches(document.body())),
            Err(Error::DocumentNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// JSON options object accepted by the neighbors entry point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NeighborsRequest {
    min_depth: Option<u64>,
    max_depth: Option<u64>,
    #[serde(default)]
    include_data: bool,
}

/// Options for [`crate::search::run_neighbors_search`].
#[derive(Debug, Clone)]
pub struct NeighborsOptions {
    /// Shared options.
    pub basic: BasicOptions,
    /// Direction in which edges are followed.
    pub direction: Direction,
    /// Minimum depth (inclusive) of reported vertices.
    pub min_depth: u64,
    /// Maximum depth (inclusive) explored.
    pub max_depth: u64,
    explicit_collections: Option<HashSet<String>>,
}

impl NeighborsOptions {
    /// Creates options for direct outbound neighbors of `start`.
    #[must_use]
    pub fn new(start: VertexId) -> Self {
        Self {
            basic: BasicOptions::new(start),
            direction: Direction::Outbound,
            min_depth: 1,
            max_depth: 1,
            explicit_collections: None,
        }
    }

    /// Creates options with the configured depth defaults.
    #[must_use]
    pub fn from_config(start: VertexId, config: &EngineConfig) -> Self {
        Self::new(start).with_depth(config.neighbors.min_depth, config.neighbors.max_depth)
    }

    /// Sets the direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the inclusive depth range.
    #[must_use]
    pub fn with_depth(mut self, min_depth: u64, max_depth: u64) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    /// Applies a query-layer options object (`minDepth`, `maxDepth`,
    /// `includeData`) and returns the `includeData` flag.
    ///
    /// `minDepth` defaults to 1. `maxDepth` defaults to `minDepth`, or to 1
    /// when `minDepth` is 0.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOptions` if the object does not deserialize.
    pub fn apply_json_options(&mut self, options: &Value) -> Result<bool> {
        let request = NeighborsRequest::deserialize(options)
            .map_err(|e| Error::InvalidOptions(format!("neighbors options: {e}")))?;
        self.min_depth = request.min_depth.unwrap_or(1);
        self.max_depth = request
            .max_depth
            .unwrap_or(if self.min_depth == 0 { 1 } else { self.min_depth });
        Ok(request.include_data)
    }

    /// Restricts the search to `collection` (may be called repeatedly).
    pub fn add_collection_restriction(&mut self, collection: &str) {
        self.explicit_collections
            .get_or_insert_with(HashSet::new)
            .insert(collection.to_string());
    }

    /// Returns true if edges of `collection` may be followed.
    #[must_use]
    pub fn allows_collection(&self, collection: &str) -> bool {
        self.explicit_collections
            .as_ref()
            .is_none_or(|allowed| allowed.contains(collection))
    }

    /// Checks the depth range.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOptions` if `min_depth > max_depth`.
    pub fn validate(&self) -> Result<()> {
        if self.min_depth > self.max_depth {
            return Err(Error::InvalidOptions(format!(
                "minDepth {} exceeds maxDepth {}",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }
}

/// Options for the shortest-path searches.
#[derive(Debug, Clone)]
pub struct ShortestPathOptions {
    /// Shared options; `basic.start` is the source vertex.
    pub basic: BasicOptions,
    /// Target vertex.
    pub end: VertexId,
    /// Direction in which edges are followed from `start`.
    pub direction: Direction,
    /// Read weights from `weight_attribute`.
    pub use_weight: bool,
    /// Edge attribute holding the weight.
    pub weight_attribute: String,
    /// Weight of edges lacking a numeric `weight_attribute`.
    pub default_weight: f64,
    /// Expand from both ends.
    pub bidirectional: bool,
    /// Run the two expansions on separate worker threads.
    pub multi_threaded: bool,
}

impl ShortestPathOptions {
    /// Creates unweighted, outbound, bidirectional multi-threaded options.
    #[must_use]
    pub fn new(start: VertexId, end: VertexId) -> Self {
        Self {
            basic: BasicOptions::new(start),
            end,
            direction: Direction::Outbound,
            use_weight: false,
            weight_attribute: String::new(),
            default_weight: 1.0,
            bidirectional: true,
            multi_threaded: true,
        }
    }

    /// Creates options with the configured shortest-path defaults.
    ///
    /// Weighting is enabled when the configuration names a weight attribute.
    #[must_use]
    pub fn from_config(start: VertexId, end: VertexId, config: &EngineConfig) -> Self {
        let defaults = &config.shortest_path;
        let mut options = Self::new(start, end);
        options.bidirectional = defaults.bidirectional;
        options.multi_threaded = defaults.multi_threaded;
        options.default_weight = defaults.default_weight;
        if !defaults.weight_attribute.is_empty() {
            options.use_weight = true;
            options.weight_attribute = defaults.weight_attribute.clone();
        }
        options
    }

    /// Sets the direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Enables weighting by `attribute` with `default_weight` as fallback.
    #[must_use]
    pub fn with_weight(mut self, attribute: &str, default_weight: f64) -> Self {
        self.use_weight = true;
        self.weight_attribute = attribute.to_string();
        self.default_weight = default_weight;
        self
    }

    /// Selects the search strategy.
    #[must_use]
    pub fn with_strategy(mut self, bidirectional: bool, multi_threaded: bool) -> Self {
        self.bidirectional = bidirectional;
        self.multi_threaded = multi_threaded;
        self
    }

    /// Returns the weighting implied by these options.
    #[must_use]
    pub fn edge_weight(&self) -> EdgeWeight {
        EdgeWeight::from_options(self.use_weight, &self.weight_attribute, self.default_weight)
    }

    /// Vertex check that never rejects the two endpoints.
    ///
    /// # Errors
    ///
    /// Storage errors from the vertex lookup.
    pub fn matches_vertex<S>(&self, storage: &S, vertex: &VertexId) -> Result<bool>
    where
        S: GraphStorage + ?Sized,
    {
        if vertex == &self.basic.start || vertex == &self.end {
            return Ok(true);
        }
        self.basic.matches_vertex(storage, vertex)
    }
}

/// Options for [`crate::traverser::DepthFirstTraverser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraverserOptions {
    /// Direction in which edges are followed.
    pub direction: Direction,
    /// Shortest path length returned.
    pub min_depth: u64,
    /// Longest path length explored.
    pub max_depth: u64,
}

impl Default for TraverserOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Outbound,
            min_depth: 1,
            max_depth: 1,
        }
    }
}

impl TraverserOptions {
    /// Creates options for the given direction and inclusive depth range.
    #[must_use]
    pub fn new(direction: Direction, min_depth: u64, max_depth: u64) -> Self {
        Self {
            direction,
            min_depth,
            max_depth,
        }
    }

    /// Creates outbound options with the configured depth defaults.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Direction::Outbound,
            config.traversal.min_depth,
            config.traversal.max_depth,
        )
    }

    /// Checks the depth range.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOptions` if `min_depth > max_depth`.
    pub fn validate(&self) -> Result<()> {
        if self.min_depth > self.max_depth {
            return Err(Error::InvalidOptions(format!(
                "minDepth {} exceeds maxDepth {}",
                self.min_depth, self.max_depth
            )));
        }
        Ok(())
    }
}
