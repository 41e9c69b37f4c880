//! Search drivers.
//!
//! Each driver takes the edge collections to follow plus an options value and
//! runs one complete search:
//!
//! - [`run_neighbors_search`]: distinct vertices within a depth range
//! - [`run_shortest_path_search`]: minimum-weight path (Dijkstra)
//! - [`run_simple_shortest_path_search`]: minimum-hop path (BFS)
//! - [`run_edges_search`]: edges incident to one vertex
//!
//! Shortest-path searches resolve every collection before they start, so a
//! multi-threaded search never resolves from a worker thread.

use crate::document::{Document, EdgeDocument};
use crate::edge_collection::EdgeCollectionInfo;
use crate::error::{Error, Result};
use crate::filter::FilterPredicate;
use crate::id::{Direction, VertexId};
use crate::options::{NeighborsOptions, ShortestPathOptions};
use crate::path_finder::{ConstDistanceFinder, Neighbor, PathFinder, SearchStrategy, ShortestPath};
use crate::storage::GraphStorage;
use crate::traverser::{vertex_value, TraversalPath};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::Value;

/// Result of a shortest-path search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPathResult {
    /// The path from start to end.
    pub path: TraversalPath,
    /// Sum of edge weights (edge count for the unweighted search).
    pub distance: f64,
}

impl ShortestPathResult {
    fn from_path<W>(found: ShortestPath<VertexId, EdgeDocument, W>, distance: f64) -> Self {
        Self {
            path: TraversalPath::from_parts(found.vertices, found.edges),
            distance,
        }
    }
}

/// One edge returned by [`run_edges_search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeMatch {
    /// The edge.
    pub edge: EdgeDocument,
    /// Opposite vertex document when requested; `Some(Value::Null)` if it no
    /// longer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex: Option<Value>,
}

/// Collects the distinct vertices reachable from the start vertex within
/// `[min_depth, max_depth]` edges.
///
/// A vertex counts at the depth it is first discovered and is expanded once.
/// The start vertex is only reported for `min_depth == 0`. Vertex filters
/// decide what is reported, not what is expanded.
///
/// # Errors
///
/// `Error::InvalidOptions` for an inverted depth range, resolution and
/// storage errors, and `Error::ResourceExhausted` if the result cannot grow.
pub fn run_neighbors_search<S>(
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &NeighborsOptions,
) -> Result<IndexSet<VertexId>>
where
    S: GraphStorage + ?Sized,
{
    options.validate()?;
    let start = &options.basic.start;
    let direction = options.direction;
    tracing::debug!(
        start = %start,
        direction = %direction,
        min_depth = options.min_depth,
        max_depth = options.max_depth,
        collections = collections.len(),
        "neighbors search"
    );

    let active: Vec<&EdgeCollectionInfo<'_, S>> = collections
        .iter()
        .filter(|info| {
            options.allows_collection(info.name())
                && !options.basic.edge_collection_excluded(info.name())
        })
        .collect();

    let mut result = IndexSet::new();
    if options.min_depth == 0 {
        result.insert(start.clone());
    }
    let mut visited = FxHashSet::default();
    visited.insert(start.clone());
    let mut frontier = vec![start.clone()];
    let mut depth = 0;

    while depth < options.max_depth && !frontier.is_empty() {
        depth += 1;
        let mut next = Vec::new();
        for vertex in &frontier {
            for info in &active {
                for edge in info.get_edges(direction, vertex)? {
                    if !options.basic.matches_edge(&edge) {
                        continue;
                    }
                    let target = edge.opposite(vertex, direction);
                    if !visited.insert(target.clone()) {
                        continue;
                    }
                    // The vertex filter only gates the result; rejected
                    // vertices are still expanded.
                    if depth >= options.min_depth
                        && options.basic.matches_vertex(info.storage(), target)?
                    {
                        result
                            .try_reserve(1)
                            .map_err(|e| Error::ResourceExhausted(e.to_string()))?;
                        result.insert(target.clone());
                    }
                    if depth < options.max_depth {
                        next.try_reserve(1)?;
                        next.push(target.clone());
                    }
                }
            }
        }
        tracing::trace!(depth, discovered = next.len(), "neighbors level done");
        frontier = next;
    }

    tracing::debug!(start = %start, found = result.len(), "neighbors search done");
    Ok(result)
}

/// Like [`run_neighbors_search`], returning the vertex documents.
///
/// # Errors
///
/// Everything [`run_neighbors_search`] returns, plus
/// `Error::DocumentNotFound` for a neighbor without a document.
pub fn run_neighbors_search_with_documents<S>(
    storage: &S,
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &NeighborsOptions,
) -> Result<Vec<Document>>
where
    S: GraphStorage + ?Sized,
{
    let ids = run_neighbors_search(collections, options)?;
    let mut documents = Vec::new();
    documents.try_reserve_exact(ids.len())?;
    for id in &ids {
        documents.push(storage.fetch_document(id.collection(), id.key())?);
    }
    Ok(documents)
}

/// Weighted neighbors of `vertex` in `direction`, with every filter applied.
fn weighted_neighbors<S>(
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &ShortestPathOptions,
    direction: Direction,
    vertex: &VertexId,
) -> Result<Vec<Neighbor<VertexId, EdgeDocument, f64>>>
where
    S: GraphStorage + ?Sized,
{
    let mut neighbors = Vec::new();
    for info in collections {
        if options.basic.edge_collection_excluded(info.name()) {
            continue;
        }
        for edge in info.get_edges(direction, vertex)? {
            if !options.basic.matches_edge(&edge) {
                continue;
            }
            let next = edge.opposite(vertex, direction).clone();
            if !options.matches_vertex(info.storage(), &next)? {
                continue;
            }
            let weight = info.weight_edge(&edge);
            if weight.is_nan() || weight < 0.0 {
                return Err(Error::InvalidOptions(format!(
                    "edge '{}' has negative weight {weight}",
                    edge.id()
                )));
            }
            neighbors.try_reserve(1)?;
            neighbors.push(Neighbor {
                vertex: next,
                edge,
                weight,
            });
        }
    }
    tracing::trace!(vertex = %vertex, direction = %direction, count = neighbors.len(), "expanded vertex");
    Ok(neighbors)
}

/// Finds a minimum-weight path between the option's start and end vertices.
///
/// Weights come from each collection's [`EdgeCollectionInfo::weight_edge`];
/// build the infos with [`ShortestPathOptions::edge_weight`] to honor the
/// option's weighting.
///
/// # Errors
///
/// Resolution and storage errors, and `Error::InvalidOptions` for an edge
/// with a negative weight.
pub fn run_shortest_path_search<S>(
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &ShortestPathOptions,
) -> Result<Option<ShortestPathResult>>
where
    S: GraphStorage + ?Sized,
{
    let start = &options.basic.start;
    let strategy = SearchStrategy::from_flags(options.bidirectional, options.multi_threaded);
    tracing::debug!(
        start = %start,
        end = %options.end,
        direction = %options.direction,
        strategy = ?strategy,
        "shortest path search"
    );

    for info in collections {
        info.resolve()?;
    }

    let forward = options.direction;
    let backward = forward.reverse();
    let finder = PathFinder::new(
        |vertex: &VertexId| weighted_neighbors(collections, options, forward, vertex),
        |vertex: &VertexId| weighted_neighbors(collections, options, backward, vertex),
        strategy,
    );

    let result = finder
        .shortest_path(start, &options.end)?
        .map(|found| {
            let distance = found.distance;
            ShortestPathResult::from_path(found, distance)
        });
    log_outcome(start, &options.end, result.as_ref());
    Ok(result)
}

/// Unweighted neighbors of `vertex` in `direction`.
fn hop_neighbors<S>(
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &ShortestPathOptions,
    direction: Direction,
    vertex: &VertexId,
) -> Result<Vec<(EdgeDocument, VertexId)>>
where
    S: GraphStorage + ?Sized,
{
    let mut neighbors = Vec::new();
    for info in collections {
        if options.basic.edge_collection_excluded(info.name()) {
            continue;
        }
        for edge in info.get_edges(direction, vertex)? {
            if !options.basic.matches_edge(&edge) {
                continue;
            }
            let next = edge.opposite(vertex, direction).clone();
            if options.matches_vertex(info.storage(), &next)? {
                neighbors.try_reserve(1)?;
                neighbors.push((edge, next));
            }
        }
    }
    Ok(neighbors)
}

/// Finds a path with the fewest edges between the option's start and end
/// vertices. Weighting options are ignored.
///
/// # Errors
///
/// Resolution and storage errors.
pub fn run_simple_shortest_path_search<S>(
    collections: &[EdgeCollectionInfo<'_, S>],
    options: &ShortestPathOptions,
) -> Result<Option<ShortestPathResult>>
where
    S: GraphStorage + ?Sized,
{
    let start = &options.basic.start;
    tracing::debug!(
        start = %start,
        end = %options.end,
        direction = %options.direction,
        bidirectional = options.bidirectional,
        "simple shortest path search"
    );

    for info in collections {
        info.resolve()?;
    }

    let forward = options.direction;
    let backward = forward.reverse();
    let finder = ConstDistanceFinder::new(
        |vertex: &VertexId| hop_neighbors(collections, options, forward, vertex),
        |vertex: &VertexId| hop_neighbors(collections, options, backward, vertex),
        options.bidirectional,
    );

    #[allow(clippy::cast_precision_loss)]
    let result = finder
        .shortest_path(start, &options.end)?
        .map(|found| {
            let distance = found.distance as f64;
            ShortestPathResult::from_path(found, distance)
        });
    log_outcome(start, &options.end, result.as_ref());
    Ok(result)
}

fn log_outcome(start: &VertexId, end: &VertexId, result: Option<&ShortestPathResult>) {
    match result {
        Some(found) => tracing::debug!(
            start = %start,
            end = %end,
            hops = found.path.len(),
            distance = found.distance,
            "shortest path found"
        ),
        None => tracing::debug!(start = %start, end = %end, "no path"),
    }
}

/// Returns the edges of `info` incident to `vertex` that pass `filter`.
///
/// With `include_vertices`, every match also carries the document of the
/// vertex on the other side of the edge (`null` if it no longer exists).
///
/// # Errors
///
/// `Error::MalformedIdentifier` for an invalid `vertex`,
/// `Error::CollectionNotFound` if its collection does not exist, plus
/// resolution and storage errors.
pub fn run_edges_search<S>(
    info: &EdgeCollectionInfo<'_, S>,
    vertex: &str,
    direction: Direction,
    filter: Option<&FilterPredicate>,
    include_vertices: bool,
) -> Result<Vec<EdgeMatch>>
where
    S: GraphStorage + ?Sized,
{
    let vertex = VertexId::parse(vertex)?;
    let storage = info.storage();
    storage.resolve_collection_id(vertex.collection())?;
    tracing::debug!(
        vertex = %vertex,
        collection = info.name(),
        direction = %direction,
        "edges search"
    );

    if filter.is_some_and(FilterPredicate::is_never) {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for edge in info.get_edges(direction, &vertex)? {
        if filter.is_some_and(|filter| !filter.matches(edge.body())) {
            continue;
        }
        let opposite = if include_vertices {
            Some(vertex_value(storage, edge.opposite(&vertex, direction))?)
        } else {
            None
        };
        matches.try_reserve(1)?;
        matches.push(EdgeMatch {
            edge,
            vertex: opposite,
        });
    }
    tracing::debug!(vertex = %vertex, found = matches.len(), "edges search done");
    Ok(matches)
}
