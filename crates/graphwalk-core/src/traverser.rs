//! Depth-first traversal with per-depth filter conditions.
//!
//! [`DepthFirstTraverser`] produces one [`TraversalPath`] per `next` call for
//! a start vertex set with [`DepthFirstTraverser::set_start_vertex`]. Edges
//! are pulled from storage lazily as the search descends; conditions attached
//! to a depth prune candidates at that depth without stopping the search of
//! their siblings.

use crate::document::EdgeDocument;
use crate::edge_collection::{resolve_edge_index, ResolvedEdgeIndex};
use crate::enumerator::{EnumeratedPath, PathEnumerator};
use crate::error::{Error, Result};
use crate::filter::FilterPredicate;
use crate::id::{Direction, VertexId};
use crate::options::TraverserOptions;
use crate::storage::GraphStorage;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// A filter attached to one traversal depth.
#[derive(Debug, Clone, PartialEq)]
pub enum TraversalCondition {
    /// Applies to the edge that reaches the depth.
    Edge(FilterPredicate),
    /// Applies to the vertex at the depth.
    Vertex(FilterPredicate),
}

impl TraversalCondition {
    /// Returns the wrapped predicate.
    #[must_use]
    pub fn predicate(&self) -> &FilterPredicate {
        match self {
            Self::Edge(predicate) | Self::Vertex(predicate) => predicate,
        }
    }
}

/// Conditions keyed by depth. Depth 0 is the start vertex.
pub type DepthConditions = HashMap<u64, Vec<TraversalCondition>>;

/// Counters collected while traversing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    /// Vertex documents fetched to evaluate conditions.
    pub read_documents: u64,
    /// Candidates rejected by a condition.
    pub filtered_paths: u64,
}

/// Edge lookup with a per-collection cache of resolved index handles.
#[derive(Debug)]
pub struct EdgeGetter<'s, S: ?Sized> {
    storage: &'s S,
    resolved: HashMap<String, ResolvedEdgeIndex>,
}

impl<'s, S> EdgeGetter<'s, S>
where
    S: GraphStorage + ?Sized,
{
    /// Creates a getter with an empty cache.
    #[must_use]
    pub fn new(storage: &'s S) -> Self {
        Self {
            storage,
            resolved: HashMap::new(),
        }
    }

    /// Returns the edges of `collection` incident to `vertex`.
    ///
    /// The collection is resolved on first use only.
    ///
    /// # Errors
    ///
    /// Resolution and storage errors.
    pub fn get_edges(
        &mut self,
        collection: &str,
        direction: Direction,
        vertex: &VertexId,
    ) -> Result<Vec<EdgeDocument>> {
        let handle = match self.resolved.get(collection) {
            Some(handle) => *handle,
            None => {
                let handle = resolve_edge_index(self.storage, collection)?;
                self.resolved.insert(collection.to_string(), handle);
                handle
            }
        };
        self.storage
            .fetch_edges_by_vertex(handle.collection, handle.index, direction, vertex)
    }

    /// Number of collections resolved so far.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

/// A path produced by a traversal or a shortest-path search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalPath {
    vertices: Vec<VertexId>,
    edges: Vec<EdgeDocument>,
}

impl TraversalPath {
    pub(crate) fn from_parts(vertices: Vec<VertexId>, edges: Vec<EdgeDocument>) -> Self {
        debug_assert_eq!(vertices.len(), edges.len() + 1);
        Self { vertices, edges }
    }

    fn from_enumerated(path: &EnumeratedPath<VertexId, EdgeDocument>) -> Self {
        Self::from_parts(path.vertices.clone(), path.edges.clone())
    }

    /// Vertices from start to end.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Edges in path order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeDocument] {
        &self.edges
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true for a zero-length path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the last vertex.
    #[must_use]
    pub fn last_vertex(&self) -> Option<&VertexId> {
        self.vertices.last()
    }

    /// Returns the last edge.
    #[must_use]
    pub fn last_edge(&self) -> Option<&EdgeDocument> {
        self.edges.last()
    }

    /// Renders `{"vertices": [...], "edges": [...]}` with full documents.
    ///
    /// Vertices whose document no longer exists render as `null`.
    ///
    /// # Errors
    ///
    /// Storage errors other than a missing document, and
    /// `Error::ResourceExhausted` if the result cannot be allocated.
    pub fn path_to_value<S>(&self, storage: &S) -> Result<Value>
    where
        S: GraphStorage + ?Sized,
    {
        let mut vertices = Vec::new();
        vertices.try_reserve_exact(self.vertices.len())?;
        for vertex in &self.vertices {
            vertices.push(vertex_value(storage, vertex)?);
        }
        let mut edges = Vec::new();
        edges.try_reserve_exact(self.edges.len())?;
        edges.extend(self.edges.iter().map(|edge| edge.body().clone()));
        Ok(json!({ "vertices": vertices, "edges": edges }))
    }

    /// Renders the last edge, `null` for a zero-length path.
    #[must_use]
    pub fn last_edge_to_value(&self) -> Value {
        self.last_edge()
            .map_or(Value::Null, |edge| edge.body().clone())
    }

    /// Renders the last vertex document, `null` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Storage errors other than a missing document.
    pub fn last_vertex_to_value<S>(&self, storage: &S) -> Result<Value>
    where
        S: GraphStorage + ?Sized,
    {
        match self.last_vertex() {
            Some(vertex) => vertex_value(storage, vertex),
            None => Ok(Value::Null),
        }
    }
}

/// Fetches a vertex body; a missing document is `null`.
pub(crate) fn vertex_value<S>(storage: &S, vertex: &VertexId) -> Result<Value>
where
    S: GraphStorage + ?Sized,
{
    match storage.fetch_document(vertex.collection(), vertex.key()) {
        Ok(document) => Ok(document.into_body()),
        Err(Error::DocumentNotFound(_)) => Ok(Value::Null),
        Err(err) => Err(err),
    }
}

fn edge_matches_conditions(conditions: &[TraversalCondition], edge: &EdgeDocument) -> bool {
    conditions.iter().all(|condition| match condition {
        TraversalCondition::Edge(predicate) => predicate.matches(edge.body()),
        TraversalCondition::Vertex(_) => true,
    })
}

fn vertex_matches_conditions<S>(
    storage: &S,
    conditions: &[TraversalCondition],
    vertex: &VertexId,
    stats: &mut TraversalStats,
) -> Result<bool>
where
    S: GraphStorage + ?Sized,
{
    let mut predicates = conditions
        .iter()
        .filter_map(|condition| match condition {
            TraversalCondition::Vertex(predicate) => Some(predicate),
            TraversalCondition::Edge(_) => None,
        })
        .peekable();
    if predicates.peek().is_none() {
        return Ok(true);
    }
    let body = vertex_value(storage, vertex)?;
    if !body.is_null() {
        stats.read_documents += 1;
    }
    Ok(predicates.all(|predicate| predicate.matches(&body)))
}

enum TraverserState {
    Idle,
    Enumerating(PathEnumerator<VertexId, EdgeDocument>),
    Exhausted,
}

/// Lazy depth-first path search over a fixed set of edge collections.
///
/// # Example
///
/// ```rust,ignore
/// let mut traverser = DepthFirstTraverser::new(&storage, &["knows"], options, conditions)?;
/// traverser.set_start_vertex(VertexId::parse("persons/alice")?)?;
/// while let Some(path) = traverser.next()? {
///     println!("{}", path.last_edge_to_value());
/// }
/// ```
pub struct DepthFirstTraverser<'s, S: ?Sized> {
    storage: &'s S,
    edge_collections: Vec<String>,
    options: TraverserOptions,
    conditions: DepthConditions,
    getter: EdgeGetter<'s, S>,
    state: TraverserState,
    stats: TraversalStats,
}

impl<'s, S> DepthFirstTraverser<'s, S>
where
    S: GraphStorage + ?Sized,
{
    /// Creates an idle traverser.
    ///
    /// # Errors
    ///
    /// `Error::InvalidOptions` if the depth range is inverted.
    pub fn new(
        storage: &'s S,
        edge_collections: &[&str],
        options: TraverserOptions,
        conditions: DepthConditions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            storage,
            edge_collections: edge_collections.iter().map(|name| (*name).to_string()).collect(),
            options,
            conditions,
            getter: EdgeGetter::new(storage),
            state: TraverserState::Idle,
            stats: TraversalStats::default(),
        })
    }

    /// Starts a new traversal at `start`, discarding any previous one.
    ///
    /// # Errors
    ///
    /// Storage errors raised while checking the start vertex.
    pub fn set_start_vertex(&mut self, start: VertexId) -> Result<()> {
        self.stats = TraversalStats::default();
        self.state = TraverserState::Exhausted;

        if self.unsatisfiable() {
            tracing::debug!(start = %start, "traversal conditions can never match");
            return Ok(());
        }
        if let Some(conditions) = self.conditions.get(&0) {
            if !vertex_matches_conditions(self.storage, conditions, &start, &mut self.stats)? {
                self.stats.filtered_paths += 1;
                tracing::debug!(start = %start, "start vertex rejected");
                return Ok(());
            }
        }

        tracing::debug!(
            start = %start,
            min_depth = self.options.min_depth,
            max_depth = self.options.max_depth,
            "starting traversal"
        );
        self.state = TraverserState::Enumerating(PathEnumerator::new(start, self.options.max_depth));
        Ok(())
    }

    /// Returns the next path, or `None` once the traversal is exhausted.
    ///
    /// Returns `None` before the first `set_start_vertex` call.
    ///
    /// # Errors
    ///
    /// Storage errors; the traversal is exhausted afterwards.
    pub fn next(&mut self) -> Result<Option<TraversalPath>> {
        let TraverserState::Enumerating(enumerator) = &mut self.state else {
            return Ok(None);
        };

        let storage = self.storage;
        let direction = self.options.direction;
        let min_depth = self.options.min_depth;
        let collections = &self.edge_collections;
        let conditions = &self.conditions;
        let getter = &mut self.getter;
        let stats = &mut self.stats;

        let outcome = loop {
            let step = enumerator.next(|vertex, depth| {
                expand(storage, getter, collections, conditions.get(&depth), direction, vertex, stats)
            });
            match step {
                Ok(Some(path)) if (path.len() as u64) < min_depth => {}
                Ok(Some(path)) => return Ok(Some(TraversalPath::from_enumerated(path))),
                Ok(None) => break Ok(None),
                Err(err) => break Err(err),
            }
        };

        tracing::debug!(
            read_documents = self.stats.read_documents,
            filtered_paths = self.stats.filtered_paths,
            "traversal exhausted"
        );
        self.state = TraverserState::Exhausted;
        outcome
    }

    /// Counters of the current traversal.
    #[must_use]
    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    /// A `NeverMatches` condition at or above the minimum depth rules out
    /// every reportable path.
    fn unsatisfiable(&self) -> bool {
        self.conditions.iter().any(|(depth, conditions)| {
            conditions.iter().any(|condition| {
                let applies = match condition {
                    TraversalCondition::Vertex(_) => *depth <= self.options.min_depth,
                    TraversalCondition::Edge(_) => (1..=self.options.min_depth).contains(depth),
                };
                applies && condition.predicate().is_never()
            })
        })
    }
}

/// Candidates of `vertex` at `depth` that pass the depth's conditions.
fn expand<S>(
    storage: &S,
    getter: &mut EdgeGetter<'_, S>,
    collections: &[String],
    conditions: Option<&Vec<TraversalCondition>>,
    direction: Direction,
    vertex: &VertexId,
    stats: &mut TraversalStats,
) -> Result<Vec<(EdgeDocument, VertexId)>>
where
    S: GraphStorage + ?Sized,
{
    let conditions = conditions.map_or(&[][..], Vec::as_slice);
    if conditions.iter().any(|condition| condition.predicate().is_never()) {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for collection in collections {
        for edge in getter.get_edges(collection, direction, vertex)? {
            if !edge_matches_conditions(conditions, &edge) {
                stats.filtered_paths += 1;
                continue;
            }
            let target = edge.opposite(vertex, direction).clone();
            if !vertex_matches_conditions(storage, conditions, &target, stats)? {
                stats.filtered_paths += 1;
                continue;
            }
            candidates.try_reserve(1)?;
            candidates.push((edge, target));
        }
    }
    tracing::trace!(vertex = %vertex, candidates = candidates.len(), "expanded vertex");
    Ok(candidates)
}
