//! Direction-aware access to one edge collection.
//!
//! [`EdgeCollectionInfo`] wraps a collection name, resolves it to a collection
//! and edge-index handle the first time edges are requested, and keeps that
//! pair for the rest of the request. It also knows how to turn an edge into a
//! numeric weight for the shortest-path search.

use crate::document::EdgeDocument;
use crate::error::{Error, Result};
use crate::id::{Direction, VertexId};
use crate::storage::{CollectionId, GraphStorage, IndexId};
use std::sync::OnceLock;

/// Collection and edge-index handle of a traversable edge collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEdgeIndex {
    /// Collection handle.
    pub collection: CollectionId,
    /// Edge index handle.
    pub index: IndexId,
}

/// Resolves `name` and picks its edge index.
///
/// # Errors
///
/// `Error::CollectionNotFound` if the name does not resolve, and
/// `Error::EdgeIndexNotFound` if the collection has no edge index.
pub fn resolve_edge_index<S>(storage: &S, name: &str) -> Result<ResolvedEdgeIndex>
where
    S: GraphStorage + ?Sized,
{
    let collection = storage.resolve_collection_id(name)?;
    let meta = storage.load_collection(collection)?;
    let index = meta
        .edge_index()
        .ok_or_else(|| Error::EdgeIndexNotFound(name.to_string()))?;
    tracing::trace!(collection = name, index = index.0, "resolved edge index");
    Ok(ResolvedEdgeIndex { collection, index })
}

/// How an edge is turned into a distance.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeWeight {
    /// Every edge has the same weight.
    Constant(f64),
    /// Weight is read from a numeric attribute, with a fallback.
    Attribute {
        /// Attribute name on the edge document.
        name: String,
        /// Weight used when the attribute is absent or not a finite number.
        default: f64,
    },
}

impl Default for EdgeWeight {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl EdgeWeight {
    /// Builds the weighting configured by shortest-path style parameters.
    ///
    /// With `use_weight == false` every edge weighs `1.0`.
    #[must_use]
    pub fn from_options(use_weight: bool, attribute: &str, default: f64) -> Self {
        if use_weight && !attribute.is_empty() {
            Self::Attribute {
                name: attribute.to_string(),
                default,
            }
        } else if use_weight {
            Self::Constant(default)
        } else {
            Self::Constant(1.0)
        }
    }

    /// Returns the weight of `edge`.
    #[must_use]
    pub fn weigh(&self, edge: &EdgeDocument) -> f64 {
        match self {
            Self::Constant(weight) => *weight,
            Self::Attribute { name, default } => edge
                .attribute(name)
                .and_then(serde_json::Value::as_f64)
                .filter(|weight| weight.is_finite())
                .unwrap_or(*default),
        }
    }
}

/// Handle on one edge collection for the duration of a request.
///
/// The index handle is resolved at most once per instance. Searches that fan
/// out to worker threads call [`EdgeCollectionInfo::resolve`] before spawning
/// so that workers only ever read the cached value.
#[derive(Debug)]
pub struct EdgeCollectionInfo<'s, S: ?Sized> {
    storage: &'s S,
    name: String,
    resolved: OnceLock<ResolvedEdgeIndex>,
    weight: EdgeWeight,
}

impl<'s, S> EdgeCollectionInfo<'s, S>
where
    S: GraphStorage + ?Sized,
{
    /// Creates a handle with constant weight `1.0`.
    #[must_use]
    pub fn new(storage: &'s S, name: &str) -> Self {
        Self::with_weight(storage, name, EdgeWeight::default())
    }

    /// Creates a handle with a custom weighting.
    #[must_use]
    pub fn with_weight(storage: &'s S, name: &str, weight: EdgeWeight) -> Self {
        Self {
            storage,
            name: name.to_string(),
            resolved: OnceLock::new(),
            weight,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage this collection lives in.
    #[must_use]
    pub fn storage(&self) -> &'s S {
        self.storage
    }

    /// Returns true once the index handle has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolves (or returns the cached) collection and edge-index handle.
    ///
    /// # Errors
    ///
    /// Propagates `Error::CollectionNotFound` / `Error::EdgeIndexNotFound`.
    pub fn resolve(&self) -> Result<ResolvedEdgeIndex> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(*resolved);
        }
        let resolved = resolve_edge_index(self.storage, &self.name)?;
        Ok(*self.resolved.get_or_init(|| resolved))
    }

    /// Returns the edges incident to `vertex` in `direction`.
    ///
    /// # Errors
    ///
    /// Resolution errors and storage errors are propagated unchanged.
    pub fn get_edges(&self, direction: Direction, vertex: &VertexId) -> Result<Vec<EdgeDocument>> {
        let resolved = self.resolve()?;
        self.storage
            .fetch_edges_by_vertex(resolved.collection, resolved.index, direction, vertex)
    }

    /// Returns the weight of `edge` under this collection's weighting.
    #[must_use]
    pub fn weight_edge(&self, edge: &EdgeDocument) -> f64 {
        self.weight.weigh(edge)
    }
}
