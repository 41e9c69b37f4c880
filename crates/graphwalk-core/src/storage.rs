//! Storage collaborator interface.
//!
//! The engine never owns documents. It asks a [`GraphStorage`] implementation
//! (the transaction manager of the surrounding database) to resolve
//! collections, enumerate their indexes, look up edges through an edge index,
//! and fetch single documents. All calls happen inside a caller-managed
//! transactional scope, so implementations must return a consistent view for
//! the duration of one search.
//!
//! [`MemoryStorage`] is a complete in-memory implementation used by the test
//! suite and by embedders that keep small graphs in RAM.

use crate::document::{Document, EdgeDocument};
use crate::error::{Error, Result};
use crate::id::{Direction, EdgeId, VertexId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Opaque collection handle issued by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub u64);

/// Opaque index handle issued by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexId(pub u64);

/// Kind of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Plain documents (vertices).
    Document,
    /// Edge documents with `_from`/`_to`.
    Edge,
}

/// Kind of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Primary key index, present on every collection.
    Primary,
    /// `_from`/`_to` lookup index, present on edge collections.
    Edge,
}

/// Description of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Index handle.
    pub id: IndexId,
    /// Index kind.
    pub kind: IndexKind,
}

/// Description of a collection as returned by [`GraphStorage::load_collection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMeta {
    /// Collection handle.
    pub id: CollectionId,
    /// Collection name.
    pub name: String,
    /// Collection kind.
    pub kind: CollectionKind,
    /// All indexes of the collection.
    pub indexes: Vec<IndexMeta>,
}

impl CollectionMeta {
    /// Returns the edge index, if the collection has one.
    #[must_use]
    pub fn edge_index(&self) -> Option<IndexId> {
        self.indexes
            .iter()
            .find(|index| index.kind == IndexKind::Edge)
            .map(|index| index.id)
    }
}

/// Read interface the engine consumes.
///
/// Implementations must be shareable across the two workers of a
/// multi-threaded bidirectional shortest-path search.
pub trait GraphStorage: Send + Sync {
    /// Resolves a collection name.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound` if no such collection exists.
    fn resolve_collection_id(&self, name: &str) -> Result<CollectionId>;

    /// Loads collection metadata, including its indexes.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound` if the handle is stale.
    fn load_collection(&self, id: CollectionId) -> Result<CollectionMeta>;

    /// Returns the edges incident to `vertex` in `direction`, in index order.
    ///
    /// For [`Direction::Any`] outbound edges come first, then inbound ones; a
    /// self-loop therefore appears twice.
    ///
    /// # Errors
    ///
    /// `Error::EdgeIndexNotFound` if `index` is not an edge index of
    /// `collection`.
    fn fetch_edges_by_vertex(
        &self,
        collection: CollectionId,
        index: IndexId,
        direction: Direction,
        vertex: &VertexId,
    ) -> Result<Vec<EdgeDocument>>;

    /// Fetches a single document by collection name and key.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound` or `Error::DocumentNotFound`.
    fn fetch_document(&self, collection: &str, key: &str) -> Result<Document>;
}

/// One collection of a [`MemoryStorage`].
#[derive(Debug)]
struct MemoryCollection {
    meta: CollectionMeta,
    documents: FxHashMap<String, Document>,
    edges: FxHashMap<String, EdgeDocument>,
    /// Outgoing edges: source vertex -> edge keys in insertion order
    outgoing: FxHashMap<VertexId, Vec<String>>,
    /// Incoming edges: target vertex -> edge keys in insertion order
    incoming: FxHashMap<VertexId, Vec<String>>,
}

impl MemoryCollection {
    fn collect_edges(
        &self,
        index: &FxHashMap<VertexId, Vec<String>>,
        vertex: &VertexId,
        out: &mut Vec<EdgeDocument>,
    ) {
        if let Some(keys) = index.get(vertex) {
            out.extend(keys.iter().filter_map(|key| self.edges.get(key)).cloned());
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    names: FxHashMap<String, CollectionId>,
    collections: FxHashMap<CollectionId, MemoryCollection>,
    next_id: u64,
}

/// Counters of storage calls, used to observe caching behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageCallCounts {
    /// Calls to `resolve_collection_id`.
    pub resolves: usize,
    /// Calls to `load_collection`.
    pub loads: usize,
    /// Calls to `fetch_edges_by_vertex`.
    pub edge_lookups: usize,
    /// Calls to `fetch_document`.
    pub document_fetches: usize,
}

/// Thread-safe in-memory graph store.
///
/// Edge collections get a primary and an edge index; document collections
/// only a primary index, so they cannot be traversed.
///
/// # Example
///
/// ```rust,ignore
/// use graphwalk_core::storage::{CollectionKind, MemoryStorage};
/// use serde_json::json;
///
/// let storage = MemoryStorage::new();
/// storage.create_collection("persons", CollectionKind::Document)?;
/// storage.create_collection("knows", CollectionKind::Edge)?;
/// storage.insert_document("persons", "alice", json!({"age": 31}))?;
/// storage.insert_document("persons", "bob", json!({}))?;
/// storage.insert_edge("knows", "ab", "persons/alice", "persons/bob", json!({}))?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
    resolves: AtomicUsize,
    loads: AtomicUsize,
    edge_lookups: AtomicUsize,
    document_fetches: AtomicUsize,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection and its indexes.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if a collection with that name already exists.
    pub fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<CollectionId> {
        let mut inner = self.inner.write();
        if inner.names.contains_key(name) {
            return Err(Error::Storage(format!("duplicate collection name '{name}'")));
        }
        inner.next_id += 1;
        let id = CollectionId(inner.next_id);
        let mut indexes = vec![IndexMeta {
            id: IndexId(id.0 * 10),
            kind: IndexKind::Primary,
        }];
        if kind == CollectionKind::Edge {
            indexes.push(IndexMeta {
                id: IndexId(id.0 * 10 + 1),
                kind: IndexKind::Edge,
            });
        }
        inner.names.insert(name.to_string(), id);
        inner.collections.insert(
            id,
            MemoryCollection {
                meta: CollectionMeta {
                    id,
                    name: name.to_string(),
                    kind,
                    indexes,
                },
                documents: FxHashMap::default(),
                edges: FxHashMap::default(),
                outgoing: FxHashMap::default(),
                incoming: FxHashMap::default(),
            },
        );
        Ok(id)
    }

    /// Inserts a vertex document.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound`, `Error::MalformedIdentifier` for an invalid
    /// key, or `Error::Storage` for a duplicate key.
    pub fn insert_document(&self, collection: &str, key: &str, body: Value) -> Result<VertexId> {
        let id = VertexId::from_parts(collection, key)?;
        let mut inner = self.inner.write();
        let target = Self::collection_mut(&mut inner, collection)?;
        if target.documents.contains_key(key) {
            return Err(Error::Storage(format!("unique constraint violated for '{id}'")));
        }
        target
            .documents
            .insert(key.to_string(), Document::new(id.clone(), body));
        Ok(id)
    }

    /// Inserts an edge document and indexes it in both directions.
    ///
    /// Endpoints are not checked for existence; dangling edges are legal.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound`, `Error::EdgeIndexNotFound` for a document
    /// collection, `Error::MalformedIdentifier` for bad endpoints, or
    /// `Error::Storage` for a duplicate key.
    pub fn insert_edge(
        &self,
        collection: &str,
        key: &str,
        from: &str,
        to: &str,
        body: Value,
    ) -> Result<EdgeId> {
        let id = EdgeId::from_parts(collection, key)?;
        let source = VertexId::parse(from)?;
        let target = VertexId::parse(to)?;
        let mut inner = self.inner.write();
        let edges = Self::collection_mut(&mut inner, collection)?;
        if edges.meta.kind != CollectionKind::Edge {
            return Err(Error::EdgeIndexNotFound(collection.to_string()));
        }
        if edges.edges.contains_key(key) {
            return Err(Error::Storage(format!("unique constraint violated for '{id}'")));
        }

        // Add to outgoing index
        edges
            .outgoing
            .entry(source.clone())
            .or_default()
            .push(key.to_string());

        // Add to incoming index
        edges
            .incoming
            .entry(target.clone())
            .or_default()
            .push(key.to_string());

        edges.edges.insert(
            key.to_string(),
            EdgeDocument::new(id.clone(), source, target, body),
        );
        Ok(id)
    }

    /// Removes a vertex document. Incident edges are left dangling.
    ///
    /// # Errors
    ///
    /// `Error::CollectionNotFound` or `Error::DocumentNotFound`.
    pub fn remove_document(&self, collection: &str, key: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let target = Self::collection_mut(&mut inner, collection)?;
        target
            .documents
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::DocumentNotFound(format!("{collection}/{key}")))
    }

    /// Returns how often each storage entry point was called.
    #[must_use]
    pub fn call_counts(&self) -> StorageCallCounts {
        StorageCallCounts {
            resolves: self.resolves.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            edge_lookups: self.edge_lookups.load(Ordering::Relaxed),
            document_fetches: self.document_fetches.load(Ordering::Relaxed),
        }
    }

    fn collection_mut<'a>(
        inner: &'a mut MemoryInner,
        name: &str,
    ) -> Result<&'a mut MemoryCollection> {
        let id = inner
            .names
            .get(name)
            .copied()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))?;
        inner
            .collections
            .get_mut(&id)
            .ok_or_else(|| Error::Internal(format!("dangling collection handle for '{name}'")))
    }
}

impl GraphStorage for MemoryStorage {
    fn resolve_collection_id(&self, name: &str) -> Result<CollectionId> {
        self.resolves.fetch_add(1, Ordering::Relaxed);
        self.inner
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    fn load_collection(&self, id: CollectionId) -> Result<CollectionMeta> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.inner
            .read()
            .collections
            .get(&id)
            .map(|collection| collection.meta.clone())
            .ok_or_else(|| Error::CollectionNotFound(format!("#{}", id.0)))
    }

    fn fetch_edges_by_vertex(
        &self,
        collection: CollectionId,
        index: IndexId,
        direction: Direction,
        vertex: &VertexId,
    ) -> Result<Vec<EdgeDocument>> {
        self.edge_lookups.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.read();
        let edges = inner
            .collections
            .get(&collection)
            .ok_or_else(|| Error::CollectionNotFound(format!("#{}", collection.0)))?;
        if edges.meta.edge_index() != Some(index) {
            return Err(Error::EdgeIndexNotFound(edges.meta.name.clone()));
        }

        let mut result = Vec::new();
        match direction {
            Direction::Outbound => edges.collect_edges(&edges.outgoing, vertex, &mut result),
            Direction::Inbound => edges.collect_edges(&edges.incoming, vertex, &mut result),
            Direction::Any => {
                edges.collect_edges(&edges.outgoing, vertex, &mut result);
                edges.collect_edges(&edges.incoming, vertex, &mut result);
            }
        }
        Ok(result)
    }

    fn fetch_document(&self, collection: &str, key: &str) -> Result<Document> {
        self.document_fetches.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.read();
        let id = inner
            .names
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        inner
            .collections
            .get(id)
            .and_then(|c| c.documents.get(key))
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(format!("{collection}/{key}")))
    }
}
