//! # `GraphWalk` Core
//!
//! Graph traversal and path-search engine for document stores that keep
//! edges in dedicated edge collections.
//!
//! The engine does not own any data. It reads vertices and edges on demand
//! through the [`GraphStorage`] trait and answers four kinds of questions:
//!
//! - **Neighbors**: distinct vertices within a depth range of a start vertex
//! - **Shortest path**: minimum-weight path, optionally bidirectional and
//!   multi-threaded
//! - **Simple shortest path**: minimum-hop path
//! - **Traversal**: lazy depth-first enumeration of paths, with per-depth
//!   filter conditions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphwalk_core::{
//!     run_neighbors_search, CollectionKind, EdgeCollectionInfo, MemoryStorage,
//!     NeighborsOptions, VertexId,
//! };
//! use serde_json::json;
//!
//! let storage = MemoryStorage::new();
//! storage.create_collection("persons", CollectionKind::Document)?;
//! storage.create_collection("knows", CollectionKind::Edge)?;
//! let alice = storage.insert_document("persons", "alice", json!({"age": 31}))?;
//! let bob = storage.insert_document("persons", "bob", json!({"age": 29}))?;
//! storage.insert_edge("knows", "e1", alice.as_str(), bob.as_str(), json!({}))?;
//!
//! let knows = [EdgeCollectionInfo::new(&storage, "knows")];
//! let neighbors = run_neighbors_search(&knows, &NeighborsOptions::new(alice))?;
//! assert!(neighbors.contains(&bob));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::significant_drop_in_scrutinee)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod document;
#[cfg(test)]
mod document_tests;
pub mod edge_collection;
pub mod enumerator;
#[cfg(test)]
mod enumerator_tests;
pub mod error;
pub mod filter;
pub mod id;
#[cfg(test)]
mod id_tests;
pub mod options;
pub mod path_finder;
pub mod search;
pub mod storage;
pub mod traverser;
#[cfg(test)]
mod traverser_tests;

pub use config::{ConfigError, EngineConfig};
pub use document::{Document, EdgeDocument};
pub use edge_collection::{EdgeCollectionInfo, EdgeWeight};
pub use error::{Error, Result};
pub use filter::FilterPredicate;
pub use id::{Direction, EdgeId, VertexId};
pub use options::{BasicOptions, NeighborsOptions, ShortestPathOptions, TraverserOptions};
pub use search::{
    run_edges_search, run_neighbors_search, run_neighbors_search_with_documents,
    run_shortest_path_search, run_simple_shortest_path_search, EdgeMatch, ShortestPathResult,
};
pub use storage::{CollectionKind, GraphStorage, MemoryStorage};
pub use traverser::{
    DepthConditions, DepthFirstTraverser, TraversalCondition, TraversalPath, TraversalStats,
};
