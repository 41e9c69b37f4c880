//! Error types for `GraphWalk`.
//!
//! All traversal and search operations return [`Result`]. Storage-layer
//! failures travel through the engine unchanged; the only condition the engine
//! downgrades is a filter that can never match, which is not an error at all
//! (see [`crate::filter::FilterPredicate::NeverMatches`]).

use thiserror::Error;

/// Result type alias for `GraphWalk` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while traversing or searching a graph.
///
/// Error codes follow the pattern `GW-XXX` so that the query layer can map
/// them onto its own error numbers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Collection not found (GW-001).
    #[error("[GW-001] Collection '{0}' not found")]
    CollectionNotFound(String),

    /// The collection exists but carries no edge index (GW-002).
    #[error("[GW-002] Collection '{0}' has no edge index and cannot be traversed")]
    EdgeIndexNotFound(String),

    /// Document not found (GW-003).
    #[error("[GW-003] Document '{0}' not found")]
    DocumentNotFound(String),

    /// Identifier is not of the form `collection/key` (GW-004).
    #[error("[GW-004] Malformed document identifier '{0}'")]
    MalformedIdentifier(String),

    /// Identifier belongs to another collection than the declared one (GW-005).
    #[error("[GW-005] Specified collection '{declared}' does not match identifier collection '{actual}'")]
    CollectionMismatch {
        /// Collection named by the caller.
        declared: String,
        /// Collection embedded in the identifier.
        actual: String,
    },

    /// Unknown traversal direction (GW-006).
    #[error("[GW-006] Invalid direction '{0}', expected one of: outbound, inbound, any")]
    InvalidDirection(String),

    /// Filter example has an unsupported shape (GW-007).
    #[error("[GW-007] Invalid filter example: {0}")]
    InvalidFilter(String),

    /// Search options are inconsistent (GW-008).
    #[error("[GW-008] Invalid options: {0}")]
    InvalidOptions(String),

    /// Allocation failed while assembling a result (GW-009).
    #[error("[GW-009] Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Storage backend failure (GW-010).
    #[error("[GW-010] Storage error: {0}")]
    Storage(String),

    /// Internal error (GW-011).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[GW-011] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "GW-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CollectionNotFound(_) => "GW-001",
            Self::EdgeIndexNotFound(_) => "GW-002",
            Self::DocumentNotFound(_) => "GW-003",
            Self::MalformedIdentifier(_) => "GW-004",
            Self::CollectionMismatch { .. } => "GW-005",
            Self::InvalidDirection(_) => "GW-006",
            Self::InvalidFilter(_) => "GW-007",
            Self::InvalidOptions(_) => "GW-008",
            Self::ResourceExhausted(_) => "GW-009",
            Self::Storage(_) => "GW-010",
            Self::Internal(_) => "GW-011",
        }
    }

    /// Returns true for the "something is missing" family of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound(_) | Self::EdgeIndexNotFound(_) | Self::DocumentNotFound(_)
        )
    }

    /// Returns true if the error was caused by caller input rather than by
    /// the state of the store.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentifier(_)
                | Self::CollectionMismatch { .. }
                | Self::InvalidDirection(_)
                | Self::InvalidFilter(_)
                | Self::InvalidOptions(_)
        )
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::ResourceExhausted(err.to_string())
    }
}
