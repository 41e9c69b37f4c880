//! Document identifiers and traversal direction.
//!
//! Vertices and edges are addressed by handles of the form `collection/key`.
//! Both identifier types keep the raw string plus the separator offset so that
//! `collection()` and `key()` are free slices.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between collection name and document key.
pub const ID_SEPARATOR: char = '/';

/// Validates `raw` and returns the byte offset of its single separator.
fn split_offset(raw: &str) -> Result<usize> {
    let mut parts = raw.match_indices(ID_SEPARATOR);
    let Some((offset, _)) = parts.next() else {
        return Err(Error::MalformedIdentifier(raw.to_string()));
    };
    if parts.next().is_some() || offset == 0 || offset + 1 == raw.len() {
        return Err(Error::MalformedIdentifier(raw.to_string()));
    }
    Ok(offset)
}

/// Identifier of a vertex document (`collection/key`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VertexId {
    raw: String,
    split: usize,
}

impl VertexId {
    /// Parses a vertex identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedIdentifier` unless `raw` has exactly one
    /// separator with non-empty parts on both sides.
    pub fn parse(raw: &str) -> Result<Self> {
        let split = split_offset(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            split,
        })
    }

    /// Builds an identifier from its two parts.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedIdentifier` if either part is empty or
    /// contains the separator.
    pub fn from_parts(collection: &str, key: &str) -> Result<Self> {
        Self::parse(&format!("{collection}{ID_SEPARATOR}{key}"))
    }

    /// Parses `raw` on behalf of a caller that declared the vertex collection.
    ///
    /// A bare key is qualified with `declared`. A full identifier must name
    /// `declared` as its collection.
    ///
    /// # Errors
    ///
    /// `Error::CollectionMismatch` if the embedded collection differs,
    /// `Error::MalformedIdentifier` if the result is not a valid handle.
    pub fn parse_in_collection(declared: &str, raw: &str) -> Result<Self> {
        if !raw.contains(ID_SEPARATOR) {
            return Self::from_parts(declared, raw);
        }
        let id = Self::parse(raw)?;
        if id.collection() != declared {
            return Err(Error::CollectionMismatch {
                declared: declared.to_string(),
                actual: id.collection().to_string(),
            });
        }
        Ok(id)
    }

    /// Returns the collection part.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Returns the full `collection/key` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Identifier of an edge document (`collection/key`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeId {
    raw: String,
    split: usize,
}

impl EdgeId {
    /// Parses an edge identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedIdentifier` for anything but `collection/key`.
    pub fn parse(raw: &str) -> Result<Self> {
        let split = split_offset(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            split,
        })
    }

    /// Builds an identifier from its two parts.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedIdentifier` if either part is invalid.
    pub fn from_parts(collection: &str, key: &str) -> Result<Self> {
        Self::parse(&format!("{collection}{ID_SEPARATOR}{key}"))
    }

    /// Returns the edge collection part.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Returns the full `collection/key` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

macro_rules! impl_id_conversions {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.raw)
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(raw: String) -> Result<Self> {
                let split = split_offset(&raw)?;
                Ok(Self { raw, split })
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.raw
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.raw
            }
        }
    };
}

impl_id_conversions!(VertexId);
impl_id_conversions!(EdgeId);

/// Direction in which edges are followed from a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Edges whose `_from` is the vertex.
    #[default]
    Outbound,
    /// Edges whose `_to` is the vertex.
    Inbound,
    /// Both of the above. A self-loop is reported once per direction.
    Any,
}

impl Direction {
    /// Returns the direction used when walking back from the target.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Outbound => Self::Inbound,
            Self::Inbound => Self::Outbound,
            Self::Any => Self::Any,
        }
    }

    /// Returns the lowercase name used by the query layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outbound => "outbound",
            Self::Inbound => "inbound",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "outbound" => Ok(Self::Outbound),
            "inbound" => Ok(Self::Inbound),
            "any" => Ok(Self::Any),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}
