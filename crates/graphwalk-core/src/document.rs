//! Vertex and edge documents as the engine sees them.
//!
//! Documents are owned copies of what the storage layer returned. The JSON
//! body always carries the system attributes (`_id`, `_key`, and for edges
//! `_from`/`_to`) so that filters and result views can work on the body alone.

use crate::id::{Direction, EdgeId, VertexId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// System attribute holding the full document handle.
pub const ATTR_ID: &str = "_id";
/// System attribute holding the document key.
pub const ATTR_KEY: &str = "_key";
/// System attribute holding an edge's source vertex.
pub const ATTR_FROM: &str = "_from";
/// System attribute holding an edge's target vertex.
pub const ATTR_TO: &str = "_to";

fn with_system_attributes(body: Value, attrs: &[(&str, &str)]) -> Value {
    let mut object = match body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    for (name, value) in attrs {
        object.insert((*name).to_string(), Value::String((*value).to_string()));
    }
    Value::Object(object)
}

/// A vertex document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: VertexId,
    body: Value,
}

impl Document {
    /// Creates a document; non-object bodies are wrapped under `value`.
    #[must_use]
    pub fn new(id: VertexId, body: Value) -> Self {
        let body = with_system_attributes(body, &[(ATTR_ID, id.as_str()), (ATTR_KEY, id.key())]);
        Self { id, body }
    }

    /// Returns the document handle.
    #[must_use]
    pub fn id(&self) -> &VertexId {
        &self.id
    }

    /// Returns the body including system attributes.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the document and returns its body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// An edge document connecting `from` to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDocument {
    id: EdgeId,
    from: VertexId,
    to: VertexId,
    body: Value,
}

impl EdgeDocument {
    /// Creates an edge document.
    #[must_use]
    pub fn new(id: EdgeId, from: VertexId, to: VertexId, body: Value) -> Self {
        let body = with_system_attributes(
            body,
            &[
                (ATTR_ID, id.as_str()),
                (ATTR_KEY, id.key()),
                (ATTR_FROM, from.as_str()),
                (ATTR_TO, to.as_str()),
            ],
        );
        Self { id, from, to, body }
    }

    /// Returns the edge handle.
    #[must_use]
    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    /// Returns the source vertex (`_from`).
    #[must_use]
    pub fn source(&self) -> &VertexId {
        &self.from
    }

    /// Returns the target vertex (`_to`).
    #[must_use]
    pub fn target(&self) -> &VertexId {
        &self.to
    }

    /// Returns the body including system attributes.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns a top-level attribute of the body.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Returns the vertex reached when leaving `vertex` over this edge in
    /// `direction`.
    ///
    /// For `Any`, the `_to` side is preferred unless it is `vertex` itself, in
    /// which case `_from` is returned; a self-loop therefore leads back to
    /// `vertex`.
    #[must_use]
    pub fn opposite(&self, vertex: &VertexId, direction: Direction) -> &VertexId {
        match direction {
            Direction::Outbound => &self.to,
            Direction::Inbound => &self.from,
            Direction::Any => {
                if &self.to == vertex {
                    &self.from
                } else {
                    &self.to
                }
            }
        }
    }
}
