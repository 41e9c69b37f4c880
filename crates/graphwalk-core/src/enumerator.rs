//! Resumable depth-first path enumeration.
//!
//! [`PathEnumerator`] walks a graph depth-first and hands out one path per
//! call to [`PathEnumerator::next`]. The search state is an explicit stack of
//! frames, one per vertex on the current path, each holding the candidates of
//! that vertex not tried yet. Nothing is recursive, so enumeration can stop
//! and resume between any two paths.
//!
//! The enumerator is generic over vertex and edge types and does not know
//! where candidates come from: every `next` call receives an expander that
//! returns the `(edge, neighbor)` candidates of a vertex. Filtering happens in
//! the expander; whatever it drops is never descended into.

use crate::error::Result;

/// A path as a vertex sequence plus the edges between consecutive vertices.
///
/// `vertices.len() == edges.len() + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedPath<V, E> {
    /// Vertices from the start vertex to the last one.
    pub vertices: Vec<V>,
    /// Edges, `edges[i]` connecting `vertices[i]` and `vertices[i + 1]`.
    pub edges: Vec<E>,
}

impl<V, E> EnumeratedPath<V, E> {
    /// Creates a zero-length path.
    #[must_use]
    pub fn new(start: V) -> Self {
        Self {
            vertices: vec![start],
            edges: Vec::new(),
        }
    }

    /// Number of edges on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true for the zero-length path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the last vertex.
    #[must_use]
    pub fn last_vertex(&self) -> Option<&V> {
        self.vertices.last()
    }

    /// Returns the last edge, `None` for the zero-length path.
    #[must_use]
    pub fn last_edge(&self) -> Option<&E> {
        self.edges.last()
    }

    fn push(&mut self, edge: E, vertex: V) {
        self.edges.push(edge);
        self.vertices.push(vertex);
    }

    fn pop(&mut self) {
        self.edges.pop();
        if self.vertices.len() > 1 {
            self.vertices.pop();
        }
    }
}

#[derive(Debug)]
struct Frame<V, E> {
    candidates: std::vec::IntoIter<(E, V)>,
}

impl<V, E> Frame<V, E> {
    fn empty() -> Self {
        Self {
            candidates: Vec::new().into_iter(),
        }
    }
}

/// Depth-first enumerator of all vertex-simple paths from one start vertex.
///
/// The first call to `next` yields the zero-length path. Every later call
/// yields the next path in depth-first, candidates-in-expander-order
/// sequence. A vertex already on the current path is skipped, so cycles
/// terminate; the same vertex may still appear on sibling paths.
#[derive(Debug)]
pub struct PathEnumerator<V, E> {
    path: EnumeratedPath<V, E>,
    stack: Vec<Frame<V, E>>,
    max_depth: u64,
    started: bool,
    expand_pending: bool,
    exhausted: bool,
}

impl<V, E> PathEnumerator<V, E>
where
    V: Clone + PartialEq,
{
    /// Creates an enumerator rooted at `start` that never builds paths longer
    /// than `max_depth` edges.
    #[must_use]
    pub fn new(start: V, max_depth: u64) -> Self {
        Self {
            path: EnumeratedPath::new(start),
            stack: Vec::new(),
            max_depth,
            started: false,
            expand_pending: false,
            exhausted: false,
        }
    }

    /// Returns the path produced by the last `next` call.
    #[must_use]
    pub fn current(&self) -> &EnumeratedPath<V, E> {
        &self.path
    }

    /// Returns true once every path has been produced.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Skips the subtree below the path returned by the last `next` call.
    pub fn prune(&mut self) {
        self.expand_pending = false;
        if self.started && !self.exhausted && self.stack.len() < self.path.vertices.len() {
            self.stack.push(Frame::empty());
        }
    }

    /// Advances to the next path.
    ///
    /// `expand(vertex, depth)` must return the candidates reachable from
    /// `vertex`, where `depth` is the length the path will have once a
    /// candidate is appended.
    ///
    /// # Errors
    ///
    /// Errors from `expand` are returned as-is; the enumerator should be
    /// discarded afterwards.
    pub fn next<F>(&mut self, mut expand: F) -> Result<Option<&EnumeratedPath<V, E>>>
    where
        F: FnMut(&V, u64) -> Result<Vec<(E, V)>>,
    {
        if self.exhausted {
            return Ok(None);
        }
        if !self.started {
            self.started = true;
            self.expand_pending = true;
            return Ok(Some(&self.path));
        }

        loop {
            if self.expand_pending {
                self.expand_pending = false;
                let depth = self.path.len() as u64;
                let frame = if depth < self.max_depth {
                    let Some(vertex) = self.path.last_vertex() else {
                        self.exhausted = true;
                        return Ok(None);
                    };
                    Frame {
                        candidates: expand(vertex, depth + 1)?.into_iter(),
                    }
                } else {
                    Frame::empty()
                };
                self.stack.push(frame);
            }

            let Some(top) = self.stack.last_mut() else {
                self.exhausted = true;
                return Ok(None);
            };

            match top.candidates.next() {
                Some((edge, vertex)) => {
                    if self.path.vertices.contains(&vertex) {
                        continue;
                    }
                    self.path.push(edge, vertex);
                    self.expand_pending = true;
                    return Ok(Some(&self.path));
                }
                None => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        self.exhausted = true;
                        return Ok(None);
                    }
                    self.path.pop();
                }
            }
        }
    }
}
