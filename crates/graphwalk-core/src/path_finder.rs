//! Generic shortest-path search.
//!
//! [`PathFinder`] is Dijkstra's algorithm over arbitrary vertex, edge and
//! distance types. It runs unidirectionally, bidirectionally on the calling
//! thread, or bidirectionally with the forward and backward expansions on two
//! scoped worker threads. [`ConstDistanceFinder`] is the breadth-first variant
//! for graphs where every edge has the same length.
//!
//! Neither finder knows about storage. They pull neighbors through expander
//! closures: the forward expander returns the successors of a vertex, the
//! backward expander its predecessors (with the edge still pointing from
//! predecessor to vertex).
//!
//! # Bidirectional termination
//!
//! Both sides keep tentative distances. Whenever a side settles a vertex or
//! improves a tentative distance, it looks the vertex up on the other side and
//! records `forward + backward` as a meeting candidate. The search stops once
//! `top(forward) + top(backward) >= best candidate` or a side runs dry. In the
//! threaded mode the check runs only at round barriers, after both workers have
//! processed their current vertex, so a meeting observed mid-round is never
//! accepted before the other side has caught up.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::hash::Hash;
use std::any::Any;
use std::ops::Add;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Barrier;

/// Distance metric usable by [`PathFinder`].
///
/// Weights must be non-negative.
pub trait Distance: Copy + PartialOrd + Add<Output = Self> + Send + Sync {
    /// Additive identity.
    fn zero() -> Self;
}

impl Distance for f64 {
    fn zero() -> Self {
        0.0
    }
}

impl Distance for u64 {
    fn zero() -> Self {
        0
    }
}

/// One candidate returned by an expander.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<V, E, W> {
    /// The vertex on the other side of `edge`.
    pub vertex: V,
    /// The connecting edge.
    pub edge: E,
    /// Length of `edge`.
    pub weight: W,
}

/// A shortest path found by one of the finders.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath<V, E, W> {
    /// Vertices from start to end.
    pub vertices: Vec<V>,
    /// Edges, `edges[i]` connecting `vertices[i]` and `vertices[i + 1]`.
    pub edges: Vec<E>,
    /// Per-edge weights.
    pub weights: Vec<W>,
    /// Sum of `weights`.
    pub distance: W,
}

impl<V, E, W: Distance> ShortestPath<V, E, W> {
    fn single(vertex: V) -> Self {
        Self {
            vertices: vec![vertex],
            edges: Vec::new(),
            weights: Vec::new(),
            distance: W::zero(),
        }
    }
}

/// How a [`PathFinder`] explores the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Expand from the start only.
    Unidirectional,
    /// Expand from both ends, alternating on the calling thread.
    #[default]
    Bidirectional,
    /// Expand from both ends on two worker threads.
    ///
    /// A panic inside an expander stops both workers and is re-raised on the
    /// calling thread.
    Concurrent,
}

impl SearchStrategy {
    /// Maps the `bidirectional` / `multiThreaded` option pair to a strategy.
    #[must_use]
    pub fn from_flags(bidirectional: bool, multi_threaded: bool) -> Self {
        match (bidirectional, multi_threaded) {
            (false, _) => Self::Unidirectional,
            (true, false) => Self::Bidirectional,
            (true, true) => Self::Concurrent,
        }
    }
}

struct HeapEntry<V, W> {
    distance: W,
    sequence: u64,
    vertex: V,
}

impl<V, W: PartialOrd> PartialEq for HeapEntry<V, W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<V, W: PartialOrd> Eq for HeapEntry<V, W> {}

impl<V, W: PartialOrd> PartialOrd for HeapEntry<V, W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, W: PartialOrd> Ord for HeapEntry<V, W> {
    // Reversed: BinaryHeap is a max-heap, smallest distance must pop first.
    // Ties pop in insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// State of one search direction.
struct SearchSide<V, E, W> {
    distances: FxHashMap<V, W>,
    predecessors: FxHashMap<V, (V, E, W)>,
    settled: FxHashSet<V>,
    heap: BinaryHeap<HeapEntry<V, W>>,
    sequence: u64,
}

impl<V, E, W> SearchSide<V, E, W>
where
    V: Clone + Eq + Hash,
    W: Distance,
{
    fn new(origin: V) -> Self {
        let mut side = Self {
            distances: FxHashMap::default(),
            predecessors: FxHashMap::default(),
            settled: FxHashSet::default(),
            heap: BinaryHeap::new(),
            sequence: 0,
        };
        side.distances.insert(origin.clone(), W::zero());
        side.push(origin, W::zero());
        side
    }

    fn push(&mut self, vertex: V, distance: W) {
        self.sequence += 1;
        self.heap.push(HeapEntry {
            distance,
            sequence: self.sequence,
            vertex,
        });
    }

    /// Smallest tentative distance not yet settled.
    fn peek_distance(&mut self) -> Option<W> {
        while let Some(top) = self.heap.peek() {
            if self.settled.contains(&top.vertex) {
                self.heap.pop();
            } else {
                return Some(top.distance);
            }
        }
        None
    }

    fn settle_next(&mut self) -> Option<(V, W)> {
        while let Some(entry) = self.heap.pop() {
            if self.settled.insert(entry.vertex.clone()) {
                return Some((entry.vertex, entry.distance));
            }
        }
        None
    }

    /// Relaxes `from -> neighbor`; returns the new distance on improvement.
    fn relax(&mut self, from: &V, from_distance: W, neighbor: Neighbor<V, E, W>) -> Option<(V, W)> {
        if self.settled.contains(&neighbor.vertex) {
            return None;
        }
        let candidate = from_distance + neighbor.weight;
        let improves = self
            .distances
            .get(&neighbor.vertex)
            .is_none_or(|known| candidate < *known);
        if !improves {
            return None;
        }
        self.distances.insert(neighbor.vertex.clone(), candidate);
        self.predecessors.insert(
            neighbor.vertex.clone(),
            (from.clone(), neighbor.edge, neighbor.weight),
        );
        self.push(neighbor.vertex.clone(), candidate);
        Some((neighbor.vertex, candidate))
    }

    fn distance(&self, vertex: &V) -> Option<W> {
        self.distances.get(vertex).copied()
    }

    /// Hops from `vertex` back to the origin, nearest hop first.
    fn trace(&self, vertex: &V) -> Result<Vec<(V, E, W)>>
    where
        E: Clone,
    {
        let mut hops = Vec::new();
        let mut current = vertex;
        while let Some(hop) = self.predecessors.get(current) {
            hops.try_reserve(1)?;
            hops.push(hop.clone());
            current = &hop.0;
            if hops.len() > self.predecessors.len() {
                return Err(Error::Internal("cycle in predecessor chain".to_string()));
            }
        }
        Ok(hops)
    }
}

/// Best meeting point seen so far.
struct Meeting<V, W> {
    distance: W,
    vertex: V,
}

fn offer<V, W: Distance>(best: &mut Option<Meeting<V, W>>, distance: W, vertex: V) {
    if best.as_ref().is_none_or(|meeting| distance < meeting.distance) {
        *best = Some(Meeting { distance, vertex });
    }
}

fn should_stop<V, W: Distance>(
    forward_top: Option<W>,
    backward_top: Option<W>,
    best: Option<&Meeting<V, W>>,
) -> bool {
    match (forward_top, backward_top, best) {
        (None, _, _) | (_, None, _) => true,
        (Some(f), Some(b), Some(meeting)) => f + b >= meeting.distance,
        _ => false,
    }
}

/// Joins the forward chain to `meeting` and the backward chain from it.
fn assemble<V, E, W>(
    forward: &SearchSide<V, E, W>,
    backward: &SearchSide<V, E, W>,
    meeting: &V,
) -> Result<ShortestPath<V, E, W>>
where
    V: Clone + Eq + Hash,
    E: Clone,
    W: Distance,
{
    let head = forward.trace(meeting)?;
    let tail = backward.trace(meeting)?;
    let hops = head.len() + tail.len();

    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    let mut weights = Vec::new();
    vertices.try_reserve_exact(hops + 1)?;
    edges.try_reserve_exact(hops)?;
    weights.try_reserve_exact(hops)?;

    let origin = head
        .last()
        .map_or_else(|| meeting.clone(), |(vertex, _, _)| vertex.clone());
    vertices.push(origin);
    for (index, (_, edge, weight)) in head.iter().enumerate().rev() {
        edges.push(edge.clone());
        weights.push(*weight);
        let next = if index == 0 {
            meeting.clone()
        } else {
            head[index - 1].0.clone()
        };
        vertices.push(next);
    }
    for (vertex, edge, weight) in tail {
        edges.push(edge);
        weights.push(weight);
        vertices.push(vertex);
    }

    let distance = weights.iter().fold(W::zero(), |sum, weight| sum + *weight);
    Ok(ShortestPath {
        vertices,
        edges,
        weights,
        distance,
    })
}

/// Dijkstra shortest-path search.
///
/// # Example
///
/// ```rust,ignore
/// use graphwalk_core::path_finder::{Neighbor, PathFinder, SearchStrategy};
///
/// let finder = PathFinder::new(forward, backward, SearchStrategy::Bidirectional);
/// let path = finder.shortest_path(&start, &end)?;
/// ```
pub struct PathFinder<F, B> {
    forward: F,
    backward: B,
    strategy: SearchStrategy,
}

impl<F, B> PathFinder<F, B> {
    /// Creates a finder from its two expanders.
    #[must_use]
    pub fn new(forward: F, backward: B, strategy: SearchStrategy) -> Self {
        Self {
            forward,
            backward,
            strategy,
        }
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    /// Finds a minimum-distance path from `start` to `end`.
    ///
    /// Returns `Ok(None)` if `end` is unreachable.
    ///
    /// # Errors
    ///
    /// Errors raised by the expanders abort the search and are returned.
    pub fn shortest_path<V, E, W>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, W>>>
    where
        V: Clone + Eq + Hash + Send + Sync,
        E: Clone + Send + Sync,
        W: Distance,
        F: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>> + Sync,
        B: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>> + Sync,
    {
        if start == end {
            return Ok(Some(ShortestPath::single(start.clone())));
        }
        match self.strategy {
            SearchStrategy::Unidirectional => self.unidirectional(start, end),
            SearchStrategy::Bidirectional => self.bidirectional(start, end),
            SearchStrategy::Concurrent => self.concurrent(start, end),
        }
    }

    fn unidirectional<V, E, W>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, W>>>
    where
        V: Clone + Eq + Hash,
        E: Clone,
        W: Distance,
        F: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
    {
        let mut side = SearchSide::new(start.clone());
        let target = SearchSide::<V, E, W>::new(end.clone());
        while let Some((vertex, distance)) = side.settle_next() {
            if &vertex == end {
                return assemble(&side, &target, end).map(Some);
            }
            for neighbor in (self.forward)(&vertex)? {
                side.relax(&vertex, distance, neighbor);
            }
        }
        Ok(None)
    }

    fn bidirectional<V, E, W>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, W>>>
    where
        V: Clone + Eq + Hash,
        E: Clone,
        W: Distance,
        F: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
        B: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
    {
        let mut forward = SearchSide::new(start.clone());
        let mut backward = SearchSide::new(end.clone());
        let mut best = None;

        loop {
            let forward_top = forward.peek_distance();
            let backward_top = backward.peek_distance();
            if should_stop(forward_top, backward_top, best.as_ref()) {
                break;
            }
            if forward_top <= backward_top {
                expand_step(&mut forward, &backward, &self.forward, &mut best)?;
            } else {
                expand_step(&mut backward, &forward, &self.backward, &mut best)?;
            }
        }

        best.map(|meeting| assemble(&forward, &backward, &meeting.vertex))
            .transpose()
    }

    fn concurrent<V, E, W>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, W>>>
    where
        V: Clone + Eq + Hash + Send + Sync,
        E: Clone + Send + Sync,
        W: Distance,
        F: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>> + Sync,
        B: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>> + Sync,
    {
        let forward = Mutex::new(SearchSide::new(start.clone()));
        let backward = Mutex::new(SearchSide::new(end.clone()));
        let round = RoundState {
            barrier: Barrier::new(2),
            done: AtomicBool::new(false),
            best: Mutex::new(None),
            failure: Mutex::new(None),
            panic: Mutex::new(None),
        };

        std::thread::scope(|scope| {
            scope.spawn(|| round.run_worker(&forward, &backward, &self.forward, (&forward, &backward)));
            scope.spawn(|| round.run_worker(&backward, &forward, &self.backward, (&forward, &backward)));
        });

        if let Some(payload) = round.panic.into_inner() {
            panic::resume_unwind(payload);
        }
        if let Some(err) = round.failure.into_inner() {
            return Err(err);
        }
        let forward = forward.into_inner();
        let backward = backward.into_inner();
        round
            .best
            .into_inner()
            .map(|meeting| assemble(&forward, &backward, &meeting.vertex))
            .transpose()
    }
}

/// Settles one vertex of `side` and relaxes its neighbors.
fn expand_step<V, E, W, X>(
    side: &mut SearchSide<V, E, W>,
    other: &SearchSide<V, E, W>,
    expand: &X,
    best: &mut Option<Meeting<V, W>>,
) -> Result<()>
where
    V: Clone + Eq + Hash,
    W: Distance,
    X: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
{
    let Some((vertex, distance)) = side.settle_next() else {
        return Ok(());
    };
    if let Some(remaining) = other.distance(&vertex) {
        offer(best, distance + remaining, vertex.clone());
    }
    for neighbor in expand(&vertex)? {
        if let Some((reached, reached_distance)) = side.relax(&vertex, distance, neighbor) {
            if let Some(remaining) = other.distance(&reached) {
                offer(best, reached_distance + remaining, reached);
            }
        }
    }
    Ok(())
}

/// Shared state of the two workers of a concurrent search.
struct RoundState<V, W> {
    barrier: Barrier,
    done: AtomicBool,
    best: Mutex<Option<Meeting<V, W>>>,
    failure: Mutex<Option<Error>>,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

impl<V, W> RoundState<V, W>
where
    V: Clone + Eq + Hash,
    W: Distance,
{
    /// Worker loop: one settled vertex per round, then two barrier waits
    /// between which the barrier leader decides whether to stop.
    fn run_worker<E, X>(
        &self,
        own: &Mutex<SearchSide<V, E, W>>,
        other: &Mutex<SearchSide<V, E, W>>,
        expand: &X,
        sides: (&Mutex<SearchSide<V, E, W>>, &Mutex<SearchSide<V, E, W>>),
    ) where
        X: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
    {
        loop {
            // Both workers must reach every barrier, even after a panic.
            match panic::catch_unwind(AssertUnwindSafe(|| self.step(own, other, expand))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.failure.lock().get_or_insert(err);
                }
                Err(payload) => {
                    self.panic.lock().get_or_insert(payload);
                }
            }

            if self.barrier.wait().is_leader() {
                let failed = self.failure.lock().is_some() || self.panic.lock().is_some();
                let forward_top = sides.0.lock().peek_distance();
                let backward_top = sides.1.lock().peek_distance();
                let stop = failed || should_stop(forward_top, backward_top, self.best.lock().as_ref());
                self.done.store(stop, AtomicOrdering::Release);
            }
            self.barrier.wait();

            if self.done.load(AtomicOrdering::Acquire) {
                break;
            }
        }
    }

    fn step<E, X>(
        &self,
        own: &Mutex<SearchSide<V, E, W>>,
        other: &Mutex<SearchSide<V, E, W>>,
        expand: &X,
    ) -> Result<()>
    where
        X: Fn(&V) -> Result<Vec<Neighbor<V, E, W>>>,
    {
        let Some((vertex, distance)) = own.lock().settle_next() else {
            return Ok(());
        };
        let neighbors = expand(&vertex)?;
        let improved: Vec<(V, W)> = {
            let mut side = own.lock();
            neighbors
                .into_iter()
                .filter_map(|neighbor| side.relax(&vertex, distance, neighbor))
                .collect()
        };

        let other = other.lock();
        let mut best = self.best.lock();
        if let Some(remaining) = other.distance(&vertex) {
            offer(&mut best, distance + remaining, vertex.clone());
        }
        for (reached, reached_distance) in improved {
            if let Some(remaining) = other.distance(&reached) {
                offer(&mut best, reached_distance + remaining, reached);
            }
        }
        Ok(())
    }
}

/// Breadth-first shortest-path search for unit edge lengths.
pub struct ConstDistanceFinder<F, B> {
    forward: F,
    backward: B,
    bidirectional: bool,
}

impl<F, B> ConstDistanceFinder<F, B> {
    /// Creates a finder from its two expanders.
    ///
    /// The backward expander is only used when `bidirectional` is set.
    #[must_use]
    pub fn new(forward: F, backward: B, bidirectional: bool) -> Self {
        Self {
            forward,
            backward,
            bidirectional,
        }
    }

    /// Finds a path with the fewest edges from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Errors raised by the expanders abort the search and are returned.
    pub fn shortest_path<V, E>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, u64>>>
    where
        V: Clone + Eq + Hash,
        E: Clone,
        F: Fn(&V) -> Result<Vec<(E, V)>>,
        B: Fn(&V) -> Result<Vec<(E, V)>>,
    {
        if start == end {
            return Ok(Some(ShortestPath::single(start.clone())));
        }
        if self.bidirectional {
            self.bidirectional_search(start, end)
        } else {
            self.forward_search(start, end)
        }
    }

    fn forward_search<V, E>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, u64>>>
    where
        V: Clone + Eq + Hash,
        E: Clone,
        F: Fn(&V) -> Result<Vec<(E, V)>>,
    {
        let mut forward = BfsSide::new(start.clone());
        let backward = BfsSide::new(end.clone());
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(vertex) = queue.pop_front() {
            for (edge, next) in (self.forward)(&vertex)? {
                if forward.discover(&vertex, edge, &next) {
                    if &next == end {
                        return assemble_bfs(&forward, &backward, end).map(Some);
                    }
                    queue.push_back(next);
                }
            }
        }
        Ok(None)
    }

    fn bidirectional_search<V, E>(&self, start: &V, end: &V) -> Result<Option<ShortestPath<V, E, u64>>>
    where
        V: Clone + Eq + Hash,
        E: Clone,
        F: Fn(&V) -> Result<Vec<(E, V)>>,
        B: Fn(&V) -> Result<Vec<(E, V)>>,
    {
        let mut forward = BfsSide::new(start.clone());
        let mut backward = BfsSide::new(end.clone());

        while !forward.frontier.is_empty() && !backward.frontier.is_empty() {
            // Expand the smaller frontier by one full level.
            let meeting = if forward.frontier.len() <= backward.frontier.len() {
                forward.expand_level(&backward, &self.forward)?
            } else {
                backward.expand_level(&forward, &self.backward)?
            };
            if let Some(vertex) = meeting {
                return assemble_bfs(&forward, &backward, &vertex).map(Some);
            }
        }
        Ok(None)
    }
}

struct BfsSide<V, E> {
    predecessors: FxHashMap<V, Option<(V, E)>>,
    frontier: Vec<V>,
}

impl<V, E> BfsSide<V, E>
where
    V: Clone + Eq + Hash,
{
    fn new(origin: V) -> Self {
        let mut predecessors = FxHashMap::default();
        predecessors.insert(origin.clone(), None);
        Self {
            predecessors,
            frontier: vec![origin],
        }
    }

    /// Records `next` as reached from `from`; false if already known.
    fn discover(&mut self, from: &V, edge: E, next: &V) -> bool {
        if self.predecessors.contains_key(next) {
            return false;
        }
        self.predecessors
            .insert(next.clone(), Some((from.clone(), edge)));
        true
    }

    /// Expands every frontier vertex once; returns the first vertex also
    /// known to `other`.
    fn expand_level<X>(&mut self, other: &Self, expand: &X) -> Result<Option<V>>
    where
        X: Fn(&V) -> Result<Vec<(E, V)>>,
    {
        let frontier = std::mem::take(&mut self.frontier);
        let mut meeting = None;
        for vertex in &frontier {
            for (edge, next) in expand(vertex)? {
                if self.discover(vertex, edge, &next) {
                    if meeting.is_none() && other.predecessors.contains_key(&next) {
                        meeting = Some(next.clone());
                    }
                    self.frontier.push(next);
                }
            }
            if meeting.is_some() {
                break;
            }
        }
        Ok(meeting)
    }

    fn trace(&self, vertex: &V) -> Result<Vec<(V, E)>>
    where
        E: Clone,
    {
        let mut hops = Vec::new();
        let mut current = vertex;
        while let Some(Some(hop)) = self.predecessors.get(current) {
            hops.try_reserve(1)?;
            hops.push(hop.clone());
            current = &hop.0;
        }
        Ok(hops)
    }
}

fn assemble_bfs<V, E>(
    forward: &BfsSide<V, E>,
    backward: &BfsSide<V, E>,
    meeting: &V,
) -> Result<ShortestPath<V, E, u64>>
where
    V: Clone + Eq + Hash,
    E: Clone,
{
    let mut head = forward.trace(meeting)?;
    head.reverse();
    let tail = backward.trace(meeting)?;

    let hops = head.len() + tail.len();
    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    vertices.try_reserve_exact(hops + 1)?;
    edges.try_reserve_exact(hops)?;

    for (vertex, edge) in head {
        vertices.push(vertex);
        edges.push(edge);
    }
    vertices.push(meeting.clone());
    for (vertex, edge) in tail {
        edges.push(edge);
        vertices.push(vertex);
    }

    Ok(ShortestPath {
        vertices,
        weights: vec![1; hops],
        edges,
        distance: hops as u64,
    })
}
