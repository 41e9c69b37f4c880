//! Tests for `enumerator` module

use super::enumerator::*;
use super::error::{Error, Result};
use std::collections::HashMap;

/// Adjacency list over single-character vertices; edge label is "xy".
fn expander(adjacency: &[(char, &str)]) -> impl FnMut(&char, u64) -> Result<Vec<(String, char)>> {
    let map: HashMap<char, String> = adjacency
        .iter()
        .map(|(vertex, targets)| (*vertex, (*targets).to_string()))
        .collect();
    move |vertex, _depth| {
        Ok(map
            .get(vertex)
            .map(|targets| {
                targets
                    .chars()
                    .map(|target| (format!("{vertex}{target}"), target))
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn collect_all(enumerator: &mut PathEnumerator<char, String>, adjacency: &[(char, &str)]) -> Vec<String> {
    let mut expand = expander(adjacency);
    let mut paths = Vec::new();
    while let Some(path) = enumerator.next(&mut expand).unwrap() {
        paths.push(path.vertices.iter().collect::<String>());
    }
    paths
}

#[test]
fn test_first_path_is_start_only() {
    let mut enumerator = PathEnumerator::new('a', 3);
    let path = enumerator.next(expander(&[])).unwrap().unwrap();
    assert_eq!(path.vertices, vec!['a']);
    assert!(path.is_empty());
    assert_eq!(path.last_edge(), None);
}

#[test]
fn test_depth_first_order() {
    // a -> b -> d, a -> c
    let adjacency = [('a', "bc"), ('b', "d")];
    let mut enumerator = PathEnumerator::new('a', 5);

    let paths = collect_all(&mut enumerator, &adjacency);

    assert_eq!(paths, ["a", "ab", "abd", "ac"]);
    assert!(enumerator.is_exhausted());
}

#[test]
fn test_max_depth_bounds_paths() {
    let adjacency = [('a', "b"), ('b', "c"), ('c', "d")];
    let mut enumerator = PathEnumerator::new('a', 2);
    assert_eq!(collect_all(&mut enumerator, &adjacency), ["a", "ab", "abc"]);
}

#[test]
fn test_zero_max_depth_yields_start_only() {
    let adjacency = [('a', "b")];
    let mut enumerator = PathEnumerator::new('a', 0);
    assert_eq!(collect_all(&mut enumerator, &adjacency), ["a"]);
}

#[test]
fn test_vertices_on_path_are_not_revisited() {
    // Cycle a -> b -> a plus self-loop on b.
    let adjacency = [('a', "b"), ('b', "ab")];
    let mut enumerator = PathEnumerator::new('a', 10);
    assert_eq!(collect_all(&mut enumerator, &adjacency), ["a", "ab"]);
}

#[test]
fn test_vertex_may_appear_on_sibling_paths() {
    // Diamond: a -> b -> d, a -> c -> d
    let adjacency = [('a', "bc"), ('b', "d"), ('c', "d")];
    let mut enumerator = PathEnumerator::new('a', 3);
    assert_eq!(
        collect_all(&mut enumerator, &adjacency),
        ["a", "ab", "abd", "ac", "acd"]
    );
}

#[test]
fn test_edges_follow_vertices() {
    let adjacency = [('a', "b"), ('b', "c")];
    let mut enumerator = PathEnumerator::new('a', 2);
    let mut expand = expander(&adjacency);
    enumerator.next(&mut expand).unwrap();
    enumerator.next(&mut expand).unwrap();
    let path = enumerator.next(&mut expand).unwrap().unwrap();

    assert_eq!(path.edges, vec!["ab".to_string(), "bc".to_string()]);
    assert_eq!(path.len(), 2);
    assert_eq!(path.last_vertex(), Some(&'c'));
}

#[test]
fn test_expander_receives_next_depth() {
    let mut seen = Vec::new();
    let mut enumerator: PathEnumerator<char, ()> = PathEnumerator::new('a', 2);
    let mut expand = |vertex: &char, depth: u64| -> Result<Vec<((), char)>> {
        seen.push((*vertex, depth));
        Ok(if *vertex == 'a' { vec![((), 'b')] } else { Vec::new() })
    };
    while enumerator.next(&mut expand).unwrap().is_some() {}

    assert_eq!(seen, vec![('a', 1), ('b', 2)]);
}

#[test]
fn test_prune_skips_subtree() {
    let adjacency = [('a', "bc"), ('b', "d"), ('c', "e")];
    let mut enumerator = PathEnumerator::new('a', 3);
    let mut expand = expander(&adjacency);
    let mut paths = Vec::new();
    while let Some(path) = enumerator.next(&mut expand).unwrap() {
        let rendered: String = path.vertices.iter().collect();
        let is_b = rendered == "ab";
        paths.push(rendered);
        if is_b {
            enumerator.prune();
        }
    }
    assert_eq!(paths, ["a", "ab", "ac", "ace"]);
}

#[test]
fn test_expander_error_is_returned() {
    let mut enumerator: PathEnumerator<char, ()> = PathEnumerator::new('a', 2);
    let fail = |_: &char, _: u64| -> Result<Vec<((), char)>> { Err(Error::Storage("down".into())) };

    assert!(enumerator.next(fail).unwrap().is_some());
    assert_eq!(
        enumerator.next(fail).unwrap_err(),
        Error::Storage("down".into())
    );
}
