//! Example-based filter predicates for edges and vertices.
//!
//! The query layer hands over examples such as `{"type": "friend"}` or
//! `[{"type": "friend"}, {"weight": 3}]`. They are compiled once into a
//! [`FilterPredicate`] and then evaluated against document bodies.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphwalk_core::filter::FilterPredicate;
//! use serde_json::json;
//!
//! let filter = FilterPredicate::from_example(&json!({"type": "friend"}))?
//!     .expect("non-empty example");
//! assert!(filter.matches(&json!({"type": "friend", "since": 2019})));
//! ```
//!
//! Compilation may prove that an example can never match (for instance an
//! `_id` attribute compared against a number). That is not an error: the
//! result is [`FilterPredicate::NeverMatches`], and searches short-circuit the
//! affected branch to an empty result.

mod matching;

use crate::document::{ATTR_FROM, ATTR_ID, ATTR_KEY, ATTR_TO};
use crate::error::{Error, Result};
use crate::id::{VertexId, ID_SEPARATOR};
use serde_json::{Map, Value};

/// A compiled document filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Matches documents equal to at least one of the examples.
    MatchAttributes(ExampleMatcher),
    /// Provably matches nothing.
    NeverMatches,
}

impl FilterPredicate {
    /// Compiles a JSON example (object or array of objects).
    ///
    /// Returns `Ok(None)` for an empty array, which means "no filter".
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFilter` if the example is neither an object nor
    /// an array of objects.
    pub fn from_example(example: &Value) -> Result<Option<Self>> {
        let objects: Vec<&Map<String, Value>> = match example {
            Value::Object(object) => vec![object],
            Value::Array(items) if items.is_empty() => return Ok(None),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_object().ok_or_else(|| {
                        Error::InvalidFilter(format!("expected an object, got {item}"))
                    })
                })
                .collect::<Result<_>>()?,
            other => {
                return Err(Error::InvalidFilter(format!(
                    "expected an object or an array of objects, got {other}"
                )))
            }
        };

        let examples: Vec<Example> = objects.into_iter().filter_map(Example::compile).collect();
        if examples.is_empty() {
            tracing::warn!(%example, "filter example can never match");
            return Ok(Some(Self::NeverMatches));
        }
        Ok(Some(Self::MatchAttributes(ExampleMatcher { examples })))
    }

    /// Evaluates the predicate against a document body.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::MatchAttributes(matcher) => matcher.matches(document),
            Self::NeverMatches => false,
        }
    }

    /// Returns true for [`FilterPredicate::NeverMatches`].
    #[must_use]
    pub fn is_never(&self) -> bool {
        matches!(self, Self::NeverMatches)
    }
}

/// Disjunction of attribute-equality examples.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleMatcher {
    examples: Vec<Example>,
}

impl ExampleMatcher {
    /// Returns true if any example matches `document`.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.examples.iter().any(|example| example.matches(document))
    }

    /// Number of alternatives that survived compilation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Always false: a matcher without examples is compiled to `NeverMatches`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Conjunction of `path == value` conditions.
#[derive(Debug, Clone, PartialEq)]
struct Example {
    conditions: Vec<(Vec<String>, Value)>,
}

impl Example {
    /// Compiles one example object; `None` if it can never match.
    fn compile(object: &Map<String, Value>) -> Option<Self> {
        let mut conditions = Vec::with_capacity(object.len());
        for (attribute, value) in object {
            let path: Vec<String> = attribute.split('.').map(str::to_string).collect();
            if path.iter().any(String::is_empty) || !system_value_possible(&path, value) {
                return None;
            }
            conditions.push((path, value.clone()));
        }
        Some(Self { conditions })
    }

    fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|(path, expected)| {
            matching::get_path(document, path)
                .is_some_and(|actual| matching::values_equal(actual, expected))
        })
    }
}

/// System attributes always hold well-formed strings; anything else is
/// unsatisfiable.
fn system_value_possible(path: &[String], value: &Value) -> bool {
    let [name] = path else {
        return true;
    };
    match name.as_str() {
        ATTR_ID | ATTR_FROM | ATTR_TO => value
            .as_str()
            .is_some_and(|handle| VertexId::parse(handle).is_ok()),
        ATTR_KEY => value
            .as_str()
            .is_some_and(|key| !key.is_empty() && !key.contains(ID_SEPARATOR)),
        _ => true,
    }
}
