//! Path steps used to walk a document tree
//!
//! A host addresses nested values with a sequence of steps: a string step
//! selects an object member by name, an integer step selects an array element
//! by zero-based index. A step that does not fit the value it is applied to is
//! a miss, not an error.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Inline-allocated step sequence; most host lookups are a handful of steps deep.
pub type Steps = SmallVec<[Step; 4]>;

/// A single navigation step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Object member name
    Key(String),
    /// Zero-based array index
    Index(usize),
}

impl Step {
    /// Member name if this is a key step
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Step::Key(key) => Some(key),
            Step::Index(_) => None,
        }
    }

    /// Array index if this is an index step
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Step::Key(_) => None,
            Step::Index(index) => Some(*index),
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Step::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Step::Key(key)
    }
}

impl From<usize> for Step {
    fn from(index: usize) -> Self {
        Step::Index(index)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => write!(f, "{key:?}"),
            Step::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Build a [`Steps`] sequence from string and integer literals
///
/// ```
/// # use arbor_json_domain::{path, Step};
/// let steps = path!["items", 0, "name"];
/// assert_eq!(steps.len(), 3);
/// assert_eq!(steps[1], Step::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Steps::new()
    };
    ($($step:expr),+ $(,)?) => {{
        let mut steps = $crate::Steps::new();
        $( steps.push($crate::Step::from($step)); )+
        steps
    }};
}
