use std::fmt;

use thiserror::Error;

use super::{DocumentVector, FormatKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Backward => f.write_str("before"),
            Direction::Forward => f.write_str("after"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cannot resolve path {path:?}: {reason}")]
    PathResolution { path: Vec<usize>, reason: String },

    #[error("expected text node at {path:?}, found {found}")]
    NodeTypeMismatch {
        path: Vec<usize>,
        found: &'static str,
    },

    #[error("index {index} outside {min}..={max} at {path:?}")]
    IndexOutOfRange {
        path: Vec<usize>,
        index: usize,
        min: usize,
        max: usize,
    },

    #[error("no caret position {direction} {vector}")]
    Boundary {
        direction: Direction,
        vector: DocumentVector,
    },

    #[error("no enclosing {kind} format at {path:?}")]
    FormatNotFound { kind: FormatKind, path: Vec<usize> },
}

impl EditError {
    pub(crate) fn unresolvable(path: &[usize], reason: impl Into<String>) -> Self {
        EditError::PathResolution {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, EditError::Boundary { .. })
    }
}

pub(crate) fn check_index(
    vector: &DocumentVector,
    min: usize,
    max: usize,
) -> Result<(), EditError> {
    if vector.index < min || vector.index > max {
        return Err(EditError::IndexOutOfRange {
            path: vector.path.clone(),
            index: vector.index,
            min,
            max,
        });
    }
    Ok(())
}
