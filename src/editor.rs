use std::collections::BTreeSet;
use std::fmt;

use tracing::warn;

mod content;
mod error;
mod navigate;
pub mod snapshot;
mod styles;
mod tree;

pub use error::{Direction, EditError};
pub use navigate::is_leading_path;
pub use styles::split_along_vector;
pub use tree::{
    Document, FormatKind, InvariantViolation, NodeRef, Paragraph, Span, char_to_byte_idx,
};

/// Caret address: child indices from the paragraph list down to a text
/// leaf, plus a character offset into that leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentVector {
    pub path: Vec<usize>,
    pub index: usize,
}

impl DocumentVector {
    pub fn new(path: Vec<usize>, index: usize) -> Self {
        Self { path, index }
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            path: self.path.clone(),
            index,
        }
    }

    pub fn paragraph_index(&self) -> Option<usize> {
        self.path.first().copied()
    }
}

impl fmt::Display for DocumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.path, self.index)
    }
}

/// `start` stays put while `end` follows the caret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: DocumentVector,
    pub end: DocumentVector,
}

impl SelectionRange {
    /// Bounds in document order.
    pub fn ordered(&self) -> (&DocumentVector, &DocumentVector) {
        if self.start <= self.end {
            (&self.start, &self.end)
        } else {
            (&self.end, &self.start)
        }
    }
}

/// Which part of the tree a mutation touched, so a renderer can redraw
/// incrementally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    None,
    Subtree(Vec<usize>),
    Document,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub vector: DocumentVector,
    pub change: Change,
}

impl Edit {
    pub fn new(vector: DocumentVector, change: Change) -> Self {
        Self { vector, change }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorState {
    pub cursor: DocumentVector,
    pub selection: Option<SelectionRange>,
    pub active_formats: BTreeSet<FormatKind>,
}

/// A document together with the caret state the host keeps for it.
pub struct DocumentEditor {
    document: Document,
    state: EditorState,
}

impl DocumentEditor {
    pub fn new(document: Document) -> Self {
        let cursor = document.document_start().unwrap_or_default();
        let mut editor = Self {
            document,
            state: EditorState {
                cursor,
                ..EditorState::default()
            },
        };
        editor.refresh_formats();
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn cursor(&self) -> &DocumentVector {
        &self.state.cursor
    }

    pub fn selection(&self) -> Option<&SelectionRange> {
        self.state.selection.as_ref()
    }

    pub fn active_formats(&self) -> &BTreeSet<FormatKind> {
        &self.state.active_formats
    }

    pub fn cursor_breadcrumbs(&self) -> Vec<&'static str> {
        self.state
            .active_formats
            .iter()
            .map(|kind| kind.label())
            .collect()
    }

    pub fn move_to(&mut self, vector: DocumentVector) -> Result<(), EditError> {
        self.document.text_len_checked(&vector)?;
        self.place_cursor(vector, false);
        Ok(())
    }

    pub fn select_to(&mut self, vector: DocumentVector) -> Result<(), EditError> {
        self.document.text_len_checked(&vector)?;
        self.place_cursor(vector, true);
        Ok(())
    }

    pub fn move_left(&mut self, extend: bool) -> bool {
        self.step(Direction::Backward, extend)
    }

    pub fn move_right(&mut self, extend: bool) -> bool {
        self.step(Direction::Forward, extend)
    }

    pub fn move_to_document_start(&mut self, extend: bool) -> bool {
        match self.document.document_start() {
            Ok(vector) => {
                self.place_cursor(vector, extend);
                true
            }
            Err(_) => false,
        }
    }

    pub fn move_to_document_end(&mut self, extend: bool) -> bool {
        match self.document.document_end() {
            Ok(vector) => {
                self.place_cursor(vector, extend);
                true
            }
            Err(_) => false,
        }
    }

    fn step(&mut self, direction: Direction, extend: bool) -> bool {
        let target = match direction {
            Direction::Backward => self.document.previous_vector(&self.state.cursor),
            Direction::Forward => self.document.next_vector(&self.state.cursor),
        };
        match target {
            Ok(vector) => {
                self.place_cursor(vector, extend);
                true
            }
            Err(err) => {
                if !err.is_boundary() {
                    warn!(%err, "cursor movement failed");
                }
                false
            }
        }
    }

    fn place_cursor(&mut self, vector: DocumentVector, extend: bool) {
        self.state.selection = if extend {
            let start = self
                .state
                .selection
                .take()
                .map(|selection| selection.start)
                .unwrap_or_else(|| self.state.cursor.clone());
            (start != vector).then(|| SelectionRange {
                start,
                end: vector.clone(),
            })
        } else {
            None
        };
        self.state.cursor = vector;
        self.refresh_formats();
    }

    pub fn insert_text(&mut self, text: &str) -> Result<Edit, EditError> {
        let at = self.state.cursor.clone();
        let vector = self.document.insert_text(text, &at)?;
        Ok(self.commit(Edit::new(vector, Change::Subtree(at.path))))
    }

    pub fn backspace(&mut self) -> Result<Edit, EditError> {
        let edit = self.document.delete_single(&self.state.cursor)?;
        Ok(self.commit(edit))
    }

    pub fn insert_paragraph_break(&mut self) -> Result<Edit, EditError> {
        let vector = self.document.insert_paragraph_break(&self.state.cursor)?;
        Ok(self.commit(Edit::new(vector, Change::Document)))
    }

    /// Ends `kind` at the caret when it is active there, opens it otherwise.
    pub fn toggle_format(&mut self, kind: FormatKind) -> Result<Edit, EditError> {
        let at = self.state.cursor.clone();
        let vector = if self.document.formats_at(&at)?.contains(&kind) {
            self.document.remove_format(&at, kind)?
        } else {
            self.document.insert_format(&at, kind)?
        };
        let paragraph = at.path[..1].to_vec();
        Ok(self.commit(Edit::new(vector, Change::Subtree(paragraph))))
    }

    fn commit(&mut self, edit: Edit) -> Edit {
        self.state.cursor = edit.vector.clone();
        self.state.selection = None;
        self.refresh_formats();
        edit
    }

    fn refresh_formats(&mut self) {
        self.state.active_formats = self
            .document
            .formats_at(&self.state.cursor)
            .unwrap_or_default();
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

#[cfg(test)]
#[path = "editor/cursor_tests.rs"]
mod cursor_tests;
