use tracing::trace;

use super::error::{Direction, EditError, check_index};
use super::tree::{Document, NodeRef, Paragraph, RelativeCaret, Span, char_len, normalize_paragraph};
use super::DocumentVector;

/// True when `path` addresses the first text leaf of its paragraph. Text
/// leaves terminate a path, so that leaf is reached by taking child 0 at
/// every level.
pub fn is_leading_path(path: &[usize]) -> bool {
    path.iter().skip(1).all(|&idx| idx == 0)
}

impl Document {
    pub fn resolve_node(&self, path: &[usize]) -> Result<NodeRef<'_>, EditError> {
        let (&first, rest) = path
            .split_first()
            .ok_or_else(|| EditError::unresolvable(path, "path is empty"))?;
        let paragraph = self.paragraphs.get(first).ok_or_else(|| {
            EditError::unresolvable(path, format!("paragraph index {first} out of range"))
        })?;

        let mut node = NodeRef::Paragraph(paragraph);
        for (depth, &idx) in rest.iter().enumerate() {
            let children = node.children().ok_or_else(|| {
                EditError::unresolvable(
                    path,
                    format!("expected format or paragraph at depth {}, found text", depth + 1),
                )
            })?;
            let child = children.get(idx).ok_or_else(|| {
                EditError::unresolvable(
                    path,
                    format!("child index {idx} out of range at depth {}", depth + 1),
                )
            })?;
            node = NodeRef::Span(child);
        }
        Ok(node)
    }

    pub fn resolve_text(&self, vector: &DocumentVector) -> Result<&str, EditError> {
        match self.resolve_node(&vector.path)? {
            NodeRef::Span(Span::Text { content }) => Ok(content),
            other => Err(EditError::NodeTypeMismatch {
                path: vector.path.clone(),
                found: other.kind_name(),
            }),
        }
    }

    /// Resolves the addressed text and checks `index` against its length.
    pub(crate) fn text_len_checked(&self, vector: &DocumentVector) -> Result<usize, EditError> {
        let len = char_len(self.resolve_text(vector)?);
        check_index(vector, 0, len)?;
        Ok(len)
    }

    pub fn next_vector(&self, vector: &DocumentVector) -> Result<DocumentVector, EditError> {
        let len = self.text_len_checked(vector)?;
        if vector.index < len {
            return Ok(vector.with_index(vector.index + 1));
        }

        let mut path = vector.path.clone();
        while let Some(child) = path.pop() {
            let sibling_count = if path.is_empty() {
                self.paragraphs.len()
            } else {
                self.children_at(&path)?.len()
            };
            if child + 1 >= sibling_count {
                continue;
            }
            path.push(child + 1);
            let crossed_paragraph = path.len() == 1;
            let mut next = self.leading_vector(&path)?;
            if !crossed_paragraph {
                // index 0 here is the same caret location as the end of the
                // leaf we just left
                next.index = char_len(self.resolve_text(&next)?).min(1);
            }
            trace!(from = %vector, to = %next, "next vector");
            return Ok(next);
        }

        Err(EditError::Boundary {
            direction: Direction::Forward,
            vector: vector.clone(),
        })
    }

    pub fn previous_vector(&self, vector: &DocumentVector) -> Result<DocumentVector, EditError> {
        self.text_len_checked(vector)?;
        let floor = if is_leading_path(&vector.path) { 0 } else { 1 };
        if vector.index > floor {
            return Ok(vector.with_index(vector.index - 1));
        }

        let mut path = vector.path.clone();
        while let Some(child) = path.pop() {
            if child == 0 {
                continue;
            }
            path.push(child - 1);
            let previous = self.trailing_vector(&path)?;
            trace!(from = %vector, to = %previous, "previous vector");
            return Ok(previous);
        }

        Err(EditError::Boundary {
            direction: Direction::Backward,
            vector: vector.clone(),
        })
    }

    /// First caret position inside the subtree rooted at `path`.
    pub fn leading_vector(&self, path: &[usize]) -> Result<DocumentVector, EditError> {
        let mut path = path.to_vec();
        let mut node = self.resolve_node(&path)?;
        loop {
            let children = match node {
                NodeRef::Span(Span::Text { .. }) => return Ok(DocumentVector::new(path, 0)),
                NodeRef::Span(Span::Format { children, .. }) => children.as_slice(),
                NodeRef::Paragraph(Paragraph { children }) => children.as_slice(),
            };
            let first = children
                .first()
                .ok_or_else(|| EditError::unresolvable(&path, "container has no children"))?;
            path.push(0);
            node = NodeRef::Span(first);
        }
    }

    /// Last caret position inside the subtree rooted at `path`.
    pub fn trailing_vector(&self, path: &[usize]) -> Result<DocumentVector, EditError> {
        let mut path = path.to_vec();
        let mut node = self.resolve_node(&path)?;
        loop {
            let children = match node {
                NodeRef::Span(Span::Text { content }) => {
                    return Ok(DocumentVector::new(path, char_len(content)));
                }
                NodeRef::Span(Span::Format { children, .. }) => children.as_slice(),
                NodeRef::Paragraph(Paragraph { children }) => children.as_slice(),
            };
            let last = children
                .last()
                .ok_or_else(|| EditError::unresolvable(&path, "container has no children"))?;
            path.push(children.len() - 1);
            node = NodeRef::Span(last);
        }
    }

    pub fn document_start(&self) -> Result<DocumentVector, EditError> {
        self.leading_vector(&[0])
    }

    pub fn document_end(&self) -> Result<DocumentVector, EditError> {
        self.trailing_vector(&[self.paragraphs.len().saturating_sub(1)])
    }

    /// Turns a host selection point into a text vector. On a text node
    /// `offset` is a character offset; on a container (or the empty path,
    /// meaning the paragraph list) it is a child index, and the point snaps
    /// to the nearest leaf.
    pub fn resolve_selection_point(
        &self,
        path: &[usize],
        offset: usize,
    ) -> Result<DocumentVector, EditError> {
        let child_count = if path.is_empty() {
            self.paragraphs.len()
        } else {
            match self.resolve_node(path)? {
                NodeRef::Span(Span::Text { content }) => {
                    let vector = DocumentVector::new(path.to_vec(), offset);
                    check_index(&vector, 0, char_len(content))?;
                    return Ok(vector);
                }
                NodeRef::Span(Span::Format { children, .. }) => children.len(),
                NodeRef::Paragraph(Paragraph { children }) => children.len(),
            }
        };

        let mut child_path = path.to_vec();
        if offset < child_count {
            child_path.push(offset);
            self.leading_vector(&child_path)
        } else {
            child_path.push(child_count.saturating_sub(1));
            self.trailing_vector(&child_path)
        }
    }

    /// Children of the paragraph or format node at `path`.
    pub(crate) fn children_at(&self, path: &[usize]) -> Result<&[Span], EditError> {
        self.resolve_node(path)?
            .children()
            .ok_or_else(|| EditError::unresolvable(path, "expected format or paragraph, found text"))
    }

    pub(crate) fn children_at_mut(&mut self, path: &[usize]) -> Result<&mut Vec<Span>, EditError> {
        let (&first, rest) = path
            .split_first()
            .ok_or_else(|| EditError::unresolvable(path, "path is empty"))?;
        let paragraph = self.paragraphs.get_mut(first).ok_or_else(|| {
            EditError::unresolvable(path, format!("paragraph index {first} out of range"))
        })?;

        let mut children = &mut paragraph.children;
        for &idx in rest {
            children = match children.get_mut(idx) {
                Some(Span::Format { children, .. }) => children,
                Some(Span::Text { .. }) => {
                    return Err(EditError::unresolvable(
                        path,
                        "expected format or paragraph, found text",
                    ));
                }
                None => {
                    return Err(EditError::unresolvable(
                        path,
                        format!("child index {idx} out of range"),
                    ));
                }
            };
        }
        Ok(children)
    }

    pub(crate) fn text_mut(&mut self, vector: &DocumentVector) -> Result<&mut String, EditError> {
        let path = &vector.path;
        let Some((&last, parent)) = path.split_last() else {
            return Err(EditError::unresolvable(path, "path is empty"));
        };
        if parent.is_empty() {
            self.resolve_node(path)?;
            return Err(EditError::NodeTypeMismatch {
                path: path.clone(),
                found: "paragraph",
            });
        }
        match self.children_at_mut(parent)?.get_mut(last) {
            Some(Span::Text { content }) => Ok(content),
            Some(Span::Format { .. }) => Err(EditError::NodeTypeMismatch {
                path: path.clone(),
                found: "format",
            }),
            None => Err(EditError::unresolvable(
                path,
                format!("child index {last} out of range"),
            )),
        }
    }

    /// Purges and merges paragraph `paragraph_index` around `caret`, returning
    /// the caret re-addressed into the rebuilt paragraph.
    pub(crate) fn normalize_paragraph_at(
        &mut self,
        paragraph_index: usize,
        caret: &DocumentVector,
    ) -> Result<DocumentVector, EditError> {
        let paragraph = self.paragraphs.get_mut(paragraph_index).ok_or_else(|| {
            EditError::unresolvable(
                &[paragraph_index],
                format!("paragraph index {paragraph_index} out of range"),
            )
        })?;
        let relative = match caret.path.split_first() {
            Some((&first, rest)) if first == paragraph_index => Some((rest, caret.index)),
            _ => None,
        };
        let children = std::mem::take(&mut paragraph.children);
        let (children, new_caret) = normalize_paragraph(children, relative);
        paragraph.children = children;

        match new_caret {
            Some(relative) => Ok(absolute(paragraph_index, relative)),
            None => self.leading_vector(&[paragraph_index]),
        }
    }
}

fn absolute(paragraph_index: usize, (mut path, index): RelativeCaret) -> DocumentVector {
    path.insert(0, paragraph_index);
    DocumentVector::new(path, index)
}
