use std::collections::BTreeSet;

use tracing::debug;

use super::error::{EditError, check_index};
use super::tree::{Document, FormatKind, NodeRef, Span, char_len, char_to_byte_idx, nested_text};
use super::DocumentVector;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormatPlacement {
    Replace,
    Before,
    After,
    Into,
}

impl Document {
    /// Opens an empty `kind` span at the caret and returns the caret inside it.
    pub fn insert_format(
        &mut self,
        vector: &DocumentVector,
        kind: FormatKind,
    ) -> Result<DocumentVector, EditError> {
        let content = self.resolve_text(vector)?;
        let len = char_len(content);
        check_index(vector, 0, len)?;

        let placement = if len == 0 {
            FormatPlacement::Replace
        } else if vector.index == 0 {
            FormatPlacement::Before
        } else if vector.index == len {
            FormatPlacement::After
        } else {
            FormatPlacement::Into
        };
        let split_at = char_to_byte_idx(content, vector.index);
        let (first, last) = (
            content[..split_at].to_string(),
            content[split_at..].to_string(),
        );

        let Some((&position, parent)) = vector.path.split_last() else {
            return Err(EditError::unresolvable(&vector.path, "path is empty"));
        };
        let format = Span::new_format(kind, vec![Span::new_text("")]);
        let siblings = self.children_at_mut(parent)?;
        let slot = match placement {
            FormatPlacement::Replace => {
                siblings[position] = format;
                position
            }
            FormatPlacement::Before => {
                siblings.insert(position, format);
                position
            }
            FormatPlacement::After => {
                siblings.insert(position + 1, format);
                position + 1
            }
            FormatPlacement::Into => {
                siblings.splice(
                    position..=position,
                    [Span::new_text(first), format, Span::new_text(last)],
                );
                position + 1
            }
        };

        let mut path = parent.to_vec();
        path.extend([slot, 0]);
        let caret = self.normalize_paragraph_at(vector.path[0], &DocumentVector::new(path, 0))?;
        debug!(at = %vector, to = %caret, %kind, ?placement, "insert format");
        Ok(caret)
    }

    /// Ends the nearest enclosing `kind` span at the caret. The span is split
    /// along the caret and a fresh leaf, still carrying the other formats that
    /// were active there, is placed between the halves. At the leading or
    /// trailing edge one half purges away, so the leaf lands before or after
    /// the span.
    pub fn remove_format(
        &mut self,
        vector: &DocumentVector,
        kind: FormatKind,
    ) -> Result<DocumentVector, EditError> {
        let ancestors = self.format_ancestors(vector)?;
        let Some(target_at) = ancestors.iter().rposition(|(_, k)| *k == kind) else {
            return Err(EditError::FormatNotFound {
                kind,
                path: vector.path.clone(),
            });
        };
        let depth = ancestors[target_at].0;
        let inner_kinds: Vec<FormatKind> = ancestors[target_at + 1..]
            .iter()
            .map(|(_, k)| *k)
            .filter(|k| *k != kind)
            .collect();

        let target_path = &vector.path[..depth];
        let target = match self.resolve_node(target_path)? {
            NodeRef::Span(span) => span,
            NodeRef::Paragraph(_) => {
                return Err(EditError::unresolvable(target_path, "expected format, found paragraph"));
            }
        };
        let (left, right) = split_along_vector(target, &vector.path[depth..], vector.index)?;
        let (caret_leaf, wrap_depth) = nested_text(&inner_kinds, "");

        let Some((&target_index, anchor_path)) = target_path.split_last() else {
            return Err(EditError::unresolvable(target_path, "path is empty"));
        };
        let anchor_path = anchor_path.to_vec();
        self.children_at_mut(&anchor_path)?
            .splice(target_index..=target_index, [left, caret_leaf, right]);

        let mut path = anchor_path;
        path.push(target_index + 1);
        path.extend(std::iter::repeat_n(0, wrap_depth));
        let caret = self.normalize_paragraph_at(vector.path[0], &DocumentVector::new(path, 0))?;
        debug!(at = %vector, to = %caret, %kind, "remove format");
        Ok(caret)
    }

    pub fn formats_at(&self, vector: &DocumentVector) -> Result<BTreeSet<FormatKind>, EditError> {
        Ok(self
            .format_ancestors(vector)?
            .into_iter()
            .map(|(_, kind)| kind)
            .collect())
    }

    /// Format nodes between the paragraph and the addressed text, outermost
    /// first, each with the length of the path prefix that reaches it.
    fn format_ancestors(
        &self,
        vector: &DocumentVector,
    ) -> Result<Vec<(usize, FormatKind)>, EditError> {
        self.resolve_text(vector)?;
        let mut ancestors = Vec::new();
        for depth in 2..vector.path.len() {
            if let NodeRef::Span(Span::Format { kind, .. }) =
                self.resolve_node(&vector.path[..depth])?
            {
                ancestors.push((depth, *kind));
            }
        }
        Ok(ancestors)
    }
}

/// Splits `span` into the parts before and after the caret addressed by the
/// relative `path` and `index`. Both halves keep the full chain of format
/// nodes, so either may come back holding only empty leaves.
pub fn split_along_vector(
    span: &Span,
    path: &[usize],
    index: usize,
) -> Result<(Span, Span), EditError> {
    match span {
        Span::Text { content } => {
            if !path.is_empty() {
                return Err(EditError::unresolvable(path, "path continues below a text node"));
            }
            let len = char_len(content);
            if index > len {
                return Err(EditError::IndexOutOfRange {
                    path: path.to_vec(),
                    index,
                    min: 0,
                    max: len,
                });
            }
            let split_at = char_to_byte_idx(content, index);
            Ok((
                Span::new_text(&content[..split_at]),
                Span::new_text(&content[split_at..]),
            ))
        }
        Span::Format { kind, children } => {
            let (left, right) = split_children(children, path, index)?;
            Ok((Span::new_format(*kind, left), Span::new_format(*kind, right)))
        }
    }
}

pub(crate) fn split_children(
    children: &[Span],
    path: &[usize],
    index: usize,
) -> Result<(Vec<Span>, Vec<Span>), EditError> {
    let Some((&at, rest)) = path.split_first() else {
        return Err(EditError::unresolvable(path, "path ends at a container"));
    };
    let pivot = children
        .get(at)
        .ok_or_else(|| EditError::unresolvable(path, format!("child index {at} out of range")))?;
    let (pivot_left, pivot_right) = split_along_vector(pivot, rest, index)?;

    let mut left = children[..at].to_vec();
    left.push(pivot_left);
    let mut right = vec![pivot_right];
    right.extend_from_slice(&children[at + 1..]);
    Ok((left, right))
}
