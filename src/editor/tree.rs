use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em", alias = "emphasis")]
    Emphasis,
    #[serde(rename = "u", alias = "underline")]
    Underline,
    #[serde(rename = "title")]
    Title,
}

impl FormatKind {
    pub const ALL: [FormatKind; 4] = [
        FormatKind::Strong,
        FormatKind::Emphasis,
        FormatKind::Underline,
        FormatKind::Title,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormatKind::Strong => "Bold",
            FormatKind::Emphasis => "Italic",
            FormatKind::Underline => "Underline",
            FormatKind::Title => "Title",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A child of a paragraph or format node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Span {
    Text { content: String },
    Format { kind: FormatKind, children: Vec<Span> },
}

impl Span {
    pub fn new_text(content: impl Into<String>) -> Self {
        Span::Text {
            content: content.into(),
        }
    }

    pub fn new_format(kind: FormatKind, children: Vec<Span>) -> Self {
        Span::Format { kind, children }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Span::Text { content } => Some(content),
            Span::Format { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&[Span]> {
        match self {
            Span::Text { .. } => None,
            Span::Format { children, .. } => Some(children),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Span::Text { .. } => "text",
            Span::Format { .. } => "format",
        }
    }

    /// True when every leaf below this span is empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Span::Text { content } => content.is_empty(),
            Span::Format { children, .. } => children.iter().all(Span::is_blank),
        }
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Span::Text { content } => out.push_str(content),
            Span::Format { children, .. } => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
        }
    }

    fn empty_leaf_count(&self) -> usize {
        match self {
            Span::Text { content } => usize::from(content.is_empty()),
            Span::Format { children, .. } => children.iter().map(Span::empty_leaf_count).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paragraph {
    pub children: Vec<Span>,
}

impl Paragraph {
    pub fn new(children: Vec<Span>) -> Self {
        Self { children }
    }

    pub fn empty() -> Self {
        Self::new(vec![Span::new_text("")])
    }

    /// Builds a paragraph from arbitrary spans, purging and merging them.
    pub fn normalized(children: Vec<Span>) -> Self {
        let (children, _) = normalize_paragraph(children, None);
        Self::new(children)
    }

    pub fn is_blank(&self) -> bool {
        self.children.iter().all(Span::is_blank)
    }

    pub fn plain_text(&self) -> String {
        self.children.iter().map(Span::plain_text).collect()
    }
}

/// Owns the paragraph sequence. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub(crate) paragraphs: Vec<Paragraph>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            paragraphs: vec![Paragraph::empty()],
        }
    }

    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Result<Self, InvariantViolation> {
        let document = Self { paragraphs };
        document.validate()?;
        Ok(document)
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Checks the structural invariants every completed mutation leaves behind.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.paragraphs.is_empty() {
            return Err(InvariantViolation::NoParagraphs);
        }
        for (idx, paragraph) in self.paragraphs.iter().enumerate() {
            let mut path = vec![idx];
            validate_children(&paragraph.children, &mut path)?;
            let empty_leaves: usize = paragraph
                .children
                .iter()
                .map(Span::empty_leaf_count)
                .sum();
            if empty_leaves > 1 {
                return Err(InvariantViolation::StrayEmptyText { paragraph: idx });
            }
        }
        Ok(())
    }
}

fn validate_children(children: &[Span], path: &mut Vec<usize>) -> Result<(), InvariantViolation> {
    if children.is_empty() {
        return Err(InvariantViolation::EmptyContainer { path: path.clone() });
    }
    for (idx, pair) in children.windows(2).enumerate() {
        if matches!(pair, [Span::Text { .. }, Span::Text { .. }]) {
            let mut at = path.clone();
            at.push(idx + 1);
            return Err(InvariantViolation::AdjacentText { path: at });
        }
    }
    for (idx, child) in children.iter().enumerate() {
        if let Span::Format { children, .. } = child {
            path.push(idx);
            validate_children(children, path)?;
            path.pop();
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("document has no paragraphs")]
    NoParagraphs,
    #[error("node at {path:?} has no children")]
    EmptyContainer { path: Vec<usize> },
    #[error("text node at {path:?} follows another text node")]
    AdjacentText { path: Vec<usize> },
    #[error("paragraph {paragraph} holds more than one empty text node")]
    StrayEmptyText { paragraph: usize },
}

/// Borrowed view of whatever a path resolves to.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Paragraph(&'a Paragraph),
    Span(&'a Span),
}

impl<'a> NodeRef<'a> {
    pub fn children(self) -> Option<&'a [Span]> {
        match self {
            NodeRef::Paragraph(paragraph) => Some(&paragraph.children),
            NodeRef::Span(span) => span.children(),
        }
    }

    pub fn kind_name(self) -> &'static str {
        match self {
            NodeRef::Paragraph(_) => "paragraph",
            NodeRef::Span(span) => span.kind_name(),
        }
    }
}

/// Caret re-addressed relative to a rebuilt child sequence.
pub(crate) type RelativeCaret = (Vec<usize>, usize);

/// Rebuilds a child sequence: empty text leaves are purged (except the one
/// the caret sits in), formats left without children vanish and adjacent
/// text siblings are merged. Returns the caret re-addressed into the result.
pub(crate) fn normalize_spans(
    spans: Vec<Span>,
    caret: Option<(&[usize], usize)>,
) -> (Vec<Span>, Option<RelativeCaret>) {
    let mut result: Vec<Span> = Vec::with_capacity(spans.len());
    let mut new_caret = None;

    for (idx, span) in spans.into_iter().enumerate() {
        let child_caret = caret.and_then(|(path, index)| match path.split_first() {
            Some((&first, rest)) if first == idx => Some((rest, index)),
            _ => None,
        });

        match span {
            Span::Text { content } => {
                if content.is_empty() && child_caret.is_none() {
                    continue;
                }
                let caret_index = child_caret.map(|(_, index)| index);
                let last = result.len().checked_sub(1);
                if let (Some(last), Some(Span::Text { content: previous })) =
                    (last, result.last_mut())
                {
                    let offset = char_len(previous);
                    previous.push_str(&content);
                    if let Some(index) = caret_index {
                        new_caret = Some((vec![last], offset + index));
                    }
                    continue;
                }
                result.push(Span::Text { content });
                if let Some(index) = caret_index {
                    new_caret = Some((vec![result.len() - 1], index));
                }
            }
            Span::Format { kind, children } => {
                let (children, inner) = normalize_spans(children, child_caret);
                if children.is_empty() {
                    continue;
                }
                result.push(Span::Format { kind, children });
                if let Some((mut path, index)) = inner {
                    path.insert(0, result.len() - 1);
                    new_caret = Some((path, index));
                }
            }
        }
    }

    (result, new_caret)
}

/// Like [`normalize_spans`], but a paragraph that purges to nothing keeps a
/// single empty text leaf.
pub(crate) fn normalize_paragraph(
    children: Vec<Span>,
    caret: Option<(&[usize], usize)>,
) -> (Vec<Span>, Option<RelativeCaret>) {
    let (mut children, caret) = normalize_spans(children, caret);
    if children.is_empty() {
        children.push(Span::new_text(""));
    }
    (children, caret)
}

/// Wraps a text leaf in `kinds`, outermost first. Returns the node and the
/// number of wrapping levels.
pub(crate) fn nested_text(kinds: &[FormatKind], content: &str) -> (Span, usize) {
    let node = kinds
        .iter()
        .rev()
        .fold(Span::new_text(content), |child, kind| {
            Span::new_format(*kind, vec![child])
        });
    (node, kinds.len())
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}
