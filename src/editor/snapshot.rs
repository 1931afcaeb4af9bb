//! JSON form of a [`Document`]: a list of paragraph nodes, each node tagged
//! with its `type`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::tree::{Document, FormatKind, InvariantViolation, Paragraph, Span};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotNode {
    Paragraph {
        children: Vec<SnapshotNode>,
    },
    Format {
        format: FormatKind,
        children: Vec<SnapshotNode>,
    },
    Text {
        #[serde(default)]
        content: String,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("paragraph node nested below paragraph {paragraph}")]
    MisplacedParagraph { paragraph: usize },
    #[error("top-level node {index} is a {found}, expected a paragraph")]
    NotAParagraph { index: usize, found: &'static str },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl SnapshotNode {
    fn type_name(&self) -> &'static str {
        match self {
            SnapshotNode::Paragraph { .. } => "paragraph",
            SnapshotNode::Format { .. } => "format",
            SnapshotNode::Text { .. } => "text",
        }
    }
}

impl From<&Span> for SnapshotNode {
    fn from(span: &Span) -> Self {
        match span {
            Span::Text { content } => SnapshotNode::Text {
                content: content.clone(),
            },
            Span::Format { kind, children } => SnapshotNode::Format {
                format: *kind,
                children: children.iter().map(SnapshotNode::from).collect(),
            },
        }
    }
}

impl From<&Paragraph> for SnapshotNode {
    fn from(paragraph: &Paragraph) -> Self {
        SnapshotNode::Paragraph {
            children: paragraph.children.iter().map(SnapshotNode::from).collect(),
        }
    }
}

fn span_from_node(node: SnapshotNode, paragraph: usize) -> Result<Span, SnapshotError> {
    match node {
        SnapshotNode::Text { content } => Ok(Span::Text { content }),
        SnapshotNode::Format { format, children } => Ok(Span::Format {
            kind: format,
            children: children
                .into_iter()
                .map(|child| span_from_node(child, paragraph))
                .collect::<Result<_, _>>()?,
        }),
        SnapshotNode::Paragraph { .. } => Err(SnapshotError::MisplacedParagraph { paragraph }),
    }
}

impl Document {
    pub fn to_snapshot(&self) -> Vec<SnapshotNode> {
        self.paragraphs.iter().map(SnapshotNode::from).collect()
    }

    /// Rebuilds a document and checks it against the structural invariants.
    pub fn from_snapshot(nodes: Vec<SnapshotNode>) -> Result<Self, SnapshotError> {
        let mut paragraphs = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.into_iter().enumerate() {
            let children = match node {
                SnapshotNode::Paragraph { children } => children,
                other => {
                    return Err(SnapshotError::NotAParagraph {
                        index,
                        found: other.type_name(),
                    });
                }
            };
            let children = children
                .into_iter()
                .map(|child| span_from_node(child, index))
                .collect::<Result<_, _>>()?;
            paragraphs.push(Paragraph::new(children));
        }
        Ok(Document::from_paragraphs(paragraphs)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let nodes: Vec<SnapshotNode> = serde_json::from_str(json)?;
        Document::from_snapshot(nodes).inspect_err(|err| warn!(%err, "rejected snapshot"))
    }
}
