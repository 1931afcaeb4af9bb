use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tdoc::{InlineStyle, markdown, parse, writer::Writer};

use crate::editor::{Document, FormatKind, Paragraph, Span};

/// On-disk representation, picked from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Markdown,
    Ftml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("md" | "markdown") => DocumentFormat::Markdown,
            Some("ftml") => DocumentFormat::Ftml,
            _ => DocumentFormat::Json,
        }
    }

    /// Markdown and FTML go through `tdoc`; block structure the tree cannot
    /// hold (lists, quotes, headings) is flattened into plain paragraphs.
    pub fn read(self, content: &str) -> Result<Document> {
        match self {
            DocumentFormat::Json => Document::from_json(content).context("failed to read snapshot"),
            DocumentFormat::Ftml => {
                let document = parse(Cursor::new(content)).context("failed to parse FTML")?;
                Ok(from_tdoc(&document))
            }
            DocumentFormat::Markdown => {
                let document = markdown::parse(Cursor::new(content))
                    .map_err(|err| anyhow!(err))
                    .context("failed to parse Markdown")?;
                Ok(from_tdoc(&document))
            }
        }
    }

    pub fn write(self, document: &Document) -> Result<String> {
        match self {
            DocumentFormat::Json => document.to_json().context("failed to serialize snapshot"),
            DocumentFormat::Markdown => write_markdown(document),
            DocumentFormat::Ftml => write_ftml(document),
        }
    }
}

pub fn inline_style(kind: FormatKind) -> InlineStyle {
    match kind {
        FormatKind::Strong => InlineStyle::Bold,
        FormatKind::Emphasis => InlineStyle::Italic,
        FormatKind::Underline => InlineStyle::Underline,
        FormatKind::Title => InlineStyle::Highlight,
    }
}

fn format_kind(style: InlineStyle) -> Option<FormatKind> {
    match style {
        InlineStyle::Bold => Some(FormatKind::Strong),
        InlineStyle::Italic => Some(FormatKind::Emphasis),
        InlineStyle::Underline => Some(FormatKind::Underline),
        InlineStyle::Highlight => Some(FormatKind::Title),
        _ => None,
    }
}

pub fn to_tdoc(document: &Document) -> tdoc::Document {
    let paragraphs = document
        .paragraphs()
        .iter()
        .map(|paragraph| tdoc::Paragraph::new_text().with_content(spans_to_tdoc(&paragraph.children)))
        .collect();
    tdoc::Document::new().with_paragraphs(paragraphs)
}

fn spans_to_tdoc(spans: &[Span]) -> Vec<tdoc::Span> {
    spans
        .iter()
        .filter(|span| !span.is_blank())
        .map(span_to_tdoc)
        .collect()
}

fn span_to_tdoc(span: &Span) -> tdoc::Span {
    match span {
        Span::Text { content } => tdoc::Span::new_text(content.as_str()),
        Span::Format { kind, children } => {
            let mut span = tdoc::Span::new_text("");
            span.style = inline_style(*kind);
            span.children = spans_to_tdoc(children);
            span
        }
    }
}

pub fn from_tdoc(document: &tdoc::Document) -> Document {
    let mut paragraphs = Vec::new();
    for paragraph in &document.paragraphs {
        collect_paragraphs(paragraph, &mut paragraphs);
    }
    Document::from_paragraphs(paragraphs).unwrap_or_default()
}

fn collect_paragraphs(paragraph: &tdoc::Paragraph, out: &mut Vec<Paragraph>) {
    let has_blocks = !paragraph.children().is_empty() || !paragraph.entries().is_empty();
    if !paragraph.content().is_empty() || !has_blocks {
        let children = paragraph.content().iter().flat_map(span_from_tdoc).collect();
        out.push(Paragraph::normalized(children));
    }
    for child in paragraph.children() {
        collect_paragraphs(child, out);
    }
    for entry in paragraph.entries() {
        for item in entry {
            collect_paragraphs(item, out);
        }
    }
}

fn span_from_tdoc(span: &tdoc::Span) -> Vec<Span> {
    let mut children = Vec::new();
    if !span.text.is_empty() {
        children.push(Span::new_text(span.text.as_str()));
    }
    children.extend(span.children.iter().flat_map(span_from_tdoc));
    match format_kind(span.style) {
        Some(kind) => vec![Span::new_format(kind, children)],
        None => children,
    }
}

pub fn write_ftml(document: &Document) -> Result<String> {
    let writer = Writer::new();
    writer
        .write_to_string(&to_tdoc(document))
        .context("failed to render FTML")
}

pub fn write_markdown(document: &Document) -> Result<String> {
    let mut contents = Vec::new();
    markdown::write(&mut contents, &to_tdoc(document)).context("failed to render Markdown")?;
    String::from_utf8(contents).context("Markdown output is not UTF-8")
}
