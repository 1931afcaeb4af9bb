use std::collections::HashMap;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::editor::{
    Document, DocumentVector, FormatKind, Paragraph, SelectionRange, Span as DocSpan,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    /// Every caret position in document order with the cell it is drawn at.
    pub cursor_map: Vec<(DocumentVector, CursorVisualPosition)>,
}

pub fn render_document(
    document: &Document,
    width: usize,
    cursor: Option<&DocumentVector>,
    selection: Option<&SelectionRange>,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), cursor, selection);
    renderer.render_document(document);
    renderer.finish()
}

struct Renderer<'a> {
    wrap_width: usize,
    cursor_target: Option<&'a DocumentVector>,
    selection: Option<(&'a DocumentVector, &'a DocumentVector)>,
    markers: Vec<DocumentVector>,
    marker_positions: HashMap<usize, CursorVisualPosition>,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
}

impl<'a> Renderer<'a> {
    fn new(
        wrap_width: usize,
        cursor_target: Option<&'a DocumentVector>,
        selection: Option<&'a SelectionRange>,
    ) -> Self {
        Self {
            wrap_width,
            cursor_target,
            selection: selection.map(SelectionRange::ordered),
            markers: Vec::new(),
            marker_positions: HashMap::new(),
            cursor: None,
            lines: Vec::new(),
            current_line_index: 0,
        }
    }

    fn render_document(&mut self, document: &Document) {
        for (idx, paragraph) in document.paragraphs().iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            self.render_paragraph(idx, paragraph);
        }
    }

    fn render_paragraph(&mut self, index: usize, paragraph: &Paragraph) {
        let mut tokenizer = Tokenizer::default();
        let mut path = vec![index];
        for (child_idx, span) in paragraph.children.iter().enumerate() {
            path.push(child_idx);
            self.collect_fragments(span, Style::default(), &mut path, &mut tokenizer);
            path.pop();
        }
        let lines = wrap_fragments(&tokenizer.finish(), self.wrap_width);
        self.consume_lines(lines);
    }

    fn collect_fragments(
        &mut self,
        span: &DocSpan,
        base_style: Style,
        path: &mut Vec<usize>,
        tokenizer: &mut Tokenizer,
    ) {
        match span {
            DocSpan::Text { content } => self.tokenize_leaf(content, base_style, path, tokenizer),
            DocSpan::Format { kind, children } => {
                let style = merge_style(base_style, *kind);
                for (idx, child) in children.iter().enumerate() {
                    path.push(idx);
                    self.collect_fragments(child, style, path, tokenizer);
                    path.pop();
                }
            }
        }
    }

    fn tokenize_leaf(
        &mut self,
        content: &str,
        style: Style,
        path: &[usize],
        tokenizer: &mut Tokenizer,
    ) {
        let mut index = 0;
        for ch in content.chars() {
            self.mark(path, index, tokenizer);
            let style = if self.is_selected(path, index) {
                style.add_modifier(Modifier::REVERSED)
            } else {
                style
            };
            tokenizer.push_char(ch, style);
            index += 1;
        }
        self.mark(path, index, tokenizer);
    }

    fn mark(&mut self, path: &[usize], index: usize, tokenizer: &mut Tokenizer) {
        let vector = DocumentVector::new(path.to_vec(), index);
        if self.cursor_target == Some(&vector) {
            tokenizer.push_event(TextEventKind::Cursor);
        }
        tokenizer.push_event(TextEventKind::Marker(self.markers.len()));
        self.markers.push(vector);
    }

    /// The character after `index` lies inside the selection.
    fn is_selected(&self, path: &[usize], index: usize) -> bool {
        let Some((from, to)) = self.selection else {
            return false;
        };
        let before = DocumentVector::new(path.to_vec(), index);
        let after = before.with_index(index + 1);
        *from <= before && after <= *to
    }

    fn push_blank_line(&mut self) {
        self.lines.push(Line::from(""));
        self.current_line_index += 1;
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let spans: Vec<Span<'static>> = output
                .spans
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect();
            let line = Line::from(spans);
            for event in output.events {
                let position = CursorVisualPosition {
                    line: self.current_line_index,
                    column: event.column,
                };
                match event.kind {
                    TextEventKind::Cursor => {
                        self.cursor = Some(position);
                    }
                    TextEventKind::Marker(id) => {
                        self.marker_positions.insert(id, position);
                    }
                }
            }
            self.lines.push(line);
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();

        let mut cursor_map = Vec::with_capacity(self.markers.len());
        for (id, vector) in self.markers.into_iter().enumerate() {
            if let Some(position) = self.marker_positions.get(&id) {
                cursor_map.push((vector, *position));
            }
        }

        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
            cursor_map,
        }
    }
}

fn merge_style(base: Style, kind: FormatKind) -> Style {
    match kind {
        FormatKind::Strong => base.add_modifier(Modifier::BOLD),
        FormatKind::Emphasis => base.add_modifier(Modifier::ITALIC),
        FormatKind::Underline => base.add_modifier(Modifier::UNDERLINED),
        FormatKind::Title => base.add_modifier(Modifier::BOLD).fg(Color::Cyan),
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
    kind: TextEventKind,
}

/// A run of word or whitespace characters that wraps as a unit. A word may
/// cross leaves, so it carries one segment per style.
#[derive(Clone)]
struct Fragment {
    segments: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
    kind: TextEventKind,
}

#[derive(Clone, Copy)]
enum TextEventKind {
    Marker(usize),
    Cursor,
}

#[derive(Default)]
struct Tokenizer {
    fragments: Vec<FragmentItem>,
    builder: Option<TokenBuilder>,
    pending_events: Vec<TextEvent>,
}

impl Tokenizer {
    fn push_event(&mut self, kind: TextEventKind) {
        self.pending_events.push(TextEvent { offset: 0, kind });
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match ch {
            '\r' => {}
            '\n' => {
                self.flush_token();
                self.fragments.push(FragmentItem::LineBreak);
            }
            '\t' => {
                for _ in 0..4 {
                    self.push_visible(' ', style);
                }
            }
            _ => self.push_visible(ch, style),
        }
    }

    fn push_visible(&mut self, ch: char, style: Style) {
        let is_whitespace = ch.is_whitespace();
        let continues = self
            .builder
            .as_ref()
            .is_some_and(|existing| existing.kind_matches(is_whitespace));
        if !continues {
            if let Some(mut existing) = self.builder.take() {
                existing.add_events(&mut self.pending_events);
                self.fragments.push(FragmentItem::Token(existing.finish()));
            }
            self.builder = Some(TokenBuilder::new(is_whitespace));
        }
        if let Some(current) = self.builder.as_mut() {
            current.add_events(&mut self.pending_events);
            current.push_char(ch, style);
        }
    }

    fn flush_token(&mut self) {
        if let Some(mut token) = self.builder.take() {
            token.add_events(&mut self.pending_events);
            self.fragments.push(FragmentItem::Token(token.finish()));
        } else if !self.pending_events.is_empty() {
            self.fragments.push(FragmentItem::Token(Fragment {
                segments: Vec::new(),
                kind: FragmentKind::Word,
                width: 0,
                events: self.pending_events.drain(..).collect(),
            }));
        }
    }

    fn finish(mut self) -> Vec<FragmentItem> {
        self.flush_token();
        self.fragments
    }
}

struct TokenBuilder {
    segments: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(is_whitespace: bool) -> Self {
        Self {
            segments: Vec::new(),
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            events: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.segments.last_mut() {
            Some(segment) if segment.style == style => segment.text.push(ch),
            _ => self.segments.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            segments: self.segments,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(fragments: &[FragmentItem], width: usize) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::default();
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::default();
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.width > 0 && builder.width + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::default();
                    }

                    builder.consume_pending(&mut pending_whitespace);
                    builder.append_token(token.clone());
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

#[derive(Default)]
struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
}

impl LineBuilder {
    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        self.segments.extend(fragment.segments);
        self.width += fragment.width;

        for event in fragment.events {
            let column = self.width.saturating_sub(fragment.width) + event.offset;
            self.events.push(LocatedEvent {
                column: column as u16,
                kind: event.kind,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.events.sort_by_key(|event| event.column);
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> DocSpan {
        DocSpan::new_text(content)
    }

    fn vector(path: &[usize], index: usize) -> DocumentVector {
        DocumentVector::new(path.to_vec(), index)
    }

    fn document(paragraphs: Vec<Vec<DocSpan>>) -> Document {
        Document::from_paragraphs(paragraphs.into_iter().map(Paragraph::new).collect()).unwrap()
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn position_of(result: &RenderResult, target: &DocumentVector) -> CursorVisualPosition {
        result
            .cursor_map
            .iter()
            .find(|(vector, _)| vector == target)
            .map(|(_, position)| *position)
            .unwrap()
    }

    #[test]
    fn empty_document_renders_cursor_at_origin() {
        let result = render_document(&Document::new(), 20, Some(&vector(&[0, 0], 0)), None);
        assert_eq!(result.total_lines, 1);
        assert_eq!(
            result.cursor,
            Some(CursorVisualPosition { line: 0, column: 0 })
        );
        assert_eq!(result.cursor_map.len(), 1);
    }

    #[test]
    fn maps_every_caret_position() {
        let doc = document(vec![vec![
            text("ab"),
            DocSpan::new_format(FormatKind::Strong, vec![text("cd")]),
        ]]);
        let result = render_document(&doc, 20, Some(&vector(&[0, 1, 0], 1)), None);
        assert_eq!(line_text(&result.lines[0]), "abcd");
        assert_eq!(result.cursor_map.len(), 6);
        assert_eq!(position_of(&result, &vector(&[0, 0], 2)).column, 2);
        assert_eq!(position_of(&result, &vector(&[0, 1, 0], 0)).column, 2);
        assert_eq!(
            result.cursor,
            Some(CursorVisualPosition { line: 0, column: 3 })
        );
    }

    #[test]
    fn wraps_on_whitespace() {
        let doc = document(vec![vec![text("hello world")]]);
        let result = render_document(&doc, 6, None, None);
        assert_eq!(result.total_lines, 2);
        assert_eq!(line_text(&result.lines[0]), "hello ");
        assert_eq!(line_text(&result.lines[1]), "world");
        assert_eq!(
            position_of(&result, &vector(&[0, 0], 7)),
            CursorVisualPosition { line: 1, column: 1 }
        );
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        let doc = document(vec![vec![text("a")], vec![text("b")]]);
        let result = render_document(&doc, 20, Some(&vector(&[1, 0], 0)), None);
        assert_eq!(result.total_lines, 3);
        assert_eq!(line_text(&result.lines[1]), "");
        assert_eq!(
            result.cursor,
            Some(CursorVisualPosition { line: 2, column: 0 })
        );
    }

    #[test]
    fn formats_map_to_styles() {
        let doc = document(vec![vec![
            DocSpan::new_format(FormatKind::Strong, vec![text("a")]),
            DocSpan::new_format(
                FormatKind::Title,
                vec![DocSpan::new_format(FormatKind::Underline, vec![text("b")])],
            ),
        ]]);
        let result = render_document(&doc, 20, None, None);
        let spans = &result.lines[0].spans;
        assert_eq!(spans.len(), 2);
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD | Modifier::UNDERLINED));
        assert_eq!(spans[1].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn selection_is_reversed() {
        let doc = document(vec![vec![text("abc")]]);
        let selection = SelectionRange {
            start: vector(&[0, 0], 2),
            end: vector(&[0, 0], 1),
        };
        let result = render_document(&doc, 20, None, Some(&selection));
        let spans = &result.lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content.as_ref(), "b");
        assert!(spans[1].style.add_modifier.contains(Modifier::REVERSED));
        assert!(!spans[0].style.add_modifier.contains(Modifier::REVERSED));
        assert!(!spans[2].style.add_modifier.contains(Modifier::REVERSED));
    }
}
