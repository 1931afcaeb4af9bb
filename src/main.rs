use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use tracing::{debug, info, warn};

use verso::editor::{Change, Document, DocumentEditor, DocumentVector, Edit, EditError, FormatKind};
use verso::export::DocumentFormat;
use verso::render::{CursorVisualPosition, RenderResult, render_document};

mod logging;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

/// Edit a structured rich-text document in the terminal.
#[derive(Debug, Parser)]
#[command(name = "verso", version, about)]
struct Args {
    /// Document to open. `.json` keeps the full tree; `.md` and `.ftml` go
    /// through tdoc. Missing files are created on first save.
    file: PathBuf,

    /// Write logs here instead of `verso.log` in the temp directory.
    #[arg(long, env = "VERSO_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Wrap at a fixed column instead of the terminal width.
    #[arg(long, value_name = "COLUMNS")]
    wrap: Option<u16>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log = logging::init(args.log_file.clone())?;
    info!(file = %args.file.display(), log_file = %log.log_file.display(), "starting");
    run(args)
}

fn column_distance(a: u16, b: u16) -> u16 {
    if a >= b { a - b } else { b - a }
}

fn run(args: Args) -> Result<()> {
    let (document, format, initial_status) = load_document(&args.file)?;
    let mut app = App::new(document, args.file, format, args.wrap, initial_status);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn load_document(path: &Path) -> Result<(Document, DocumentFormat, Option<String>)> {
    let format = DocumentFormat::from_path(path);
    if !path.exists() {
        return Ok((Document::new(), format, Some("New document".to_string())));
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match format.read(&content) {
        Ok(document) => Ok((document, format, None)),
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "falling back to empty document");
            let message = format!("Parse error: {err:#}. Starting with empty document.");
            Ok((Document::new(), format, Some(message)))
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    editor: DocumentEditor,
    file_path: PathBuf,
    format: DocumentFormat,
    fixed_wrap: Option<u16>,
    text_area: Rect,
    scroll_top: usize,
    last_view_height: usize,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
    visual_positions: Vec<CursorDisplay>,
    last_cursor_visual: Option<CursorVisualPosition>,
    preferred_column: Option<u16>,
}

impl App {
    fn new(
        document: Document,
        path: PathBuf,
        format: DocumentFormat,
        fixed_wrap: Option<u16>,
        initial_status: Option<String>,
    ) -> Self {
        Self {
            editor: DocumentEditor::new(document),
            file_path: path,
            format,
            fixed_wrap,
            text_area: Rect::default(),
            scroll_top: 0,
            last_view_height: 1,
            should_quit: false,
            dirty: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            visual_positions: Vec::new(),
            last_cursor_visual: None,
            preferred_column: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);

        let editor_area = vertical[0];
        let status_area = vertical[1];

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(editor_area);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];
        self.text_area = text_area;

        let wrap_width = self
            .fixed_wrap
            .unwrap_or(text_area.width)
            .clamp(1, text_area.width.max(1));
        let render = render_document(
            self.editor.document(),
            usize::from(wrap_width),
            Some(self.editor.cursor()),
            self.editor.selection(),
        );

        self.visual_positions = render
            .cursor_map
            .iter()
            .cloned()
            .map(|(vector, position)| CursorDisplay { vector, position })
            .collect();
        let cursor_visual = render.cursor;
        self.last_cursor_visual = cursor_visual;
        if self.preferred_column.is_none() {
            self.preferred_column = cursor_visual.map(|p| p.column);
        }

        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        self.adjust_scroll(&render, viewport_height);

        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(render.total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        if let Some(cursor) = cursor_visual {
            if cursor.line >= self.scroll_top
                && cursor.line < self.scroll_top + viewport_height
                && text_area.width > 0
            {
                let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
                let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }

        let status_text = self.status_line(render.total_lines);
        let status_widget = Paragraph::new(Line::from(Span::styled(status_text, Style::default())))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, status_area);
    }

    fn status_line(&mut self, total_lines: usize) -> String {
        self.prune_status_message();
        let cursor_details = self.cursor_status_text();
        if let Some((message, _)) = &self.status_message {
            return format!("{cursor_details} | {message}");
        }

        let marker = if self.dirty { "*" } else { "" };
        format!(
            "{} | {}{} | Lines: {} | ^B ^E ^U ^T format | ^S save | ^Q quit",
            cursor_details,
            self.file_path.display(),
            marker,
            total_lines
        )
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render
            .total_lines
            .saturating_sub(viewport)
            .min(render.total_lines);
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
        if let Some(cursor) = &render.cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport_height {
                let target = cursor.line.saturating_add(1);
                self.scroll_top = target.saturating_sub(viewport);
            }
        }
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    fn current_visual_position(&self) -> Option<CursorVisualPosition> {
        let cursor = self.editor.cursor();
        self.visual_positions
            .iter()
            .find(|entry| &entry.vector == cursor)
            .map(|entry| entry.position)
            .or(self.last_cursor_visual)
    }

    fn move_cursor_vertical(&mut self, delta: i32, extend: bool) {
        if self.visual_positions.is_empty() {
            return;
        }

        let Some(current) = self.current_visual_position() else {
            return;
        };

        let desired_column = self.preferred_column.unwrap_or(current.column);

        let max_line = self
            .visual_positions
            .iter()
            .map(|entry| entry.position.line)
            .max()
            .unwrap_or(0);

        let target_line = (current.line as i32 + delta).clamp(0, max_line as i32) as usize;

        let destination = self
            .closest_vector_on_line(target_line, desired_column)
            .or_else(|| self.search_nearest_line(target_line, delta, desired_column));

        if let Some(dest) = destination {
            if self.jump_to(dest.vector, extend) {
                self.preferred_column = Some(desired_column);
            }
            self.last_cursor_visual = Some(dest.position);
        }
    }

    fn move_to_visual_line_edge(&mut self, end: bool, extend: bool) {
        self.preferred_column = None;

        let Some(current) = self.current_visual_position() else {
            return;
        };

        let on_line = self
            .visual_positions
            .iter()
            .filter(|entry| entry.position.line == current.line);
        let destination = if end {
            on_line
                .max_by(|a, b| {
                    (a.position.column, &a.vector).cmp(&(b.position.column, &b.vector))
                })
                .cloned()
        } else {
            on_line
                .min_by(|a, b| {
                    (a.position.column, &a.vector).cmp(&(b.position.column, &b.vector))
                })
                .cloned()
        };

        if let Some(target) = destination {
            self.jump_to(target.vector, extend);
            self.last_cursor_visual = Some(target.position);
        }
    }

    fn closest_vector_on_line(&self, line: usize, column: u16) -> Option<CursorDisplay> {
        self.visual_positions
            .iter()
            .filter(|entry| entry.position.line == line)
            .min_by_key(|entry| column_distance(entry.position.column, column))
            .cloned()
    }

    fn search_nearest_line(
        &self,
        start_line: usize,
        delta: i32,
        column: u16,
    ) -> Option<CursorDisplay> {
        if delta == 0 {
            return None;
        }
        let max_line = self
            .visual_positions
            .iter()
            .map(|entry| entry.position.line)
            .max()
            .unwrap_or(0);

        let mut distance = 1usize;
        loop {
            if delta < 0 {
                let line = start_line.checked_sub(distance)?;
                if let Some(found) = self.closest_vector_on_line(line, column) {
                    return Some(found);
                }
            } else {
                let line = start_line + distance;
                if line > max_line {
                    return None;
                }
                if let Some(found) = self.closest_vector_on_line(line, column) {
                    return Some(found);
                }
            }
            distance += 1;
        }
    }

    /// Screen cell to the nearest caret vector on that rendered line.
    fn vector_at_cell(&self, column: u16, row: u16) -> Option<DocumentVector> {
        let area = self.text_area;
        if row < area.y || row >= area.y + area.height || column < area.x {
            return None;
        }
        let line = self.scroll_top + usize::from(row - area.y);
        let column = column - area.x;
        self.closest_vector_on_line(line, column)
            .or_else(|| self.search_nearest_line(line, -1, column))
            .map(|entry| entry.vector)
    }

    fn jump_to(&mut self, vector: DocumentVector, extend: bool) -> bool {
        let result = if extend {
            self.editor.select_to(vector)
        } else {
            self.editor.move_to(vector)
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "stale cursor map entry");
                false
            }
        }
    }

    fn apply_edit(&mut self, result: Result<Edit, EditError>) {
        match result {
            Ok(edit) => {
                if edit.change != Change::None {
                    debug!(vector = %edit.vector, change = ?edit.change, "edit applied");
                    self.mark_dirty();
                }
                self.preferred_column = None;
            }
            Err(err) if err.is_boundary() => {}
            Err(err) => {
                warn!(%err, "edit rejected");
                self.set_status(err.to_string());
            }
        }
    }

    fn toggle_format(&mut self, kind: FormatKind) {
        let result = self.editor.toggle_format(kind);
        self.apply_edit(result);
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        let control = modifiers.contains(KeyModifiers::CONTROL);
        let shift = modifiers.contains(KeyModifiers::SHIFT);

        match code {
            KeyCode::Char('q') if control => {
                self.should_quit = true;
            }
            KeyCode::Char('s') if control => {
                if let Err(err) = self.save() {
                    warn!(error = %format!("{err:#}"), "save failed");
                    self.set_status(format!("Save failed: {err:#}"));
                }
            }
            KeyCode::Char('b') if control => self.toggle_format(FormatKind::Strong),
            KeyCode::Char('e') if control => self.toggle_format(FormatKind::Emphasis),
            KeyCode::Char('u') if control => self.toggle_format(FormatKind::Underline),
            KeyCode::Char('t') if control => self.toggle_format(FormatKind::Title),
            KeyCode::Left => {
                if self.editor.move_left(shift) {
                    self.preferred_column = None;
                }
            }
            KeyCode::Right => {
                if self.editor.move_right(shift) {
                    self.preferred_column = None;
                }
            }
            KeyCode::Up if control => {
                self.scroll_top = self.scroll_top.saturating_sub(self.last_view_height);
            }
            KeyCode::Down if control => {
                self.scroll_top += self.last_view_height;
            }
            KeyCode::Up => self.move_cursor_vertical(-1, shift),
            KeyCode::Down => self.move_cursor_vertical(1, shift),
            KeyCode::Home if control => {
                self.editor.move_to_document_start(shift);
                self.preferred_column = None;
            }
            KeyCode::End if control => {
                self.editor.move_to_document_end(shift);
                self.preferred_column = None;
            }
            KeyCode::Home => self.move_to_visual_line_edge(false, shift),
            KeyCode::End => self.move_to_visual_line_edge(true, shift),
            KeyCode::PageUp => {
                self.scroll_top = self.scroll_top.saturating_sub(self.last_view_height.max(1));
            }
            KeyCode::PageDown => {
                self.scroll_top += self.last_view_height.max(1);
            }
            KeyCode::Backspace => {
                let result = self.editor.backspace();
                self.apply_edit(result);
            }
            KeyCode::Enter => {
                let result = self.editor.insert_paragraph_break();
                self.apply_edit(result);
            }
            KeyCode::Tab => {
                let result = self.editor.insert_text("\t");
                self.apply_edit(result);
            }
            KeyCode::Char(ch) if !control && !modifiers.contains(KeyModifiers::ALT) => {
                let mut buffer = [0u8; 4];
                let result = self.editor.insert_text(ch.encode_utf8(&mut buffer));
                self.apply_edit(result);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) => {
                let extend = matches!(mouse.kind, MouseEventKind::Drag(_))
                    || mouse.modifiers.contains(KeyModifiers::SHIFT);
                if let Some(vector) = self.vector_at_cell(mouse.column, mouse.row) {
                    self.jump_to(vector, extend);
                    self.preferred_column = None;
                }
            }
            MouseEventKind::ScrollUp => {
                self.scroll_top = self.scroll_top.saturating_sub(3);
            }
            MouseEventKind::ScrollDown => {
                self.scroll_top += 3;
            }
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn save(&mut self) -> Result<()> {
        let contents = self.format.write(self.editor.document())?;
        fs::write(&self.file_path, contents)
            .with_context(|| format!("failed to write {}", self.file_path.display()))?;

        info!(path = %self.file_path.display(), format = ?self.format, "saved");
        self.dirty = false;
        self.set_status("Saved");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn cursor_status_text(&self) -> String {
        let position_text = if let Some(position) = self.last_cursor_visual {
            format!("[{},{}]", position.line + 1, usize::from(position.column) + 1)
        } else {
            "[?,?]".to_string()
        };
        let mut parts = vec![position_text, self.editor.cursor().to_string()];
        let labels = self.editor.cursor_breadcrumbs();
        if !labels.is_empty() {
            parts.push(labels.join(" > "));
        }
        parts.join(" ")
    }
}

#[derive(Clone)]
struct CursorDisplay {
    vector: DocumentVector,
    position: CursorVisualPosition,
}
