use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::notify::Level;
use crate::pipeline::{SendState, SendStatus};
use crate::render::render_message;
use crate::tui::keys::InputMode;

const SIDEBAR_WIDTH: u16 = 28;
const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 4;

/// Where the last draw put things, for mouse hits and scroll limits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawnLayout {
    /// Rows of the thread list inside the sidebar border
    pub sidebar: Option<Rect>,
    /// Index of the first thread shown in the sidebar
    pub sidebar_offset: usize,
    /// Furthest the conversation can be scrolled up
    pub max_scroll_back: u16,
}

impl DrawnLayout {
    /// Index of the thread drawn at a screen cell
    pub fn thread_at(&self, column: u16, row: u16) -> Option<usize> {
        let list = self.sidebar?;
        let inside = column >= list.x
            && column < list.x + list.width
            && row >= list.y
            && row < list.y + list.height;
        inside.then(|| self.sidebar_offset + usize::from(row - list.y))
    }
}

/// Render the main UI
pub fn render_ui(f: &mut Frame, app: &App, mode: InputMode) -> DrawnLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Sidebar and messages
            Constraint::Length(3), // Composer
        ])
        .split(f.size());

    render_header(f, app, mode, chunks[0]);

    let mut layout = DrawnLayout::default();
    if app.sidebar_open() {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
            .split(chunks[1]);
        let (list, offset) = render_sidebar(f, app, body[0]);
        layout.sidebar = Some(list);
        layout.sidebar_offset = offset;
        layout.max_scroll_back = render_messages(f, app, body[1]);
    } else {
        layout.max_scroll_back = render_messages(f, app, chunks[1]);
    }

    render_composer(f, app, mode, chunks[2]);
    render_toasts(f, app, f.size());
    layout
}

fn render_header(f: &mut Frame, app: &App, mode: InputMode, area: Rect) {
    let title = app
        .store()
        .selected()
        .map(|thread| thread.title().to_string())
        .unwrap_or_else(|| "Assistant".to_string());

    let status = match (app.send_state(), app.last_status()) {
        (SendState::Sending { .. }, _) => Span::styled("sending…", Style::default().fg(Color::Yellow)),
        (SendState::Idle, Some(SendStatus::Failed)) => {
            Span::styled("last send failed", Style::default().fg(Color::Red))
        }
        _ => Span::styled("ready", Style::default().fg(Color::Green)),
    };

    let hint = match mode {
        InputMode::Editing => "Enter send · Esc commands",
        InputMode::Normal => "e edit · n new · j/k move · d delete · x/t export · b sidebar · q quit",
    };

    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        status,
        Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Parley"));
    f.render_widget(header, area);
}

/// Draw the thread list, returning its inner area and scroll offset
fn render_sidebar(f: &mut Frame, app: &App, area: Rect) -> (Rect, usize) {
    let store = app.store();
    let items: Vec<ListItem> = store
        .threads()
        .iter()
        .map(|thread| ListItem::new(Line::from(vec![Span::raw("▪ "), Span::raw(thread.title().to_string())])))
        .collect();

    let mut state = ListState::default();
    state.select(
        store
            .selected_id()
            .and_then(|id| store.threads().iter().position(|thread| thread.id() == id)),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Chats ({})", store.len()));
    let inner = block.inner(area);
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(list, area, &mut state);
    (inner, state.offset())
}

/// Draw the selected conversation, returning how far it can scroll up
fn render_messages(f: &mut Frame, app: &App, area: Rect) -> u16 {
    let block = Block::default().borders(Borders::ALL).title("Conversation");
    let inner = block.inner(area);

    let thread = app.store().selected();
    let messages = thread.map(|t| t.messages()).unwrap_or(&[]);

    if messages.is_empty() {
        let hint = Text::from(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Start a new conversation",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Ask anything to begin. Every chat stays in the sidebar.",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        let empty = Paragraph::new(hint).alignment(Alignment::Center).block(block);
        f.render_widget(empty, area);
        return 0;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in messages {
        lines.extend(render_message(message));
        lines.push(Line::default());
    }

    let waiting = matches!(
        (app.send_state(), thread),
        (SendState::Sending { thread_id }, Some(t)) if thread_id.as_str() == t.id()
    );
    if waiting {
        lines.push(Line::from(Span::styled(
            "Assistant is typing…",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let rows = wrap_lines(lines, inner.width);
    let overflow = rows.len().saturating_sub(usize::from(inner.height));
    let max_scroll_back = u16::try_from(overflow).unwrap_or(u16::MAX);
    let offset = scroll_offset(rows.len(), inner.height, app.scroll_back());
    let paragraph = Paragraph::new(Text::from(rows)).block(block).scroll((offset, 0));

    f.render_widget(paragraph, area);
    max_scroll_back
}

/// Top row to show so the newest row sits at the bottom, minus `scroll_back`
fn scroll_offset(rows: usize, height: u16, scroll_back: u16) -> u16 {
    let bottom = rows.saturating_sub(usize::from(height));
    let offset = bottom.saturating_sub(usize::from(scroll_back));
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn text_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Break lines into rows no wider than `width`, at spaces where possible.
///
/// Rows are measured here rather than by the paragraph so the scroll offset
/// always matches what is drawn.
fn wrap_lines(lines: Vec<Line<'static>>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();

    for line in lines {
        if line.width() <= width {
            rows.push(line);
            continue;
        }

        let mut row: Vec<Span<'static>> = Vec::new();
        let mut used = 0;
        for (piece, style) in words(&line) {
            let piece_width = text_width(&piece);
            let blank = piece.trim().is_empty();

            if used > 0 && used + piece_width > width {
                push_row(&mut rows, std::mem::take(&mut row));
                used = 0;
                if blank {
                    continue;
                }
            }

            if piece_width <= width {
                row.push(Span::styled(piece, style));
                used += piece_width;
                continue;
            }

            // longer than a whole row: split between characters
            for c in piece.chars() {
                let c = c.to_string();
                let c_width = text_width(&c);
                if used > 0 && used + c_width > width {
                    push_row(&mut rows, std::mem::take(&mut row));
                    used = 0;
                }
                row.push(Span::styled(c, style));
                used += c_width;
            }
        }
        if !row.is_empty() {
            push_row(&mut rows, row);
        }
    }

    rows
}

/// Finish a wrapped row, dropping the spaces it broke on
fn push_row(rows: &mut Vec<Line<'static>>, mut row: Vec<Span<'static>>) {
    while row.last().map_or(false, |span| span.content.trim().is_empty()) {
        row.pop();
    }
    rows.push(Line::from(row));
}

/// Split a line into alternating runs of whitespace and non-whitespace, keeping styles
fn words(line: &Line<'static>) -> Vec<(String, Style)> {
    let mut out = Vec::new();
    for span in &line.spans {
        let mut current = String::new();
        let mut in_blank = None;
        for c in span.content.chars() {
            let blank = c.is_whitespace();
            if in_blank.map_or(false, |was| was != blank) {
                out.push((std::mem::take(&mut current), span.style));
            }
            in_blank = Some(blank);
            current.push(c);
        }
        if !current.is_empty() {
            out.push((current, span.style));
        }
    }
    out
}

fn render_composer(f: &mut Frame, app: &App, mode: InputMode, area: Rect) {
    let enabled = app.composer_enabled();
    let input = app.composer().input();

    let content = if input.is_empty() {
        Span::styled("Type a message...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(input.to_string())
    };

    let border = if !enabled {
        Color::DarkGray
    } else if mode == InputMode::Editing {
        Color::Cyan
    } else {
        Color::White
    };

    let composer = Paragraph::new(Line::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if enabled { "Message" } else { "Message (waiting for reply)" })
            .style(Style::default().fg(border)),
    );
    f.render_widget(composer, area);

    if enabled && mode == InputMode::Editing {
        let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor((area.x + 1).saturating_add(typed).min(max_x), area.y + 1);
    }
}

fn render_toasts(f: &mut Frame, app: &App, area: Rect) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width.saturating_sub(width + 1);
    let mut y = area.y + 1;

    for toast in app.notifications().visible() {
        if y + TOAST_HEIGHT > area.y + area.height {
            break;
        }
        let rect = Rect::new(x, y, width, TOAST_HEIGHT);
        let color = match toast.level {
            Level::Info => Color::Green,
            Level::Error => Color::Red,
        };

        let body = Paragraph::new(toast.description.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled(
                        toast.title.clone(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().fg(color)),
            );

        f.render_widget(Clear, rect);
        f.render_widget(body, rect);
        y += TOAST_HEIGHT;
    }
}
