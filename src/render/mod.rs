//! Message rendering: markdown element trees to styled terminal lines.

pub mod highlight;
pub mod markdown;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::chat::{Message, Role};
use highlight::HighlightSpan;
use markdown::{Block, Inline, LinkTarget, ListItem};

const TAB_WIDTH: usize = 4;
const RULE_WIDTH: usize = 40;

pub fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Green,
    }
}

/// Render one message: a role header followed by its body
pub fn render_message(message: &Message) -> Vec<Line<'static>> {
    let header = Line::from(vec![
        Span::styled(
            match message.role() {
                Role::User => "You",
                Role::Assistant => "Assistant",
            },
            Style::default()
                .fg(role_color(message.role()))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", message.timestamp().with_timezone(&chrono::Local).format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let mut lines = vec![header];
    match message.role() {
        Role::User => lines.extend(preformatted(message.content())),
        Role::Assistant => lines.extend(blocks_to_lines(&markdown::parse(message.content()))),
    }
    lines
}

/// User text: one line per source line, whitespace kept, no markdown
pub fn preformatted(content: &str) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r').replace('\t', &" ".repeat(TAB_WIDTH));
            Line::from(Span::raw(line))
        })
        .collect()
}

pub fn blocks_to_lines(blocks: &[Block]) -> Vec<Line<'static>> {
    render_blocks(blocks, true)
}

fn render_blocks(blocks: &[Block], spaced: bool) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if spaced && i > 0 {
            out.push(Line::default());
        }
        out.extend(render_block(block));
    }
    out
}

fn render_block(block: &Block) -> Vec<Line<'static>> {
    match block {
        Block::Paragraph(content) => inline_lines(content, Style::default()),
        Block::Heading { level, content } => inline_lines(content, heading_style(*level)),
        Block::List { start, items } => render_list(*start, items),
        Block::BlockQuote(children) => {
            let marker = Span::styled("│ ", Style::default().fg(Color::Blue));
            render_blocks(children, true)
                .into_iter()
                .map(|line| prefix(italic(line), marker.clone()))
                .collect()
        }
        Block::CodeBlock { language, code } => render_code(language.as_deref(), code),
        Block::Table { header, rows } => render_table(header, rows),
        Block::Rule => vec![Line::from(Span::styled(
            "─".repeat(RULE_WIDTH),
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

fn heading_style(level: u8) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        1 => style.fg(Color::Magenta).add_modifier(Modifier::UNDERLINED),
        2 => style.fg(Color::Magenta),
        _ => style,
    }
}

fn render_list(start: Option<u64>, items: &[ListItem]) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let mut marker = match start {
            Some(n) => format!("{}. ", n + i as u64),
            None => "• ".to_string(),
        };
        if let Some(checked) = item.checked {
            marker.push_str(if checked { "[x] " } else { "[ ] " });
        }
        let indent = " ".repeat(marker.chars().count());

        let body = render_blocks(&item.blocks, false);
        if body.is_empty() {
            out.push(Line::from(marker));
            continue;
        }
        for (j, line) in body.into_iter().enumerate() {
            let lead = if j == 0 {
                Span::styled(marker.clone(), Style::default().fg(Color::Yellow))
            } else {
                Span::raw(indent.clone())
            };
            out.push(prefix(line, lead));
        }
    }
    out
}

fn render_code(language: Option<&str>, code: &str) -> Vec<Line<'static>> {
    let gutter = Style::default().fg(Color::DarkGray);
    let mut out = vec![Line::from(Span::styled(
        format!("┌─ {}", language.unwrap_or("code")),
        gutter,
    ))];
    for line in highlight::highlight(code, language) {
        let mut spans = vec![Span::styled("│ ", gutter)];
        spans.extend(line.iter().map(code_span));
        out.push(Line::from(spans));
    }
    out.push(Line::from(Span::styled("└─", gutter)));
    out
}

fn code_span(span: &HighlightSpan) -> Span<'static> {
    let mut style = Style::default();
    if let Some((r, g, b)) = span.fg {
        style = style.fg(Color::Rgb(r, g, b));
    }
    if span.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if span.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if span.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(span.text.replace('\t', &" ".repeat(TAB_WIDTH)), style)
}

fn render_table(header: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>]) -> Vec<Line<'static>> {
    let header: Vec<String> = header.iter().map(|cell| markdown::plain_text(cell)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| markdown::plain_text(cell)).collect())
        .collect();

    let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows.iter().chain([&header]) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |row: &[String], style: Style| {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                format!("{:width$}", cell, width = widths[i])
            })
            .collect();
        Line::from(Span::styled(cells.join(" │ "), style))
    };

    let mut out = vec![format_row(&header, Style::default().add_modifier(Modifier::BOLD))];
    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push(Line::from(Span::styled(
        separator.join("─┼─"),
        Style::default().fg(Color::DarkGray),
    )));
    out.extend(rows.iter().map(|row| format_row(row, Style::default())));
    out
}

/// Lay out inline content, breaking on hard breaks
fn inline_lines(content: &[Inline], base: Style) -> Vec<Line<'static>> {
    let mut lines = vec![Vec::new()];
    push_inlines(content, base, &mut lines);
    lines.into_iter().map(Line::from).collect()
}

fn push_inlines(content: &[Inline], style: Style, lines: &mut Vec<Vec<Span<'static>>>) {
    for inline in content {
        match inline {
            Inline::Text(text) => push_span(lines, Span::styled(text.clone(), style)),
            Inline::Code(code) => push_span(
                lines,
                Span::styled(code.clone(), style.fg(Color::Yellow).bg(Color::Black)),
            ),
            Inline::Emphasis(children) => push_inlines(children, style.add_modifier(Modifier::ITALIC), lines),
            Inline::Strong(children) => push_inlines(children, style.add_modifier(Modifier::BOLD), lines),
            Inline::Strikethrough(children) => {
                push_inlines(children, style.add_modifier(Modifier::CROSSED_OUT), lines)
            }
            Inline::Link { href, target, content } => {
                push_inlines(content, style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED), lines);
                // A terminal cannot open the link in place, so show where it leads
                match target {
                    LinkTarget::NewContext if markdown::plain_text(content) != *href => push_span(
                        lines,
                        Span::styled(format!(" <{}>", href), Style::default().fg(Color::DarkGray)),
                    ),
                    LinkTarget::NewContext => {}
                }
            }
            Inline::Image { src, alt } => push_span(
                lines,
                Span::styled(format!("[image: {}] <{}>", alt, src), Style::default().fg(Color::DarkGray)),
            ),
            Inline::SoftBreak => push_span(lines, Span::styled(" ", style)),
            Inline::LineBreak => lines.push(Vec::new()),
        }
    }
}

fn push_span(lines: &mut Vec<Vec<Span<'static>>>, span: Span<'static>) {
    if let Some(current) = lines.last_mut() {
        current.push(span);
    }
}

fn italic(line: Line<'static>) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .spans
        .into_iter()
        .map(|span| Span::styled(span.content, span.style.add_modifier(Modifier::ITALIC)))
        .collect();
    Line::from(spans)
}

fn prefix(line: Line<'static>, lead: Span<'static>) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    spans.push(lead);
    spans.extend(line.spans);
    Line::from(spans)
}
