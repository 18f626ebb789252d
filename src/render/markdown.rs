//! Markdown to element tree.
//!
//! The tree is independent of any presentation target: the terminal renderer
//! in the parent module walks it, and nothing here knows about styles.

use std::iter::Peekable;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// Deepest heading level kept; deeper headings are clamped to this
pub const MAX_HEADING_LEVEL: u8 = 3;

/// Containers nested deeper than this are flattened into plain paragraphs
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    List { start: Option<u64>, items: Vec<ListItem> },
    BlockQuote(Vec<Block>),
    CodeBlock { language: Option<String>, code: String },
    Table { header: Vec<Vec<Inline>>, rows: Vec<Vec<Vec<Inline>>> },
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// `Some` for task list items
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// Opened outside the chat view
    NewContext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link {
        href: String,
        target: LinkTarget,
        content: Vec<Inline>,
    },
    Image { src: String, alt: String },
    SoftBreak,
    LineBreak,
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Parse markdown into blocks
pub fn parse(source: &str) -> Vec<Block> {
    let mut events = Parser::new_ext(source, options()).peekable();
    blocks(&mut events, 0)
}

/// Consume block-level events up to and including the end of the enclosing container
fn blocks<'a, I>(events: &mut Peekable<I>, depth: usize) -> Vec<Block>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut out = Vec::new();
    let nested = depth + 1;

    loop {
        if events.peek().map(starts_inline).unwrap_or(false) {
            let content = inline_run(events, depth);
            if !content.is_empty() {
                out.push(Block::Paragraph(content));
            }
            continue;
        }

        let Some(event) = events.next() else {
            break;
        };

        match event {
            Event::Start(Tag::CodeBlock(kind)) => out.push(code_block(events, kind)),
            Event::Start(_) if nested > MAX_DEPTH => out.extend(flatten_blocks(events)),
            Event::Start(tag) => match tag {
                Tag::Paragraph => out.push(Block::Paragraph(inlines(events, nested))),
                Tag::Heading(level, _, _) => out.push(Block::Heading {
                    level: heading_level(level),
                    content: inlines(events, nested),
                }),
                Tag::BlockQuote => out.push(Block::BlockQuote(blocks(events, nested))),
                Tag::List(start) => out.push(Block::List {
                    start,
                    items: list_items(events, nested),
                }),
                Tag::Table(_) => out.push(table(events, nested)),
                Tag::FootnoteDefinition(label) => {
                    out.push(Block::Paragraph(vec![Inline::Text(format!("[^{}]:", label))]));
                    out.extend(blocks(events, nested));
                }
                // Items only appear inside lists, inline tags are caught by the peek above
                _ => out.extend(blocks(events, nested)),
            },
            Event::End(_) => break,
            Event::Rule => out.push(Block::Rule),
            _ => {}
        }
    }

    out
}

/// Consume a whole container without recursing, keeping only its text as paragraphs
fn flatten_blocks<'a, I>(events: &mut Peekable<I>) -> Vec<Block>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut out = Vec::new();
    let mut text = String::new();
    let mut open = 0usize;

    for event in events.by_ref() {
        match event {
            Event::Start(_) => open += 1,
            Event::End(tag) => {
                if !is_inline_tag(&tag) {
                    flush_paragraph(&mut text, &mut out);
                }
                if open == 0 {
                    break;
                }
                open -= 1;
            }
            Event::Rule => flush_paragraph(&mut text, &mut out),
            event => push_flat(&mut text, event),
        }
    }
    flush_paragraph(&mut text, &mut out);
    out
}

/// Consume an inline tag without recursing, keeping only its text
fn flatten_text<'a, I>(events: &mut Peekable<I>) -> String
where
    I: Iterator<Item = Event<'a>>,
{
    let mut text = String::new();
    let mut open = 0usize;

    for event in events.by_ref() {
        match event {
            Event::Start(_) => open += 1,
            Event::End(_) if open == 0 => break,
            Event::End(_) => open -= 1,
            event => push_flat(&mut text, event),
        }
    }
    text
}

fn push_flat(text: &mut String, event: Event<'_>) {
    match event {
        Event::Text(t) | Event::Code(t) => text.push_str(&t),
        Event::Html(html) => text.push_str(html.trim_end_matches('\n')),
        Event::SoftBreak | Event::HardBreak => text.push(' '),
        _ => {}
    }
}

fn flush_paragraph(text: &mut String, out: &mut Vec<Block>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(Block::Paragraph(vec![Inline::Text(trimmed.to_string())]));
    }
    text.clear();
}

fn heading_level(level: HeadingLevel) -> u8 {
    let level = match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    };
    level.min(MAX_HEADING_LEVEL)
}

fn code_block<'a, I>(events: &mut Peekable<I>, kind: CodeBlockKind<'a>) -> Block
where
    I: Iterator<Item = Event<'a>>,
{
    let language = match kind {
        CodeBlockKind::Fenced(info) => info
            .split_whitespace()
            .next()
            .map(|lang| lang.to_string()),
        CodeBlockKind::Indented => None,
    };

    let mut code = String::new();
    for event in events.by_ref() {
        match event {
            Event::Text(text) => code.push_str(&text),
            Event::End(_) => break,
            _ => {}
        }
    }
    if code.ends_with('\n') {
        code.pop();
    }

    Block::CodeBlock { language, code }
}

fn list_items<'a, I>(events: &mut Peekable<I>, depth: usize) -> Vec<ListItem>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut items = Vec::new();
    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Item) => {
                let checked = match events.peek() {
                    Some(Event::TaskListMarker(checked)) => {
                        let checked = *checked;
                        events.next();
                        Some(checked)
                    }
                    _ => None,
                };
                items.push(ListItem {
                    checked,
                    blocks: blocks(events, depth),
                });
            }
            Event::End(_) => break,
            _ => {}
        }
    }
    items
}

fn table<'a, I>(events: &mut Peekable<I>, depth: usize) -> Block
where
    I: Iterator<Item = Event<'a>>,
{
    let mut header = Vec::new();
    let mut rows = Vec::new();
    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::TableHead) => header = cells(events, depth),
            Event::Start(Tag::TableRow) => rows.push(cells(events, depth)),
            Event::End(_) => break,
            _ => {}
        }
    }
    Block::Table { header, rows }
}

fn cells<'a, I>(events: &mut Peekable<I>, depth: usize) -> Vec<Vec<Inline>>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut cells = Vec::new();
    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::TableCell) => cells.push(inlines(events, depth)),
            Event::End(_) => break,
            _ => {}
        }
    }
    cells
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link(..) | Tag::Image(..)
    )
}

fn starts_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::Html(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_) => true,
        Event::Start(tag) => is_inline_tag(tag),
        _ => false,
    }
}

/// Inline content that sits directly in a container, as in tight list items
fn inline_run<'a, I>(events: &mut Peekable<I>, depth: usize) -> Vec<Inline>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut out = Vec::new();
    while events.peek().map(starts_inline).unwrap_or(false) {
        if let Some(event) = events.next() {
            inline_event(event, events, &mut out, depth);
        }
    }
    trim_trailing_breaks(&mut out);
    out
}

/// Consume inline events up to and including the end of the enclosing tag
fn inlines<'a, I>(events: &mut Peekable<I>, depth: usize) -> Vec<Inline>
where
    I: Iterator<Item = Event<'a>>,
{
    let mut out = Vec::new();
    while let Some(event) = events.next() {
        if let Event::End(_) = event {
            break;
        }
        inline_event(event, events, &mut out, depth);
    }
    out
}

fn inline_event<'a, I>(event: Event<'a>, events: &mut Peekable<I>, out: &mut Vec<Inline>, depth: usize)
where
    I: Iterator<Item = Event<'a>>,
{
    let nested = depth + 1;
    match event {
        Event::Text(text) => push_text(out, &text),
        Event::Html(html) => push_text(out, html.trim_end_matches('\n')),
        Event::Code(code) => out.push(Inline::Code(code.to_string())),
        Event::SoftBreak => out.push(Inline::SoftBreak),
        Event::HardBreak => out.push(Inline::LineBreak),
        Event::FootnoteReference(label) => push_text(out, &format!("[^{}]", label)),
        Event::Start(_) if nested > MAX_DEPTH => push_text(out, &flatten_text(events)),
        Event::Start(tag) => match tag {
            Tag::Emphasis => out.push(Inline::Emphasis(inlines(events, nested))),
            Tag::Strong => out.push(Inline::Strong(inlines(events, nested))),
            Tag::Strikethrough => out.push(Inline::Strikethrough(inlines(events, nested))),
            Tag::Link(_, href, _) => out.push(Inline::Link {
                href: href.to_string(),
                target: LinkTarget::NewContext,
                content: inlines(events, nested),
            }),
            Tag::Image(_, src, _) => {
                let alt = plain_text(&inlines(events, nested));
                out.push(Inline::Image {
                    src: src.to_string(),
                    alt,
                });
            }
            _ => out.extend(inlines(events, nested)),
        },
        _ => {}
    }
}

/// Parsers split text at punctuation; keep adjacent runs together
fn push_text(out: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
}

fn trim_trailing_breaks(out: &mut Vec<Inline>) {
    while matches!(out.last(), Some(Inline::SoftBreak) | Some(Inline::LineBreak)) {
        out.pop();
    }
}

/// Text content of inlines with all formatting dropped
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children) | Inline::Strong(children) | Inline::Strikethrough(children) => {
                out.push_str(&plain_text(children))
            }
            Inline::Link { content, .. } => out.push_str(&plain_text(content)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak => out.push(' '),
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_paragraphs() {
        let blocks = parse("first paragraph\n\nsecond paragraph");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("first paragraph")]),
                Block::Paragraph(vec![text("second paragraph")]),
            ]
        );
    }

    #[test]
    fn test_headings_are_clamped() {
        let blocks = parse("# One\n## Two\n### Three\n#### Four");
        let levels: Vec<u8> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_tight_unordered_list() {
        let blocks = parse("- apples\n- pears");
        assert_eq!(
            blocks,
            vec![Block::List {
                start: None,
                items: vec![
                    ListItem {
                        checked: None,
                        blocks: vec![Block::Paragraph(vec![text("apples")])],
                    },
                    ListItem {
                        checked: None,
                        blocks: vec![Block::Paragraph(vec![text("pears")])],
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_ordered_list_keeps_start() {
        let blocks = parse("3. three\n4. four");
        match &blocks[0] {
            Block::List { start, items } => {
                assert_eq!(*start, Some(3));
                assert_eq!(items.len(), 2);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_list_inside_item() {
        let blocks = parse("- outer\n  - inner");
        let Block::List { items, .. } = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].blocks.len(), 2);
        assert!(matches!(items[0].blocks[1], Block::List { .. }));
    }

    #[test]
    fn test_task_list_markers() {
        let blocks = parse("- [x] done\n- [ ] todo");
        let Block::List { items, .. } = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].checked, Some(true));
        assert_eq!(items[1].checked, Some(false));
    }

    #[test]
    fn test_block_quote() {
        let blocks = parse("> quoted *text*");
        assert_eq!(
            blocks,
            vec![Block::BlockQuote(vec![Block::Paragraph(vec![
                text("quoted "),
                Inline::Emphasis(vec![text("text")]),
            ])])]
        );
    }

    #[test]
    fn test_link_opens_new_context() {
        let blocks = parse("see [docs](https://doc.rust-lang.org)");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("see "),
                Inline::Link {
                    href: "https://doc.rust-lang.org".to_string(),
                    target: LinkTarget::NewContext,
                    content: vec![text("docs")],
                },
            ])]
        );
    }

    #[test]
    fn test_inline_code() {
        let blocks = parse("call `foo()` now");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("call "),
                Inline::Code("foo()".to_string()),
                text(" now"),
            ])]
        );
    }

    #[test]
    fn test_fenced_code_block_with_language() {
        let blocks = parse("```rust\nfn main() {}\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                code: "fn main() {}".to_string(),
            }]
        );
    }

    #[test]
    fn test_fenced_code_block_without_language() {
        let blocks = parse("```\nplain\ntext\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                language: None,
                code: "plain\ntext".to_string(),
            }]
        );
    }

    #[test]
    fn test_table() {
        let blocks = parse("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            blocks,
            vec![Block::Table {
                header: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![vec![text("1")], vec![text("2")]]],
            }]
        );
    }

    #[test]
    fn test_strikethrough_and_strong() {
        let blocks = parse("~~old~~ **new**");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Strikethrough(vec![text("old")]),
                text(" "),
                Inline::Strong(vec![text("new")]),
            ])]
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "# Title\n\n- a\n- b\n\n```python\nprint(1)\n```\n\n> quote";
        assert_eq!(parse(source), parse(source));
    }

    #[test]
    fn test_plain_text() {
        let blocks = parse("**bold** and [link](http://x) `code`");
        let Block::Paragraph(content) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(plain_text(content), "bold and link code");
    }

    fn quote_depth(blocks: &[Block]) -> usize {
        blocks
            .iter()
            .map(|block| match block {
                Block::BlockQuote(children) => 1 + quote_depth(children),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    fn innermost_text(blocks: &[Block]) -> Option<String> {
        match blocks.last()? {
            Block::BlockQuote(children) => innermost_text(children),
            Block::Paragraph(content) => Some(plain_text(content)),
            _ => None,
        }
    }

    #[test]
    fn test_deep_quotes_are_capped() {
        let source = ">".repeat(MAX_DEPTH + 5) + " deep";
        let blocks = parse(&source);

        assert_eq!(quote_depth(&blocks), MAX_DEPTH);
        assert_eq!(innermost_text(&blocks).as_deref(), Some("deep"));
    }

    #[test]
    fn test_huge_quote_nesting_is_flattened() {
        let source = ">".repeat(100_000) + " hi";
        let blocks = parse(&source);

        assert_eq!(quote_depth(&blocks), MAX_DEPTH);
        assert_eq!(innermost_text(&blocks).as_deref(), Some("hi"));
    }

    #[test]
    fn test_shallow_nesting_is_untouched() {
        let blocks = parse("> > two levels");
        assert_eq!(quote_depth(&blocks), 2);
        assert_eq!(innermost_text(&blocks).as_deref(), Some("two levels"));
    }
}
