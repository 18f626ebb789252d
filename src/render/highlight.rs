use lazy_static::lazy_static;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME: &str = "base16-ocean.dark";

lazy_static! {
    static ref SYNTAXES: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEMES: ThemeSet = ThemeSet::load_defaults();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    /// `None` means the default foreground
    pub fg: Option<(u8, u8, u8)>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl HighlightSpan {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fg: None,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    fn styled(style: Style, text: &str) -> Self {
        Self {
            text: text.to_string(),
            fg: Some((style.foreground.r, style.foreground.g, style.foreground.b)),
            bold: style.font_style.contains(FontStyle::BOLD),
            italic: style.font_style.contains(FontStyle::ITALIC),
            underline: style.font_style.contains(FontStyle::UNDERLINE),
        }
    }
}

pub type HighlightedLine = Vec<HighlightSpan>;

/// Highlight `code` for the language named in a fence tag. Unknown languages
/// come back as unstyled lines.
pub fn highlight(code: &str, language: Option<&str>) -> Vec<HighlightedLine> {
    let syntax = language.and_then(|token| SYNTAXES.find_syntax_by_token(token));
    let (Some(syntax), Some(theme)) = (syntax, THEMES.themes.get(THEME)) else {
        return plain_lines(code);
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let spans = match highlighter.highlight_line(line, &SYNTAXES) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(style, text)| HighlightSpan::styled(style, strip_newline(text)))
                .filter(|span| !span.text.is_empty())
                .collect(),
            Err(_) => vec![HighlightSpan::plain(strip_newline(line))],
        };
        lines.push(spans);
    }
    lines
}

fn plain_lines(code: &str) -> Vec<HighlightedLine> {
    code.split('\n')
        .map(|line| vec![HighlightSpan::plain(line)])
        .collect()
}

fn strip_newline(text: &str) -> &str {
    text.trim_end_matches(|c| c == '\n' || c == '\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &HighlightedLine) -> String {
        line.iter().map(|span| span.text.as_str()).collect()
    }

    #[test]
    fn test_known_language_gets_colors() {
        let code = "fn main() {\n    let x = 1;\n}";
        let lines = highlight(code, Some("rust"));

        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "    let x = 1;");
        assert!(lines.iter().flatten().all(|span| span.fg.is_some()));
        // keywords and identifiers differ in color
        let colors: std::collections::HashSet<_> = lines[1].iter().filter_map(|s| s.fg).collect();
        assert!(colors.len() > 1);
    }

    #[test]
    fn test_unknown_language_is_plain() {
        let lines = highlight("one\ntwo", Some("no-such-language"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![HighlightSpan::plain("one")]);
        assert!(lines.iter().flatten().all(|span| span.fg.is_none()));
    }

    #[test]
    fn test_missing_language_is_plain() {
        let lines = highlight("echo hi", None);
        assert_eq!(lines, vec![vec![HighlightSpan::plain("echo hi")]]);
    }

    #[test]
    fn test_highlight_is_deterministic() {
        let code = "def f(x):\n    return x * 2";
        assert_eq!(highlight(code, Some("python")), highlight(code, Some("python")));
    }
}
