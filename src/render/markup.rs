use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::render::format::decode_text;

/// Styles applied while walking rendered HTML.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupStyle {
    pub base: Style,
    pub code: Style,
}

enum Token<'a> {
    Open(&'a str),
    Close(&'a str),
    Text(&'a str),
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        if let Some(after_lt) = rest.strip_prefix('<') {
            let Some(end) = after_lt.find('>') else {
                tokens.push(Token::Text(rest));
                break;
            };
            let inner = after_lt[..end].trim();
            let (closing, body) = match inner.strip_prefix('/') {
                Some(b) => (true, b),
                None => (false, inner.trim_end_matches('/')),
            };
            let name = body.split_whitespace().next().unwrap_or("");
            tokens.push(if closing {
                Token::Close(name)
            } else {
                Token::Open(name)
            });
            rest = &after_lt[end + 1..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token::Text(&rest[..end]));
            rest = &rest[end..];
        }
    }
    tokens
}

#[derive(Default)]
struct Builder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    bold: usize,
    italic: usize,
    code: usize,
}

impl Builder {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn style(&self, styles: &MarkupStyle) -> Style {
        let mut style = if self.code > 0 { styles.code } else { styles.base };
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }
}

/// Converts the renderer's HTML subset into styled terminal lines.
///
/// Understands `p`, `br`, `ul`, `li`, `strong`, `em` and `code`; any other tag
/// is dropped and its text kept.
pub fn html_to_lines(html: &str, styles: MarkupStyle) -> Vec<Line<'static>> {
    let mut b = Builder::default();
    for token in tokenize(html) {
        match token {
            Token::Open(tag) => match tag {
                "p" | "ul" | "div" => b.flush(),
                "br" => {
                    b.flush();
                    b.lines.push(Line::default());
                }
                "li" => {
                    b.flush();
                    b.current.push(Span::styled("  \u{2022} ", styles.base));
                }
                "strong" | "b" => b.bold += 1,
                "em" | "i" => b.italic += 1,
                "code" => b.code += 1,
                _ => {}
            },
            Token::Close(tag) => match tag {
                "p" | "li" | "ul" | "div" => b.flush(),
                "strong" | "b" => b.bold = b.bold.saturating_sub(1),
                "em" | "i" => b.italic = b.italic.saturating_sub(1),
                "code" => b.code = b.code.saturating_sub(1),
                _ => {}
            },
            Token::Text(text) => {
                let decoded = decode_text(text);
                let style = b.style(&styles);
                for (i, part) in decoded.split('\n').enumerate() {
                    if i > 0 {
                        b.flush();
                    }
                    if !part.is_empty() {
                        b.current.push(Span::styled(part.to_string(), style));
                    }
                }
            }
        }
    }
    b.flush();
    b.lines
}

/// Text content of rendered HTML, one paragraph or list item per line.
pub fn html_to_text(html: &str) -> String {
    html_to_lines(html, MarkupStyle::default())
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
