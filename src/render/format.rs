use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::render::math::MathRenderer;

static MATH_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\$(.+?)\$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").unwrap());
static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").unwrap());

pub const NO_CONTENT: &str = "<p>No content</p>";

pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for ch in unsafe_text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape_html`]. `&amp;` goes first so `&amp;lt;` decodes to `&lt;`,
/// matching a sequential replace.
pub fn unescape_html(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
}

/// Renders the markdown subset returned by the chat API into HTML.
///
/// Literal text is escaped before any markup is inserted. Math spans go to
/// `math` when present and fall back to an inline code span otherwise. Bold is
/// substituted before italic so `**x**` never turns into nested `<em>`.
/// Lists are detected per line: no nesting, tables or fences. The output is
/// not meant to be fed back in.
pub fn render_formatting(text: &str, math: Option<&dyn MathRenderer>) -> String {
    if text.is_empty() {
        return NO_CONTENT.to_string();
    }

    let escaped = escape_html(text);
    let with_math = MATH_SPAN.replace_all(&escaped, |caps: &Captures| {
        let raw_expr = unescape_html(&caps[1]);
        shield_markers(&render_math(&raw_expr, math))
    });
    let with_bold = BOLD.replace_all(&with_math, "<strong>$1</strong>");
    let with_italic = ITALIC.replace_all(&with_bold, "<em>$1</em>");

    let mut out = String::with_capacity(with_italic.len() + 64);
    let mut in_list = false;
    for line in LINE_BREAK.split(&with_italic) {
        let item = BULLET_ITEM
            .find(line)
            .or_else(|| NUMBERED_ITEM.find(line))
            .map(|marker| &line[marker.end()..]);
        match item {
            Some(content) => {
                if !in_list {
                    out.push_str("<ul>");
                    in_list = true;
                }
                out.push_str("<li>");
                out.push_str(content);
                out.push_str("</li>");
            }
            None => {
                if in_list {
                    out.push_str("</ul>");
                    in_list = false;
                }
                if line.trim().is_empty() {
                    out.push_str("<br/>");
                } else {
                    out.push_str("<p>");
                    out.push_str(line);
                    out.push_str("</p>");
                }
            }
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out
}

fn render_math(raw_expr: &str, math: Option<&dyn MathRenderer>) -> String {
    if let Some(renderer) = math {
        match renderer.render(raw_expr) {
            Ok(html) => return html,
            Err(err) => {
                tracing::warn!(expr = raw_expr, %err, "math rendering failed, using inline code");
            }
        }
    }
    inline_code(raw_expr)
}

pub fn inline_code(raw: &str) -> String {
    format!("<code>{}</code>", escape_html(raw))
}

/// Keeps asterisks and dollars produced inside a math span away from the
/// emphasis pass that runs afterwards.
fn shield_markers(html: &str) -> String {
    html.replace('*', "&#42;").replace('$', "&#36;")
}

/// Text content of rendered output back to literal characters: the shielded
/// math markers and every escape are decoded.
pub fn decode_text(text: &str) -> String {
    unescape_html(&text.replace("&#42;", "*").replace("&#36;", "$"))
}
