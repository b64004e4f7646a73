use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::render::format::escape_html;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("empty expression")]
    Empty,
    #[error("unbalanced braces")]
    Unbalanced,
    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// Turns a LaTeX-like expression into safe inline HTML.
///
/// Callers treat any error as "render the raw expression as code instead".
pub trait MathRenderer {
    fn render(&self, expr: &str) -> Result<String, MathError>;
}

/// Terminal-friendly renderer: maps common commands, Greek letters and
/// simple super/subscripts onto Unicode.
pub struct PlainMath;

impl MathRenderer for PlainMath {
    fn render(&self, expr: &str) -> Result<String, MathError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(MathError::Empty);
        }
        let mut chars = trimmed.chars().peekable();
        let text = convert(&mut chars, false)?;
        Ok(format!("<code class=\"math\">{}</code>", escape_html(&text)))
    }
}

fn convert(chars: &mut Peekable<Chars<'_>>, in_group: bool) -> Result<String, MathError> {
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '}' if in_group => return Ok(out),
            '}' => return Err(MathError::Unbalanced),
            '{' => out.push_str(&convert(chars, true)?),
            '\\' => out.push_str(&command(chars)?),
            '^' => {
                let arg = argument(chars)?;
                out.push_str(&scripted(&arg, superscript, '^'));
            }
            '_' => {
                let arg = argument(chars)?;
                out.push_str(&scripted(&arg, subscript, '_'));
            }
            _ => out.push(ch),
        }
    }
    if in_group {
        Err(MathError::Unbalanced)
    } else {
        Ok(out)
    }
}

/// One braced group or a single token following `^`, `_`, `\frac`, `\sqrt`.
fn argument(chars: &mut Peekable<Chars<'_>>) -> Result<String, MathError> {
    while chars.peek() == Some(&' ') {
        chars.next();
    }
    match chars.next() {
        Some('{') => convert(chars, true),
        Some('\\') => command(chars),
        Some('}') | None => Err(MathError::Unbalanced),
        Some(ch) => Ok(ch.to_string()),
    }
}

fn command(chars: &mut Peekable<Chars<'_>>) -> Result<String, MathError> {
    let mut name = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphabetic() {
            name.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        // Escaped punctuation such as `\{` or `\,`.
        return Ok(match chars.next() {
            Some(',') | Some(';') | Some(' ') => " ".to_string(),
            Some(ch) => ch.to_string(),
            None => String::new(),
        });
    }
    match name.as_str() {
        "frac" | "dfrac" | "tfrac" => {
            let num = argument(chars)?;
            let den = argument(chars)?;
            Ok(format!("{}/{}", parenthesize(&num), parenthesize(&den)))
        }
        "sqrt" => {
            let radicand = argument(chars)?;
            Ok(format!("\u{221a}{}", parenthesize(&radicand)))
        }
        "text" | "mathrm" | "mathbf" | "operatorname" => argument(chars),
        "left" | "right" => Ok(String::new()),
        other => symbol(other)
            .map(str::to_string)
            .ok_or_else(|| MathError::Unsupported(format!("\\{other}"))),
    }
}

fn parenthesize(s: &str) -> String {
    if s.chars().count() <= 1 || s.chars().all(|c| c.is_alphanumeric() || c == '.') {
        s.to_string()
    } else {
        format!("({s})")
    }
}

fn scripted(arg: &str, map: fn(char) -> Option<char>, marker: char) -> String {
    let mapped: Option<String> = arg.chars().map(map).collect();
    match mapped {
        Some(s) => s,
        None if arg.chars().count() == 1 => format!("{marker}{arg}"),
        None => format!("{marker}({arg})"),
    }
}

fn superscript(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\u{2070}',
        '1' => '\u{00b9}',
        '2' => '\u{00b2}',
        '3' => '\u{00b3}',
        '4' => '\u{2074}',
        '5' => '\u{2075}',
        '6' => '\u{2076}',
        '7' => '\u{2077}',
        '8' => '\u{2078}',
        '9' => '\u{2079}',
        '+' => '\u{207a}',
        '-' => '\u{207b}',
        '=' => '\u{207c}',
        '(' => '\u{207d}',
        ')' => '\u{207e}',
        'n' => '\u{207f}',
        'i' => '\u{2071}',
        _ => return None,
    })
}

fn subscript(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\u{2080}',
        '1' => '\u{2081}',
        '2' => '\u{2082}',
        '3' => '\u{2083}',
        '4' => '\u{2084}',
        '5' => '\u{2085}',
        '6' => '\u{2086}',
        '7' => '\u{2087}',
        '8' => '\u{2088}',
        '9' => '\u{2089}',
        '+' => '\u{208a}',
        '-' => '\u{208b}',
        '=' => '\u{208c}',
        '(' => '\u{208d}',
        ')' => '\u{208e}',
        'a' => '\u{2090}',
        'e' => '\u{2091}',
        'o' => '\u{2092}',
        'x' => '\u{2093}',
        _ => return None,
    })
}

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "\u{03b1}",
        "beta" => "\u{03b2}",
        "gamma" => "\u{03b3}",
        "delta" => "\u{03b4}",
        "epsilon" | "varepsilon" => "\u{03b5}",
        "theta" => "\u{03b8}",
        "lambda" => "\u{03bb}",
        "mu" => "\u{03bc}",
        "pi" => "\u{03c0}",
        "rho" => "\u{03c1}",
        "sigma" => "\u{03c3}",
        "tau" => "\u{03c4}",
        "phi" | "varphi" => "\u{03c6}",
        "omega" => "\u{03c9}",
        "Delta" => "\u{0394}",
        "Sigma" => "\u{03a3}",
        "Omega" => "\u{03a9}",
        "times" => "\u{00d7}",
        "cdot" => "\u{00b7}",
        "div" => "\u{00f7}",
        "pm" => "\u{00b1}",
        "leq" | "le" => "\u{2264}",
        "geq" | "ge" => "\u{2265}",
        "neq" | "ne" => "\u{2260}",
        "approx" => "\u{2248}",
        "infty" => "\u{221e}",
        "degree" | "circ" => "\u{00b0}",
        "sum" => "\u{2211}",
        "int" => "\u{222b}",
        "partial" => "\u{2202}",
        "rightarrow" | "to" => "\u{2192}",
        "quad" | "qquad" => " ",
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "log" => "log",
        "ln" => "ln",
        _ => return None,
    })
}
