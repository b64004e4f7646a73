pub mod format;
pub mod markup;
pub mod math;

pub use format::{decode_text, escape_html, render_formatting, unescape_html};
pub use math::{MathError, MathRenderer, PlainMath};
