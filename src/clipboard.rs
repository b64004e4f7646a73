use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("copy failed: {0}")]
    Copy(String),
}

pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard, opened lazily on first copy and kept open afterwards
/// (on X11 the contents vanish when the handle is dropped).
#[derive(Default)]
pub struct SystemClipboard {
    #[cfg(feature = "clipboard")]
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let handle =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(handle);
        }
        match self.inner.as_mut() {
            Some(handle) => handle
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Copy(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialised".to_string())),
        }
    }
}

#[cfg(not(feature = "clipboard"))]
impl Clipboard for SystemClipboard {
    fn copy_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable(
            "built without clipboard support".to_string(),
        ))
    }
}
