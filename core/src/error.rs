use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipError {
    /// Empty clipboard text. Callers treat this as a no-op.
    #[error("clipboard entry text is empty")]
    InvalidEntry,

    #[error("entry index {index} out of range (history has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to read clipboard: {0}")]
    ClipboardRead(String),

    #[error("failed to write clipboard: {0}")]
    ClipboardWrite(String),

    #[error("history file I/O failed: {0}")]
    Persistence(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClipError>;
