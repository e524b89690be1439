use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ClipError, Result};

pub const DEFAULT_PREVIEW_LEN: usize = 50;
const ELLIPSIS: &str = "...";

/// One recorded clipboard snapshot.
///
/// Text and timestamp are fixed at construction. A promoted entry is moved,
/// never rebuilt, so `timestamp` always reflects the first time the text was
/// seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    text: String,
    timestamp: u64,
}

impl Entry {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self::with_timestamp(text, timestamp)
    }

    pub fn with_timestamp(text: impl Into<String>, timestamp: u64) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(ClipError::InvalidEntry);
        }
        Ok(Self { text, timestamp })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Unix seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Byte length of the text.
    pub fn size(&self) -> usize {
        self.text.len()
    }

    /// Text cut to at most `max_len` characters, ending in `...` when cut.
    ///
    /// Lengths are counted in chars so multi-byte text is never split inside
    /// a code point. `max_len` below the ellipsis width is raised to it.
    pub fn preview(&self, max_len: usize) -> String {
        let max_len = max_len.max(ELLIPSIS.len());

        if self.text.chars().count() <= max_len {
            return self.text.clone();
        }

        let keep = max_len - ELLIPSIS.len();
        let mut preview: String = self.text.chars().take(keep).collect();
        preview.push_str(ELLIPSIS);
        preview
    }

    /// Creation time in local time as `HH:MM:SS`.
    pub fn formatted_time(&self) -> String {
        match Local.timestamp_opt(self.timestamp as i64, 0).single() {
            Some(time) => time.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }
}

pub fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{}K", bytes / 1024)
    } else {
        format!("{}M", bytes / (1024 * 1024))
    }
}
