//! On-disk history file.
//!
//! Each entry is stored as
//!
//! ```text
//! ---ENTRY_START---
//! <text, any number of lines>
//! ---ENTRY_END---
//! ```
//!
//! most recent first. Lines are split on `\n` only. A text line that would
//! read as a sentinel once its leading backslashes are stripped gets one more
//! backslash on disk, which `decode` removes again.
//!
//! Files written by older builds used a single `===ENTRY_END===` terminator
//! per record, oldest first. Those are still readable.

use log::debug;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::entry::Entry;
use crate::error::Result;

pub const ENTRY_START: &str = "---ENTRY_START---";
pub const ENTRY_END: &str = "---ENTRY_END---";
const LEGACY_ENTRY_END: &str = "===ENTRY_END===";
const ESCAPE: char = '\\';

pub struct HistoryFile {
    path: PathBuf,
    capacity: usize,
    // serialises writers sharing the temp file
    write_lock: Mutex<()>,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `entries` (front first, at most `capacity`).
    ///
    /// The data goes to a sibling temp file which is then renamed over the
    /// target, so a crash mid-write leaves the previous history intact.
    pub fn save(&self, entries: &[Entry]) -> Result<()> {
        let _lock = self.write_lock.lock();
        self.write(entries)
    }

    /// Like `save`, but `snapshot` runs while the writer lock is held, so
    /// racing savers hit the disk in the order they read the history.
    pub fn save_with<F>(&self, snapshot: F) -> Result<()>
    where
        F: FnOnce() -> Vec<Entry>,
    {
        let _lock = self.write_lock.lock();
        self.write(&snapshot())
    }

    fn write(&self, entries: &[Entry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let limit = entries.len().min(self.capacity);
        let data = encode(entries[..limit].iter().map(Entry::text));

        let temp_path = self.temp_path();
        fs::write(&temp_path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.path)?;
        debug!("saved {} entries to {}", limit, self.path.display());
        Ok(())
    }

    /// Texts in file order. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut texts = decode(&String::from_utf8_lossy(&bytes));
        texts.truncate(self.capacity);
        debug!("loaded {} entries from {}", texts.len(), self.path.display());
        Ok(texts)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn is_sentinel(line: &str) -> bool {
    line == ENTRY_START || line == ENTRY_END
}

fn escape_line(line: &str) -> String {
    if is_sentinel(line.trim_start_matches(ESCAPE)) {
        format!("{}{}", ESCAPE, line)
    } else {
        line.to_string()
    }
}

fn unescape_line(line: &str) -> &str {
    match line.strip_prefix(ESCAPE) {
        Some(rest) if is_sentinel(line.trim_start_matches(ESCAPE)) => rest,
        _ => line,
    }
}

pub fn encode<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for text in texts {
        out.push_str(ENTRY_START);
        out.push('\n');
        for line in text.split('\n') {
            out.push_str(&escape_line(line));
            out.push('\n');
        }
        out.push_str(ENTRY_END);
        out.push('\n');
    }
    out
}

pub fn decode(data: &str) -> Vec<String> {
    if !data.split('\n').any(|line| line == ENTRY_START) {
        return decode_legacy(data);
    }

    let mut texts = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in data.split('\n') {
        match line {
            ENTRY_START => {
                if current.is_some() {
                    debug!("discarding unterminated history record");
                }
                current = Some(Vec::new());
            }
            ENTRY_END => {
                if let Some(lines) = current.take() {
                    let text = lines.join("\n");
                    if !text.is_empty() {
                        texts.push(text);
                    }
                }
            }
            _ => {
                if let Some(lines) = current.as_mut() {
                    lines.push(unescape_line(line));
                }
            }
        }
    }

    if current.is_some() {
        debug!("discarding truncated trailing history record");
    }

    texts
}

fn decode_legacy(data: &str) -> Vec<String> {
    let mut texts = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in data.split('\n') {
        if line == LEGACY_ENTRY_END {
            let text = lines.join("\n");
            if !text.is_empty() {
                texts.push(text);
            }
            lines.clear();
        } else {
            lines.push(line);
        }
    }

    // legacy files were appended oldest first
    texts.reverse();
    texts
}
