use log::trace;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use crate::clipboard::{ClipboardBackend, SuppressGuard};
use crate::history::ClipboardHistory;

pub type SharedClipboard = Arc<Mutex<Box<dyn ClipboardBackend>>>;

/// Feeds fresh clipboard text into the history.
pub struct ClipboardPoller {
    history: Arc<ClipboardHistory>,
    clipboard: SharedClipboard,
    suppressed: Arc<AtomicUsize>,
}

impl ClipboardPoller {
    pub fn new(
        history: Arc<ClipboardHistory>,
        clipboard: SharedClipboard,
        suppressed: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            history,
            clipboard,
            suppressed,
        }
    }

    /// One sampling tick. Returns whether the history changed.
    ///
    /// A write in progress, a busy clipboard, a failed read and an empty read
    /// all count as "nothing new".
    pub fn poll_once(&self) -> bool {
        if SuppressGuard::is_active(&self.suppressed) {
            return false;
        }

        // non-blocking: a writer holding the clipboard wins this tick
        let text = match self.clipboard.try_lock() {
            Some(mut clipboard) => clipboard.read_text(),
            None => return false,
        };

        // re-check: the write may have started while we were reading
        if SuppressGuard::is_active(&self.suppressed) {
            return false;
        }

        match text {
            Some(text) if !text.is_empty() => {
                let changed = self.history.ingest(&text);
                if changed {
                    trace!("captured {} bytes from clipboard", text.len());
                }
                changed
            }
            _ => false,
        }
    }
}
