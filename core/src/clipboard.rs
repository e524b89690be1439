use arboard::Clipboard;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ClipError, Result};

/// Text access to the system clipboard.
pub trait ClipboardBackend: Send {
    /// Current clipboard text. `None` for an empty, non-text or locked
    /// clipboard; the poller treats all of those as "nothing new".
    fn read_text(&mut self) -> Option<String>;

    fn write_text(&mut self, text: &str) -> Result<()>;
}

pub struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().map_err(|e| ClipError::ClipboardRead(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

impl ClipboardBackend for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        self.clipboard.get_text().ok()
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ClipError::ClipboardWrite(e.to_string()))?;

        // X11/Wayland keep a separate primary selection; mirror into it
        #[cfg(all(
            unix,
            not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
        ))]
        {
            use arboard::{LinuxClipboardKind, SetExtLinux};

            if let Err(e) = self
                .clipboard
                .set()
                .clipboard(LinuxClipboardKind::Primary)
                .text(text)
            {
                log::warn!("failed to set primary selection: {}", e);
            }
        }

        Ok(())
    }
}

/// Held while the application itself writes to the clipboard.
///
/// Guards count up on construction and down on drop, so polling stays off
/// until every overlapping write (GUI and shortcut thread) has finished, on
/// every exit path including `?` and panics.
pub struct SuppressGuard {
    count: Arc<AtomicUsize>,
}

impl SuppressGuard {
    pub fn new(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self {
            count: count.clone(),
        }
    }

    pub fn is_active(count: &AtomicUsize) -> bool {
        count.load(Ordering::SeqCst) > 0
    }
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_clears_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _guard = SuppressGuard::new(&count);
            assert!(SuppressGuard::is_active(&count));
        }
        assert!(!SuppressGuard::is_active(&count));
    }

    #[test]
    fn test_guard_clears_on_early_return() {
        fn failing_write(count: &Arc<AtomicUsize>) -> Result<()> {
            let _guard = SuppressGuard::new(count);
            Err(ClipError::ClipboardWrite("nope".into()))
        }

        let count = Arc::new(AtomicUsize::new(0));
        assert!(failing_write(&count).is_err());
        assert!(!SuppressGuard::is_active(&count));
    }

    #[test]
    fn test_overlapping_guards_stay_active_until_last_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let first = SuppressGuard::new(&count);
        let second = SuppressGuard::new(&count);

        drop(first);
        assert!(SuppressGuard::is_active(&count));

        drop(second);
        assert!(!SuppressGuard::is_active(&count));
    }
}
