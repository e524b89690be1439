//! Clipboard history core: a bounded, deduplicated, most-recently-used list of
//! clipboard texts, the poller that feeds it, and the file that keeps it
//! across restarts.

pub mod clipboard;
pub mod config;
pub mod entry;
pub mod error;
pub mod history;
pub mod manager;
pub mod poller;
pub mod storage;

pub use clipboard::{ClipboardBackend, SuppressGuard, SystemClipboard};
pub use config::Config;
pub use entry::{DEFAULT_PREVIEW_LEN, Entry, format_size};
pub use error::{ClipError, Result};
pub use history::{ClipboardHistory, ListenerId, MAX_ENTRIES};
pub use manager::ClipboardManager;
pub use poller::ClipboardPoller;
pub use storage::HistoryFile;
