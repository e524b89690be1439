use anyhow::Context;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::time::MissedTickBehavior;

use crate::clipboard::{ClipboardBackend, SuppressGuard, SystemClipboard};
use crate::config::Config;
use crate::entry::Entry;
use crate::error::{ClipError, Result};
use crate::history::{ClipboardHistory, ListenerId};
use crate::poller::{ClipboardPoller, SharedClipboard};
use crate::storage::HistoryFile;

/// The clipboard session: sole owner of the history.
///
/// The GUI, the shortcut handlers and the polling daemon all share one
/// `Arc<ClipboardManager>`; every method takes `&self`.
pub struct ClipboardManager {
    config: Config,
    history: Arc<ClipboardHistory>,
    clipboard: SharedClipboard,
    suppressed: Arc<AtomicUsize>,
    storage: HistoryFile,
    save_rx: Mutex<Option<mpsc::Receiver<()>>>,
    shutdown: Notify,
}

impl ClipboardManager {
    pub fn new(config: Config) -> Result<Self> {
        let backend = SystemClipboard::new()?;
        Ok(Self::with_backend(config, Box::new(backend)))
    }

    pub fn with_backend(config: Config, backend: Box<dyn ClipboardBackend>) -> Self {
        let history = Arc::new(ClipboardHistory::new(config.max_entries));
        let storage = HistoryFile::new(&config.history_path, config.max_entries);

        match storage.load() {
            Ok(texts) => {
                info!(
                    "loaded {} history entries from {}",
                    texts.len(),
                    storage.path().display()
                );
                history.replace_all(texts);
            }
            Err(e) => warn!(
                "could not read {}, keeping history in memory only: {}",
                storage.path().display(),
                e
            ),
        }

        // a full channel means a save is already pending, which covers this change
        let (save_tx, save_rx) = mpsc::channel(1);
        history.on_change(move || {
            let _ = save_tx.try_send(());
        });

        Self {
            config,
            history,
            clipboard: Arc::new(Mutex::new(backend)),
            suppressed: Arc::new(AtomicUsize::new(0)),
            storage,
            save_rx: Mutex::new(Some(save_rx)),
            shutdown: Notify::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &Arc<ClipboardHistory> {
        &self.history
    }

    /// Poll the clipboard and persist pending changes until `shutdown`.
    ///
    /// Saves requested by history listeners are coalesced: however many
    /// mutations land between two loop turns, the file is written once. The
    /// final state is flushed before returning.
    pub async fn run_daemon(&self) -> anyhow::Result<()> {
        let mut save_rx = self
            .save_rx
            .lock()
            .take()
            .context("clipboard daemon is already running")?;

        let poller = ClipboardPoller::new(
            self.history.clone(),
            self.clipboard.clone(),
            self.suppressed.clone(),
        );

        let mut interval = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "watching clipboard every {}ms",
            self.config.poll_interval_ms
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    poller.poll_once();
                }

                Some(()) = save_rx.recv() => {
                    let _ = self.flush();
                }

                _ = self.shutdown.notified() => break,
            }
        }

        let flushed = self.flush();
        *self.save_rx.lock() = Some(save_rx);
        info!("clipboard daemon stopped");

        flushed.context("final history flush failed")
    }

    /// Ask a running daemon to flush and return. If the daemon is not
    /// running yet, it stops right after starting.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Write the history file now.
    pub fn flush(&self) -> Result<()> {
        self.storage
            .save_with(|| self.history.get_all())
            .inspect_err(|e| warn!("failed to save history: {}", e))
    }

    pub fn get_entries(&self) -> Vec<Entry> {
        self.history.get_all()
    }

    pub fn get_entry(&self, index: usize) -> Option<Entry> {
        self.history.get(index)
    }

    pub fn entry_count(&self) -> usize {
        self.history.count()
    }

    pub fn search(&self, query: &str) -> Vec<(usize, Entry)> {
        self.history.search(query)
    }

    /// Put entry `index` back on the system clipboard.
    ///
    /// Polling is suppressed for the duration of the write. The entry moves
    /// to the front only once the write succeeded; a rejected write leaves
    /// the history as it was.
    pub fn copy_to_clipboard(&self, index: usize) -> Result<()> {
        let entry = self
            .history
            .get(index)
            .ok_or_else(|| ClipError::IndexOutOfRange {
                index,
                len: self.history.count(),
            })?;

        {
            let _guard = SuppressGuard::new(&self.suppressed);
            self.clipboard.lock().write_text(entry.text())?;
            self.history.mark_seen(entry.text());
        }

        self.history.promote_text(entry.text());
        debug!("copied entry {} ({} bytes) to clipboard", index, entry.size());
        Ok(())
    }

    pub fn remove_entry(&self, index: usize) -> Option<Entry> {
        self.history.remove(index)
    }

    pub fn clear_entries(&self) {
        self.history.clear();
    }

    pub fn register_callback<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.history.on_change(callback)
    }
}
