use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::{ClipError, Result};

pub const MAX_ENTRIES: usize = 50;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct HistoryInner {
    // keyed by the full text: iteration order is most- to least-recently used
    entries: LruCache<String, Entry>,
    last_seen: Option<String>,
}

impl HistoryInner {
    fn key_at(&self, index: usize) -> Option<String> {
        self.entries.iter().nth(index).map(|(key, _)| key.clone())
    }

    fn upsert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }

        if self.entries.contains(text) {
            self.entries.promote(text);
            return true;
        }

        let Ok(entry) = Entry::new(text) else {
            return false;
        };

        if let Some((evicted, _)) = self.entries.push(text.to_string(), entry) {
            debug!("history full, evicted {} bytes", evicted.len());
        }
        true
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    callbacks: Vec<(ListenerId, Listener)>,
}

/// Bounded, deduplicated, most-recently-used-first clipboard history.
///
/// Every operation takes one exclusive lock for its whole duration. Change
/// listeners run after that lock is released, from a copy of the listener
/// list, so a listener may call straight back into the history.
pub struct ClipboardHistory {
    inner: Mutex<HistoryInner>,
    listeners: Mutex<Listeners>,
}

impl ClipboardHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Mutex::new(HistoryInner {
                entries: LruCache::new(capacity),
                last_seen: None,
            }),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Insert `text` at the front, or move the existing entry there keeping
    /// its first-seen timestamp. Evicts the least recently used entry when full.
    pub fn upsert(&self, text: &str) -> bool {
        let changed = self.inner.lock().upsert(text);
        if changed {
            self.notify();
        }
        changed
    }

    /// Poller entry point: upsert only when `text` differs from the last
    /// observed clipboard content.
    pub fn ingest(&self, text: &str) -> bool {
        let changed = {
            let mut inner = self.inner.lock();
            if text.is_empty() || inner.last_seen.as_deref() == Some(text) {
                return false;
            }
            inner.last_seen = Some(text.to_string());
            inner.upsert(text)
        };

        if changed {
            self.notify();
        }
        changed
    }

    pub fn mark_seen(&self, text: &str) {
        self.inner.lock().last_seen = Some(text.to_string());
    }

    pub fn last_seen(&self) -> Option<String> {
        self.inner.lock().last_seen.clone()
    }

    pub fn get_all(&self) -> Vec<Entry> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<Entry> {
        self.inner
            .lock()
            .entries
            .iter()
            .nth(index)
            .map(|(_, entry)| entry.clone())
    }

    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Move the entry at `index` to the front and return its text.
    pub fn promote_and_fetch(&self, index: usize) -> Result<String> {
        let text = {
            let mut inner = self.inner.lock();
            let len = inner.entries.len();
            let key = inner
                .key_at(index)
                .ok_or(ClipError::IndexOutOfRange { index, len })?;
            inner.entries.promote(&key);
            key
        };

        self.notify();
        Ok(text)
    }

    /// Move the entry holding exactly `text` to the front, if it still exists.
    pub fn promote_text(&self, text: &str) -> bool {
        let found = {
            let mut inner = self.inner.lock();
            if inner.entries.contains(text) {
                inner.entries.promote(text);
                true
            } else {
                false
            }
        };

        if found {
            self.notify();
        }
        found
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub fn remove(&self, index: usize) -> Option<Entry> {
        let removed = {
            let mut inner = self.inner.lock();
            let key = inner.key_at(index)?;
            inner.entries.pop(&key)
        };

        if removed.is_some() {
            self.notify();
        }
        removed
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        self.notify();
    }

    /// Populate from persisted texts, most recent first. Empty and repeated
    /// texts are skipped and the list is cut at capacity. The most recent
    /// text becomes the last seen clipboard content. Listeners are not told.
    pub fn replace_all<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.lock();
        let capacity = inner.entries.cap().get();
        inner.entries.clear();

        let mut ordered: Vec<Entry> = Vec::with_capacity(capacity);
        for text in texts {
            if ordered.len() == capacity {
                break;
            }
            let Ok(entry) = Entry::new(text) else {
                continue;
            };
            if ordered.iter().any(|existing| existing.text() == entry.text()) {
                continue;
            }
            ordered.push(entry);
        }

        inner.last_seen = ordered.first().map(|entry| entry.text().to_string());

        // oldest first so the most recent ends up at the front
        for entry in ordered.into_iter().rev() {
            inner.entries.push(entry.text().to_string(), entry);
        }
    }

    /// Case-sensitive substring match over the full text, with store indices.
    pub fn search(&self, query: &str) -> Vec<(usize, Entry)> {
        self.inner
            .lock()
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (text, _))| text.contains(query))
            .map(|(index, (_, entry))| (index, entry.clone()))
            .collect()
    }

    pub fn on_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.callbacks.push((id, Arc::new(callback)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.callbacks.len();
        listeners.callbacks.retain(|(existing, _)| *existing != id);
        listeners.callbacks.len() != before
    }

    fn notify(&self) {
        let callbacks: Vec<Listener> = self
            .listeners
            .lock()
            .callbacks
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            callback();
        }
    }
}

impl Default for ClipboardHistory {
    fn default() -> Self {
        Self::new(MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn texts(history: &ClipboardHistory) -> Vec<String> {
        history
            .get_all()
            .iter()
            .map(|entry| entry.text().to_string())
            .collect()
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let history = ClipboardHistory::new(2);
        history.upsert("a");
        history.upsert("b");
        history.upsert("c");

        assert_eq!(texts(&history), vec!["c", "b"]);
    }

    #[test]
    fn test_upsert_existing_promotes_without_duplicate() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.upsert("x");
        history.upsert("y");
        history.upsert("x");

        assert_eq!(texts(&history), vec!["x", "y"]);
        assert_eq!(history.count(), 2);
    }

    #[test]
    fn test_upsert_twice_keeps_size() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.upsert("same");
        history.upsert("same");

        assert_eq!(history.count(), 1);
    }

    #[test]
    fn test_upsert_empty_is_noop() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        assert!(!history.upsert(""));
        assert!(history.is_empty());
    }

    #[test]
    fn test_bounded_under_many_upserts() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        for i in 0..(MAX_ENTRIES * 3) {
            let text = format!("item {}", i % (MAX_ENTRIES + 7));
            history.upsert(&text);
            assert!(history.count() <= MAX_ENTRIES);
            assert_eq!(history.get(0).unwrap().text(), text);
        }
    }

    #[test]
    fn test_eviction_keeps_recently_promoted() {
        let history = ClipboardHistory::new(3);
        history.upsert("a");
        history.upsert("b");
        history.upsert("c");
        history.upsert("a");
        history.upsert("d");

        // "b" was the least recently used once "a" got promoted
        assert_eq!(texts(&history), vec!["d", "a", "c"]);
    }

    #[test]
    fn test_promote_keeps_timestamp() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.replace_all(["newest", "middle", "oldest"]);
        let before = history.get(2).unwrap();

        let text = history.promote_and_fetch(2).unwrap();

        assert_eq!(text, "oldest");
        let after = history.get(0).unwrap();
        assert_eq!(after.text(), "oldest");
        assert_eq!(after.timestamp(), before.timestamp());
        assert_eq!(texts(&history), vec!["oldest", "newest", "middle"]);
    }

    #[test]
    fn test_promote_out_of_range() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.upsert("only");

        let err = history.promote_and_fetch(3).unwrap_err();
        assert!(matches!(err, ClipError::IndexOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.replace_all(["a", "b", "c"]);

        assert!(history.remove(5).is_none());
        assert_eq!(texts(&history), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_middle() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.replace_all(["a", "b", "c"]);

        let removed = history.remove(1).unwrap();
        assert_eq!(removed.text(), "b");
        assert_eq!(texts(&history), vec!["a", "c"]);
    }

    #[test]
    fn test_clear() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.replace_all(["a", "b"]);
        history.clear();

        assert!(history.is_empty());
        assert!(history.get(0).is_none());
    }

    #[test]
    fn test_ingest_ignores_last_seen() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        assert!(history.ingest("one"));
        assert!(!history.ingest("one"));
        assert!(history.ingest("two"));
        assert!(!history.ingest(""));

        assert_eq!(texts(&history), vec!["two", "one"]);
        assert_eq!(history.last_seen().as_deref(), Some("two"));
    }

    #[test]
    fn test_mark_seen_suppresses_ingest() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.mark_seen("written by us");
        assert!(!history.ingest("written by us"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_replace_all_dedupes_and_truncates() {
        let history = ClipboardHistory::new(3);
        history.replace_all(["a", "", "b", "a", "c", "d"]);

        assert_eq!(texts(&history), vec!["a", "b", "c"]);
        assert_eq!(history.last_seen().as_deref(), Some("a"));
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.replace_all(["Hello there", "say hello", "unrelated"]);

        let hits: Vec<usize> = history.search("hello").iter().map(|(i, _)| *i).collect();
        assert_eq!(hits, vec![1]);
        assert_eq!(history.search("").len(), 3);
    }

    #[test]
    fn test_get_all_is_a_snapshot() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        history.upsert("a");
        let snapshot = history.get_all();
        history.upsert("b");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.count(), 2);
    }

    #[test]
    fn test_listeners_fire_on_mutation() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        history.on_change(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        history.upsert("a");
        history.upsert("b");
        history.promote_and_fetch(1).unwrap();
        history.remove(9);
        history.remove(0);
        history.clear();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_listener_can_reenter_history() {
        let history = Arc::new(ClipboardHistory::new(MAX_ENTRIES));
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&history);
        let observed = seen.clone();
        history.on_change(move || {
            if let Some(history) = weak.upgrade() {
                observed.store(history.count(), Ordering::SeqCst);
            }
        });

        history.upsert("a");
        history.upsert("b");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_listener() {
        let history = ClipboardHistory::new(MAX_ENTRIES);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = history.on_change(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        history.upsert("a");
        assert!(history.remove_listener(id));
        assert!(!history.remove_listener(id));
        history.upsert("b");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_upserts_stay_bounded() {
        let history = Arc::new(ClipboardHistory::new(10));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let history = history.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        history.upsert(&format!("{}-{}", t, i % 15));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let all = texts(&history);
        assert_eq!(all.len(), 10);
        let mut unique = all.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), all.len());
    }
}
