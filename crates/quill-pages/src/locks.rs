//! Per-title mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use quill_storage::Title;

/// Keyed lock table: one mutex per title currently being written.
///
/// Entries exist only while someone holds or waits for them, so the table
/// stays as small as the number of in-flight writes. Writers to different
/// titles only share the table lock, held for a map lookup.
#[derive(Debug, Default)]
pub(crate) struct TitleLocks {
    table: Mutex<HashMap<Title, Arc<Mutex<()>>>>,
}

impl TitleLocks {
    /// Run `f` while holding the lock for `title`.
    pub(crate) fn with_lock<R>(&self, title: &Title, f: impl FnOnce() -> R) -> R {
        let entry = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(title.clone()).or_default())
        };

        let result = {
            // The mutex guards no data, so a panic in another holder leaves
            // nothing inconsistent behind.
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Two references left: the table's and ours. Nobody else is waiting.
        if Arc::strong_count(&entry) == 2 {
            table.remove(title);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn title(raw: &str) -> Title {
        Title::new(raw).unwrap()
    }

    #[test]
    fn test_entry_removed_after_use() {
        let locks = TitleLocks::default();

        let value = locks.with_lock(&title("a"), || 42);

        assert_eq!(value, 42);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn test_same_title_is_exclusive() {
        let locks = Arc::new(TitleLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_lock(&title("same"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn test_different_titles_do_not_block() {
        let locks = Arc::new(TitleLocks::default());
        let (tx, rx) = std::sync::mpsc::channel();

        let other = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                // Waits inside "b" until the main thread, holding "a", signals.
                locks.with_lock(&title("b"), || rx.recv().unwrap());
            })
        };

        locks.with_lock(&title("a"), || {
            thread::sleep(Duration::from_millis(10));
            tx.send(()).unwrap();
        });
        other.join().unwrap();
    }
}
