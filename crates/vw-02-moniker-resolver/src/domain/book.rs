//! Shared, atomically replaced moniker map.

use parking_lot::RwLock;
use shared_types::{Moniker, MonikerMap, UNKNOWN_MONIKER};
use std::sync::Arc;

/// Handle to the current `MonikerMap`.
///
/// Cloning the handle shares the map. Writers never mutate a published map:
/// `replace` swaps in a fully built one under the write lock, so a reader
/// holding a snapshot keeps seeing a complete map.
#[derive(Clone, Default)]
pub struct MonikerBook {
    inner: Arc<RwLock<Arc<MonikerMap>>>,
}

impl MonikerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: MonikerMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(map))),
        }
    }

    /// Current map.
    pub fn snapshot(&self) -> Arc<MonikerMap> {
        Arc::clone(&self.inner.read())
    }

    /// Publish `map`, returning the one it replaced.
    pub fn replace(&self, map: MonikerMap) -> Arc<MonikerMap> {
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, Arc::new(map))
    }

    /// Moniker for `address`, `"unknown"` when absent.
    pub fn moniker_of(&self, address: &str) -> Moniker {
        self.inner
            .read()
            .get(address)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_MONIKER.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn map_of(n: usize, tag: &str) -> MonikerMap {
        (0..n)
            .map(|i| (format!("g1{i:04}"), format!("{tag}-{i}")))
            .collect()
    }

    #[test]
    fn test_replace_returns_previous() {
        let book = MonikerBook::from_map(map_of(2, "old"));
        let previous = book.replace(map_of(3, "new"));

        assert_eq!(previous.len(), 2);
        assert_eq!(book.len(), 3);
        assert_eq!(book.moniker_of("g10001"), "new-1");
        assert_eq!(book.moniker_of("g1zzzz"), "unknown");
    }

    #[test]
    fn test_readers_never_see_partial_map() {
        let book = MonikerBook::from_map(map_of(50, "a"));

        let writer = {
            let book = book.clone();
            thread::spawn(move || {
                for round in 0..200 {
                    let tag = if round % 2 == 0 { "b" } else { "a" };
                    book.replace(map_of(50, tag));
                }
            })
        };

        for _ in 0..500 {
            let snapshot = book.snapshot();
            assert_eq!(snapshot.len(), 50);
            let first_tag = snapshot["g10000"].split('-').next().unwrap().to_string();
            assert!(snapshot
                .values()
                .all(|m| m.starts_with(&format!("{first_tag}-"))));
        }

        writer.join().unwrap();
    }
}
