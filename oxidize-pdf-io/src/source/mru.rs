//! Most-recently-used list for bounding open resources
//!
//! Keeps at most `capacity` entries ordered most recently used first.
//! Pushing an entry beyond capacity evicts the least recently used one and
//! hands it back so the caller can release it.

use std::collections::VecDeque;

/// Bounded most-recently-used list.
#[derive(Debug, Clone)]
pub struct MruList<T> {
    capacity: usize,
    order: VecDeque<T>,
}

impl<T: PartialEq> MruList<T> {
    /// Create a new list holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Mark `item` as most recently used.
    ///
    /// An entry already present is moved to the front rather than
    /// duplicated. Returns the evicted entry when the list overflows.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        if self.order.front() == Some(&item) {
            return None;
        }
        if let Some(index) = self.order.iter().position(|existing| *existing == item) {
            if let Some(existing) = self.order.remove(index) {
                self.order.push_front(existing);
            }
            return None;
        }

        self.order.push_front(item);
        if self.order.len() > self.capacity {
            return self.order.pop_back();
        }
        None
    }

    pub fn contains(&self, item: &T) -> bool {
        self.order.contains(item)
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mru_basic() {
        let mut mru = MruList::new(3);

        assert_eq!(mru.enqueue(1), None);
        assert_eq!(mru.enqueue(2), None);
        assert_eq!(mru.enqueue(3), None);

        assert_eq!(mru.len(), 3);
        assert_eq!(mru.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn test_mru_eviction() {
        let mut mru = MruList::new(3);
        mru.enqueue(1);
        mru.enqueue(2);
        mru.enqueue(3);

        // This should evict the least recently used (1)
        assert_eq!(mru.enqueue(4), Some(1));
        assert_eq!(mru.len(), 3);
        assert!(!mru.contains(&1));
    }

    #[test]
    fn test_mru_access_order() {
        let mut mru = MruList::new(3);
        mru.enqueue(1);
        mru.enqueue(2);
        mru.enqueue(3);

        // Touch 1, making it recently used
        assert_eq!(mru.enqueue(1), None);
        assert_eq!(mru.iter().copied().collect::<Vec<_>>(), vec![1, 3, 2]);

        // Add 4, should evict 2 (least recently used)
        assert_eq!(mru.enqueue(4), Some(2));
    }

    #[test]
    fn test_mru_front_is_noop() {
        let mut mru = MruList::new(1);
        assert_eq!(mru.enqueue(7), None);
        assert_eq!(mru.enqueue(7), None);
        assert_eq!(mru.len(), 1);
        assert_eq!(mru.enqueue(8), Some(7));
    }

    #[test]
    fn test_mru_clear() {
        let mut mru = MruList::new(2);
        mru.enqueue("a");
        mru.enqueue("b");
        mru.clear();
        assert!(mru.is_empty());
        assert_eq!(mru.capacity(), 2);
    }
}
