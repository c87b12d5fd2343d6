use std::collections::VecDeque;

/// A most-recent-first sequence holding at most `capacity` entries.
///
/// Pushing onto a full log evicts the oldest entry. Evicted entries are gone
/// for good; nothing is archived.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a log from entries already ordered newest first, dropping any
    /// beyond capacity
    pub fn from_newest_first(entries: Vec<T>, capacity: usize) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Insert as the newest entry, returning the evicted entry if the log was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        self.entries.push_front(entry);
        evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_newest_first() {
        let mut log = BoundedLog::new(3);
        log.push(1);
        log.push(2);
        assert_eq!(log.to_vec(), vec![2, 1]);
        assert_eq!(log.newest(), Some(&2));
    }

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let mut log = BoundedLog::new(3);
        for i in 1..=3 {
            assert_eq!(log.push(i), None);
        }
        assert_eq!(log.push(4), Some(1));
        assert_eq!(log.to_vec(), vec![4, 3, 2]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut log = BoundedLog::new(50);
        for i in 0..500 {
            log.push(i);
            assert!(log.len() <= 50);
        }
        assert_eq!(log.newest(), Some(&499));
        assert_eq!(log.get(49), Some(&450));
    }

    #[test]
    fn test_from_newest_first_truncates() {
        let log = BoundedLog::from_newest_first(vec![9, 8, 7, 6], 2);
        assert_eq!(log.to_vec(), vec![9, 8]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut log = BoundedLog::new(0);
        assert_eq!(log.push("a"), Some("a"));
        assert!(log.is_empty());
    }
}
