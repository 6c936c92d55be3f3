use std::collections::VecDeque;
use std::sync::Arc;

use region_watch_common::frame::Frame;
use tracing::debug;

/// Bounded, newest-first retention buffer of frames.
///
/// Insertion is always at the front. Whenever the length would exceed the
/// capacity, the oldest frames are dropped from the tail.
#[derive(Debug)]
pub struct HistoryStore {
    frames: VecDeque<Arc<Frame>>,
    capacity: usize,
}

impl HistoryStore {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert `frame` as the newest entry. Returns the frames evicted to stay
    /// within capacity (at most one).
    pub fn push_front(&mut self, frame: Arc<Frame>) -> Vec<Arc<Frame>> {
        self.frames.push_front(frame);
        self.evict_overflow()
    }

    /// Change the capacity, evicting from the tail immediately if the store
    /// is now over it.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<Arc<Frame>> {
        self.capacity = capacity.max(1);
        self.evict_overflow()
    }

    fn evict_overflow(&mut self) -> Vec<Arc<Frame>> {
        let keep = self.frames.len().min(self.capacity);
        let evicted: Vec<Arc<Frame>> = self.frames.drain(keep..).collect();
        for frame in &evicted {
            debug!(seq = frame.seq, capacity = self.capacity, "evicted oldest frame");
        }
        evicted
    }

    /// Remove every frame, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.frames.len();
        self.frames.clear();
        dropped
    }

    /// The most recently stored frame.
    pub fn front(&self) -> Option<&Arc<Frame>> {
        self.frames.front()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Frame>> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Frame>> {
        self.frames.iter()
    }

    /// Shared handles to the current contents, newest first.
    pub fn snapshot(&self) -> Vec<Arc<Frame>> {
        self.frames.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(seq: u64) -> Arc<Frame> {
        Arc::new(Frame::new(RgbImage::new(1, 1), 0, seq))
    }

    fn seqs(store: &HistoryStore) -> Vec<u64> {
        store.iter().map(|f| f.seq).collect()
    }

    #[test]
    fn newest_first_order() {
        let mut store = HistoryStore::new(5);
        for seq in 1..=3 {
            assert!(store.push_front(frame(seq)).is_empty());
        }
        assert_eq!(seqs(&store), vec![3, 2, 1]);
        assert_eq!(store.front().map(|f| f.seq), Some(3));
    }

    #[test]
    fn overflow_evicts_least_recently_inserted() {
        let mut store = HistoryStore::new(3);
        for seq in 1..=3 {
            store.push_front(frame(seq));
        }
        let evicted = store.push_front(frame(4));
        assert_eq!(evicted.iter().map(|f| f.seq).collect::<Vec<_>>(), vec![1]);
        assert_eq!(seqs(&store), vec![4, 3, 2]);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        for capacity in 1..=7 {
            let mut store = HistoryStore::new(capacity);
            for seq in 0..20 {
                store.push_front(frame(seq));
                assert!(store.len() <= capacity);
            }
            assert_eq!(store.len(), capacity);
            assert_eq!(store.front().map(|f| f.seq), Some(19));
        }
    }

    #[test]
    fn shrinking_capacity_evicts_from_tail() {
        let mut store = HistoryStore::new(10);
        for seq in 1..=6 {
            store.push_front(frame(seq));
        }
        let evicted = store.set_capacity(2);
        assert_eq!(evicted.iter().map(|f| f.seq).collect::<Vec<_>>(), vec![4, 3, 2, 1]);
        assert_eq!(seqs(&store), vec![6, 5]);
    }

    #[test]
    fn growing_capacity_keeps_everything() {
        let mut store = HistoryStore::new(2);
        store.push_front(frame(1));
        store.push_front(frame(2));
        assert!(store.set_capacity(50).is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn zero_capacity_is_one() {
        let mut store = HistoryStore::new(0);
        store.push_front(frame(1));
        store.push_front(frame(2));
        assert_eq!(seqs(&store), vec![2]);
    }

    #[test]
    fn clear_empties() {
        let mut store = HistoryStore::new(4);
        store.push_front(frame(1));
        store.push_front(frame(2));
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }
}
