//! Result set (spec component D): the per-cell collection of observations
//! that satisfy a range+time query.
//!
//! The source system models this as a mutex-protected singly-linked list to
//! support concurrent insertion during a parallelised query. Queries here
//! are issued from a single worker thread per cell (spec §5, §9 "Result
//! set"), so a growable vector behind a lock is strictly faster with
//! identical observable semantics; this crate takes the vector.

use std::sync::Mutex;

/// A single observation that matched a range query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub x: f32,
    pub y: f32,
    pub t: f32,
    pub record_index: u32,
}

/// An append-only, thread-safe bag of [`Hit`]s with single-consumer,
/// read-once forward iteration.
#[derive(Debug, Default)]
pub struct ResultSet {
    items: Mutex<Vec<Hit>>,
    cursor: usize,
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            cursor: 0,
        }
    }

    /// Append a hit. Safe to call concurrently from multiple writers.
    #[inline]
    pub fn insert(&self, x: f32, y: f32, t: f32, record_index: u32) {
        self.items.lock().unwrap().push(Hit {
            x,
            y,
            t,
            record_index,
        });
    }

    /// The number of hits inserted so far.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return each hit once, in insertion order; `None` once exhausted.
    /// There is no restart — a second pass requires [`ResultSet::to_vec`] or
    /// rebuilding the set.
    pub fn iterate(&mut self) -> Option<Hit> {
        let items = self.items.get_mut().unwrap();
        if self.cursor >= items.len() {
            return None;
        }
        let hit = items[self.cursor];
        self.cursor += 1;
        Some(hit)
    }

    /// Copy all hits into a fresh `Vec`, for reductions (median) that need
    /// random access rather than a single forward pass.
    pub fn to_vec(&self) -> Vec<Hit> {
        self.items.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_once_iteration_exhausts() {
        let mut set = ResultSet::new();
        set.insert(1.0, 2.0, 3.0, 0);
        set.insert(4.0, 5.0, 6.0, 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iterate().unwrap().record_index, 0);
        assert_eq!(set.iterate().unwrap().record_index, 1);
        assert!(set.iterate().is_none());
        assert!(set.iterate().is_none());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let set = ResultSet::new();
        for i in 0..100u32 {
            set.insert(0.0, 0.0, 0.0, i);
        }
        let all = set.to_vec();
        let indices: Vec<u32> = all.iter().map(|h| h.record_index).collect();
        let expected: Vec<u32> = (0..100).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn concurrent_insert_preserves_atomicity_of_length() {
        use std::sync::Arc;
        use std::thread;

        let set = Arc::new(ResultSet::new());
        let mut handles = vec![];
        for t in 0..8 {
            let set = Arc::clone(&set);
            handles.push(thread::spawn(move || {
                for i in 0..1000u32 {
                    set.insert(0.0, 0.0, 0.0, t * 1000 + i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(set.len(), 8000);
    }
}
