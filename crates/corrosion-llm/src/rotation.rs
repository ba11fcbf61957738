//! Round-robin selection over a fixed list.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Cycles through an immutable list, one step per [`Rotation::next`].
///
/// The cursor is a single atomic counter, so concurrent callers each get a
/// distinct step and no lock is held across an `await`.
#[derive(Debug)]
pub struct Rotation<T> {
    items: Vec<T>,
    cursor: AtomicUsize,
}

impl<T> Rotation<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Next item in cyclic order, or `None` for an empty list.
    pub fn next(&self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let step = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.items.get(step % self.items.len())
    }

    /// Number of times the cursor has advanced.
    pub fn advanced(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}
