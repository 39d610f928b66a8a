//! Rotating record of recently-seen message ids.

use std::sync::Mutex;

/// Fixed-capacity, thread-safe duplicate filter.
///
/// Keeps the last N seen ids in a ring buffer: membership is a linear
/// scan, insertion overwrites the slot at the write cursor and advances
/// it modulo capacity. The oldest entry is evicted first (a rotation,
/// not an LRU).
///
/// This is a best-effort, bounded-memory, single-process filter: under
/// a redelivery burst larger than the capacity, ids older than the
/// window are treated as new and re-processed. Keep the capacity small
/// (tens to low hundreds); the lock is held for the full scan.
pub struct IdempotencyCache {
    inner: Mutex<Ring>,
}

struct Ring {
    slots: Vec<Option<String>>,
    cursor: usize,
}

impl IdempotencyCache {
    /// Create a cache holding the last `capacity` ids.
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "idempotency cache capacity must be non-zero");
        IdempotencyCache {
            inner: Mutex::new(Ring {
                slots: vec![None; capacity],
                cursor: 0,
            }),
        }
    }

    /// Report whether `id` has been seen within the current window.
    ///
    /// Returns `true` and records the id when it is new; returns
    /// `false` without touching the window when it is already present.
    pub fn is_unique(&self, id: &str) -> bool {
        let mut ring = self.inner.lock().unwrap();

        if ring.slots.iter().any(|slot| slot.as_deref() == Some(id)) {
            return false;
        }

        let cursor = ring.cursor;
        ring.slots[cursor] = Some(id.to_string());
        ring.cursor = (cursor + 1) % ring.slots.len();
        true
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }
}
