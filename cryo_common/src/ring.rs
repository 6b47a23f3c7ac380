//! Bounded circular buffer.
//!
//! Every fixed-capacity history in the workspace (PID error history,
//! alarm history log, performance windows) goes through [`RingBuffer`].
//! A push on a full buffer evicts the oldest element; there is no other
//! way to remove a single element.
//!
//! Backed by `heapless::Deque`, so capacity is a const generic and no
//! allocation happens after construction.

use heapless::Deque;

/// Fixed-capacity FIFO with oldest-eviction on push.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    items: Deque<T, N>,
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> RingBuffer<T, N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self { items: Deque::new() }
    }

    /// Append `item`, returning the evicted oldest element when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        // Cannot fail: a slot was freed above if the deque was full.
        let _ = self.items.push_back(item);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recently pushed element.
    #[inline]
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest retained element.
    #[inline]
    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterate oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Iterate over the `n` most recent elements, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<const N: usize> RingBuffer<f64, N> {
    /// Arithmetic mean of the retained samples (0.0 when empty).
    pub fn mean(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.items.iter().sum::<f64>() / self.items.len() as f64
    }

    /// Least-squares slope over the `n` most recent samples, per sample.
    ///
    /// `n` is capped at the number of retained samples. Returns 0.0 with
    /// fewer than two samples.
    pub fn slope(&self, n: usize) -> f64 {
        let n = n.min(self.items.len());
        if n < 2 {
            return 0.0;
        }
        let nf = n as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for (i, y) in self.recent(n).enumerate() {
            let x = i as f64;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }
        let denom = nf * sum_xx - sum_x * sum_x;
        if denom.abs() < f64::EPSILON {
            return 0.0;
        }
        (nf * sum_xy - sum_x * sum_y) / denom
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
