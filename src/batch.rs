//! Minimum-size batch accumulation for deliveries.
//!
//! Polled messages are held until at least `min_batch_size` of them are
//! available, then released together in poll order.

/// Batch accumulator gating deliveries on a minimum size.
///
/// With a minimum of 1 every non-empty poll is released as-is and nothing is
/// ever held across ticks.
#[derive(Debug)]
pub struct BatchAccumulator<T> {
    min_batch_size: usize,
    items: Vec<T>,
}

impl<T> BatchAccumulator<T> {
    /// Create a new accumulator. A minimum of 0 is treated as 1.
    pub fn new(min_batch_size: usize) -> Self {
        Self {
            min_batch_size: min_batch_size.max(1),
            items: Vec::new(),
        }
    }

    /// Append a polled batch behind anything already held.
    pub fn extend(&mut self, batch: Vec<T>) {
        if self.items.is_empty() {
            self.items = batch;
        } else {
            self.items.extend(batch);
        }
    }

    /// Check if the held items meet the minimum size.
    pub fn is_ready(&self) -> bool {
        !self.items.is_empty() && self.items.len() >= self.min_batch_size
    }

    /// Take the held items if they meet the minimum size.
    pub fn take_ready(&mut self) -> Option<Vec<T>> {
        if self.is_ready() {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Drain everything held, ready or not.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }

    /// Check if the accumulator is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of held items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn min_batch_size(&self) -> usize {
        self.min_batch_size
    }
}
