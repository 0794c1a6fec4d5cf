//! # Smoothing Module
//!
//! Rolling average over the most recent accepted pitch estimates.

use std::collections::VecDeque;

/// Sliding window of accepted estimates (the pitch history).
///
/// Nothing is emitted until the history holds `capacity` entries; from
/// then on every accepted estimate emits the mean of the full window and
/// evicts the oldest entry, so the window keeps sliding one step at a time.
#[derive(Debug, Clone)]
pub struct SmoothingBuffer {
    history: VecDeque<f32>,
    capacity: usize,
}

impl SmoothingBuffer {
    /// Creates an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Feeds one estimate; returns the stabilized frequency when the window is full.
    ///
    /// Absent estimates leave the buffer untouched.
    pub fn accept(&mut self, estimate: Option<f32>) -> Option<f32> {
        let frequency = estimate?;
        self.history.push_back(frequency);
        if self.history.len() < self.capacity {
            return None;
        }

        let mean = self.history.iter().sum::<f32>() / self.history.len() as f32;
        self.history.pop_front();
        Some(mean)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn emits_only_once_full() {
        let mut buffer = SmoothingBuffer::new(5);
        for f in [80.0, 81.0, 82.0, 83.0] {
            assert_eq!(buffer.accept(Some(f)), None);
        }
        let first = buffer.accept(Some(82.0)).unwrap();
        assert!(close(first, 81.6), "got {}", first);
    }

    #[test]
    fn window_slides_after_first_emission() {
        let mut buffer = SmoothingBuffer::new(5);
        for f in [80.0, 81.0, 82.0, 83.0, 82.0] {
            buffer.accept(Some(f));
        }
        assert_eq!(buffer.len(), 4);

        // Window is now [81, 82, 83, 82, 87].
        let second = buffer.accept(Some(87.0)).unwrap();
        assert!(close(second, 83.0), "got {}", second);

        // Window is now [82, 83, 82, 87, 91].
        let third = buffer.accept(Some(91.0)).unwrap();
        assert!(close(third, 85.0), "got {}", third);
    }

    #[test]
    fn absent_estimates_change_nothing() {
        let mut buffer = SmoothingBuffer::new(3);
        buffer.accept(Some(100.0));
        assert_eq!(buffer.accept(None), None);
        assert_eq!(buffer.len(), 1);
        buffer.accept(Some(110.0));
        assert_eq!(buffer.accept(None), None);
        let mean = buffer.accept(Some(120.0)).unwrap();
        assert!(close(mean, 110.0));
    }

    #[test]
    fn capacity_one_passes_estimates_through() {
        let mut buffer = SmoothingBuffer::new(1);
        assert_eq!(buffer.accept(Some(196.0)), Some(196.0));
        assert_eq!(buffer.accept(Some(200.0)), Some(200.0));
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(SmoothingBuffer::new(0).capacity(), 1);
    }

    #[test]
    fn clear_restarts_warm_up() {
        let mut buffer = SmoothingBuffer::new(2);
        buffer.accept(Some(100.0));
        buffer.clear();
        assert_eq!(buffer.accept(Some(100.0)), None);
        assert_eq!(buffer.accept(Some(102.0)), Some(101.0));
    }
}
