//! Bounded FIFO of scored outputs
//!
//! Keeps a fixed-duration rolling view of the most recent scores for
//! display. Eviction is strictly positional: a score is never rejected for
//! being similar or stale, only pushed out from the front when the buffer
//! is full.

use eegstream_core::{StreamError, StreamResult};
use std::collections::VecDeque;

/// Sliding window of the most recent scores
#[derive(Debug, Clone)]
pub struct SlidingResultBuffer {
    scores: VecDeque<f32>,
    capacity: usize,
}

impl SlidingResultBuffer {
    /// Capacity is floor(result_window / tick_interval); zero capacity is a
    /// misconfiguration and fails here rather than discarding every append.
    pub fn new(result_window_seconds: f32, tick_interval_seconds: f32) -> StreamResult<Self> {
        let capacity = if tick_interval_seconds > 0.0 {
            (result_window_seconds / tick_interval_seconds).floor() as usize
        } else {
            0
        };

        if capacity == 0 {
            return Err(StreamError::InvalidBufferCapacity {
                result_window_seconds,
                tick_interval_seconds,
            });
        }

        Ok(SlidingResultBuffer {
            scores: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Push to the back, evict from the front beyond capacity
    pub fn append(&mut self, score: f32) {
        self.scores.push_back(score);
        while self.scores.len() > self.capacity {
            self.scores.pop_front();
        }
    }

    /// Current contents, oldest to newest
    pub fn snapshot(&self) -> Vec<f32> {
        self.scores.iter().copied().collect()
    }

    /// Most recently appended score
    pub fn latest(&self) -> Option<f32> {
        self.scores.back().copied()
    }
}
