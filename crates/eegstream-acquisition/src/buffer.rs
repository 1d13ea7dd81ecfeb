//! Append-only acquisition buffer with bounded retention
//!
//! The device task is the single writer; analytics engines hold independent
//! read cursors and `latest(n)` never mutates the store, so any number of
//! engines can read one buffer concurrently.

use eegstream_core::{SignalWindow, StreamError, StreamResult};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Default retention, in samples per channel
pub const DEFAULT_RETAINED_SAMPLES: usize = 450_000;

struct BufferInner {
    channels: Vec<VecDeque<f32>>,
    total_appended: u64,
}

/// Continuously growing store of multi-channel samples.
///
/// Retention is bounded: once a channel holds `retained_samples`, appending
/// evicts the oldest samples. Shape (channel count, sampling rate) is fixed
/// at construction.
pub struct AcquisitionBuffer {
    inner: RwLock<BufferInner>,
    channel_count: usize,
    sampling_rate: f32,
    retained_samples: usize,
}

impl AcquisitionBuffer {
    pub fn new(channel_count: usize, sampling_rate: f32) -> StreamResult<Self> {
        Self::with_retention(channel_count, sampling_rate, DEFAULT_RETAINED_SAMPLES)
    }

    pub fn with_retention(
        channel_count: usize,
        sampling_rate: f32,
        retained_samples: usize,
    ) -> StreamResult<Self> {
        if channel_count == 0 {
            return Err(StreamError::DeviceError {
                message: "buffer needs at least one channel".to_string(),
            });
        }
        if sampling_rate <= 0.0 {
            return Err(StreamError::DeviceError {
                message: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }
        if retained_samples == 0 {
            return Err(StreamError::DeviceError {
                message: "retention must be at least one sample".to_string(),
            });
        }

        Ok(AcquisitionBuffer {
            inner: RwLock::new(BufferInner {
                channels: vec![VecDeque::new(); channel_count],
                total_appended: 0,
            }),
            channel_count,
            sampling_rate,
            retained_samples,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    /// Monotonic count of samples per channel ever appended
    pub fn total_appended(&self) -> u64 {
        self.inner.read().expect("buffer lock poisoned").total_appended
    }

    /// Device-side: append one chunk of per-channel rows.
    ///
    /// The chunk shape must match the buffer shape.
    pub fn append(&self, chunk: &SignalWindow) -> StreamResult<()> {
        if chunk.channel_count() != self.channel_count {
            return Err(StreamError::DeviceError {
                message: format!(
                    "chunk has {} channels, buffer has {}",
                    chunk.channel_count(),
                    self.channel_count
                ),
            });
        }
        if chunk.sampling_rate() != self.sampling_rate {
            return Err(StreamError::DeviceError {
                message: format!(
                    "chunk sampled at {} Hz, buffer at {} Hz",
                    chunk.sampling_rate(),
                    self.sampling_rate
                ),
            });
        }

        let mut inner = self.inner.write().expect("buffer lock poisoned");
        for (store, row) in inner.channels.iter_mut().zip(chunk.channels()) {
            store.extend(row.iter().copied());
            while store.len() > self.retained_samples {
                store.pop_front();
            }
        }
        inner.total_appended += chunk.samples_per_channel() as u64;
        Ok(())
    }

    /// The n most recent samples per channel, oldest first.
    ///
    /// A short result is data, not an error: if fewer than n samples have
    /// arrived, whatever exists is returned. Callers that need a minimum
    /// window length discard short results themselves.
    pub fn latest(&self, n: usize) -> SignalWindow {
        let inner = self.inner.read().expect("buffer lock poisoned");
        let rows: Vec<Vec<f32>> = inner
            .channels
            .iter()
            .map(|store| {
                let skip = store.len().saturating_sub(n);
                store.iter().skip(skip).copied().collect()
            })
            .collect();
        drop(inner);

        // Shape invariants hold by construction, so this cannot fail
        SignalWindow::new(rows, self.sampling_rate)
            .expect("buffer rows are rectangular by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(values: &[f32], channels: usize, rate: f32) -> SignalWindow {
        SignalWindow::new(vec![values.to_vec(); channels], rate).unwrap()
    }

    #[test]
    fn test_latest_returns_most_recent_oldest_first() {
        let buffer = AcquisitionBuffer::new(1, 200.0).unwrap();
        let values: Vec<f32> = (0..100).map(|i| i as f32).collect();
        buffer.append(&chunk(&values, 1, 200.0)).unwrap();

        let window = buffer.latest(10);
        let row = window.channel(0).unwrap();
        assert_eq!(row.len(), 10);
        assert_eq!(row[0], 90.0);
        assert_eq!(row[9], 99.0);
    }

    #[test]
    fn test_short_window_is_data() {
        let buffer = AcquisitionBuffer::new(2, 200.0).unwrap();
        buffer.append(&chunk(&[1.0, 2.0, 3.0], 2, 200.0)).unwrap();

        let window = buffer.latest(100);
        assert_eq!(window.samples_per_channel(), 3);
        assert_eq!(window.channel_count(), 2);
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let buffer = AcquisitionBuffer::with_retention(1, 200.0, 50).unwrap();
        let values: Vec<f32> = (0..80).map(|i| i as f32).collect();
        buffer.append(&chunk(&values, 1, 200.0)).unwrap();

        let window = buffer.latest(100);
        let row = window.channel(0).unwrap();
        assert_eq!(row.len(), 50);
        assert_eq!(row[0], 30.0);
        assert_eq!(*row.last().unwrap(), 79.0);
        assert_eq!(buffer.total_appended(), 80);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let buffer = AcquisitionBuffer::new(2, 200.0).unwrap();
        assert!(buffer.append(&chunk(&[1.0], 3, 200.0)).is_err());
        assert!(buffer.append(&chunk(&[1.0], 2, 250.0)).is_err());
    }

    #[test]
    fn test_concurrent_reads_while_appending() {
        use std::sync::Arc;

        let buffer = Arc::new(AcquisitionBuffer::new(1, 200.0).unwrap());
        let writer = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let values = vec![i as f32; 10];
                    buffer.append(&chunk(&values, 1, 200.0)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = buffer.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let window = buffer.latest(64);
                        assert!(window.samples_per_channel() <= 64);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(buffer.total_appended(), 2000);
    }
}
