//! SignalWindow: container for one analysis window of multi-channel samples

use crate::error::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One contiguous slice of the most recent samples across all channels,
/// channel-major: `channels[c][i]` is sample i (oldest first) of channel c.
#[derive(Debug, Clone)]
pub struct SignalWindow {
    /// Unique identifier for this window
    pub id: Uuid,
    /// Per-channel sample rows, all the same length
    channels: Vec<Vec<f32>>,
    /// Sampling rate in Hz
    sampling_rate: f32,
}

impl SignalWindow {
    /// Create a new window from per-channel rows
    pub fn new(channels: Vec<Vec<f32>>, sampling_rate: f32) -> StreamResult<Self> {
        if sampling_rate <= 0.0 {
            return Err(StreamError::InvalidSignalConfig {
                message: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }

        if let Some(first) = channels.first() {
            let expected = first.len();
            if channels.iter().any(|ch| ch.len() != expected) {
                return Err(StreamError::InvalidSignalData {
                    reason: "channel rows have unequal lengths".to_string(),
                });
            }
        }

        Ok(SignalWindow {
            id: Uuid::new_v4(),
            channels,
            sampling_rate,
        })
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map_or(0, |ch| ch.len())
    }

    /// True if the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples_per_channel() == 0
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    /// Window duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples_per_channel() as f32 / self.sampling_rate
    }

    /// Borrow one channel's samples
    pub fn channel(&self, channel_index: usize) -> StreamResult<&[f32]> {
        self.channels
            .get(channel_index)
            .map(Vec::as_slice)
            .ok_or_else(|| StreamError::InvalidSignalData {
                reason: format!(
                    "channel index {} out of bounds ({} channels)",
                    channel_index,
                    self.channels.len()
                ),
            })
    }

    /// Borrow all channel rows
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the window and take ownership of the channel rows
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Get time vector for plotting
    pub fn time_vector(&self) -> Vec<f32> {
        let dt = 1.0 / self.sampling_rate;
        (0..self.samples_per_channel())
            .map(|i| i as f32 * dt)
            .collect()
    }

    /// Calculate basic statistics for a channel
    pub fn channel_stats(&self, channel_index: usize) -> StreamResult<ChannelStats> {
        let data = self.channel(channel_index)?;
        Ok(ChannelStats::calculate(data))
    }
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    pub rms: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub peak_to_peak: f32,
}

impl ChannelStats {
    pub fn calculate(data: &[f32]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f32;
        let mean = data.iter().sum::<f32>() / n;
        let rms = (data.iter().map(|x| x * x).sum::<f32>() / n).sqrt();

        let variance = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f32>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_creation() {
        let window = SignalWindow::new(vec![vec![0.0; 1000]], 200.0).unwrap();

        assert_eq!(window.channel_count(), 1);
        assert_eq!(window.samples_per_channel(), 1000);
        assert_eq!(window.duration(), 5.0);
    }

    #[test]
    fn test_multichannel_access() {
        let ch0: Vec<f32> = (0..500).map(|i| i as f32).collect();
        let ch1: Vec<f32> = (0..500).map(|i| -(i as f32)).collect();
        let window = SignalWindow::new(vec![ch0, ch1], 200.0).unwrap();

        assert_eq!(window.channel_count(), 2);
        assert_eq!(window.channel(0).unwrap()[3], 3.0);
        assert_eq!(window.channel(1).unwrap()[3], -3.0);
        assert!(window.channel(2).is_err());
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result = SignalWindow::new(vec![vec![0.0; 10], vec![0.0; 9]], 200.0);
        assert!(matches!(result, Err(StreamError::InvalidSignalData { .. })));
    }

    #[test]
    fn test_nonpositive_rate_rejected() {
        let result = SignalWindow::new(vec![vec![0.0; 10]], 0.0);
        assert!(matches!(result, Err(StreamError::InvalidSignalConfig { .. })));
    }

    #[test]
    fn test_channel_stats() {
        let data: Vec<f32> = (0..1000)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 100.0).sin())
            .collect();
        let stats = ChannelStats::calculate(&data);

        assert!(stats.mean.abs() < 0.01);
        assert!((stats.rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!((stats.peak_to_peak - 2.0).abs() < 0.01);
    }
}
