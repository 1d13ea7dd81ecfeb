//! Synthetic EEG generator with rhythm, noise and interference components

use eegstream_core::{SignalWindow, StreamError, StreamResult};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// One oscillatory component of the synthetic signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RhythmComponent {
    /// Oscillation frequency in Hz
    pub frequency: f32,
    /// Peak amplitude in microvolts
    pub amplitude: f32,
}

/// Noise configuration for realistic EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f32,
    /// Baseline wander amplitude
    pub baseline_wander: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 2.0,
            baseline_wander: 1.0,
        }
    }
}

/// Configuration for EEG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EegConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f32,
    /// Number of channels to simulate
    pub channel_count: usize,
    /// Rhythm components mixed into every channel
    pub rhythms: Vec<RhythmComponent>,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Power line interference: frequency and amplitude
    pub powerline: Option<RhythmComponent>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 200.0,
            channel_count: 4,
            rhythms: vec![
                RhythmComponent { frequency: 10.0, amplitude: 20.0 },
                RhythmComponent { frequency: 20.0, amplitude: 10.0 },
            ],
            noise: NoiseConfig::default(),
            powerline: Some(RhythmComponent { frequency: 50.0, amplitude: 5.0 }),
            seed: None,
        }
    }
}

/// Phase-continuous EEG signal simulator
pub struct EegSimulator {
    config: EegConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f32>,
    time_offset: f32,
}

impl EegSimulator {
    pub fn new(config: EegConfig) -> StreamResult<Self> {
        if config.sampling_rate <= 0.0 {
            return Err(StreamError::DeviceError {
                message: format!(
                    "sampling rate must be positive, got {}",
                    config.sampling_rate
                ),
            });
        }
        if config.channel_count == 0 {
            return Err(StreamError::DeviceError {
                message: "channel count must be at least 1".to_string(),
            });
        }

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| {
            StreamError::DeviceError {
                message: format!("failed to create noise distribution: {}", e),
            }
        })?;

        Ok(EegSimulator {
            config,
            rng,
            normal_dist,
            time_offset: 0.0,
        })
    }

    pub fn config(&self) -> &EegConfig {
        &self.config
    }

    /// Generate one chunk; consecutive chunks are phase-continuous
    pub fn generate_chunk(&mut self, duration: f32) -> StreamResult<SignalWindow> {
        let samples_per_channel = (duration * self.config.sampling_rate) as usize;
        let dt = 1.0 / self.config.sampling_rate;

        let mut rows = Vec::with_capacity(self.config.channel_count);
        for channel_idx in 0..self.config.channel_count {
            // Slight per-channel amplitude variation, like real montages
            let channel_gain = 1.0 + 0.05 * channel_idx as f32;
            let mut row = Vec::with_capacity(samples_per_channel);

            for sample_idx in 0..samples_per_channel {
                let time = self.time_offset + sample_idx as f32 * dt;
                let mut value = 0.0f32;

                for rhythm in &self.config.rhythms {
                    value += channel_gain
                        * rhythm.amplitude
                        * (2.0 * std::f32::consts::PI * rhythm.frequency * time).sin();
                }

                if let Some(powerline) = &self.config.powerline {
                    value += powerline.amplitude
                        * (2.0 * std::f32::consts::PI * powerline.frequency * time).sin();
                }

                // Slow drift plus broadband noise
                value += self.config.noise.baseline_wander
                    * (2.0 * std::f32::consts::PI * 0.1 * time).sin();
                value += self.normal_dist.sample(&mut self.rng);

                row.push(value);
            }
            rows.push(row);
        }

        self.time_offset += samples_per_channel as f32 * dt;

        SignalWindow::new(rows, self.config.sampling_rate)
    }

    /// Reset time offset (useful for restarting simulation)
    pub fn reset_time(&mut self) {
        self.time_offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_shape() {
        let mut simulator = EegSimulator::new(EegConfig::default()).unwrap();
        let chunk = simulator.generate_chunk(0.5).unwrap();

        assert_eq!(chunk.channel_count(), 4);
        assert_eq!(chunk.samples_per_channel(), 100);
        assert_eq!(chunk.sampling_rate(), 200.0);
    }

    #[test]
    fn test_seed_determinism() {
        let config = EegConfig {
            seed: Some(7),
            ..EegConfig::default()
        };
        let mut a = EegSimulator::new(config.clone()).unwrap();
        let mut b = EegSimulator::new(config).unwrap();

        let chunk_a = a.generate_chunk(0.2).unwrap();
        let chunk_b = b.generate_chunk(0.2).unwrap();
        assert_eq!(chunk_a.channel(0).unwrap(), chunk_b.channel(0).unwrap());
    }

    #[test]
    fn test_phase_continuity() {
        // Pure tone, no noise: two chunks must join without a jump
        let config = EegConfig {
            channel_count: 1,
            rhythms: vec![RhythmComponent { frequency: 10.0, amplitude: 1.0 }],
            noise: NoiseConfig { gaussian_std: 0.0, baseline_wander: 0.0 },
            powerline: None,
            seed: Some(1),
            ..EegConfig::default()
        };
        let mut simulator = EegSimulator::new(config).unwrap();

        let first = simulator.generate_chunk(0.1).unwrap();
        let second = simulator.generate_chunk(0.1).unwrap();

        let last = *first.channel(0).unwrap().last().unwrap();
        let next = second.channel(0).unwrap()[0];
        // One sample step of a 10 Hz tone at 200 Hz never jumps more than
        // amplitude * 2*pi*f/fs
        assert!((next - last).abs() < 0.4, "discontinuity {}", (next - last).abs());
    }

    #[test]
    fn test_signal_has_energy() {
        let mut simulator = EegSimulator::new(EegConfig::default()).unwrap();
        let chunk = simulator.generate_chunk(1.0).unwrap();
        let stats = chunk.channel_stats(0).unwrap();
        assert!(stats.std_dev > 1.0);
    }
}
