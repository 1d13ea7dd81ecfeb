//! Configuration for the streaming analytics engine
//!
//! Every option is fixed for the lifetime of one engine instance; changing
//! any of them means constructing a new engine.

use crate::bands::BandDefinition;
use eegstream_core::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};

/// Trend-removal mode applied before filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetrendMode {
    /// Remove the window mean
    Constant,
    /// Remove a least-squares linear trend
    Linear,
}

/// A frequency interval in Hz, used for the band-pass range and notch bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyRange {
    pub fn new(low_hz: f32, high_hz: f32) -> Self {
        FrequencyRange { low_hz, high_hz }
    }
}

/// How a tick's conditioned window is turned into scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoreMode {
    /// Quotient of two configured band powers on one channel
    BandRatio {
        /// Absolute channel index the ratio is computed on
        channel: usize,
        /// Name of the numerator band
        numerator: String,
        /// Name of the denominator band
        denominator: String,
    },
    /// Channel-averaged band powers fed to the inference model
    Classifier,
}

/// Full configuration surface of one analytics engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Analysis window length in seconds (W = window * sampling rate)
    pub window_size_seconds: f32,
    /// Tick period in seconds
    pub tick_interval_seconds: f32,
    /// Rolling duration the result buffer covers, in seconds
    pub result_window_seconds: f32,
    /// Bands available to band-power features and ratios
    pub bands: Vec<BandDefinition>,
    /// Trend removal mode
    pub detrend: DetrendMode,
    /// Band-pass range of the conditioning cascade
    pub bandpass: FrequencyRange,
    /// Butterworth order for band-pass and notch passes
    pub filter_order: usize,
    /// Interference bands removed after the band-pass
    pub notch_bands: Vec<FrequencyRange>,
    /// Channels carrying EEG, fixed by device configuration at setup
    pub channel_subset: Vec<usize>,
    /// Scoring mode for the tick pipeline
    pub score_mode: ScoreMode,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: 10.0,
            tick_interval_seconds: 0.05,
            result_window_seconds: 25.0,
            bands: vec![BandDefinition::alpha(), BandDefinition::beta()],
            detrend: DetrendMode::Linear,
            bandpass: FrequencyRange::new(3.0, 45.0),
            filter_order: 2,
            // Mains hum at both line frequencies
            notch_bands: vec![
                FrequencyRange::new(48.0, 52.0),
                FrequencyRange::new(58.0, 62.0),
            ],
            channel_subset: vec![0, 1, 2, 3],
            score_mode: ScoreMode::BandRatio {
                channel: 1,
                numerator: "alpha".to_string(),
                denominator: "beta".to_string(),
            },
        }
    }
}

impl AnalyticsConfig {
    /// Validate everything that does not depend on the device sampling rate.
    ///
    /// Band-vs-Nyquist checks happen at computation time so a configuration
    /// stays portable across devices.
    pub fn validate(&self) -> StreamResult<()> {
        if self.window_size_seconds <= 0.0 {
            return Err(config_error(format!(
                "window_size_seconds must be positive, got {}",
                self.window_size_seconds
            )));
        }
        if self.tick_interval_seconds <= 0.0 {
            return Err(config_error(format!(
                "tick_interval_seconds must be positive, got {}",
                self.tick_interval_seconds
            )));
        }
        if self.result_window_seconds <= 0.0 {
            return Err(config_error(format!(
                "result_window_seconds must be positive, got {}",
                self.result_window_seconds
            )));
        }
        if self.filter_order == 0 {
            return Err(config_error("filter_order must be at least 1".to_string()));
        }
        if self.bands.is_empty() {
            return Err(config_error("at least one band must be configured".to_string()));
        }
        for band in &self.bands {
            // Deserialized configs bypass BandDefinition::new
            if band.low_hz < 0.0 || band.low_hz >= band.high_hz {
                return Err(config_error(format!(
                    "band '{}' requires 0 <= low < high, got [{}, {})",
                    band.name, band.low_hz, band.high_hz
                )));
            }
        }
        if self.bandpass.low_hz <= 0.0 || self.bandpass.low_hz >= self.bandpass.high_hz {
            return Err(config_error(format!(
                "bandpass requires 0 < low < high, got [{}, {}]",
                self.bandpass.low_hz, self.bandpass.high_hz
            )));
        }
        for notch in &self.notch_bands {
            if notch.low_hz <= 0.0 || notch.low_hz >= notch.high_hz {
                return Err(config_error(format!(
                    "notch band requires 0 < low < high, got [{}, {}]",
                    notch.low_hz, notch.high_hz
                )));
            }
        }
        if self.channel_subset.is_empty() {
            return Err(config_error("channel_subset must not be empty".to_string()));
        }
        if let ScoreMode::BandRatio { numerator, denominator, .. } = &self.score_mode {
            for name in [numerator, denominator] {
                if !self.bands.iter().any(|b| &b.name == name) {
                    return Err(config_error(format!(
                        "ratio band '{}' is not among the configured bands",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of samples in one analysis window at the given sampling rate
    pub fn window_samples(&self, sampling_rate: f32) -> usize {
        (self.window_size_seconds * sampling_rate) as usize
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> StreamResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StreamError::InvalidSignalConfig {
            message: format!("failed to serialize configuration: {}", e),
        })
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> StreamResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StreamError::InvalidSignalConfig {
                message: format!("failed to parse configuration: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }
}

fn config_error(message: String) -> StreamError {
    StreamError::InvalidSignalConfig { message }
}
