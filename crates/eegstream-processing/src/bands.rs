//! Frequency band definitions for spectral analysis

use eegstream_core::{StreamError, StreamResult};
use serde::{Deserialize, Serialize};

/// A named half-open frequency interval [low_hz, high_hz).
///
/// Bands may overlap; disjointness is not enforced anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub name: String,
    pub low_hz: f32,
    pub high_hz: f32,
}

impl BandDefinition {
    /// Create a band, validating the interval shape.
    ///
    /// Whether the band fits under the device Nyquist frequency is checked
    /// at computation time, not here.
    pub fn new(name: &str, low_hz: f32, high_hz: f32) -> StreamResult<Self> {
        if low_hz < 0.0 || low_hz >= high_hz {
            return Err(StreamError::InvalidSignalConfig {
                message: format!(
                    "band '{}' requires 0 <= low < high, got [{}, {})",
                    name, low_hz, high_hz
                ),
            });
        }
        Ok(BandDefinition {
            name: name.to_string(),
            low_hz,
            high_hz,
        })
    }

    /// True if the frequency falls inside [low_hz, high_hz)
    pub fn contains(&self, hz: f32) -> bool {
        hz >= self.low_hz && hz < self.high_hz
    }

    /// Alpha rhythm band
    pub fn alpha() -> Self {
        BandDefinition { name: "alpha".to_string(), low_hz: 7.0, high_hz: 13.0 }
    }

    /// Beta rhythm band
    pub fn beta() -> Self {
        BandDefinition { name: "beta".to_string(), low_hz: 14.0, high_hz: 30.0 }
    }

    /// The standard five-band EEG set used for classifier features
    pub fn eeg_bands() -> Vec<BandDefinition> {
        vec![
            BandDefinition { name: "delta".to_string(), low_hz: 1.5, high_hz: 4.0 },
            BandDefinition { name: "theta".to_string(), low_hz: 4.0, high_hz: 8.0 },
            BandDefinition { name: "alpha".to_string(), low_hz: 7.5, high_hz: 13.0 },
            BandDefinition { name: "beta".to_string(), low_hz: 13.0, high_hz: 30.0 },
            BandDefinition { name: "gamma".to_string(), low_hz: 30.0, high_hz: 45.0 },
        ]
    }
}
