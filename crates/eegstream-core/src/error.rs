//! Error handling for the eegstream workspace
//!
//! One error enum shared by the acquisition, processing and engine crates.
//! Recoverability is a caller decision: the tick loop treats
//! `InsufficientSamples` as skip-and-retry, everything else as fatal.

use std::fmt;

/// Result type alias for eegstream operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Error type for all eegstream operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StreamError {
    /// Window too short for the requested filter order or spectral estimate
    InsufficientSamples {
        /// Minimum samples the operation needs
        required: usize,
        /// Samples actually available
        available: usize,
    },

    /// Frequency band outside what the sampling rate can represent
    InvalidBandRange {
        /// Name of the offending band
        band: String,
        /// Band lower edge in Hz
        low_hz: f32,
        /// Band upper edge in Hz
        high_hz: f32,
        /// Nyquist frequency of the signal in Hz
        nyquist_hz: f32,
    },

    /// Result buffer capacity computed as zero from window/tick settings
    InvalidBufferCapacity {
        /// Configured result window in seconds
        result_window_seconds: f32,
        /// Configured tick interval in seconds
        tick_interval_seconds: f32,
    },

    /// Inference model used before prepare() or after release()
    NotPrepared,

    /// Inference model prepared twice without an intervening release()
    AlreadyPrepared,

    /// Invalid engine or filter configuration
    InvalidSignalConfig {
        /// Description of the configuration error
        message: String,
    },

    /// Malformed signal data (ragged channels, bad channel index, ...)
    InvalidSignalData {
        /// Description of the data error
        reason: String,
    },

    /// Acquisition device error
    DeviceError {
        /// Device-related error description
        message: String,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::InsufficientSamples { required, available } => {
                write!(f, "Insufficient samples: required {}, available {}",
                       required, available)
            }
            StreamError::InvalidBandRange { band, low_hz, high_hz, nyquist_hz } => {
                write!(f, "Band '{}' [{}, {}) Hz outside [0, {}) Hz",
                       band, low_hz, high_hz, nyquist_hz)
            }
            StreamError::InvalidBufferCapacity { result_window_seconds, tick_interval_seconds } => {
                write!(f, "Result buffer capacity is zero: window {}s / tick {}s",
                       result_window_seconds, tick_interval_seconds)
            }
            StreamError::NotPrepared => {
                write!(f, "Inference model is not prepared")
            }
            StreamError::AlreadyPrepared => {
                write!(f, "Inference model is already prepared")
            }
            StreamError::InvalidSignalConfig { message } => {
                write!(f, "Invalid signal configuration: {}", message)
            }
            StreamError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            StreamError::DeviceError { message } => {
                write!(f, "Device error: {}", message)
            }
        }
    }
}

impl std::error::Error for StreamError {}
