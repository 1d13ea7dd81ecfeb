//! EEGStream-Processing: window conditioning and spectral features
//!
//! Deterministic signal conditioning (detrend, zero-phase band-pass, notch
//! passes), Welch band-power estimation, and the inference model seam.

pub mod bands;
pub mod cascade;
pub mod config;
pub mod detrend;
pub mod inference;
pub mod spectral;

pub use bands::BandDefinition;
pub use cascade::FilterCascade;
pub use config::{AnalyticsConfig, DetrendMode, FrequencyRange, ScoreMode};
pub use detrend::detrend;
pub use inference::{InferenceAdapter, InferenceModel, LogisticModel};
pub use spectral::{welch_psd, BandPowerFeatures, Psd, SpectralFeatureExtractor};
