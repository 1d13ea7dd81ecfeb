//! Welch spectral estimation and band-power features
//!
//! The PSD estimator uses overlap-averaged Hann-tapered periodograms with a
//! power-of-two segment length. Overlap averaging trades frequency
//! resolution for variance, which is the right trade for short, noisy
//! biosignal windows.

use crate::bands::BandDefinition;
use eegstream_core::{SignalWindow, StreamError, StreamResult};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Shortest window the estimator accepts
const MIN_WELCH_SAMPLES: usize = 16;

/// One-sided power spectral density estimate
#[derive(Debug, Clone)]
pub struct Psd {
    values: Vec<f32>,
    freq_step: f32,
}

impl Psd {
    /// Density values, bin k at frequency `k * freq_step()`
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Frequency resolution in Hz
    pub fn freq_step(&self) -> f32 {
        self.freq_step
    }

    /// Highest representable frequency
    pub fn nyquist_hz(&self) -> f32 {
        (self.values.len() - 1) as f32 * self.freq_step
    }

    /// Integrate the density over a band's [low, high) interval.
    ///
    /// The band must lie inside [0, Nyquist); this is checked here rather
    /// than at configuration time so configurations stay device-agnostic.
    pub fn band_power(&self, band: &BandDefinition) -> StreamResult<f32> {
        let nyquist = self.nyquist_hz();
        if band.low_hz < 0.0 || band.low_hz >= band.high_hz || band.high_hz >= nyquist {
            return Err(StreamError::InvalidBandRange {
                band: band.name.clone(),
                low_hz: band.low_hz,
                high_hz: band.high_hz,
                nyquist_hz: nyquist,
            });
        }

        let power = self
            .values
            .iter()
            .enumerate()
            .filter(|(k, _)| band.contains(*k as f32 * self.freq_step))
            .map(|(_, &p)| p)
            .sum::<f32>()
            * self.freq_step;

        Ok(power)
    }
}

fn hann_window(n: usize) -> Vec<f32> {
    let nm1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / nm1).cos())
        .collect()
}

fn largest_power_of_two_leq(n: usize) -> usize {
    debug_assert!(n >= 1);
    let mut p = 1usize;
    while p * 2 <= n {
        p *= 2;
    }
    p
}

/// Welch PSD estimate of one channel's samples.
///
/// Segment length is the largest power of two not exceeding the sampling
/// rate (clamped to the data length), with 50% segment overlap.
pub fn welch_psd(data: &[f32], sampling_rate: f32) -> StreamResult<Psd> {
    if data.len() < MIN_WELCH_SAMPLES {
        return Err(StreamError::InsufficientSamples {
            required: MIN_WELCH_SAMPLES,
            available: data.len(),
        });
    }
    if sampling_rate <= 0.0 {
        return Err(StreamError::InvalidSignalConfig {
            message: format!("sampling rate must be positive, got {}", sampling_rate),
        });
    }

    let nperseg = largest_power_of_two_leq(data.len().min(sampling_rate as usize).max(MIN_WELCH_SAMPLES));
    let hop = nperseg / 2;
    let n_bins = nperseg / 2 + 1;

    let window = hann_window(nperseg);
    let window_power: f32 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(nperseg);

    let mut accumulated = vec![0.0f32; n_bins];
    let mut segments = 0usize;
    let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(nperseg);

    let mut start = 0usize;
    while start + nperseg <= data.len() {
        buffer.clear();
        buffer.extend(
            data[start..start + nperseg]
                .iter()
                .zip(window.iter())
                .map(|(&x, &w)| Complex::new(x * w, 0.0)),
        );
        fft.process(&mut buffer);

        for (k, bin) in buffer[..n_bins].iter().enumerate() {
            let mut p = bin.norm_sqr() / (sampling_rate * window_power);
            // One-sided doubling, except DC and Nyquist
            if k != 0 && k != nperseg / 2 {
                p *= 2.0;
            }
            accumulated[k] += p;
        }

        segments += 1;
        start += hop;
    }

    for value in accumulated.iter_mut() {
        *value /= segments as f32;
    }

    Ok(Psd {
        values: accumulated,
        freq_step: sampling_rate / nperseg as f32,
    })
}

/// Per-band features assembled from one window
#[derive(Debug, Clone)]
pub struct BandPowerFeatures {
    /// Per band, averaged across the channel subset, in band order
    pub band_averages: Vec<f32>,
    /// Channel-major detail: `per_channel[c][b]`
    pub per_channel: Vec<Vec<f32>>,
}

/// Computes band powers, ratios and classifier feature vectors
pub struct SpectralFeatureExtractor {
    bands: Vec<BandDefinition>,
    sampling_rate: f32,
}

impl SpectralFeatureExtractor {
    pub fn new(bands: Vec<BandDefinition>, sampling_rate: f32) -> StreamResult<Self> {
        if bands.is_empty() {
            return Err(StreamError::InvalidSignalConfig {
                message: "at least one band must be configured".to_string(),
            });
        }
        if sampling_rate <= 0.0 {
            return Err(StreamError::InvalidSignalConfig {
                message: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }
        Ok(SpectralFeatureExtractor { bands, sampling_rate })
    }

    /// Configured bands, in feature order
    pub fn bands(&self) -> &[BandDefinition] {
        &self.bands
    }

    /// Scalar power of each configured band for one channel
    pub fn band_powers(&self, data: &[f32]) -> StreamResult<Vec<f32>> {
        let psd = welch_psd(data, self.sampling_rate)?;
        self.bands.iter().map(|band| psd.band_power(band)).collect()
    }

    /// Quotient of two configured band powers on one channel
    pub fn power_ratio(
        &self,
        data: &[f32],
        numerator: &str,
        denominator: &str,
    ) -> StreamResult<f32> {
        let num_band = self.find_band(numerator)?;
        let den_band = self.find_band(denominator)?;

        let psd = welch_psd(data, self.sampling_rate)?;
        let num = psd.band_power(num_band)?;
        let den = psd.band_power(den_band)?;

        if den <= 0.0 {
            return Err(StreamError::InvalidSignalData {
                reason: format!("denominator band '{}' has zero power", denominator),
            });
        }
        Ok(num / den)
    }

    /// Channel-averaged band powers over a channel subset, plus the
    /// per-channel detail matrix
    pub fn feature_vector(
        &self,
        window: &SignalWindow,
        channel_subset: &[usize],
    ) -> StreamResult<BandPowerFeatures> {
        if channel_subset.is_empty() {
            return Err(StreamError::InvalidSignalConfig {
                message: "channel subset must not be empty".to_string(),
            });
        }

        let mut per_channel = Vec::with_capacity(channel_subset.len());
        for &channel in channel_subset {
            let powers = self.band_powers(window.channel(channel)?)?;
            per_channel.push(powers);
        }

        let mut band_averages = vec![0.0f32; self.bands.len()];
        for powers in &per_channel {
            for (avg, &p) in band_averages.iter_mut().zip(powers.iter()) {
                *avg += p;
            }
        }
        for avg in band_averages.iter_mut() {
            *avg /= channel_subset.len() as f32;
        }

        Ok(BandPowerFeatures { band_averages, per_channel })
    }

    fn find_band(&self, name: &str) -> StreamResult<&BandDefinition> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| StreamError::InvalidSignalConfig {
                message: format!("band '{}' is not among the configured bands", name),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, sampling_rate: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sampling_rate).sin()
            })
            .collect()
    }

    #[test]
    fn test_welch_single_tone_power() {
        // Unit sine has total power 0.5; leakage stays near the tone
        let data = sine(10.0, 1.0, 200.0, 2000);
        let psd = welch_psd(&data, 200.0).unwrap();

        let alpha = psd.band_power(&BandDefinition::alpha()).unwrap();
        assert!(alpha > 0.3 && alpha < 0.7, "alpha power {}", alpha);
    }

    #[test]
    fn test_single_tone_band_monotonicity() {
        // Tone inside alpha, disjoint beta band sees only leakage
        let data = sine(10.0, 1.0, 200.0, 2000);
        let psd = welch_psd(&data, 200.0).unwrap();

        let alpha = psd.band_power(&BandDefinition::alpha()).unwrap();
        let beta = psd.band_power(&BandDefinition::beta()).unwrap();
        assert!(alpha > 10.0 * beta, "alpha {} not >> beta {}", alpha, beta);
    }

    #[test]
    fn test_band_beyond_nyquist_rejected() {
        let data = sine(10.0, 1.0, 200.0, 2000);
        let psd = welch_psd(&data, 200.0).unwrap();

        let band = BandDefinition::new("wide", 30.0, 120.0).unwrap();
        assert!(matches!(
            psd.band_power(&band),
            Err(StreamError::InvalidBandRange { .. })
        ));
    }

    #[test]
    fn test_short_window_rejected() {
        let data = vec![0.0f32; 8];
        assert!(matches!(
            welch_psd(&data, 200.0),
            Err(StreamError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_equal_tones_ratio_near_one() {
        let alpha_tone = sine(10.0, 1.0, 200.0, 2000);
        let beta_tone = sine(20.0, 1.0, 200.0, 2000);
        let data: Vec<f32> = alpha_tone
            .iter()
            .zip(beta_tone.iter())
            .map(|(a, b)| a + b)
            .collect();

        let extractor = SpectralFeatureExtractor::new(
            vec![BandDefinition::alpha(), BandDefinition::beta()],
            200.0,
        )
        .unwrap();

        let ratio = extractor.power_ratio(&data, "alpha", "beta").unwrap();
        assert!(ratio > 0.7 && ratio < 1.4, "ratio {}", ratio);
    }

    #[test]
    fn test_feature_vector_shape() {
        let rows = vec![
            sine(10.0, 1.0, 200.0, 1000),
            sine(20.0, 1.0, 200.0, 1000),
        ];
        let window = SignalWindow::new(rows, 200.0).unwrap();

        let extractor =
            SpectralFeatureExtractor::new(BandDefinition::eeg_bands(), 200.0).unwrap();
        let features = extractor.feature_vector(&window, &[0, 1]).unwrap();

        assert_eq!(features.band_averages.len(), 5);
        assert_eq!(features.per_channel.len(), 2);
        assert_eq!(features.per_channel[0].len(), 5);

        // The averages really are channel averages
        for (b, avg) in features.band_averages.iter().enumerate() {
            let expected = (features.per_channel[0][b] + features.per_channel[1][b]) / 2.0;
            assert!((avg - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unknown_ratio_band() {
        let extractor = SpectralFeatureExtractor::new(
            vec![BandDefinition::alpha(), BandDefinition::beta()],
            200.0,
        )
        .unwrap();
        let data = sine(10.0, 1.0, 200.0, 1000);
        assert!(extractor.power_ratio(&data, "alpha", "gamma").is_err());
    }
}
