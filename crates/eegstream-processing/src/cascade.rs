//! Zero-phase signal conditioning cascade
//!
//! Per channel, in fixed order: detrend, Butterworth band-pass, then one
//! pass per configured notch band. Reordering the cascade changes the
//! output; callers get exactly this order.
//!
//! All filters are applied forward-backward (filtfilt), so the conditioned
//! window carries no group delay and later band-power comparisons are not
//! biased by phase smear.

use crate::config::{AnalyticsConfig, DetrendMode, FrequencyRange};
use crate::detrend::detrend;
use eegstream_core::{SignalWindow, StreamError, StreamResult};

/// Single biquad section (2nd order), direct form I
#[derive(Debug, Clone, Copy)]
struct BiquadSection {
    // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadSection {
    /// Run the section across a sample row, state carried locally
    fn run_in_place(&self, data: &mut [f32]) {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for sample in data.iter_mut() {
            let x0 = *sample;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            *sample = y0;
        }
    }
}

/// Quality factors of the second-order sections of a Butterworth filter.
/// `None` marks the extra first-order section of an odd-order design.
fn butterworth_section_qs(order: usize) -> Vec<Option<f32>> {
    let mut qs = Vec::with_capacity(order / 2 + 1);
    for k in 0..order / 2 {
        let theta = std::f32::consts::PI * (2 * k + 1) as f32 / (2 * order) as f32;
        qs.push(Some(1.0 / (2.0 * theta.cos())));
    }
    if order % 2 == 1 {
        qs.push(None);
    }
    qs
}

fn validate_cutoff(cutoff: f32, sampling_rate: f32) -> StreamResult<()> {
    if cutoff <= 0.0 || cutoff >= sampling_rate / 2.0 {
        return Err(StreamError::InvalidSignalConfig {
            message: format!(
                "cutoff {} Hz must lie in (0, {}) Hz",
                cutoff,
                sampling_rate / 2.0
            ),
        });
    }
    Ok(())
}

/// Butterworth low-pass as cascaded biquads via the bilinear transform
fn design_lowpass(cutoff: f32, sampling_rate: f32, order: usize) -> StreamResult<Vec<BiquadSection>> {
    validate_cutoff(cutoff, sampling_rate)?;

    // Pre-warped analog frequency
    let k = (std::f32::consts::PI * cutoff / sampling_rate).tan();
    let k2 = k * k;

    let sections = butterworth_section_qs(order)
        .into_iter()
        .map(|q| match q {
            Some(q) => {
                let norm = 1.0 / (k2 + k / q + 1.0);
                let b0 = k2 * norm;
                BiquadSection {
                    b0,
                    b1: 2.0 * b0,
                    b2: b0,
                    a1: 2.0 * (k2 - 1.0) * norm,
                    a2: (k2 - k / q + 1.0) * norm,
                }
            }
            None => {
                // First-order tail of an odd-order design
                let norm = 1.0 / (k + 1.0);
                BiquadSection {
                    b0: k * norm,
                    b1: k * norm,
                    b2: 0.0,
                    a1: (k - 1.0) * norm,
                    a2: 0.0,
                }
            }
        })
        .collect();

    Ok(sections)
}

/// Butterworth high-pass as cascaded biquads via the bilinear transform
fn design_highpass(cutoff: f32, sampling_rate: f32, order: usize) -> StreamResult<Vec<BiquadSection>> {
    validate_cutoff(cutoff, sampling_rate)?;

    let k = (std::f32::consts::PI * cutoff / sampling_rate).tan();
    let k2 = k * k;

    let sections = butterworth_section_qs(order)
        .into_iter()
        .map(|q| match q {
            Some(q) => {
                let norm = 1.0 / (k2 + k / q + 1.0);
                BiquadSection {
                    b0: norm,
                    b1: -2.0 * norm,
                    b2: norm,
                    a1: 2.0 * (k2 - 1.0) * norm,
                    a2: (k2 - k / q + 1.0) * norm,
                }
            }
            None => {
                let norm = 1.0 / (k + 1.0);
                BiquadSection {
                    b0: norm,
                    b1: -norm,
                    b2: 0.0,
                    a1: (k - 1.0) * norm,
                    a2: 0.0,
                }
            }
        })
        .collect();

    Ok(sections)
}

/// Notch sections for one interference band.
///
/// Center frequency and Q derive from the band edges; `order / 2` identical
/// sections (at least one) approximate higher-order stop bands.
fn design_notch(
    band: &FrequencyRange,
    sampling_rate: f32,
    order: usize,
) -> StreamResult<Vec<BiquadSection>> {
    if band.low_hz <= 0.0 || band.low_hz >= band.high_hz {
        return Err(StreamError::InvalidSignalConfig {
            message: format!(
                "notch band requires 0 < low < high, got [{}, {}]",
                band.low_hz, band.high_hz
            ),
        });
    }
    let center = (band.low_hz + band.high_hz) / 2.0;
    validate_cutoff(band.high_hz, sampling_rate)?;

    let q = center / (band.high_hz - band.low_hz);
    let omega = 2.0 * std::f32::consts::PI * center / sampling_rate;
    let alpha = omega.sin() / (2.0 * q);
    let cos_omega = omega.cos();

    let a0 = 1.0 + alpha;
    let section = BiquadSection {
        b0: 1.0 / a0,
        b1: -2.0 * cos_omega / a0,
        b2: 1.0 / a0,
        a1: -2.0 * cos_omega / a0,
        a2: (1.0 - alpha) / a0,
    };

    Ok(vec![section; (order / 2).max(1)])
}

/// Forward-backward application: no phase shift, squared magnitude response
fn filtfilt(sections: &[BiquadSection], data: &mut [f32]) {
    for section in sections {
        section.run_in_place(data);
    }
    data.reverse();
    for section in sections {
        section.run_in_place(data);
    }
    data.reverse();
}

/// The conditioning cascade for one engine instance.
///
/// Stateless with respect to windows: every `apply` starts from fresh filter
/// state, so identical windows condition identically.
pub struct FilterCascade {
    sampling_rate: f32,
    detrend_mode: DetrendMode,
    // High-pass at the low edge followed by low-pass at the high edge
    bandpass: Vec<BiquadSection>,
    notches: Vec<Vec<BiquadSection>>,
    min_samples: usize,
}

impl FilterCascade {
    /// Build the cascade for a device sampling rate.
    ///
    /// Cutoffs at or beyond Nyquist are configuration errors and fail here,
    /// before the first tick.
    pub fn new(config: &AnalyticsConfig, sampling_rate: f32) -> StreamResult<Self> {
        if sampling_rate <= 0.0 {
            return Err(StreamError::InvalidSignalConfig {
                message: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }
        if config.bandpass.low_hz >= config.bandpass.high_hz {
            return Err(StreamError::InvalidSignalConfig {
                message: format!(
                    "bandpass requires low < high, got [{}, {}]",
                    config.bandpass.low_hz, config.bandpass.high_hz
                ),
            });
        }

        let order = config.filter_order;
        let mut bandpass = design_highpass(config.bandpass.low_hz, sampling_rate, order)?;
        bandpass.extend(design_lowpass(config.bandpass.high_hz, sampling_rate, order)?);

        let notches = config
            .notch_bands
            .iter()
            .map(|band| design_notch(band, sampling_rate, order))
            .collect::<StreamResult<Vec<_>>>()?;

        Ok(FilterCascade {
            sampling_rate,
            detrend_mode: config.detrend,
            bandpass,
            notches,
            // filtfilt needs a few time constants of settling room
            min_samples: 3 * (order + 1),
        })
    }

    /// Minimum window length the configured order can filter
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Condition a window: detrend, band-pass, notch passes, per channel.
    ///
    /// Shape-preserving: output has the same channel count and length.
    pub fn apply(&self, window: &SignalWindow) -> StreamResult<SignalWindow> {
        let available = window.samples_per_channel();
        if available < self.min_samples {
            return Err(StreamError::InsufficientSamples {
                required: self.min_samples,
                available,
            });
        }

        let mut rows = window.channels().to_vec();
        for row in rows.iter_mut() {
            detrend(row, self.detrend_mode);
            filtfilt(&self.bandpass, row);
            for notch in &self.notches {
                filtfilt(notch, row);
            }
        }

        SignalWindow::new(rows, self.sampling_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreMode;
    use crate::bands::BandDefinition;

    fn test_config() -> AnalyticsConfig {
        AnalyticsConfig {
            channel_subset: vec![0],
            score_mode: ScoreMode::BandRatio {
                channel: 0,
                numerator: "alpha".to_string(),
                denominator: "beta".to_string(),
            },
            bands: vec![BandDefinition::alpha(), BandDefinition::beta()],
            ..AnalyticsConfig::default()
        }
    }

    fn sine(freq: f32, sampling_rate: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sampling_rate).sin())
            .collect()
    }

    fn middle_rms(data: &[f32]) -> f32 {
        let quarter = data.len() / 4;
        let mid = &data[quarter..data.len() - quarter];
        (mid.iter().map(|x| x * x).sum::<f32>() / mid.len() as f32).sqrt()
    }

    #[test]
    fn test_shape_preserving() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let window = SignalWindow::new(
            vec![sine(10.0, 200.0, 400), sine(20.0, 200.0, 400)],
            200.0,
        )
        .unwrap();

        let out = cascade.apply(&window).unwrap();
        assert_eq!(out.channel_count(), 2);
        assert_eq!(out.samples_per_channel(), 400);
    }

    #[test]
    fn test_passband_tone_preserved() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let input = sine(10.0, 200.0, 800);
        let window = SignalWindow::new(vec![input.clone()], 200.0).unwrap();

        let out = cascade.apply(&window).unwrap();
        let ratio = middle_rms(out.channel(0).unwrap()) / middle_rms(&input);
        assert!(ratio > 0.85, "passband tone attenuated to {}", ratio);
    }

    #[test]
    fn test_stopband_tone_attenuated() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let input = sine(80.0, 200.0, 800);
        let window = SignalWindow::new(vec![input.clone()], 200.0).unwrap();

        let out = cascade.apply(&window).unwrap();
        let ratio = middle_rms(out.channel(0).unwrap()) / middle_rms(&input);
        assert!(ratio < 0.25, "stopband tone only attenuated to {}", ratio);
    }

    #[test]
    fn test_notch_removes_mains_tone() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let input = sine(50.0, 200.0, 800);
        let window = SignalWindow::new(vec![input.clone()], 200.0).unwrap();

        let out = cascade.apply(&window).unwrap();
        let ratio = middle_rms(out.channel(0).unwrap()) / middle_rms(&input);
        assert!(ratio < 0.1, "mains tone only attenuated to {}", ratio);
    }

    #[test]
    fn test_zero_phase() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let freq = 10.0;
        let input = sine(freq, 200.0, 800);
        let window = SignalWindow::new(vec![input], 200.0).unwrap();

        let out = cascade.apply(&window).unwrap();
        let filtered = out.channel(0).unwrap();

        // Project the middle of the filtered tone onto sine/cosine at the
        // tone frequency; a zero-phase filter leaves the phase untouched
        let omega = 2.0 * std::f32::consts::PI * freq / 200.0;
        let (mut in_phase, mut quadrature) = (0.0f32, 0.0f32);
        for i in 200..600 {
            in_phase += filtered[i] * (omega * i as f32).sin();
            quadrature += filtered[i] * (omega * i as f32).cos();
        }
        let phase = quadrature.atan2(in_phase);
        assert!(phase.abs() < 0.15, "phase shift {} rad", phase);
    }

    #[test]
    fn test_insufficient_samples() {
        let cascade = FilterCascade::new(&test_config(), 200.0).unwrap();
        let window = SignalWindow::new(vec![vec![0.0; 5]], 200.0).unwrap();

        match cascade.apply(&window) {
            Err(StreamError::InsufficientSamples { required, available }) => {
                assert_eq!(required, 9);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientSamples, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_cutoff_beyond_nyquist_rejected() {
        let mut config = test_config();
        config.bandpass = FrequencyRange::new(3.0, 120.0);
        assert!(FilterCascade::new(&config, 200.0).is_err());
    }

    #[test]
    fn test_higher_order_design() {
        let mut config = test_config();
        config.filter_order = 4;
        let cascade = FilterCascade::new(&config, 200.0).unwrap();

        let input = sine(80.0, 200.0, 800);
        let window = SignalWindow::new(vec![input.clone()], 200.0).unwrap();
        let out = cascade.apply(&window).unwrap();

        // Fourth order rolls off harder than second
        let ratio = middle_rms(out.channel(0).unwrap()) / middle_rms(&input);
        assert!(ratio < 0.05, "order-4 stopband only attenuated to {}", ratio);
    }
}
