//! Tick-driven analytics engine
//!
//! One engine owns one result buffer and at most one inference adapter, and
//! is the only writer of both. Each tick runs the full pipeline
//! synchronously: latest window, conditioning cascade, spectral features,
//! optional inference, result buffer append, sink forward. Cancellation is
//! cooperative and takes effect at tick boundaries.

use crate::result_buffer::SlidingResultBuffer;
use crate::sink::{DisplaySink, TickUpdate};
use eegstream_acquisition::AcquisitionBuffer;
use eegstream_core::{StreamError, StreamResult};
use eegstream_processing::{
    AnalyticsConfig, FilterCascade, InferenceAdapter, InferenceModel, ScoreMode,
    SpectralFeatureExtractor,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Engine lifecycle: Stopped is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopped,
}

/// Stop handle for a running engine; stop() is idempotent and takes effect
/// at the next tick boundary
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shutdown: watch::Sender<bool>,
}

impl EngineHandle {
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// The streaming window analytics engine
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    buffer: Arc<AcquisitionBuffer>,
    cascade: FilterCascade,
    extractor: SpectralFeatureExtractor,
    adapter: Option<InferenceAdapter>,
    results: SlidingResultBuffer,
    sink: Box<dyn DisplaySink>,
    window_samples: usize,
    state: EngineState,
    shutdown: watch::Sender<bool>,
    ticks: u64,
    skipped: u64,
}

impl AnalyticsEngine {
    /// Build an engine over an acquisition buffer.
    ///
    /// All configuration problems surface here, before the first tick:
    /// invalid ranges, zero result capacity, channel indexes the device
    /// does not have.
    pub fn new(
        config: AnalyticsConfig,
        buffer: Arc<AcquisitionBuffer>,
        sink: Box<dyn DisplaySink>,
    ) -> StreamResult<Self> {
        config.validate()?;

        let sampling_rate = buffer.sampling_rate();
        let cascade = FilterCascade::new(&config, sampling_rate)?;
        let extractor = SpectralFeatureExtractor::new(config.bands.clone(), sampling_rate)?;
        let results = SlidingResultBuffer::new(
            config.result_window_seconds,
            config.tick_interval_seconds,
        )?;

        for &channel in &config.channel_subset {
            if channel >= buffer.channel_count() {
                return Err(StreamError::InvalidSignalConfig {
                    message: format!(
                        "channel {} not available on a {}-channel device",
                        channel,
                        buffer.channel_count()
                    ),
                });
            }
        }
        if let ScoreMode::BandRatio { channel, .. } = &config.score_mode {
            if *channel >= buffer.channel_count() {
                return Err(StreamError::InvalidSignalConfig {
                    message: format!(
                        "ratio channel {} not available on a {}-channel device",
                        channel,
                        buffer.channel_count()
                    ),
                });
            }
        }

        let window_samples = config.window_samples(sampling_rate);
        let (shutdown, _) = watch::channel(false);

        Ok(AnalyticsEngine {
            config,
            buffer,
            cascade,
            extractor,
            adapter: None,
            results,
            sink,
            window_samples,
            state: EngineState::Idle,
            shutdown,
            ticks: 0,
            skipped: 0,
        })
    }

    /// Attach an inference model (required for classifier scoring)
    pub fn with_model(mut self, model: Box<dyn InferenceModel>) -> Self {
        self.adapter = Some(InferenceAdapter::new(model));
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Samples per analysis window (W)
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run until stopped via an [`EngineHandle`].
    ///
    /// Lifecycle and configuration errors propagate out; a tick that only
    /// lacks samples logs a warning and produces no score. The inference
    /// model is released on every exit path.
    pub async fn run(mut self) -> StreamResult<()> {
        if self.config.score_mode == ScoreMode::Classifier && self.adapter.is_none() {
            return Err(StreamError::InvalidSignalConfig {
                message: "classifier scoring requires an inference model".to_string(),
            });
        }

        if let Some(adapter) = self.adapter.as_mut() {
            adapter.prepare()?;
            tracing::info!(model = adapter.model_name(), "inference model prepared");
        }

        self.state = EngineState::Running;
        tracing::info!(
            window_samples = self.window_samples,
            tick_seconds = self.config.tick_interval_seconds,
            "analytics engine running"
        );

        let mut ticker = interval(Duration::from_secs_f32(self.config.tick_interval_seconds));
        // Drop-and-resync: a slow tick delays the next one, executions
        // never stack
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut shutdown = self.shutdown.subscribe();
        // A stop issued before run() still wins
        if *shutdown.borrow() {
            self.finish();
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_tick() {
                        Ok(update) => {
                            self.sink.render(&update);
                        }
                        Err(StreamError::InsufficientSamples { required, available }) => {
                            self.skipped += 1;
                            tracing::warn!(required, available, "window too short, skipping tick");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "fatal analytics error");
                            self.finish();
                            return Err(e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.finish();
        Ok(())
    }

    /// One pass through the pipeline
    fn run_tick(&mut self) -> StreamResult<TickUpdate> {
        let raw = self.buffer.latest(self.window_samples);
        let conditioned = self.cascade.apply(&raw)?;

        let scores = match &self.config.score_mode {
            ScoreMode::BandRatio { channel, numerator, denominator } => {
                let data = conditioned.channel(*channel)?;
                vec![self.extractor.power_ratio(data, numerator, denominator)?]
            }
            ScoreMode::Classifier => {
                let features = self
                    .extractor
                    .feature_vector(&conditioned, &self.config.channel_subset)?;
                match self.adapter.as_ref() {
                    Some(adapter) => adapter.predict(&features.band_averages)?,
                    None => return Err(StreamError::NotPrepared),
                }
            }
        };

        // Vector outputs append element-wise, like scalar ones
        for score in scores {
            self.results.append(score);
        }

        self.ticks += 1;
        Ok(TickUpdate {
            tick: self.ticks,
            window: conditioned,
            trend: self.results.snapshot(),
        })
    }

    fn finish(&mut self) {
        if let Some(adapter) = self.adapter.as_mut() {
            if adapter.is_prepared() {
                if let Err(e) = adapter.release() {
                    tracing::warn!(error = %e, "inference model release failed");
                }
            }
        }
        self.state = EngineState::Stopped;
        tracing::info!(
            ticks = self.ticks,
            skipped = self.skipped,
            "analytics engine stopped"
        );
    }
}
