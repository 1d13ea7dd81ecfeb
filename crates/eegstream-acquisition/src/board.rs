//! Simulated acquisition board with a scoped session guard
//!
//! `prepare()` hands back a [`BoardSession`] that streams chunks into an
//! [`AcquisitionBuffer`] from a background task. The session is the only
//! handle to the stream; stopping is explicit and idempotent, and dropping
//! the session stops the stream on every exit path.

use crate::buffer::AcquisitionBuffer;
use crate::simulator::{EegConfig, EegSimulator};
use eegstream_core::StreamResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Configuration for the simulated board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Signal generation parameters
    pub eeg: EegConfig,
    /// Chunk duration in seconds (e.g. 0.05 for 50ms chunks)
    pub chunk_duration: f32,
    /// Samples per channel the buffer retains
    pub retained_samples: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            eeg: EegConfig::default(),
            chunk_duration: 0.05,
            retained_samples: crate::buffer::DEFAULT_RETAINED_SAMPLES,
        }
    }
}

/// Simulated EEG acquisition board
pub struct SimulatedBoard {
    config: BoardConfig,
}

impl SimulatedBoard {
    pub fn new(config: BoardConfig) -> Self {
        SimulatedBoard { config }
    }

    /// Open the session and start streaming into a fresh buffer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn prepare(self) -> StreamResult<BoardSession> {
        let mut simulator = EegSimulator::new(self.config.eeg.clone())?;
        let buffer = Arc::new(AcquisitionBuffer::with_retention(
            self.config.eeg.channel_count,
            self.config.eeg.sampling_rate,
            self.config.retained_samples,
        )?);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let chunk_duration = self.config.chunk_duration;
        let task_buffer = buffer.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs_f32(chunk_duration));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            println!(
                "EEG board stream started - chunk duration: {:.0}ms",
                chunk_duration * 1000.0
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match simulator.generate_chunk(chunk_duration) {
                            Ok(chunk) => {
                                if let Err(e) = task_buffer.append(&chunk) {
                                    eprintln!("EEG board append error: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                eprintln!("EEG board generation error: {}", e);
                                break;
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            println!("EEG board stream stopped");
        });

        Ok(BoardSession {
            buffer,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// Live acquisition session; owns the streaming task
pub struct BoardSession {
    buffer: Arc<AcquisitionBuffer>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl BoardSession {
    /// The buffer this session appends into
    pub fn buffer(&self) -> Arc<AcquisitionBuffer> {
        self.buffer.clone()
    }

    pub fn sampling_rate(&self) -> f32 {
        self.buffer.sampling_rate()
    }

    pub fn channel_count(&self) -> usize {
        self.buffer.channel_count()
    }

    /// Stop streaming; idempotent, takes effect at the next chunk boundary
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// True while the streaming task is alive
    pub fn is_streaming(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::NoiseConfig;
    use tokio::time::sleep;

    fn fast_config() -> BoardConfig {
        BoardConfig {
            eeg: EegConfig {
                channel_count: 2,
                noise: NoiseConfig::default(),
                seed: Some(11),
                ..EegConfig::default()
            },
            chunk_duration: 0.01,
            ..BoardConfig::default()
        }
    }

    #[tokio::test]
    async fn test_session_streams_into_buffer() {
        let session = SimulatedBoard::new(fast_config()).prepare().unwrap();

        sleep(Duration::from_millis(100)).await;

        let buffer = session.buffer();
        assert!(buffer.total_appended() > 0);
        assert_eq!(buffer.channel_count(), 2);

        let window = buffer.latest(16);
        assert_eq!(window.channel_count(), 2);
        assert!(window.samples_per_channel() > 0);

        session.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_halts_stream() {
        let session = SimulatedBoard::new(fast_config()).prepare().unwrap();
        sleep(Duration::from_millis(50)).await;

        session.stop();
        session.stop();

        sleep(Duration::from_millis(50)).await;
        let after_stop = session.buffer().total_appended();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(session.buffer().total_appended(), after_stop);
        assert!(!session.is_streaming());
    }

    #[tokio::test]
    async fn test_drop_stops_stream() {
        let buffer = {
            let session = SimulatedBoard::new(fast_config()).prepare().unwrap();
            sleep(Duration::from_millis(50)).await;
            session.buffer()
        };

        sleep(Duration::from_millis(50)).await;
        let after_drop = buffer.total_appended();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(buffer.total_appended(), after_drop);
    }
}
