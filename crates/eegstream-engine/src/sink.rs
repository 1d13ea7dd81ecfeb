//! Display sink seam
//!
//! The engine hands each tick's output to a [`DisplaySink`] as an immutable
//! snapshot; sinks never call back into the engine.

use eegstream_core::SignalWindow;
use std::sync::{Arc, Mutex};

/// Everything a sink gets per tick
#[derive(Debug, Clone)]
pub struct TickUpdate {
    /// 1-based tick counter
    pub tick: u64,
    /// Conditioned window, per channel, for live traces
    pub window: SignalWindow,
    /// Result buffer contents, oldest to newest, for trend plots
    pub trend: Vec<f32>,
}

/// Consumer of per-tick snapshots
pub trait DisplaySink: Send {
    fn render(&mut self, update: &TickUpdate);
}

/// Logging sink: the headless stand-in for a plot widget
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        LogSink
    }
}

impl DisplaySink for LogSink {
    fn render(&mut self, update: &TickUpdate) {
        let score = update.trend.last().copied().unwrap_or(f32::NAN);
        tracing::debug!(
            tick = update.tick,
            score,
            trend_len = update.trend.len(),
            "tick scored"
        );

        if update.tick % 20 == 0 {
            let rms = update
                .window
                .channel_stats(0)
                .map(|s| s.rms)
                .unwrap_or(f32::NAN);
            tracing::info!(tick = update.tick, score, rms, "trend update");
        }
    }
}

/// Test sink collecting every update behind a shared handle
#[derive(Debug, Default)]
pub struct MemorySink {
    updates: Arc<Mutex<Vec<TickUpdate>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the collected updates
    pub fn updates(&self) -> Arc<Mutex<Vec<TickUpdate>>> {
        self.updates.clone()
    }
}

impl DisplaySink for MemorySink {
    fn render(&mut self, update: &TickUpdate) {
        self.updates
            .lock()
            .expect("sink lock poisoned")
            .push(update.clone());
    }
}
