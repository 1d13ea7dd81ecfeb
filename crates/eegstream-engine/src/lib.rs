//! EEGStream-Engine: tick-driven streaming analytics
//!
//! Ties the acquisition buffer, conditioning cascade, spectral features and
//! inference adapter together under a fixed-cadence scheduler with a
//! bounded result buffer and a display sink seam.

pub mod engine;
pub mod result_buffer;
pub mod sink;

pub use engine::{AnalyticsEngine, EngineHandle, EngineState};
pub use result_buffer::SlidingResultBuffer;
pub use sink::{DisplaySink, LogSink, MemorySink, TickUpdate};
