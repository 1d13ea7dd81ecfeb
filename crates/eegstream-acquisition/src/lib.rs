//! EEGStream-Acquisition: sample buffering and simulated acquisition
//!
//! The append-only acquisition buffer consumed by analytics engines, plus a
//! synthetic EEG board for testing and development.

pub mod board;
pub mod buffer;
pub mod simulator;

pub use board::{BoardConfig, BoardSession, SimulatedBoard};
pub use buffer::AcquisitionBuffer;
pub use simulator::{EegConfig, EegSimulator, NoiseConfig, RhythmComponent};
