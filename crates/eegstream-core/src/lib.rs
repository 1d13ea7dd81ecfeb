//! EEGStream-Core: Foundation types for EEG stream analytics
//!
//! Window container and error taxonomy shared by the acquisition,
//! processing and engine crates.

pub mod error;
pub mod window;

pub use error::{StreamError, StreamResult};
pub use window::{ChannelStats, SignalWindow};
