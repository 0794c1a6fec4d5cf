// tuner-core/src/lib.rs

//! The core logic for the stringed-instrument tuner.
//! This crate is responsible for audio capture, signal conditioning,
//! pitch detection and the tuning decision. It is completely headless
//! and contains no GUI code.

pub mod audio;
pub mod band;
pub mod config;
pub mod error;
pub mod fft;
pub mod filter;
pub mod instruments;
pub mod pipeline;
pub mod pitch;
pub mod scheduler;
pub mod smoothing;
pub mod tuning;

pub use config::TunerSettings;
pub use error::TunerError;
pub use instruments::{InstrumentProfile, InstrumentTable};
pub use pipeline::Tuner;
pub use tuning::{Direction, TuningVerdict};

/// A block of mono samples in [-1.0, 1.0] and the rate they were captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }
}

/// What the presentation layer shows after one analysis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The stabilized frequency in Hz, `None` until the first emission.
    pub frequency: Option<f32>,
    /// Verdict for `frequency` against the instrument selected for this tick.
    pub verdict: Option<TuningVerdict>,
}
