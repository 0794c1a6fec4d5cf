//! # Error Module
//!
//! Error taxonomy for the tuner core. Only setup-time operations fail:
//! capture acquisition, instrument lookup and configuration. Estimation,
//! smoothing and classification always produce a value.

use thiserror::Error;

/// Errors raised by the tuner core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TunerError {
    /// The requested instrument identifier is not in the profile table.
    #[error("unknown instrument `{0}`")]
    UnknownInstrument(String),

    /// Microphone permission denied, no input device, or the stream could not be built.
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// A settings value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An instrument profile breaks the table invariants.
    #[error("invalid instrument profile: {0}")]
    InvalidProfile(String),

    /// Filter coefficients could not be computed for the sample rate.
    #[error("filter design failed: {0}")]
    Filter(String),
}
