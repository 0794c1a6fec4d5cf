//! # Settings Module
//!
//! Tuner settings, loaded from and saved to a JSON file. Every field has a
//! default, so a partial file only overrides what it names and a missing
//! file yields the defaults.

use crate::band::PassBand;
use crate::error::TunerError;
use crate::instruments::{InstrumentProfile, InstrumentTable};
use crate::tuning::{TieBreak, Tolerance};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Audio buffer size for processing frames.
///
/// Number of samples per captured frame, and the hop between analyses.
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Capture rate the settings are validated against. Devices are asked for
/// this rate first.
pub const NOMINAL_SAMPLE_RATE: u32 = 44_100;

/// Samples in the analysis window handed to the pitch estimator.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerSettings {
    /// Run the band-limiting filter chain before estimation.
    pub filter_enabled: bool,
    pub pass_band: PassBand,
    /// Number of accepted estimates averaged into one stabilized frequency.
    pub history_capacity: usize,
    pub match_epsilon: f32,
    pub band_epsilon: f32,
    pub tie_break: TieBreak,
    pub frame_size: usize,
    pub window_size: usize,
    /// Minimum RMS amplitude for a window to be analysed.
    pub amplitude_threshold: f32,
    /// YIN absolute threshold.
    pub yin_threshold: f32,
    /// Scheduling cadence of the analysis loop. Each tick consumes one
    /// frame, so this must not exceed a frame's duration or captured
    /// frames back up and get dropped.
    pub tick_interval_ms: u64,
    pub default_instrument: String,
    /// Profiles appended to the built-in table.
    pub instruments: Vec<InstrumentProfile>,
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self {
            filter_enabled: true,
            pass_band: PassBand::default(),
            history_capacity: 5,
            match_epsilon: 1.0,
            band_epsilon: 10.0,
            tie_break: TieBreak::TableOrder,
            frame_size: DEFAULT_FRAME_SIZE,
            window_size: DEFAULT_WINDOW_SIZE,
            amplitude_threshold: 0.01,
            yin_threshold: 0.1,
            tick_interval_ms: 16,
            default_instrument: "guitar".to_string(),
            instruments: Vec::new(),
        }
    }
}

impl TunerSettings {
    /// Unfiltered, unsmoothed configuration: every gated estimate is
    /// classified directly.
    pub fn basic() -> Self {
        Self {
            filter_enabled: false,
            history_capacity: 1,
            ..Self::default()
        }
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            match_epsilon: self.match_epsilon,
            band_epsilon: self.band_epsilon,
            tie_break: self.tie_break,
        }
    }

    /// Time covered by one frame at `sample_rate`.
    pub fn frame_duration(&self, sample_rate: u32) -> Duration {
        Duration::from_secs_f64(self.frame_size as f64 / sample_rate.max(1) as f64)
    }

    /// Builds the instrument table: built-ins followed by the configured extras.
    pub fn instrument_table(&self) -> Result<InstrumentTable, TunerError> {
        InstrumentTable::with_profiles(&self.instruments)
    }

    /// Checks value ranges and that the default instrument exists.
    pub fn validate(&self) -> Result<(), TunerError> {
        let invalid = |msg: String| Err(TunerError::InvalidConfig(msg));

        if !self.pass_band.is_valid() {
            return invalid(format!(
                "pass band {}..{} Hz is not a positive, increasing range",
                self.pass_band.low_hz, self.pass_band.high_hz
            ));
        }
        if self.history_capacity == 0 {
            return invalid("history_capacity must be at least 1".into());
        }
        if !(self.match_epsilon > 0.0 && self.band_epsilon > 0.0) {
            return invalid("match_epsilon and band_epsilon must be positive".into());
        }
        if self.match_epsilon > self.band_epsilon {
            return invalid(format!(
                "match_epsilon {} exceeds band_epsilon {}",
                self.match_epsilon, self.band_epsilon
            ));
        }
        if self.frame_size == 0 {
            return invalid("frame_size must be positive".into());
        }
        if self.window_size < 4 || self.window_size < self.frame_size {
            return invalid(format!(
                "window_size {} must be at least 4 and at least frame_size {}",
                self.window_size, self.frame_size
            ));
        }
        if !(self.amplitude_threshold >= 0.0) {
            return invalid("amplitude_threshold must not be negative".into());
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold < 1.0) {
            return invalid(format!("yin_threshold {} must be in (0, 1)", self.yin_threshold));
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive".into());
        }
        let frame_duration = self.frame_duration(NOMINAL_SAMPLE_RATE);
        if Duration::from_millis(self.tick_interval_ms) > frame_duration {
            return invalid(format!(
                "tick_interval_ms {} is longer than one {}-sample frame ({:.1} ms at {} Hz)",
                self.tick_interval_ms,
                self.frame_size,
                frame_duration.as_secs_f64() * 1000.0,
                NOMINAL_SAMPLE_RATE
            ));
        }

        self.instrument_table()?.lookup(&self.default_instrument)?;
        Ok(())
    }
}

/// Loads settings from a JSON file; a missing file yields the defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<TunerSettings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no settings file, using defaults");
        return Ok(TunerSettings::default());
    }

    let mut file = File::open(path)
        .with_context(|| format!("opening settings file {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let settings: TunerSettings = serde_json::from_str(&data)
        .with_context(|| format!("parsing settings file {}", path.display()))?;
    settings.validate()?;

    tracing::info!(path = %path.display(), "settings loaded");
    Ok(settings)
}

/// Saves settings as pretty-printed JSON.
pub fn save_settings(path: impl AsRef<Path>, settings: &TunerSettings) -> Result<()> {
    let path = path.as_ref();
    let json_string = serde_json::to_string_pretty(settings)?;
    let mut file = File::create(path)
        .with_context(|| format!("creating settings file {}", path.display()))?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}
