//! # Analysis Pipeline Module
//!
//! One analysis step per captured frame:
//! filter → window → estimate → range gate → smooth → classify.
//!
//! The filter and the window carry state from frame to frame; everything
//! downstream of the estimator only sees values.

use crate::band::RangeGate;
use crate::config::TunerSettings;
use crate::filter::FilterChain;
use crate::instruments::InstrumentProfile;
use crate::pitch::{PitchEstimator, YinEstimator};
use crate::smoothing::SmoothingBuffer;
use crate::tuning::{self, Tolerance, TuningVerdict};
use crate::{AudioFrame, TickReport};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Stateful analysis pipeline.
pub struct Tuner {
    settings: TunerSettings,
    tolerance: Tolerance,
    filter: Option<FilterChain>,
    window: VecDeque<f32>,
    estimator: Box<dyn PitchEstimator + Send>,
    gate: RangeGate,
    smoother: SmoothingBuffer,
    /// Last emitted stabilized frequency; stays on display until replaced.
    stabilized: Option<f32>,
}

impl Tuner {
    pub fn new(settings: TunerSettings) -> Self {
        let estimator = YinEstimator::new(settings.amplitude_threshold, settings.yin_threshold);
        Self::with_estimator(settings, Box::new(estimator))
    }

    /// Pipeline with a custom pitch estimator.
    pub fn with_estimator(settings: TunerSettings, estimator: Box<dyn PitchEstimator + Send>) -> Self {
        Self {
            tolerance: settings.tolerance(),
            filter: None,
            window: VecDeque::with_capacity(settings.window_size),
            estimator,
            gate: RangeGate::new(settings.pass_band),
            smoother: SmoothingBuffer::new(settings.history_capacity),
            stabilized: None,
            settings,
        }
    }

    /// Last stabilized frequency, if any has been emitted.
    pub fn stabilized(&self) -> Option<f32> {
        self.stabilized
    }

    /// Filters `samples` in place, designing the chain for the frame's sample rate.
    ///
    /// A chain that cannot be designed (cutoff above Nyquist) leaves the
    /// signal unfiltered; the range gate still applies.
    fn condition(&mut self, samples: &mut [f32], sample_rate: u32) {
        if !self.settings.filter_enabled {
            return;
        }
        if self.filter.as_ref().is_none_or(|f| f.sample_rate() != sample_rate) {
            self.filter = match FilterChain::new(self.settings.pass_band, sample_rate) {
                Ok(chain) => {
                    debug!(sample_rate, "filter chain designed");
                    Some(chain)
                }
                Err(e) => {
                    warn!(sample_rate, error = %e, "filter chain unavailable, analysing unfiltered signal");
                    None
                }
            };
        }
        if let Some(filter) = &mut self.filter {
            filter.process(samples);
        }
    }

    /// Runs one full analysis step and reports the result against `profile`.
    pub fn process_frame(&mut self, frame: &AudioFrame, profile: &InstrumentProfile) -> TickReport {
        let mut samples = frame.samples.clone();
        self.condition(&mut samples, frame.sample_rate);

        let capacity = self.settings.window_size;
        self.window.extend(samples);
        if self.window.len() > capacity {
            let excess = self.window.len() - capacity;
            self.window.drain(..excess);
        }

        if self.window.len() == capacity {
            let window = AudioFrame::new(self.window.iter().copied().collect(), frame.sample_rate);
            let raw = self.estimator.estimate(&window);
            let accepted = self.gate.admit(raw);
            if raw.is_some() && accepted.is_none() {
                trace!(raw = ?raw, "estimate outside pass band discarded");
            }
            if let Some(stable) = self.smoother.accept(accepted) {
                trace!(stable, "stabilized frequency");
                self.stabilized = Some(stable);
            }
        }

        self.report(profile)
    }

    /// Classifies the current stabilized frequency against `profile`.
    pub fn report(&self, profile: &InstrumentProfile) -> TickReport {
        TickReport {
            frequency: self.stabilized,
            verdict: self.verdict(profile),
        }
    }

    fn verdict(&self, profile: &InstrumentProfile) -> Option<TuningVerdict> {
        self.stabilized
            .map(|f| tuning::classify(f, profile, &self.tolerance))
    }

    /// Drops all signal state: filter memory, window, history and the displayed value.
    pub fn reset(&mut self) {
        if let Some(filter) = &mut self.filter {
            filter.reset();
        }
        self.window.clear();
        self.smoother.clear();
        self.stabilized = None;
    }
}

impl std::fmt::Debug for Tuner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tuner")
            .field("settings", &self.settings)
            .field("window_len", &self.window.len())
            .field("stabilized", &self.stabilized)
            .finish_non_exhaustive()
    }
}
