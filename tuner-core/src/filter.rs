//! # Band-Limiting Filter Module
//!
//! Conditions the raw microphone signal before pitch estimation: a
//! high-pass stage at the low edge of the pass-band removes rumble and DC
//! bias, a low-pass stage at the high edge removes upper partials that
//! cause octave errors.
//!
//! Both stages are 2-pole Butterworth biquads run in series. Filter state
//! persists across calls, so the chain sees one continuous stream rather
//! than independent windows.

use crate::band::PassBand;
use crate::error::TunerError;
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Q_BUTTERWORTH_F32, ToHertz, Type};

/// High-pass followed by low-pass, applied sample by sample.
pub struct FilterChain {
    highpass: DirectForm2Transposed<f32>,
    lowpass: DirectForm2Transposed<f32>,
    hp_coeffs: Coefficients<f32>,
    lp_coeffs: Coefficients<f32>,
    sample_rate: u32,
}

impl FilterChain {
    /// Designs the chain for `band` at `sample_rate`.
    ///
    /// Fails when a cutoff is not below the Nyquist frequency.
    pub fn new(band: PassBand, sample_rate: u32) -> Result<Self, TunerError> {
        let fs = (sample_rate as f32).hz();
        let hp_coeffs = Coefficients::<f32>::from_params(
            Type::HighPass,
            fs,
            band.low_hz.hz(),
            Q_BUTTERWORTH_F32,
        )
        .map_err(|e| TunerError::Filter(format!("high-pass at {} Hz: {:?}", band.low_hz, e)))?;
        let lp_coeffs = Coefficients::<f32>::from_params(
            Type::LowPass,
            fs,
            band.high_hz.hz(),
            Q_BUTTERWORTH_F32,
        )
        .map_err(|e| TunerError::Filter(format!("low-pass at {} Hz: {:?}", band.high_hz, e)))?;

        Ok(Self {
            highpass: DirectForm2Transposed::<f32>::new(hp_coeffs),
            lowpass: DirectForm2Transposed::<f32>::new(lp_coeffs),
            hp_coeffs,
            lp_coeffs,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Filters `samples` in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.lowpass.run(self.highpass.run(*sample));
        }
    }

    /// Clears the internal state of both stages.
    pub fn reset(&mut self) {
        self.highpass = DirectForm2Transposed::<f32>::new(self.hp_coeffs);
        self.lowpass = DirectForm2Transposed::<f32>::new(self.lp_coeffs);
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}
