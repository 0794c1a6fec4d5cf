//! # Pitch Detection Module
//!
//! Fundamental frequency estimation over one analysis window using the
//! YIN algorithm, with the difference function computed through the FFT.
//!
//! ## Features
//! - Noise gate: windows below an RMS threshold report no pitch
//! - Cumulative mean normalized difference with an absolute threshold
//! - Parabolic interpolation for sub-sample accuracy
//! - Deterministic: identical input always yields identical output

use crate::AudioFrame;
use crate::fft::{LagCorrelator, remove_dc_offset};

/// Estimates the fundamental frequency of one window of audio.
///
/// Implementations return `None` for silence or non-periodic input; they
/// never fail.
pub trait PitchEstimator {
    fn estimate(&mut self, frame: &AudioFrame) -> Option<f32>;
}

/// YIN estimator with cached FFT plans and work buffers.
#[derive(Debug)]
pub struct YinEstimator {
    /// Minimum RMS amplitude for a window to be analysed.
    amplitude_threshold: f32,
    /// Absolute threshold on the normalized difference function.
    threshold: f32,
    correlator: Option<LagCorrelator>,
    signal: Vec<f32>,
    lagged: Vec<f32>,
    yin_buffer: Vec<f32>,
}

impl YinEstimator {
    pub fn new(amplitude_threshold: f32, threshold: f32) -> Self {
        Self {
            amplitude_threshold,
            threshold,
            correlator: None,
            signal: Vec::new(),
            lagged: Vec::new(),
            yin_buffer: Vec::new(),
        }
    }

    /// Difference function `d(tau) = sum_{i < W} (x[i] - x[i + tau])^2`,
    /// expanded into energy terms and the FFT cross products.
    fn difference_function(&mut self) {
        let size = self.signal.len();
        let half = size / 2;

        if self.correlator.as_ref().is_some_and(|c| c.size() != size) {
            self.correlator = None;
        }
        let correlator = self
            .correlator
            .get_or_insert_with(|| LagCorrelator::new(size));
        self.lagged.resize(half, 0.0);
        correlator.correlate(&self.signal, &mut self.lagged);

        let signal = &self.signal;
        let head_energy: f32 = signal[..half].iter().map(|s| s * s).sum();
        let mut lag_energy = head_energy;

        self.yin_buffer.resize(half, 0.0);
        for tau in 0..half {
            let diff = head_energy + lag_energy - 2.0 * self.lagged[tau];
            self.yin_buffer[tau] = diff.max(0.0);
            if tau + half < size {
                lag_energy += signal[tau + half] * signal[tau + half] - signal[tau] * signal[tau];
            }
        }
    }

    /// Cumulative mean normalized difference, in place.
    fn normalize(&mut self) {
        let mut running_sum = 0.0;
        self.yin_buffer[0] = 1.0;
        for tau in 1..self.yin_buffer.len() {
            running_sum += self.yin_buffer[tau];
            if running_sum > 0.0 {
                self.yin_buffer[tau] *= tau as f32 / running_sum;
            } else {
                self.yin_buffer[tau] = 1.0;
            }
        }
    }

    /// First dip below the threshold, followed down to its local minimum.
    fn find_period(&self) -> Option<usize> {
        let buffer = &self.yin_buffer;
        let mut tau = (2..buffer.len()).find(|&t| buffer[t] < self.threshold)?;
        while tau + 1 < buffer.len() && buffer[tau + 1] < buffer[tau] {
            tau += 1;
        }
        Some(tau)
    }
}

impl PitchEstimator for YinEstimator {
    fn estimate(&mut self, frame: &AudioFrame) -> Option<f32> {
        let frame_size = frame.samples.len();
        if frame_size < 4 || frame.sample_rate == 0 {
            return None;
        }

        self.signal.clear();
        self.signal.extend_from_slice(&frame.samples);
        remove_dc_offset(&mut self.signal);

        // --- Noise gate: silence never produces an estimate ---
        let rms = (self.signal.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
        if rms.is_nan() || rms < self.amplitude_threshold {
            return None;
        }

        self.difference_function();
        self.normalize();
        let period = self.find_period()?;

        // Interpolation needs a neighbour on both sides.
        if period + 1 >= self.yin_buffer.len() {
            return None;
        }

        let y1 = self.yin_buffer[period - 1];
        let y2 = self.yin_buffer[period];
        let y3 = self.yin_buffer[period + 1];

        let denominator = y1 - 2.0 * y2 + y3;
        let period_float = if denominator.abs() > f32::EPSILON {
            period as f32 + (y1 - y3) / (2.0 * denominator)
        } else {
            period as f32
        };

        let frequency = frame.sample_rate as f32 / period_float;
        if frequency.is_finite() && frequency > 0.0 {
            Some(frequency)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44_100;
    const WINDOW: usize = 4096;

    fn sine_frame(freq: f32, amplitude: f32) -> AudioFrame {
        let samples = (0..WINDOW)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        AudioFrame::new(samples, SAMPLE_RATE)
    }

    fn estimator() -> YinEstimator {
        YinEstimator::new(0.01, 0.1)
    }

    #[test]
    fn detects_string_fundamentals() {
        let mut yin = estimator();
        for target in [82.0, 110.0, 196.0, 329.628, 440.0, 659.255] {
            let estimate = yin.estimate(&sine_frame(target, 0.5)).unwrap();
            assert!(
                (estimate - target).abs() < target * 0.01,
                "expected {} Hz, got {} Hz",
                target,
                estimate
            );
        }
    }

    #[test]
    fn detects_fundamental_of_harmonic_tone() {
        let samples = (0..WINDOW)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                0.5 * (2.0 * PI * 147.0 * t).sin()
                    + 0.3 * (2.0 * PI * 294.0 * t).sin()
                    + 0.2 * (2.0 * PI * 441.0 * t).sin()
            })
            .collect();
        let estimate = estimator()
            .estimate(&AudioFrame::new(samples, SAMPLE_RATE))
            .unwrap();
        assert!((estimate - 147.0).abs() < 1.5, "got {} Hz", estimate);
    }

    #[test]
    fn silence_is_absent() {
        let frame = AudioFrame::new(vec![0.0; WINDOW], SAMPLE_RATE);
        assert_eq!(estimator().estimate(&frame), None);
    }

    #[test]
    fn quiet_tone_is_gated() {
        assert_eq!(estimator().estimate(&sine_frame(110.0, 0.005)), None);
    }

    #[test]
    fn noise_is_absent() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = (0..WINDOW).map(|_| rng.gen_range(-0.5..0.5)).collect();
        let frame = AudioFrame::new(samples, SAMPLE_RATE);
        assert_eq!(estimator().estimate(&frame), None);
    }

    #[test]
    fn estimate_is_deterministic() {
        let frame = sine_frame(247.0, 0.4);
        let mut yin = estimator();
        let first = yin.estimate(&frame);
        let second = yin.estimate(&frame);
        assert_eq!(first, second);
        assert_eq!(first, estimator().estimate(&frame));
    }

    #[test]
    fn tiny_or_rateless_frames_are_absent() {
        let mut yin = estimator();
        assert_eq!(yin.estimate(&AudioFrame::new(vec![0.5, -0.5], SAMPLE_RATE)), None);
        assert_eq!(yin.estimate(&AudioFrame::new(vec![0.5; WINDOW], 0)), None);
    }

    #[test]
    fn window_size_can_change_between_calls() {
        let mut yin = estimator();
        assert!(yin.estimate(&sine_frame(220.0, 0.5)).is_some());
        let short: Vec<f32> = sine_frame(220.0, 0.5).samples[..2048].to_vec();
        let estimate = yin.estimate(&AudioFrame::new(short, SAMPLE_RATE)).unwrap();
        assert!((estimate - 220.0).abs() < 2.2);
    }
}
