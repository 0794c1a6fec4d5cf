//! # Fast Fourier Transform (FFT) Module
//!
//! FFT helpers for the pitch estimator. The YIN difference function needs
//! the lagged products `sum x[i] * x[i + tau]` for every lag; computing
//! them through the frequency domain turns an O(N^2) loop into O(N log N).
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - FFT plans and scratch buffers cached per window size
//! - DC offset removal

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Removes the DC offset from a signal by making its average value zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Computes lagged cross products between the head of a window and the whole window.
///
/// For a signal of length `N` and `W = N / 2`, `correlate` fills
/// `out[tau] = sum_{i < W} x[i] * x[i + tau]` for `tau` in `0..W`.
pub struct LagCorrelator {
    size: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    head: Vec<Complex<f32>>,
    full: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl LagCorrelator {
    /// Plans transforms for windows of `size` samples.
    pub fn new(size: usize) -> Self {
        // Zero padding to 2N keeps the circular correlation free of wrap-around.
        let fft_len = (2 * size).next_power_of_two();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            size,
            fft_len,
            forward,
            inverse,
            head: vec![Complex::default(); fft_len],
            full: vec![Complex::default(); fft_len],
            scratch: vec![Complex::default(); scratch_len],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Fills `out` with the lagged products of `signal`.
    ///
    /// # Panics
    /// * If `signal.len()` differs from the planned size or `out.len() != size / 2`
    pub fn correlate(&mut self, signal: &[f32], out: &mut [f32]) {
        assert_eq!(signal.len(), self.size, "signal length must match the planned size");
        let half = self.size / 2;
        assert_eq!(out.len(), half, "output length must be half the planned size");

        for (i, slot) in self.head.iter_mut().enumerate() {
            let re = if i < half { signal[i] } else { 0.0 };
            *slot = Complex { re, im: 0.0 };
        }
        for (i, slot) in self.full.iter_mut().enumerate() {
            let re = if i < self.size { signal[i] } else { 0.0 };
            *slot = Complex { re, im: 0.0 };
        }

        self.forward.process_with_scratch(&mut self.head, &mut self.scratch);
        self.forward.process_with_scratch(&mut self.full, &mut self.scratch);

        // Cross-correlation: conj(HEAD) * FULL
        for (h, f) in self.head.iter_mut().zip(self.full.iter()) {
            *h = h.conj() * f;
        }
        self.inverse.process_with_scratch(&mut self.head, &mut self.scratch);

        // RustFFT leaves the inverse unnormalized.
        let scale = 1.0 / self.fft_len as f32;
        for (tau, value) in out.iter_mut().enumerate() {
            *value = self.head[tau].re * scale;
        }
    }
}

impl std::fmt::Debug for LagCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LagCorrelator")
            .field("size", &self.size)
            .field("fft_len", &self.fft_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_offset_is_centered() {
        let mut signal = vec![1.0, 2.0, 3.0, 4.0];
        remove_dc_offset(&mut signal);
        assert_eq!(signal, vec![-1.5, -0.5, 0.5, 1.5]);

        let mut empty: Vec<f32> = vec![];
        remove_dc_offset(&mut empty);
    }

    #[test]
    fn matches_direct_correlation() {
        let size = 64;
        let signal: Vec<f32> = (0..size).map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0).collect();
        let mut correlator = LagCorrelator::new(size);
        let mut out = vec![0.0; size / 2];
        correlator.correlate(&signal, &mut out);

        for tau in 0..size / 2 {
            let direct: f32 = (0..size / 2).map(|i| signal[i] * signal[i + tau]).sum();
            assert!(
                (direct - out[tau]).abs() < 1e-3,
                "lag {}: expected {}, got {}",
                tau,
                direct,
                out[tau]
            );
        }
    }
}
