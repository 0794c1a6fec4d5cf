//! # Pass-Band Module
//!
//! The fixed frequency range covering the fundamentals of every supported
//! instrument, and the range gate that rejects estimator output outside it.

use serde::{Deserialize, Serialize};

/// Plausible fundamental range in Hz, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassBand {
    pub low_hz: f32,
    pub high_hz: f32,
}

impl Default for PassBand {
    fn default() -> Self {
        Self {
            low_hz: 70.0,
            high_hz: 700.0,
        }
    }
}

impl PassBand {
    pub fn contains(&self, frequency: f32) -> bool {
        frequency >= self.low_hz && frequency <= self.high_hz
    }

    pub fn is_valid(&self) -> bool {
        self.low_hz.is_finite() && self.high_hz.is_finite() && 0.0 < self.low_hz && self.low_hz < self.high_hz
    }
}

/// Discards raw estimates outside the pass-band.
///
/// The filter chain only attenuates out-of-band energy; the gate rejects
/// estimator artifacts (octave jumps, sub-harmonics) directly.
#[derive(Debug, Clone, Copy)]
pub struct RangeGate {
    band: PassBand,
}

impl RangeGate {
    pub fn new(band: PassBand) -> Self {
        Self { band }
    }

    /// Returns the estimate unchanged when it lies inside the band, `None` otherwise.
    pub fn admit(&self, estimate: Option<f32>) -> Option<f32> {
        estimate.filter(|&f| self.band.contains(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_inclusive_at_both_edges() {
        let gate = RangeGate::new(PassBand::default());
        assert_eq!(gate.admit(Some(70.0)), Some(70.0));
        assert_eq!(gate.admit(Some(700.0)), Some(700.0));
        assert_eq!(gate.admit(Some(329.628)), Some(329.628));
    }

    #[test]
    fn gate_rejects_out_of_band_and_absent() {
        let gate = RangeGate::new(PassBand::default());
        assert_eq!(gate.admit(Some(69.9)), None);
        assert_eq!(gate.admit(Some(1400.0)), None);
        assert_eq!(gate.admit(Some(f32::NAN)), None);
        assert_eq!(gate.admit(None), None);
    }

    #[test]
    fn band_validity() {
        assert!(PassBand::default().is_valid());
        assert!(!PassBand { low_hz: 700.0, high_hz: 70.0 }.is_valid());
        assert!(!PassBand { low_hz: 0.0, high_hz: 70.0 }.is_valid());
    }
}
