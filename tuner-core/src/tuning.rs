//! # Tuning Module
//!
//! Maps a stabilized frequency onto the strings of the selected instrument
//! and produces a directional tuning hint.
//!
//! ## Rules
//! For each string, in table order:
//! 1. `|f - target| < match_epsilon` → in tune
//! 2. `target - band_epsilon <= f < target` → tune up
//! 3. `target < f <= target + band_epsilon` → tune down
//!
//! With [`TieBreak::TableOrder`] the first string satisfying any rule wins.
//! With [`TieBreak::Nearest`] the closest candidate wins, earlier strings
//! winning exact ties. No candidate means the string is unrecognized.

use crate::instruments::{InstrumentProfile, StringTarget};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the tuning hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    InTune,
    /// Below the target: raise the pitch.
    TooLow,
    /// Above the target: lower the pitch.
    TooHigh,
    Unrecognized,
}

/// Colour cue shown alongside the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorCue {
    Green,
    Blue,
    Red,
    Gray,
}

impl Direction {
    pub fn cue(self) -> ColorCue {
        match self {
            Direction::InTune => ColorCue::Green,
            Direction::TooLow => ColorCue::Blue,
            Direction::TooHigh => ColorCue::Red,
            Direction::Unrecognized => ColorCue::Gray,
        }
    }
}

impl ColorCue {
    /// 8-bit RGB triple for renderers.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ColorCue::Green => (0x34, 0xDB, 0x98),
            ColorCue::Blue => (0x3A, 0x8E, 0xE6),
            ColorCue::Red => (0xFF, 0x33, 0x33),
            ColorCue::Gray => (0x9E, 0x9E, 0x9E),
        }
    }
}

/// How overlapping string bands are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First matching string in table order.
    #[default]
    TableOrder,
    /// Matching string with the smallest absolute distance.
    Nearest,
}

/// Classification thresholds in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub match_epsilon: f32,
    pub band_epsilon: f32,
    pub tie_break: TieBreak,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            match_epsilon: 1.0,
            band_epsilon: 10.0,
            tie_break: TieBreak::TableOrder,
        }
    }
}

/// Result of classifying one stabilized frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningVerdict {
    pub matched_string: Option<String>,
    /// Target frequency of the matched string.
    pub target_frequency: Option<f32>,
    pub direction: Direction,
    pub display_frequency: f32,
}

impl TuningVerdict {
    pub fn cue(&self) -> ColorCue {
        self.direction.cue()
    }

    /// Offset from the matched string in cents, if a string matched.
    pub fn cents(&self) -> Option<f32> {
        self.target_frequency
            .map(|target| cents_deviation(self.display_frequency, target))
    }

    /// Short message for the player.
    pub fn message(&self) -> String {
        match (&self.matched_string, self.direction) {
            (Some(name), Direction::InTune) => format!("String {} is in tune!", name),
            (Some(name), Direction::TooLow) => format!("String {}: tune up", name),
            (Some(name), Direction::TooHigh) => format!("String {}: tune down", name),
            _ => "String not recognized".to_string(),
        }
    }
}

impl fmt::Display for TuningVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Direction for a single string, if the frequency falls inside its band.
fn rate(frequency: f32, target: f32, tolerance: &Tolerance) -> Option<Direction> {
    if (frequency - target).abs() < tolerance.match_epsilon {
        Some(Direction::InTune)
    } else if frequency < target && frequency >= target - tolerance.band_epsilon {
        Some(Direction::TooLow)
    } else if frequency > target && frequency <= target + tolerance.band_epsilon {
        Some(Direction::TooHigh)
    } else {
        None
    }
}

/// Classifies `frequency` against the strings of `profile`.
///
/// Never fails: non-finite input and frequencies outside every band are
/// reported as [`Direction::Unrecognized`].
pub fn classify(frequency: f32, profile: &InstrumentProfile, tolerance: &Tolerance) -> TuningVerdict {
    let mut candidates = profile
        .strings
        .iter()
        .filter_map(|target| rate(frequency, target.frequency, tolerance).map(|d| (target, d)));

    let chosen: Option<(&StringTarget, Direction)> = match tolerance.tie_break {
        TieBreak::TableOrder => candidates.next(),
        TieBreak::Nearest => candidates.fold(None, |best, (target, direction)| match best {
            Some((b, _)) if (b.frequency - frequency).abs() <= (target.frequency - frequency).abs() => best,
            _ => Some((target, direction)),
        }),
    };

    match chosen {
        Some((target, direction)) => TuningVerdict {
            matched_string: Some(target.name.clone()),
            target_frequency: Some(target.frequency),
            direction,
            display_frequency: frequency,
        },
        None => TuningVerdict {
            matched_string: None,
            target_frequency: None,
            direction: Direction::Unrecognized,
            display_frequency: frequency,
        },
    }
}

/// Formats a frequency for display with two decimals.
pub fn format_frequency(frequency: Option<f32>) -> String {
    match frequency {
        Some(f) => format!("{:.2} Hz", f),
        None => "Not detected".to_string(),
    }
}

/// Signed distance from `target` in cents (100 per semitone), sharp positive.
pub fn cents_deviation(frequency: f32, target: f32) -> f32 {
    1200.0 * (frequency / target).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::InstrumentTable;

    fn guitar() -> InstrumentProfile {
        InstrumentTable::builtin().lookup("guitar").unwrap().clone()
    }

    #[test]
    fn averaged_e6_is_in_tune() {
        let verdict = classify(81.6, &guitar(), &Tolerance::default());
        assert_eq!(verdict.direction, Direction::InTune);
        assert_eq!(verdict.matched_string.as_deref(), Some("E6"));
        assert_eq!(verdict.target_frequency, Some(82.0));
        assert_eq!(verdict.cue(), ColorCue::Green);
        assert_eq!(verdict.message(), "String E6 is in tune!");
    }

    #[test]
    fn ninety_five_hz_is_unrecognized() {
        let verdict = classify(95.0, &guitar(), &Tolerance::default());
        assert_eq!(verdict.direction, Direction::Unrecognized);
        assert_eq!(verdict.matched_string, None);
        assert_eq!(verdict.cue(), ColorCue::Gray);
        assert_eq!(verdict.message(), "String not recognized");
        assert_eq!(verdict.display_frequency, 95.0);
    }

    #[test]
    fn band_edge_is_inclusive() {
        let low = classify(100.0, &guitar(), &Tolerance::default());
        assert_eq!(low.direction, Direction::TooLow);
        assert_eq!(low.matched_string.as_deref(), Some("A"));
        assert_eq!(low.cue(), ColorCue::Blue);
        assert_eq!(low.message(), "String A: tune up");

        let high = classify(120.0, &guitar(), &Tolerance::default());
        assert_eq!(high.direction, Direction::TooHigh);
        assert_eq!(high.cue(), ColorCue::Red);
        assert_eq!(high.message(), "String A: tune down");
    }

    #[test]
    fn match_edge_is_exclusive() {
        let verdict = classify(109.0, &guitar(), &Tolerance::default());
        assert_eq!(verdict.direction, Direction::TooLow);
        let verdict = classify(111.0, &guitar(), &Tolerance::default());
        assert_eq!(verdict.direction, Direction::TooHigh);
    }

    #[test]
    fn every_builtin_string_classifies_around_its_target() {
        let tolerance = Tolerance::default();
        for profile in InstrumentTable::builtin().profiles() {
            for target in &profile.strings {
                let t = target.frequency;
                for (f, expected) in [
                    (t, Direction::InTune),
                    (t - 0.5, Direction::InTune),
                    (t + 0.9, Direction::InTune),
                    (t - 5.0, Direction::TooLow),
                    (t - 9.5, Direction::TooLow),
                    (t - 10.0, Direction::TooLow),
                    (t + 5.0, Direction::TooHigh),
                    (t + 9.5, Direction::TooHigh),
                    (t + 10.0, Direction::TooHigh),
                ] {
                    let verdict = classify(f, profile, &tolerance);
                    assert_eq!(verdict.direction, expected, "{} {} at {}", profile.id, target.name, f);
                    assert_eq!(verdict.matched_string.as_deref(), Some(target.name.as_str()));
                }
            }
        }
    }

    #[test]
    fn outside_every_band_is_unrecognized() {
        let tolerance = Tolerance::default();
        for profile in InstrumentTable::builtin().profiles() {
            for f in [50.0, 150.0 * 4.0, 1000.0] {
                let near = profile
                    .strings
                    .iter()
                    .any(|s| (s.frequency - f).abs() <= tolerance.band_epsilon);
                if !near {
                    assert_eq!(classify(f, profile, &tolerance).direction, Direction::Unrecognized);
                }
            }
        }
    }

    #[test]
    fn non_finite_input_is_unrecognized() {
        let tolerance = Tolerance::default();
        assert_eq!(classify(f32::NAN, &guitar(), &tolerance).direction, Direction::Unrecognized);
        assert_eq!(classify(f32::INFINITY, &guitar(), &tolerance).direction, Direction::Unrecognized);
    }

    fn overlapping() -> InstrumentProfile {
        InstrumentProfile {
            id: "overlap".into(),
            label: String::new(),
            strings: vec![
                StringTarget { name: "low".into(), frequency: 100.0 },
                StringTarget { name: "high".into(), frequency: 108.0 },
            ],
        }
    }

    #[test]
    fn table_order_prefers_earlier_string() {
        let verdict = classify(107.5, &overlapping(), &Tolerance::default());
        assert_eq!(verdict.matched_string.as_deref(), Some("low"));
        assert_eq!(verdict.direction, Direction::TooHigh);
    }

    #[test]
    fn nearest_prefers_closest_string() {
        let tolerance = Tolerance {
            tie_break: TieBreak::Nearest,
            ..Tolerance::default()
        };
        let verdict = classify(107.5, &overlapping(), &tolerance);
        assert_eq!(verdict.matched_string.as_deref(), Some("high"));
        assert_eq!(verdict.direction, Direction::InTune);

        // Equidistant: the earlier string keeps the match.
        let verdict = classify(104.0, &overlapping(), &tolerance);
        assert_eq!(verdict.matched_string.as_deref(), Some("low"));
    }

    #[test]
    fn frequency_formatting() {
        assert_eq!(format_frequency(Some(81.6)), "81.60 Hz");
        assert_eq!(format_frequency(None), "Not detected");
    }

    #[test]
    fn ronroco_b3_upper_edge_is_tune_down() {
        let table = InstrumentTable::builtin();
        let ronroco = table.lookup("ronroco").unwrap();
        let b3 = ronroco.strings.iter().find(|s| s.name == "B3").unwrap();
        let verdict = classify(b3.frequency + 10.0, ronroco, &Tolerance::default());
        assert_eq!(verdict.direction, Direction::TooHigh);
        assert_eq!(verdict.matched_string.as_deref(), Some("B3"));
    }

    #[test]
    fn verdict_cents_follow_matched_string() {
        let sharp = classify(111.0, &guitar(), &Tolerance::default());
        let cents = sharp.cents().unwrap();
        assert!(cents > 15.0 && cents < 16.5, "got {cents}");

        let flat = classify(100.0, &guitar(), &Tolerance::default());
        assert!(flat.cents().unwrap() < 0.0);

        assert_eq!(classify(95.0, &guitar(), &Tolerance::default()).cents(), None);
    }

    #[test]
    fn cents_of_an_octave() {
        assert!((cents_deviation(220.0, 110.0) - 1200.0).abs() < 1e-3);
        assert!(cents_deviation(109.0, 110.0) < 0.0);
    }
}
