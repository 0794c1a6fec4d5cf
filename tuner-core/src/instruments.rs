//! # Instrument Profile Module
//!
//! Static mapping from instrument identifier to the ordered set of string
//! target frequencies the classifier tunes against.
//!
//! ## Features
//! - Built-in guitar, ukulele, charango and ronroco profiles
//! - Extra profiles from the settings file, appended at start-up
//! - Ordered string entries: the first matching string wins during classification

use crate::error::TunerError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single tunable string and its target frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringTarget {
    /// String name as shown to the player (e.g., "E6", "A")
    pub name: String,
    /// Target frequency in Hz
    pub frequency: f32,
}

/// An instrument and its strings, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    /// Identifier used by the presentation layer (e.g., "guitar")
    pub id: String,
    /// Human readable name
    #[serde(default)]
    pub label: String,
    pub strings: Vec<StringTarget>,
}

impl InstrumentProfile {
    fn new(id: &str, label: &str, strings: &[(&str, f32)]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            strings: strings
                .iter()
                .map(|&(name, frequency)| StringTarget {
                    name: name.to_string(),
                    frequency,
                })
                .collect(),
        }
    }

    /// Display name, falling back to the identifier when no label is set.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() { &self.id } else { &self.label }
    }

    /// Checks the table invariants: non-empty id, at least one string,
    /// unique string names, strictly positive finite frequencies.
    pub fn validate(&self) -> Result<(), TunerError> {
        if self.id.trim().is_empty() {
            return Err(TunerError::InvalidProfile("profile id is empty".into()));
        }
        if self.strings.is_empty() {
            return Err(TunerError::InvalidProfile(format!(
                "`{}` has no strings",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for target in &self.strings {
            if !seen.insert(target.name.as_str()) {
                return Err(TunerError::InvalidProfile(format!(
                    "`{}` lists string `{}` twice",
                    self.id, target.name
                )));
            }
            if !(target.frequency.is_finite() && target.frequency > 0.0) {
                return Err(TunerError::InvalidProfile(format!(
                    "`{}` string `{}` has non-positive frequency {}",
                    self.id, target.name, target.frequency
                )));
            }
        }
        Ok(())
    }
}

/// Built-in profiles, in the order the instrument picker lists them.
static BUILTIN: Lazy<Vec<InstrumentProfile>> = Lazy::new(|| {
    vec![
        InstrumentProfile::new(
            "guitar",
            "Guitar",
            &[
                ("E6", 82.0),
                ("A", 110.0),
                ("D", 147.0),
                ("G", 196.0),
                ("B", 247.0),
                ("E1", 329.628),
            ],
        ),
        InstrumentProfile::new(
            "ukulele",
            "Ukulele",
            &[("G", 196.0), ("C", 261.63), ("E", 329.628), ("A", 440.0)],
        ),
        InstrumentProfile::new(
            "charango",
            "Charango",
            &[
                ("G4", 391.995),
                ("C5", 523.251),
                ("E5", 659.255),
                ("A4", 440.0),
                ("E4", 329.628),
            ],
        ),
        InstrumentProfile::new(
            "ronroco",
            "Ronroco",
            &[
                ("D4", 293.665),
                ("G4", 391.995),
                ("B4", 493.883),
                ("E4", 329.628),
                ("B3", 246.942),
            ],
        ),
    ]
});

/// Immutable instrument table, built once at process start.
#[derive(Debug, Clone)]
pub struct InstrumentTable {
    profiles: Vec<InstrumentProfile>,
}

impl InstrumentTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN.clone(),
        }
    }

    /// The built-in table followed by `extra` profiles.
    ///
    /// Every extra profile is validated and may not reuse an existing id.
    pub fn with_profiles(extra: &[InstrumentProfile]) -> Result<Self, TunerError> {
        let mut table = Self::builtin();
        for profile in extra {
            profile.validate()?;
            if table.profiles.iter().any(|p| p.id == profile.id) {
                return Err(TunerError::InvalidProfile(format!(
                    "duplicate instrument id `{}`",
                    profile.id
                )));
            }
            table.profiles.push(profile.clone());
        }
        Ok(table)
    }

    /// Looks up a profile by identifier.
    pub fn lookup(&self, instrument_id: &str) -> Result<&InstrumentProfile, TunerError> {
        self.profiles
            .iter()
            .find(|p| p.id == instrument_id)
            .ok_or_else(|| TunerError::UnknownInstrument(instrument_id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.id.as_str())
    }

    pub fn profiles(&self) -> &[InstrumentProfile] {
        &self.profiles
    }
}

impl Default for InstrumentTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        let table = InstrumentTable::builtin();
        assert_eq!(
            table.ids().collect::<Vec<_>>(),
            vec!["guitar", "ukulele", "charango", "ronroco"]
        );
        for profile in table.profiles() {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn lookup_keeps_string_order() {
        let table = InstrumentTable::builtin();
        let guitar = table.lookup("guitar").unwrap();
        let names: Vec<_> = guitar.strings.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["E6", "A", "D", "G", "B", "E1"]);
        assert_eq!(guitar.strings[0].frequency, 82.0);
    }

    #[test]
    fn unknown_instrument_fails() {
        let table = InstrumentTable::builtin();
        assert_eq!(
            table.lookup("banjo"),
            Err(TunerError::UnknownInstrument("banjo".into()))
        );
    }

    #[test]
    fn extra_profiles_are_appended() {
        let bass = InstrumentProfile::new("bass", "Bass", &[("E", 41.2), ("A", 55.0)]);
        let table = InstrumentTable::with_profiles(&[bass.clone()]).unwrap();
        assert_eq!(table.profiles().last(), Some(&bass));
        assert_eq!(table.lookup("bass").unwrap().display_name(), "Bass");
    }

    #[test]
    fn invalid_extra_profiles_are_rejected() {
        let empty = InstrumentProfile::new("empty", "", &[]);
        assert!(matches!(
            InstrumentTable::with_profiles(&[empty]),
            Err(TunerError::InvalidProfile(_))
        ));

        let negative = InstrumentProfile::new("neg", "", &[("X", -1.0)]);
        assert!(InstrumentTable::with_profiles(&[negative]).is_err());

        let repeated = InstrumentProfile::new("rep", "", &[("X", 100.0), ("X", 200.0)]);
        assert!(InstrumentTable::with_profiles(&[repeated]).is_err());

        let clash = InstrumentProfile::new("guitar", "", &[("X", 100.0)]);
        assert!(InstrumentTable::with_profiles(&[clash]).is_err());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let profile = InstrumentProfile::new("mandolin", "", &[("G", 196.0)]);
        assert_eq!(profile.display_name(), "mandolin");
    }
}
