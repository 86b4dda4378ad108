// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Chord formulas and their application to a root note.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::piano::{NoteName, PitchedNote};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown chord type '{0}'")]
pub struct UnknownChordType(pub String);

/// The chord types the trainer knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Add6,
    MinorAdd6,
    Sus4,
    Sus2,
    DoubleDim,
    Maj7,
    Min7,
    MinMaj7,
    Dom9,
    Min79,
    Dom7b9,
}

impl ChordType {
    /// The full catalog, in a stable order.
    pub const ALL: [ChordType; 16] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Dominant7,
        ChordType::Add6,
        ChordType::MinorAdd6,
        ChordType::Sus4,
        ChordType::Sus2,
        ChordType::DoubleDim,
        ChordType::Maj7,
        ChordType::Min7,
        ChordType::MinMaj7,
        ChordType::Dom9,
        ChordType::Min79,
        ChordType::Dom7b9,
    ];

    /// Semitone offsets from the root. Extended chords go past the octave.
    pub fn formula(self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Dominant7 => &[0, 4, 7, 10],
            ChordType::Add6 => &[0, 4, 7, 9],
            ChordType::MinorAdd6 => &[0, 3, 7, 9],
            ChordType::Sus4 => &[0, 5, 7],
            ChordType::Sus2 => &[0, 2, 7],
            ChordType::DoubleDim => &[0, 3, 6, 9],
            ChordType::Maj7 => &[0, 4, 7, 11],
            ChordType::Min7 => &[0, 3, 7, 10],
            ChordType::MinMaj7 => &[0, 3, 7, 11],
            ChordType::Dom9 => &[0, 4, 7, 10, 14],
            ChordType::Min79 => &[0, 3, 7, 10, 14],
            ChordType::Dom7b9 => &[0, 4, 7, 10, 13],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordType::Major => "major",
            ChordType::Minor => "minor",
            ChordType::Diminished => "diminished",
            ChordType::Augmented => "augmented",
            ChordType::Dominant7 => "dominant7",
            ChordType::Add6 => "add6",
            ChordType::MinorAdd6 => "minorAdd6",
            ChordType::Sus4 => "sus4",
            ChordType::Sus2 => "sus2",
            ChordType::DoubleDim => "doubleDim",
            ChordType::Maj7 => "maj7",
            ChordType::Min7 => "min7",
            ChordType::MinMaj7 => "minMaj7",
            ChordType::Dom9 => "dom9",
            ChordType::Min79 => "min79",
            ChordType::Dom7b9 => "dom7b9",
        }
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChordType {
    type Err = UnknownChordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordType::ALL
            .into_iter()
            .find(|chord_type| chord_type.name() == s)
            .ok_or_else(|| UnknownChordType(s.to_string()))
    }
}

/// Moves the root up by the interval and returns the resulting pitch class.
pub fn apply_interval_to_root(root: NoteName, interval: u8) -> NoteName {
    NoteName::from_index(root.index() as usize + interval as usize)
}

/// Builds the pitch classes of a chord, one per formula offset, in formula order.
/// Offsets that wrap past the octave can land on a class already present.
pub fn build_chord_from_root(formula: &[u8], root: NoteName) -> Vec<NoteName> {
    formula
        .iter()
        .map(|&interval| apply_interval_to_root(root, interval))
        .collect()
}

/// A generated chord.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub root: NoteName,
    #[serde(rename = "type")]
    pub chord_type: ChordType,
    pub formula: Vec<u8>,
    /// Pitch classes, one per formula offset.
    pub notes: Vec<NoteName>,
    /// Voiced notes in ascending MIDI order.
    pub pitched_notes: Vec<PitchedNote>,
    pub is_polyphonic: bool,
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let voicing: Vec<String> = self.pitched_notes.iter().map(|n| n.to_string()).collect();
        write!(
            f,
            "{} {} [{}]",
            self.root,
            self.chord_type,
            voicing.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_wraps() {
        assert_eq!(apply_interval_to_root(NoteName::C, 12), NoteName::C);
        assert_eq!(apply_interval_to_root(NoteName::B, 1), NoteName::C);
        assert_eq!(apply_interval_to_root(NoteName::A, 14), NoteName::B);
    }

    #[test]
    fn test_c_major() {
        assert_eq!(
            build_chord_from_root(ChordType::Major.formula(), NoteName::C),
            vec![NoteName::C, NoteName::E, NoteName::G]
        );
    }

    #[test]
    fn test_chord_length_matches_formula() {
        for chord_type in ChordType::ALL {
            for root in NoteName::ALL {
                let notes = build_chord_from_root(chord_type.formula(), root);
                assert_eq!(notes.len(), chord_type.formula().len());
                assert_eq!(notes[0], root);
            }
        }
    }

    #[test]
    fn test_extended_chord_keeps_duplicates() {
        // An offset of 12 lands back on the root.
        assert_eq!(
            build_chord_from_root(&[0, 4, 12], NoteName::D),
            vec![NoteName::D, NoteName::FSharp, NoteName::D]
        );
        assert_eq!(
            build_chord_from_root(ChordType::Dom9.formula(), NoteName::D),
            vec![
                NoteName::D,
                NoteName::FSharp,
                NoteName::A,
                NoteName::C,
                NoteName::E
            ]
        );
    }

    #[test]
    fn test_names_match_serde() {
        for chord_type in ChordType::ALL {
            let json = serde_json::to_string(&chord_type).unwrap();
            assert_eq!(json, format!("\"{}\"", chord_type.name()));
            assert_eq!(chord_type.name().parse::<ChordType>(), Ok(chord_type));
        }
        assert!("power".parse::<ChordType>().is_err());
    }
}
