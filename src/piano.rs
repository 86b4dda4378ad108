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

//! The piano key space.
//!
//! A full 88-key keyboard runs from A0 to C8. Octave 0 only has A, A# and B,
//! octave 8 only has C, and every octave in between has all twelve pitch
//! classes. Each key maps to a MIDI value starting at 21 for A0.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// The lowest octave on the keyboard.
pub const LOWEST_OCTAVE: u8 = 0;

/// The highest octave on the keyboard.
pub const HIGHEST_OCTAVE: u8 = 8;

/// The MIDI value of the lowest key (A0).
pub const LOWEST_MIDI: u8 = 21;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PianoError {
    #[error("unknown note name '{0}'")]
    UnknownNoteName(String),

    #[error("invalid pitched note '{0}'")]
    InvalidPitchedNote(String),

    #[error("{note} does not exist in octave {octave}")]
    NotOnKeyboard { note: NoteName, octave: u8 },
}

/// One of the twelve pitch classes, without an octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    /// All pitch classes in semitone order, starting at C.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// The semitone class of this note, C = 0.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Looks up a note by its semitone class. The index is taken modulo 12.
    pub fn from_index(index: usize) -> NoteName {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteName {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteName::ALL
            .into_iter()
            .find(|note| note.as_str() == s)
            .ok_or_else(|| PianoError::UnknownNoteName(s.to_string()))
    }
}

impl TryFrom<String> for NoteName {
    type Error = PianoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NoteName> for String {
    fn from(note: NoteName) -> Self {
        note.as_str().to_string()
    }
}

/// Returns the notes that exist on the keyboard in the given octave.
pub fn notes_in_octave(octave: u8) -> &'static [NoteName] {
    match octave {
        LOWEST_OCTAVE => &NoteName::ALL[9..],
        HIGHEST_OCTAVE => &NoteName::ALL[..1],
        1..=7 => &NoteName::ALL,
        _ => &[],
    }
}

/// A note bound to an octave, e.g. C#4. Only keys that exist on the keyboard
/// can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchedNote {
    note: NoteName,
    octave: u8,
}

impl PitchedNote {
    pub fn new(note: NoteName, octave: u8) -> Result<PitchedNote, PianoError> {
        if !notes_in_octave(octave).contains(&note) {
            return Err(PianoError::NotOnKeyboard { note, octave });
        }
        Ok(PitchedNote { note, octave })
    }

    pub fn note(&self) -> NoteName {
        self.note
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// The MIDI value of this key.
    pub fn midi(&self) -> u8 {
        12 * (self.octave + 1) + self.note.index()
    }
}

impl fmt::Display for PitchedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

impl FromStr for PitchedNote {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| PianoError::InvalidPitchedNote(s.to_string()))?;
        let (note, octave) = s.split_at(split);
        let note: NoteName = note.parse()?;
        let octave: u8 = octave
            .parse()
            .map_err(|_| PianoError::InvalidPitchedNote(s.to_string()))?;
        PitchedNote::new(note, octave)
    }
}

impl TryFrom<String> for PitchedNote {
    type Error = PianoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchedNote> for String {
    fn from(note: PitchedNote) -> Self {
        note.to_string()
    }
}

impl PartialOrd for PitchedNote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PitchedNote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.midi().cmp(&other.midi())
    }
}

/// The derived keyboard tables.
pub struct Piano {
    /// Every key from A0 to C8 in keyboard order.
    keys: Vec<PitchedNote>,
    /// Key to MIDI value.
    key_to_midi: HashMap<PitchedNote, u8>,
}

static PIANO: LazyLock<Piano> = LazyLock::new(Piano::generate);

/// Returns the process-wide keyboard tables.
pub fn piano() -> &'static Piano {
    &PIANO
}

impl Piano {
    fn generate() -> Piano {
        let keys: Vec<PitchedNote> = (LOWEST_OCTAVE..=HIGHEST_OCTAVE)
            .flat_map(|octave| {
                notes_in_octave(octave)
                    .iter()
                    .map(move |&note| PitchedNote { note, octave })
            })
            .collect();

        let key_to_midi = keys
            .iter()
            .zip(LOWEST_MIDI..)
            .map(|(key, midi)| (*key, midi))
            .collect();

        Piano { keys, key_to_midi }
    }

    /// All keys from lowest to highest.
    pub fn keys(&self) -> &[PitchedNote] {
        &self.keys
    }

    /// Returns the MIDI value for the given key.
    pub fn note_to_midi(&self, note: &PitchedNote) -> Option<u8> {
        self.key_to_midi.get(note).copied()
    }

    /// Returns the key for the given MIDI value, if it's on the keyboard.
    pub fn midi_to_note(&self, midi: u8) -> Option<PitchedNote> {
        midi.checked_sub(LOWEST_MIDI)
            .and_then(|index| self.keys.get(index as usize))
            .copied()
    }
}

impl fmt::Debug for Piano {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Piano")
            .field("keys", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(s: &str) -> PitchedNote {
        s.parse().unwrap()
    }

    #[test]
    fn test_keyboard_bounds() {
        let keys = piano().keys();
        assert_eq!(keys.len(), 88);
        assert_eq!(keys.first().unwrap().to_string(), "A0");
        assert_eq!(keys.last().unwrap().to_string(), "C8");

        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_notes_by_octave() {
        assert_eq!(
            notes_in_octave(0),
            &[NoteName::A, NoteName::ASharp, NoteName::B]
        );
        assert_eq!(notes_in_octave(8), &[NoteName::C]);
        for octave in 1..=7 {
            assert_eq!(notes_in_octave(octave).len(), 12);
        }
        assert!(notes_in_octave(9).is_empty());
    }

    #[test]
    fn test_midi_bounds() {
        assert_eq!(piano().note_to_midi(&key("A0")), Some(21));
        assert_eq!(piano().note_to_midi(&key("C4")), Some(60));
        assert_eq!(piano().note_to_midi(&key("C8")), Some(108));
        assert_eq!(piano().midi_to_note(20), None);
        assert_eq!(piano().midi_to_note(109), None);
    }

    #[test]
    fn test_midi_round_trip() {
        for key in piano().keys() {
            let midi = piano().note_to_midi(key).unwrap();
            assert_eq!(midi, key.midi());
            assert_eq!(piano().midi_to_note(midi), Some(*key));
        }
    }

    #[test]
    fn test_parse_pitched_notes() {
        let note = key("C#4");
        assert_eq!(note.note(), NoteName::CSharp);
        assert_eq!(note.octave(), 4);

        assert_eq!(
            "C0".parse::<PitchedNote>(),
            Err(PianoError::NotOnKeyboard {
                note: NoteName::C,
                octave: 0
            })
        );
        assert_eq!(
            "D8".parse::<PitchedNote>(),
            Err(PianoError::NotOnKeyboard {
                note: NoteName::D,
                octave: 8
            })
        );
        assert!("H4".parse::<PitchedNote>().is_err());
        assert!("C".parse::<PitchedNote>().is_err());
        assert!("Cx".parse::<NoteName>().is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let json = serde_json::to_string(&key("A#2")).unwrap();
        assert_eq!(json, "\"A#2\"");
        let parsed: PitchedNote = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key("A#2"));

        let note: NoteName = serde_json::from_str("\"F#\"").unwrap();
        assert_eq!(note, NoteName::FSharp);
        assert!(serde_json::from_str::<NoteName>("\"Gb\"").is_err());
    }
}
