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


//! Maps pitched notes onto the sparse set of recorded base samples.
//!
//! Only some keys have a recording. Every other key is played by picking the
//! nearest recorded anchor and shifting it by the semitone difference.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::piano::{piano, PitchedNote};

/// The string sharps are replaced with in sample file names.
const SHARP_SUBSTITUTE: &str = "sh";

/// The velocity layer suffix of the recorded samples.
const VELOCITY_SUFFIX: &str = "v9";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapperError {
    #[error("no base sample exists for MIDI value {0}")]
    NoAnchor(u8),
}

/// Which MIDI values have a recorded base sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseNotePolicy {
    /// Every third MIDI value is recorded.
    #[default]
    Full,
    /// Only the C of each octave is recorded.
    Demo,
}

impl BaseNotePolicy {
    /// Returns the nearest MIDI value with a recorded sample.
    pub fn calc_base_note(self, midi: u8) -> u8 {
        match self {
            BaseNotePolicy::Full => match midi % 3 {
                0 => midi,
                1 => midi - 1,
                _ => midi + 1,
            },
            BaseNotePolicy::Demo => {
                // Above the tritone rounds up to the next C.
                if midi % 12 > 6 {
                    (midi / 12 + 1) * 12
                } else {
                    midi / 12 * 12
                }
            }
        }
    }
}

/// Signed semitone distance from the base sample to the requested pitch.
pub fn calc_semitone_diff(midi: u8, base_midi: u8) -> i32 {
    i32::from(midi) - i32::from(base_midi)
}

/// Builds the file name for the sample recorded at the given key.
pub fn sample_file_name(anchor: &PitchedNote, extension: &str) -> String {
    format!(
        "{}{}.{}",
        anchor.to_string().replace('#', SHARP_SUBSTITUTE),
        VELOCITY_SUFFIX,
        extension
    )
}

/// A resolved sample and the pitch shift needed to play the requested note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteData {
    pub note: PitchedNote,
    pub anchor: PitchedNote,
    pub path: PathBuf,
    pub semitone_diff: i32,
}

/// Resolves notes to sample files.
#[derive(Clone, Debug)]
pub struct SampleMapper {
    directory: PathBuf,
    extension: String,
    policy: BaseNotePolicy,
}

impl SampleMapper {
    pub fn new(directory: &Path, extension: &str, policy: BaseNotePolicy) -> SampleMapper {
        SampleMapper {
            directory: directory.to_path_buf(),
            extension: extension.to_string(),
            policy,
        }
    }

    pub fn policy(&self) -> BaseNotePolicy {
        self.policy
    }

    /// Resolves the sample and semitone offset for a note.
    pub fn note_data(&self, note: &PitchedNote) -> Result<NoteData, MapperError> {
        let midi = note.midi();
        let base = self.policy.calc_base_note(midi);
        let anchor = piano()
            .midi_to_note(base)
            .ok_or(MapperError::NoAnchor(base))?;
        let semitone_diff = calc_semitone_diff(midi, base);
        let path = self
            .directory
            .join(sample_file_name(&anchor, &self.extension));

        debug!(%note, %anchor, semitone_diff, "Resolved sample");

        Ok(NoteData {
            note: *note,
            anchor,
            path,
            semitone_diff,
        })
    }

    /// Resolves every note of a chord, in order.
    pub fn setup_chord(&self, notes: &[PitchedNote]) -> Result<Vec<NoteData>, MapperError> {
        notes.iter().map(|note| self.note_data(note)).collect()
    }
}
