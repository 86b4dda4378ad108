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

//! Random chord generation and voicing.
//!
//! Voicing spreads the pitch classes of a chord over octaves 2 through 5,
//! optionally doubling voices, without ever using the same key twice.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::chords::{build_chord_from_root, Chord, ChordType};
use crate::piano::{notes_in_octave, NoteName, PitchedNote};

/// The number of times chord generation is attempted before giving up.
pub const MAX_ATTEMPTS: u32 = 10;

/// The octaves notes may be voiced in.
pub const VOICING_OCTAVES: RangeInclusive<u8> = 2..=5;

/// Voice counts picked from when a polyphonic chord has no explicit size.
const POLYPHONIC_VOICES: [usize; 3] = [4, 5, 6];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VoicingError {
    #[error("no available octave for {note}")]
    VoicingExhausted { note: NoteName },

    #[error("unable to generate a valid chord after {attempts} attempts")]
    ChordGenerationFailed { attempts: u32 },

    #[error("no chord type has at most {max_size} notes")]
    NoChordType { max_size: usize },
}

/// Picks a chord type uniformly at random. With a maximum size, only chord types
/// with at most that many notes are considered.
pub fn select_random_chord_type<R: Rng + ?Sized>(
    rng: &mut R,
    max_size: Option<usize>,
) -> Result<ChordType, VoicingError> {
    let candidates: Vec<ChordType> = ChordType::ALL
        .into_iter()
        .filter(|chord_type| max_size.map_or(true, |max| chord_type.formula().len() <= max))
        .collect();

    candidates
        .choose(rng)
        .copied()
        .ok_or(VoicingError::NoChordType {
            max_size: max_size.unwrap_or_default(),
        })
}

/// Picks a root note uniformly at random.
pub fn select_random_root<R: Rng + ?Sized>(rng: &mut R) -> NoteName {
    NoteName::ALL[rng.gen_range(0..NoteName::ALL.len())]
}

/// Returns true if the note may be voiced in the given octave. The boundary
/// octaves only allow the part of the octave that sits inside the range: A to B
/// at the bottom, C to G# at the top.
fn octave_allowed(note: NoteName, octave: u8) -> bool {
    let start = *VOICING_OCTAVES.start();
    let end = *VOICING_OCTAVES.end();

    if !notes_in_octave(octave).contains(&note) {
        return false;
    }

    if octave == start {
        matches!(note, NoteName::A | NoteName::ASharp | NoteName::B)
    } else if octave == end {
        !matches!(note, NoteName::A | NoteName::ASharp | NoteName::B)
    } else {
        octave > start && octave < end
    }
}

/// Assigns a random octave to the note, skipping keys that are already used.
/// The chosen key is added to `used`.
pub fn spread_note_to_octave<R: Rng + ?Sized>(
    rng: &mut R,
    note: NoteName,
    used: &mut HashSet<PitchedNote>,
) -> Result<PitchedNote, VoicingError> {
    let available: Vec<PitchedNote> = VOICING_OCTAVES
        .filter(|&octave| octave_allowed(note, octave))
        .filter_map(|octave| PitchedNote::new(note, octave).ok())
        .filter(|key| !used.contains(key))
        .collect();

    let key = *available
        .choose(rng)
        .ok_or(VoicingError::VoicingExhausted { note })?;
    used.insert(key);
    Ok(key)
}

/// Voices the given pitch classes.
///
/// With a target size, or when polyphonic, the notes are padded up to the target
/// voice count (a random choice of 4, 5 or 6 if no size is given) by doubling
/// random notes from the chord. Each note then gets its own octave and the
/// result is sorted by MIDI value.
pub fn pitchify<R: Rng + ?Sized>(
    rng: &mut R,
    notes: &[NoteName],
    target_size: Option<usize>,
    is_polyphonic: bool,
) -> Result<Vec<PitchedNote>, VoicingError> {
    let mut spread_notes = notes.to_vec();

    if (target_size.is_some() || is_polyphonic) && !notes.is_empty() {
        let voices = match target_size {
            Some(size) => size,
            None => *POLYPHONIC_VOICES.choose(rng).unwrap_or(&notes.len()),
        };

        while spread_notes.len() < voices {
            spread_notes.push(notes[rng.gen_range(0..notes.len())]);
        }
    }

    let mut used = HashSet::with_capacity(spread_notes.len());
    let mut pitched = spread_notes
        .into_iter()
        .map(|note| spread_note_to_octave(rng, note, &mut used))
        .collect::<Result<Vec<PitchedNote>, VoicingError>>()?;
    pitched.sort();

    Ok(pitched)
}

/// A single end-to-end generation attempt.
fn try_generate_chord<R: Rng + ?Sized>(
    rng: &mut R,
    is_polyphonic: bool,
    chord_size: Option<usize>,
) -> Result<Chord, VoicingError> {
    let root = select_random_root(rng);
    let chord_type = select_random_chord_type(rng, chord_size)?;
    let formula = chord_type.formula().to_vec();
    let notes = build_chord_from_root(&formula, root);
    let pitched_notes = pitchify(rng, &notes, chord_size, is_polyphonic)?;

    Ok(Chord {
        root,
        chord_type,
        formula,
        notes,
        pitched_notes,
        is_polyphonic,
    })
}

/// Generates a random, voiced chord. Failed attempts are retried with a fresh
/// root and chord type, up to [`MAX_ATTEMPTS`] times.
pub fn generate_random_chord<R: Rng + ?Sized>(
    rng: &mut R,
    is_polyphonic: bool,
    chord_size: Option<usize>,
) -> Result<Chord, VoicingError> {
    for attempt in 1..=MAX_ATTEMPTS {
        match try_generate_chord(rng, is_polyphonic, chord_size) {
            Ok(chord) => {
                debug!(
                    attempt,
                    root = %chord.root,
                    chord_type = %chord.chord_type,
                    voices = chord.pitched_notes.len(),
                    "Chord generated"
                );
                return Ok(chord);
            }
            Err(e) => {
                warn!(attempt, err = %e, "Failed to generate chord, retrying");
            }
        }
    }

    Err(VoicingError::ChordGenerationFailed {
        attempts: MAX_ATTEMPTS,
    })
}
