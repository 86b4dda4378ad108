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

//! Voice management for chord playback.
//!
//! Each note of a chord plays as one voice. The voices of the most recently
//! played chord form the current cohort.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::audio::{AudioError, OutputContext, PitchShift, SourceHandle};
use crate::piano::PitchedNote;
use crate::samples::{LoadedSample, NoteData};

/// Represents an active voice playing a sample.
#[derive(Debug)]
pub struct Voice {
    /// The note being played.
    note: PitchedNote,
    /// The sample file the voice was shifted from.
    path: PathBuf,
    /// Semitones the sample was shifted by.
    semitone_diff: i32,
    /// Handle to the started source.
    handle: SourceHandle,
    /// Length of the sample buffer.
    duration: Duration,
    /// When this voice started playing.
    start_time: Instant,
}

impl Voice {
    /// Starts the sample immediately, shifted to the note's pitch. Detune is
    /// used when the context supports it, otherwise the playback rate.
    pub fn start(
        context: &dyn OutputContext,
        sample: &LoadedSample,
        data: &NoteData,
    ) -> Result<Voice, AudioError> {
        let shift = PitchShift::for_semitones(data.semitone_diff, context.supports_detune());
        let handle = context.start_source(sample, shift)?;
        debug!(
            id = handle.id(),
            note = %data.note,
            anchor = %data.anchor,
            shift = ?shift,
            "Started voice"
        );

        Ok(Voice {
            note: data.note,
            path: data.path.clone(),
            semitone_diff: data.semitone_diff,
            handle,
            duration: sample.duration(),
            start_time: Instant::now(),
        })
    }

    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    pub fn note(&self) -> PitchedNote {
        self.note
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn semitone_diff(&self) -> i32 {
        self.semitone_diff
    }

    /// Returns the length of the underlying sample buffer.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stops the voice. Voices that are already stopped are ignored.
    pub fn stop(&self) {
        if let Err(e) = self.handle.stop() {
            debug!(id = self.id(), err = %e, "Voice already stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }
}

/// Tracks the voices of the current chord.
#[derive(Debug, Default)]
pub struct VoiceManager {
    voices: Vec<Voice>,
}

impl VoiceManager {
    /// Creates a new voice manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current cohort. The previous voices are forgotten but keep
    /// playing until they end on their own.
    pub fn replace(&mut self, voices: Vec<Voice>) {
        self.voices = voices;
    }

    /// Stops every voice in the current cohort.
    pub fn stop_all(&mut self) {
        for voice in &self.voices {
            voice.stop();
        }
    }

    /// Returns the number of voices in the current cohort.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Returns the duration of the longest sample in the cohort.
    pub fn longest_duration(&self) -> Duration {
        self.voices
            .iter()
            .map(Voice::duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
