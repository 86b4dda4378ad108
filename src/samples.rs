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


//! Sample-based piano playback.
//!
//! This module provides:
//! - Resolution of pitched notes to the nearest recorded sample
//! - Sample loading and caching (decoded fully into memory)
//! - Voices, one per chord note, pitch shifted from their sample
//! - The playback engine that starts and stops whole chords

mod engine;
mod loader;
mod mapper;
mod voice;

pub use engine::{PlaybackEngine, PlaybackError};
pub use loader::{LoadedSample, SampleLoadError, SampleLoader};
pub use mapper::{
    calc_semitone_diff, sample_file_name, BaseNotePolicy, MapperError, NoteData, SampleMapper,
};
pub use voice::{Voice, VoiceManager};
