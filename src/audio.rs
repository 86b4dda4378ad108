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

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config;
use crate::samples::LoadedSample;

pub mod cpal;
pub mod decode;
pub mod mixer;
pub mod mock;

/// Global counter for voice source IDs.
static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Returns a new unique source ID.
pub fn next_source_id() -> u64 {
    SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio device found with name {0}")]
    DeviceNotFound(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("source {0} has already been stopped")]
    AlreadyStopped(u64),

    #[error("output context is gone")]
    Disconnected,
}

/// Whether the output context is producing audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
}

/// How a source is pitch shifted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PitchShift {
    /// Fine detune in cents.
    Detune { cents: f32 },
    /// Playback rate multiplier.
    PlaybackRate(f32),
}

impl PitchShift {
    /// Returns the shift for the given number of semitones. Detune is preferred
    /// when the context supports it.
    pub fn for_semitones(semitones: i32, supports_detune: bool) -> PitchShift {
        if supports_detune {
            PitchShift::Detune {
                cents: semitones as f32 * 100.0,
            }
        } else {
            PitchShift::PlaybackRate(2f32.powf(semitones as f32 / 12.0))
        }
    }

    /// The resulting playback rate multiplier.
    pub fn rate(&self) -> f64 {
        match self {
            PitchShift::Detune { cents } => 2f64.powf(f64::from(*cents) / 1200.0),
            PitchShift::PlaybackRate(rate) => f64::from(*rate),
        }
    }
}

/// A handle to a started source.
#[derive(Clone, Debug)]
pub struct SourceHandle {
    id: u64,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl SourceHandle {
    pub fn new(id: u64) -> SourceHandle {
        SourceHandle {
            id,
            stopped: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops the source. Stopping a source twice is an error.
    pub fn stop(&self) -> Result<(), AudioError> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Err(AudioError::AlreadyStopped(self.id));
        }
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Marks the source as having played to the end.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// The output context voices are played through.
pub trait OutputContext: Any + fmt::Display + Send + Sync {
    /// Returns whether the context is running.
    fn state(&self) -> ContextState;

    /// Starts the context if it's suspended. Calling this on a running context
    /// does nothing.
    fn resume(&self) -> Result<(), AudioError>;

    /// Whether sources can be detuned in cents. Otherwise the playback rate is used.
    fn supports_detune(&self) -> bool;

    /// Starts playing the sample immediately with the given pitch shift.
    fn start_source(
        &self,
        sample: &LoadedSample,
        shift: PitchShift,
    ) -> Result<SourceHandle, AudioError>;
}

/// Gets the output context for the given configuration. Device names starting
/// with "mock" produce a mock context.
pub fn get_context(config: &config::Audio) -> Result<Arc<dyn OutputContext>, AudioError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Context::get(device)));
    }

    Ok(Arc::new(cpal::Context::get(config)?))
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, AudioError> {
    cpal::Context::list()
}
