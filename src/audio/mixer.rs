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

// Core voice mixing logic that can be used by both CPAL and test implementations
use crate::audio::{next_source_id, PitchShift, SourceHandle};
use crate::samples::LoadedSample;

/// Represents an active voice in the mixer.
pub struct ActiveSource {
    /// The sample being played.
    sample: LoadedSample,
    /// Current read position in source frames.
    position: f64,
    /// Source frames advanced per output frame.
    step: f64,
    /// Shared stop/finish state with the voice that owns this source.
    handle: SourceHandle,
}

impl ActiveSource {
    /// Creates a new source for the sample, pitch shifted and resampled to the
    /// output sample rate.
    pub fn new(sample: &LoadedSample, shift: PitchShift, output_sample_rate: u32) -> ActiveSource {
        let step =
            shift.rate() * f64::from(sample.sample_rate()) / f64::from(output_sample_rate.max(1));
        ActiveSource {
            sample: sample.clone(),
            position: 0.0,
            step,
            handle: SourceHandle::new(next_source_id()),
        }
    }

    /// Returns a handle sharing this source's stop state.
    pub fn handle(&self) -> SourceHandle {
        self.handle.clone()
    }

    /// Reads the interpolated value for the given output channel at the current
    /// position. Mono samples are copied to every channel.
    fn read(&self, channel: usize) -> f32 {
        let channels = usize::from(self.sample.channel_count());
        let channel = channel.min(channels.saturating_sub(1));
        let frame = self.position.floor() as usize;
        let frac = self.position.fract() as f32;

        let s0 = self.sample.value(frame, channel).unwrap_or(0.0);
        let s1 = self.sample.value(frame + 1, channel).unwrap_or(s0);

        // Linear interpolation
        s0 + (s1 - s0) * frac
    }

    fn is_done(&self) -> bool {
        self.handle.is_stopped() || self.position >= self.sample.frames() as f64
    }
}

/// Core mixing logic that's independent of any audio backend.
pub struct AudioMixer {
    /// Active voices currently playing.
    sources: Vec<ActiveSource>,
    /// Number of output channels.
    num_channels: u16,
    /// Output sample rate.
    sample_rate: u32,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(num_channels: u16, sample_rate: u32) -> Self {
        Self {
            sources: Vec::new(),
            num_channels,
            sample_rate,
        }
    }

    /// Adds a new voice to the mixer.
    pub fn add_source(&mut self, source: ActiveSource) {
        self.sources.push(source);
    }

    /// Mixes all active voices into the interleaved output buffer. Voices that
    /// are stopped or have played to the end are dropped.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);

        let channels = usize::from(self.num_channels);
        if channels == 0 {
            return;
        }

        for frame in output.chunks_mut(channels) {
            for source in self.sources.iter_mut() {
                if source.is_done() {
                    continue;
                }
                for (channel, out) in frame.iter_mut().enumerate() {
                    *out += source.read(channel);
                }
                source.position += source.step;
            }
        }

        self.sources.retain(|source| {
            if source.is_done() {
                source.handle.finish();
                return false;
            }
            true
        });
    }

    /// Returns the number of active voices.
    pub fn active_count(&self) -> usize {
        self.sources.len()
    }

    /// Gets the number of output channels.
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Gets the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
