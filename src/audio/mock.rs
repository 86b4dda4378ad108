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

use std::{fmt, time::Duration};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::audio::{
    next_source_id, AudioError, ContextState, OutputContext, PitchShift, SourceHandle,
};
use crate::samples::LoadedSample;

/// A source started on the mock context.
#[derive(Clone, Debug)]
pub struct StartedSource {
    pub handle: SourceHandle,
    pub shift: PitchShift,
    pub duration: Duration,
    /// The context state at the time the source was started.
    pub state: ContextState,
}

/// A mock output context. Doesn't actually play anything, but records every
/// source it's asked to start.
pub struct Context {
    name: String,
    supports_detune: bool,
    state: Mutex<ContextState>,
    resume_count: Mutex<usize>,
    started: Mutex<Vec<StartedSource>>,
}

impl Context {
    /// Gets the given mock context. Names containing "rate" produce a context
    /// that can only shift pitch through the playback rate.
    pub fn get(name: &str) -> Context {
        Context {
            name: name.to_string(),
            supports_detune: !name.contains("rate"),
            state: Mutex::new(ContextState::Suspended),
            resume_count: Mutex::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    /// The number of times the context actually transitioned to running.
    pub fn resume_count(&self) -> usize {
        *self.resume_count.lock()
    }

    /// All sources started so far.
    pub fn started(&self) -> Vec<StartedSource> {
        self.started.lock().clone()
    }
}

impl OutputContext for Context {
    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn resume(&self) -> Result<(), AudioError> {
        let mut state = self.state.lock();
        if *state == ContextState::Suspended {
            info!(context = self.name, "Resuming mock context.");
            *state = ContextState::Running;
            *self.resume_count.lock() += 1;
        }
        Ok(())
    }

    fn supports_detune(&self) -> bool {
        self.supports_detune
    }

    fn start_source(
        &self,
        sample: &LoadedSample,
        shift: PitchShift,
    ) -> Result<SourceHandle, AudioError> {
        let handle = SourceHandle::new(next_source_id());
        debug!(context = self.name, id = handle.id(), shift = ?shift, "Starting mock source.");
        self.started.lock().push(StartedSource {
            handle: handle.clone(),
            shift,
            duration: sample.duration(),
            state: self.state(),
        });
        Ok(handle)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_is_idempotent() {
        let context = Context::get("mock");
        assert_eq!(context.state(), ContextState::Suspended);
        context.resume().unwrap();
        context.resume().unwrap();
        assert_eq!(context.state(), ContextState::Running);
        assert_eq!(context.resume_count(), 1);
    }

    #[test]
    fn test_records_started_sources() {
        let context = Context::get("mock-rate");
        assert!(!context.supports_detune());

        let sample = LoadedSample::from_interleaved(vec![0.0; 44100], 1, 44100);
        let handle = context
            .start_source(&sample, PitchShift::PlaybackRate(1.5))
            .unwrap();

        let started = context.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].handle.id(), handle.id());
        assert_eq!(started[0].shift, PitchShift::PlaybackRate(1.5));
        assert_eq!(started[0].duration, Duration::from_secs(1));
        assert_eq!(started[0].state, ContextState::Suspended);
    }
}
