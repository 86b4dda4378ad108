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

//! Playback engine that turns pitched notes into simultaneously started voices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::loader::{LoadedSample, SampleLoadError, SampleLoader};
use super::mapper::{MapperError, NoteData, SampleMapper};
use super::voice::{Voice, VoiceManager};
use crate::audio::{self, AudioError, ContextState, OutputContext};
use crate::config;
use crate::piano::PitchedNote;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    SampleLoad(#[from] SampleLoadError),
}

/// Plays chords through a lazily opened output context.
pub struct PlaybackEngine {
    /// The audio configuration used to open the context.
    audio_config: config::Audio,
    /// The output context, opened on first use.
    context: Mutex<Option<Arc<dyn OutputContext>>>,
    /// Resolves notes to sample files.
    mapper: SampleMapper,
    /// Loads and caches decoded samples.
    loader: SampleLoader,
    /// The voices of the most recent chord.
    voices: Mutex<VoiceManager>,
    /// Set while a chord is playing. Cleared by the auto-stop deadline.
    is_playing: Arc<AtomicBool>,
}

impl PlaybackEngine {
    /// Creates a new playback engine. No audio device is opened until the
    /// first playback.
    pub fn new(settings: &config::Settings) -> Self {
        let samples = settings.samples();
        Self {
            audio_config: settings.audio().clone(),
            context: Mutex::new(None),
            mapper: SampleMapper::new(&samples.directory(), samples.extension(), samples.policy()),
            loader: SampleLoader::new(samples.cache()),
            voices: Mutex::new(VoiceManager::new()),
            is_playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a playback engine that plays through the given context.
    pub fn with_context(context: Arc<dyn OutputContext>, samples: &config::Samples) -> Self {
        Self {
            audio_config: config::Audio::default(),
            context: Mutex::new(Some(context)),
            mapper: SampleMapper::new(&samples.directory(), samples.extension(), samples.policy()),
            loader: SampleLoader::new(samples.cache()),
            voices: Mutex::new(VoiceManager::new()),
            is_playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the output context, opening it if needed, and resumes it if it's
    /// suspended. Safe to call before every playback.
    pub fn init_context(&self) -> Result<Arc<dyn OutputContext>, AudioError> {
        let context = {
            let mut context = self.context.lock();
            match context.as_ref() {
                Some(context) => context.clone(),
                None => {
                    let opened = audio::get_context(&self.audio_config)?;
                    info!(context = %opened, "Opened output context");
                    *context = Some(opened.clone());
                    opened
                }
            }
        };

        if context.state() == ContextState::Suspended {
            context.resume()?;
        }
        Ok(context)
    }

    /// Loads the decoded sample at the given path.
    pub async fn load_sample(&self, data: &NoteData) -> Result<LoadedSample, SampleLoadError> {
        self.loader.load(&data.path).await
    }

    /// Resolves every note and loads its sample. All loads run concurrently and
    /// this only returns once every sample is ready. Order is preserved.
    pub async fn setup_chord(
        &self,
        notes: &[PitchedNote],
    ) -> Result<Vec<(NoteData, LoadedSample)>, PlaybackError> {
        let resolved = self.mapper.setup_chord(notes)?;
        let samples = try_join_all(resolved.iter().map(|data| self.load_sample(data))).await?;
        Ok(resolved.into_iter().zip(samples).collect())
    }

    /// Starts a single voice immediately.
    pub fn play_note(
        &self,
        context: &dyn OutputContext,
        sample: &LoadedSample,
        data: &NoteData,
    ) -> Result<Voice, AudioError> {
        Voice::start(context, sample, data)
    }

    /// Plays every note of a chord at once. Returns the auto-stop deadline,
    /// after which the playing flag clears on its own. Voices from an earlier
    /// chord keep playing.
    pub async fn play_chord(&self, notes: &[PitchedNote]) -> Result<Duration, PlaybackError> {
        self.is_playing.store(true, Ordering::SeqCst);
        let result = self.start_chord(notes).await;
        if result.is_err() {
            self.is_playing.store(false, Ordering::SeqCst);
        }
        let deadline = result?;

        let is_playing = self.is_playing.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            is_playing.store(false, Ordering::SeqCst);
        });

        Ok(deadline)
    }

    async fn start_chord(&self, notes: &[PitchedNote]) -> Result<Duration, PlaybackError> {
        let context = self.init_context()?;
        let prepared = self.setup_chord(notes).await?;

        let cohort = prepared
            .iter()
            .map(|(data, sample)| self.play_note(context.as_ref(), sample, data))
            .collect::<Result<Vec<Voice>, AudioError>>()?;

        let mut voices = self.voices.lock();
        voices.replace(cohort);
        let deadline = voices.longest_duration();
        info!(
            notes = ?notes.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
            voices = voices.active_count(),
            deadline = ?deadline,
            "Playing chord"
        );
        Ok(deadline)
    }

    /// Stops every voice of the current chord and clears the playing flag.
    pub fn stop_chord(&self) {
        let mut voices = self.voices.lock();
        debug!(voices = voices.active_count(), "Stopping chord");
        voices.stop_all();
        voices.replace(Vec::new());
        self.is_playing.store(false, Ordering::SeqCst);
    }

    /// Returns true while a chord is playing.
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    /// Returns the number of voices in the current chord.
    pub fn active_voices(&self) -> usize {
        self.voices.lock().active_count()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::audio::{mock, PitchShift};
    use crate::samples::BaseNotePolicy;
    use crate::testutil::audio_test_utils::{generate_sine, write_wav};

    fn key(s: &str) -> PitchedNote {
        s.parse().unwrap()
    }

    /// Writes fixtures for C4 (0.25s), D#4 (0.5s) and F#4 (0.75s).
    fn write_fixtures(dir: &Path) {
        for (name, seconds) in [("C4v9", 0.25), ("Dsh4v9", 0.5), ("Fsh4v9", 0.75)] {
            write_wav(
                &dir.join(format!("{}.wav", name)),
                vec![generate_sine(440.0, 0.5, 44100, seconds)],
                44100,
            )
            .unwrap();
        }
    }

    fn engine(dir: &Path, device: &str) -> (Arc<mock::Context>, PlaybackEngine) {
        let context = Arc::new(mock::Context::get(device));
        let samples = config::Samples::new(
            dir.to_str().unwrap(),
            BaseNotePolicy::Full,
            true,
        );
        let engine = PlaybackEngine::with_context(context.clone(), &samples);
        (context, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_chord_deadline() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (context, engine) = engine(tempdir.path(), "mock");

        let deadline = engine
            .play_chord(&[key("C4"), key("E4"), key("G4")])
            .await
            .unwrap();
        assert_eq!(deadline, Duration::from_millis(750));
        assert!(engine.is_playing());
        assert_eq!(engine.active_voices(), 3);
        assert_eq!(context.resume_count(), 1);

        let started = context.started();
        assert_eq!(started.len(), 3);
        assert!(started.iter().all(|s| s.state == ContextState::Running));
        assert_eq!(started[0].shift, PitchShift::Detune { cents: 0.0 });
        assert_eq!(started[1].shift, PitchShift::Detune { cents: 100.0 });
        assert_eq!(started[2].shift, PitchShift::Detune { cents: 100.0 });

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(engine.is_playing());

        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert!(!engine.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_chord() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (context, engine) = engine(tempdir.path(), "mock");

        engine.play_chord(&[key("C4"), key("C#4")]).await.unwrap();
        engine.stop_chord();
        assert!(!engine.is_playing());
        assert_eq!(engine.active_voices(), 0);
        assert!(context.started().iter().all(|s| s.handle.is_stopped()));

        // Stopping again is tolerated.
        engine.stop_chord();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_fallback() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (context, engine) = engine(tempdir.path(), "mock-rate");

        engine.play_chord(&[key("F4")]).await.unwrap();
        let started = context.started();
        assert_eq!(
            started[0].shift,
            PitchShift::PlaybackRate(2f32.powf(-1.0 / 12.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_sample() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (context, engine) = engine(tempdir.path(), "mock");

        let result = engine.play_chord(&[key("C4"), key("A4")]).await;
        assert!(matches!(
            result,
            Err(PlaybackError::SampleLoad(SampleLoadError::Io { .. }))
        ));
        assert!(!engine.is_playing());
        assert!(context.started().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_chord_keeps_first_cohort() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (context, engine) = engine(tempdir.path(), "mock");

        engine.play_chord(&[key("C4")]).await.unwrap();
        engine.play_chord(&[key("E4"), key("G4")]).await.unwrap();
        assert_eq!(engine.active_voices(), 2);

        engine.stop_chord();
        let started = context.started();
        assert_eq!(started.len(), 3);
        assert!(!started[0].handle.is_stopped());
        assert!(started[1].handle.is_stopped());
        assert!(started[2].handle.is_stopped());
    }

    #[tokio::test]
    async fn test_setup_chord_shares_samples() {
        let tempdir = tempfile::tempdir().unwrap();
        write_fixtures(tempdir.path());
        let (_, engine) = engine(tempdir.path(), "mock");

        // C4 and C#4 both resolve to the C4 sample.
        let prepared = engine.setup_chord(&[key("C4"), key("C#4")]).await.unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].0.path, prepared[1].0.path);
        assert_eq!(prepared[1].0.semitone_diff, 1);
        assert!(prepared[0].1.shares_data(&prepared[1].1));
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = PlaybackEngine::new(&config::Settings::default());
        assert!(!engine.is_playing());
        assert_eq!(engine.active_voices(), 0);
    }
}
