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


//! Sample loading and caching.
//!
//! Piano samples are decoded fully into memory. Decoded samples are shared
//! between every voice that plays them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::audio::decode::{decode_file, DecodeError};

#[derive(Debug, thiserror::Error)]
pub enum SampleLoadError {
    #[error("failed to read sample {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode sample {}: {source}", path.display())]
    Decode { path: PathBuf, source: DecodeError },

    #[error("sample loading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A decoded sample that can be played back.
/// The sample data is stored in an Arc for efficient sharing between voices.
#[derive(Clone)]
pub struct LoadedSample {
    /// The sample data as f32 samples (interleaved if multi-channel).
    data: Arc<Vec<f32>>,
    /// Number of channels in the sample.
    channel_count: u16,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl LoadedSample {
    /// Wraps already decoded interleaved samples.
    pub fn from_interleaved(data: Vec<f32>, channel_count: u16, sample_rate: u32) -> Self {
        Self {
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames.
    pub fn frames(&self) -> usize {
        self.data.len() / usize::from(self.channel_count)
    }

    /// Returns the playback duration at the sample's own rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Returns the value at the given frame and channel.
    pub fn value(&self, frame: usize, channel: usize) -> Option<f32> {
        if channel >= usize::from(self.channel_count) {
            return None;
        }
        self.data
            .get(frame * usize::from(self.channel_count) + channel)
            .copied()
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    #[cfg(test)]
    pub(crate) fn shares_data(&self, other: &LoadedSample) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for LoadedSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedSample")
            .field("frames", &self.frames())
            .field("channel_count", &self.channel_count)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Manages loading and caching of sample data.
pub struct SampleLoader {
    /// Cache of loaded samples by file path. None when caching is disabled.
    cache: Option<Mutex<HashMap<PathBuf, LoadedSample>>>,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new(cache: bool) -> Self {
        Self {
            cache: cache.then(|| Mutex::new(HashMap::new())),
        }
    }

    /// Loads a sample from a file into memory.
    /// Returns a cached version if already loaded.
    pub async fn load(&self, path: &Path) -> Result<LoadedSample, SampleLoadError> {
        if let Some(cache) = &self.cache {
            if let Some(sample) = cache.lock().get(path) {
                debug!(path = ?path, "Using cached sample");
                return Ok(sample.clone());
            }
        }

        info!(path = ?path, "Loading sample into memory");

        let owned_path = path.to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || decode_file(&owned_path))
            .await?
            .map_err(|source| match source {
                DecodeError::Io(source) => SampleLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                source => SampleLoadError::Decode {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        let sample =
            LoadedSample::from_interleaved(decoded.samples, decoded.channel_count, decoded.sample_rate);
        debug!(
            path = ?path,
            frames = sample.frames(),
            memory_bytes = sample.memory_size(),
            "Sample loaded"
        );

        if let Some(cache) = &self.cache {
            // Another load may have finished first; keep whichever is cached.
            let mut cache = cache.lock();
            return Ok(cache
                .entry(path.to_path_buf())
                .or_insert(sample)
                .clone());
        }

        Ok(sample)
    }

    /// Returns the number of cached samples.
    pub fn cached_count(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }
}
