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


//! Settings for the trainer.
//!
//! Settings come from an optional YAML file, overridden by environment
//! variables prefixed with `CHORDTRAINER_`. Nested keys use a double
//! underscore, e.g. `CHORDTRAINER_SAMPLES__POLICY=demo`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

pub mod audio;
pub mod error;
pub mod samples;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::samples::Samples;

/// The environment variable prefix for settings overrides.
const ENV_PREFIX: &str = "CHORDTRAINER";

/// Default location of the stored challenge.
const DEFAULT_STORE_PATH: &str = "challenge.json";

/// The trainer settings.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// The sample configuration.
    #[serde(default)]
    samples: Samples,

    /// Where the current challenge is persisted.
    store_path: Option<String>,

    /// Whether challenges use polyphonic voicings.
    polyphonic: Option<bool>,
}

impl Settings {
    /// Loads settings from the given file (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            debug!(path = ?path, "Loading settings file");
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(settings)
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the sample configuration.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Returns the path of the challenge store.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(self.store_path.as_deref().unwrap_or(DEFAULT_STORE_PATH))
    }

    /// Returns whether challenges are polyphonic (default: true).
    pub fn polyphonic(&self) -> bool {
        self.polyphonic.unwrap_or(true)
    }
}
