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

use std::path::PathBuf;

use serde::Deserialize;

use crate::samples::BaseNotePolicy;

/// Default directory holding the piano samples.
pub const DEFAULT_SAMPLE_DIRECTORY: &str = "audio/pianotones";

/// Default sample file extension.
pub const DEFAULT_SAMPLE_EXTENSION: &str = "wav";

/// A YAML representation of the sample configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Samples {
    /// The directory the base samples live in.
    directory: Option<String>,

    /// The file extension of the base samples.
    extension: Option<String>,

    /// Which anchors have recorded samples: "full" or "demo".
    policy: Option<BaseNotePolicy>,

    /// Whether decoded samples are kept in memory and shared between voices.
    cache: Option<bool>,
}

impl Samples {
    /// Returns the sample directory.
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(
            self.directory
                .as_deref()
                .unwrap_or(DEFAULT_SAMPLE_DIRECTORY),
        )
    }

    /// Returns the sample file extension.
    pub fn extension(&self) -> &str {
        self.extension
            .as_deref()
            .unwrap_or(DEFAULT_SAMPLE_EXTENSION)
    }

    /// Returns the base note policy (default: full).
    pub fn policy(&self) -> BaseNotePolicy {
        self.policy.unwrap_or_default()
    }

    /// Returns whether decoded samples are cached (default: true).
    pub fn cache(&self) -> bool {
        self.cache.unwrap_or(true)
    }
}

#[cfg(test)]
impl Samples {
    /// Creates a sample configuration (test only).
    pub fn new(directory: &str, policy: BaseNotePolicy, cache: bool) -> Samples {
        Samples {
            directory: Some(directory.to_string()),
            extension: None,
            policy: Some(policy),
            cache: Some(cache),
        }
    }
}
