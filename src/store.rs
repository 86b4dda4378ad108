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


//! Persists the current challenge in a small JSON key-value file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::challenge::ChordChallenge;

/// The key the challenge is stored under.
pub const CHALLENGE_KEY: &str = "chordChallenge";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to access store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt store {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub struct ChallengeStore {
    path: PathBuf,
}

impl ChallengeStore {
    pub fn new(path: &Path) -> ChallengeStore {
        ChallengeStore {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the challenge, replacing any stored one.
    pub fn save(&self, challenge: &ChordChallenge) -> Result<(), StoreError> {
        let value = serde_json::to_value(challenge).map_err(|e| self.json_error(e))?;
        let mut entries = self.read()?;
        entries.insert(CHALLENGE_KEY.to_string(), value);
        self.write(&entries)?;
        debug!(path = ?self.path, "Saved challenge");
        Ok(())
    }

    /// Returns the stored challenge, if any.
    pub fn get(&self) -> Result<Option<ChordChallenge>, StoreError> {
        match self.read()?.remove(CHALLENGE_KEY) {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| self.json_error(e))?,
            )),
            None => Ok(None),
        }
    }

    /// Removes the stored challenge. Other keys are kept.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.read()?;
        if entries.remove(CHALLENGE_KEY).is_some() {
            self.write(&entries)?;
            debug!(path = ?self.path, "Cleared challenge");
        }
        Ok(())
    }

    fn read(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&contents).map_err(|e| self.json_error(e))
    }

    fn write(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries).map_err(|e| self.json_error(e))?;
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::challenge::init_chord_challenge;

    fn challenge() -> ChordChallenge {
        init_chord_challenge(&mut StdRng::seed_from_u64(3), true).unwrap()
    }

    #[test]
    fn test_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = ChallengeStore::new(&tempdir.path().join("challenge.json"));
        assert!(store.get().unwrap().is_none());
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_get_clear() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = ChallengeStore::new(&tempdir.path().join("challenge.json"));
        let challenge = challenge();

        store.save(&challenge).unwrap();
        assert_eq!(store.get().unwrap(), Some(challenge.clone()));

        let mut evaluated = challenge;
        evaluated.evaluate_selected();
        store.save(&evaluated).unwrap();
        assert_eq!(store.get().unwrap(), Some(evaluated));

        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_clear_keeps_other_keys() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("challenge.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = ChallengeStore::new(&path);
        store.save(&challenge()).unwrap();
        store.clear().unwrap();

        let contents: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(contents["theme"], "dark");
        assert!(contents.get(CHALLENGE_KEY).is_none());
    }

    #[test]
    fn test_corrupt_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("challenge.json");
        fs::write(&path, "{not json").unwrap();

        let store = ChallengeStore::new(&path);
        assert!(matches!(store.get(), Err(StoreError::Json { .. })));
    }
}
