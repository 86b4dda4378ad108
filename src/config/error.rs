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

/// Errors raised while loading trainer settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file or an environment override could not be parsed.
    #[error("unable to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// An explicitly requested settings file is not on disk.
    #[error("settings file {} does not exist", .0.display())]
    Missing(PathBuf),
}
