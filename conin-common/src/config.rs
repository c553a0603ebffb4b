// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input_mode::InputMode;

/// UTF-8. encoding_rs has no tables for the OEM code pages (437, 850, ...),
/// so the console default of 437 can't be used here.
pub const DEFAULT_CODE_PAGE: u32 = 65001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub logging: LoggingConfig,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Code page used for narrow reads and writes.
    pub code_page: u32,
    pub line_input: bool,
    pub processed_input: bool,
    pub echo_input: bool,
    pub mouse_input: bool,
    pub window_input: bool,
    pub insert_mode: bool,
    pub quick_edit_mode: bool,
    pub virtual_terminal_input: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        let mode = InputMode::default();

        Self {
            code_page: DEFAULT_CODE_PAGE,
            line_input: mode.contains(InputMode::LINE_INPUT),
            processed_input: mode.contains(InputMode::PROCESSED_INPUT),
            echo_input: mode.contains(InputMode::ECHO_INPUT),
            mouse_input: mode.contains(InputMode::MOUSE_INPUT),
            window_input: false,
            insert_mode: false,
            quick_edit_mode: false,
            virtual_terminal_input: false,
        }
    }
}

impl InputConfig {
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        let mut mode = InputMode::empty();
        mode.set(InputMode::LINE_INPUT, self.line_input);
        mode.set(InputMode::PROCESSED_INPUT, self.processed_input);
        mode.set(InputMode::ECHO_INPUT, self.echo_input);
        mode.set(InputMode::MOUSE_INPUT, self.mouse_input);
        mode.set(InputMode::WINDOW_INPUT, self.window_input);
        mode.set(InputMode::INSERT_MODE, self.insert_mode);
        mode.set(InputMode::QUICK_EDIT_MODE, self.quick_edit_mode);
        mode.set(
            InputMode::VIRTUAL_TERMINAL_INPUT,
            self.virtual_terminal_input,
        );
        mode
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level; `RUST_LOG` still wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// `<config dir>/conin/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io.github", "fredclausen", "conin")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the config from `path`, or from the default location when `path`
    /// is `None`. A file that does not exist yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;

        Ok(config)
    }
}
