use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Default byte budget for the live file (2 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Default number of retired generations kept on disk.
pub const DEFAULT_MAX_GENERATIONS: u32 = 10;

/// How the live file is opened when the logger starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Keep an existing live file and continue after its last line.
    #[default]
    Append,
    /// Start from an empty live file.
    Truncate,
}

impl FromStr for OpenMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(OpenMode::Append),
            "truncate" => Ok(OpenMode::Truncate),
            other => Err(ConfigError::InvalidValue {
                key: "open_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Where rotated files live and how many bytes / generations to keep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    pub directory: PathBuf,
    pub base_name: String,
    pub max_file_size: u64,
    pub max_generations: u32,
    pub open_mode: OpenMode,
}

impl RotationPolicy {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: base_name.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_generations: DEFAULT_MAX_GENERATIONS,
            open_mode: OpenMode::default(),
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    #[must_use]
    pub fn with_open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Path of the file holding `generation`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::path::Path;
    /// use sinklog::rotation::RotationPolicy;
    ///
    /// let policy = RotationPolicy::new("/var/log/app", "server");
    /// assert_eq!(policy.path_for(0), Path::new("/var/log/app/server.log"));
    /// assert_eq!(policy.path_for(3), Path::new("/var/log/app/server-3.log"));
    /// ```
    #[must_use]
    pub fn path_for(&self, generation: u32) -> PathBuf {
        let name = if generation == 0 {
            format!("{}.log", self.base_name)
        } else {
            format!("{}-{}.log", self.base_name, generation)
        };
        self.directory.join(name)
    }

    #[must_use]
    pub fn live_path(&self) -> PathBuf {
        self.path_for(0)
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
