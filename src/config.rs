use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::log::log_level::LogLevel;
use crate::registry::DEFAULT_CAPACITY;
use crate::rotation::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_GENERATIONS, OpenMode, RotationPolicy};

/// Section of the INI file read by [`LoggerConfig::from_config`].
pub const LOGGING_SECTION: &str = "logging";

/// Longest accepted output directory, in bytes.
pub const MAX_OUTPUT_PATH_LEN: usize = 254;

/// Longest accepted base name, in bytes.
pub const MAX_NAME_PATTERN_LEN: usize = 127;

/// Minimal INI reader: `[section]` headers, `key = value` pairs, `#` comments.
///
/// Keys before the first header are globals.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    /// Section value, falling back to a non-empty global of the same key.
    #[must_use]
    pub fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
    }
}

/// Which synchronization provider the logger uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LockKind {
    /// Serialize the threads of this process.
    #[default]
    Local,
    /// Serialize every process opening the same key.
    Shared { key: String },
}

/// Options accepted by [`Logger::init`](crate::log::logger::Logger::init).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    pub output_directory: PathBuf,
    pub base_name: Option<String>,
    pub level: LogLevel,
    pub max_file_size: u64,
    pub max_generations: u32,
    /// Skip the `"stderr"` console sink.
    pub quiet: bool,
    pub capacity: usize,
    pub open_mode: OpenMode,
    pub lock: LockKind,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            base_name: None,
            level: LogLevel::Trace,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_generations: DEFAULT_MAX_GENERATIONS,
            quiet: false,
            capacity: DEFAULT_CAPACITY,
            open_mode: OpenMode::default(),
            lock: LockKind::default(),
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: Some(base_name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    #[must_use]
    pub fn lock(mut self, lock: LockKind) -> Self {
        self.lock = lock;
        self
    }

    /// Reads the `[logging]` section of `config`.
    ///
    /// Recognized keys: `output_directory`, `base_name`, `level`,
    /// `max_file_size`, `max_generations`, `quiet`, `capacity`, `open_mode`,
    /// `lock` (`local` or `shared`) and `shared_lock_name`. Missing keys keep
    /// their defaults; values are checked later by [`validate`](Self::validate).
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let get = |key: &str| config.lookup(LOGGING_SECTION, key);
        let mut out = Self::default();

        if let Some(dir) = get("output_directory") {
            out.output_directory = expand_path(dir);
        }
        out.base_name = get("base_name").map(str::to_string);
        if let Some(level) = get("level") {
            out.level = level.parse()?;
        }
        if let Some(size) = get("max_file_size") {
            out.max_file_size = parse_size(size).ok_or_else(|| invalid("max_file_size", size))?;
        }
        if let Some(n) = get("max_generations") {
            out.max_generations = n.parse().map_err(|_| invalid("max_generations", n))?;
        }
        if let Some(q) = get("quiet") {
            out.quiet = parse_bool(q).ok_or_else(|| invalid("quiet", q))?;
        }
        if let Some(n) = get("capacity") {
            out.capacity = n.parse().map_err(|_| invalid("capacity", n))?;
        }
        if let Some(mode) = get("open_mode") {
            out.open_mode = mode.parse()?;
        }

        out.lock = match get("lock").map(str::to_ascii_lowercase).as_deref() {
            None | Some("local") => LockKind::Local,
            Some("shared") => {
                let key = get("shared_lock_name")
                    .map(str::to_string)
                    .or_else(|| out.base_name.as_ref().map(|b| format!("sinklog-{b}")))
                    .ok_or(ConfigError::MissingNamePattern)?;
                LockKind::Shared { key }
            }
            Some(other) => return Err(invalid("lock", other)),
        };

        Ok(out)
    }

    /// Checks every option and returns the rotation policy they describe.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] other than [`ConfigError::Read`].
    pub fn validate(&self) -> Result<RotationPolicy, ConfigError> {
        let base_name = self
            .base_name
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or(ConfigError::MissingNamePattern)?;
        if base_name.len() > MAX_NAME_PATTERN_LEN {
            return Err(ConfigError::NamePatternTooLong {
                len: base_name.len(),
                max: MAX_NAME_PATTERN_LEN,
            });
        }
        if base_name.contains(['/', '\\', '\0']) {
            return Err(ConfigError::InvalidNamePattern(base_name.to_string()));
        }

        let dir_len = self.output_directory.as_os_str().len();
        if dir_len > MAX_OUTPUT_PATH_LEN {
            return Err(ConfigError::OutputPathTooLong {
                len: dir_len,
                max: MAX_OUTPUT_PATH_LEN,
            });
        }
        if !self.output_directory.is_dir() {
            return Err(ConfigError::NotADirectory(self.output_directory.clone()));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::ZeroMaxFileSize);
        }
        // `Logger::init` registers the file sink, plus stderr unless quiet.
        let required = 1 + usize::from(!self.quiet);
        if self.capacity < required {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
                required,
            });
        }

        Ok(RotationPolicy::new(&self.output_directory, base_name)
            .with_max_file_size(self.max_file_size)
            .with_max_generations(self.max_generations)
            .with_open_mode(self.open_mode))
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses a byte count with an optional `K`, `M` or `G` suffix (powers of 1024).
fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, shift) = match s.char_indices().last()? {
        (i, 'k' | 'K') => (&s[..i], 10),
        (i, 'm' | 'M') => (&s[..i], 20),
        (i, 'g' | 'G') => (&s[..i], 30),
        _ => (s, 0),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(1u64 << shift)
}

/// Expands tilde (`~`) in file paths to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if path_str.starts_with("~/") || path_str.starts_with("~\\") {
                home_path.push(&path_str[2..]);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
