use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::RotationError;
use crate::rotation::rotation_policy::{OpenMode, RotationPolicy};
use crate::sinks::file_sink::{FileSink, open_log_file};

/// Phase of the rotation state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationState {
    /// Counting bytes written to the live file.
    Active,
    /// Shifting generations and reopening the live file.
    Rotating,
}

/// Keeps the live file within its byte budget.
///
/// The controller only counts and moves files; the handle it reopens belongs
/// to the [`FileSink`] passed to [`rotate`](Self::rotate), so the owning sink
/// keeps its slot and name across rotations.
#[derive(Debug)]
pub struct RotationController {
    policy: RotationPolicy,
    written: u64,
    state: RotationState,
    rotations: u64,
    /// Generations were shifted but no fresh live file could be opened yet.
    reopen_pending: bool,
}

impl RotationController {
    /// `initial_size` is the size of the live file when it was opened.
    #[must_use]
    pub fn new(policy: RotationPolicy, initial_size: u64) -> Self {
        Self {
            policy,
            written: initial_size,
            state: RotationState::Active,
            rotations: 0,
            reopen_pending: false,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes in the live file since it was (re)opened.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    #[must_use]
    pub fn state(&self) -> RotationState {
        self.state
    }

    /// Completed rotations since the controller was created.
    #[must_use]
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Whether the last rotation shifted the history but failed to reopen
    /// generation 0. The next rotation only retries the reopen.
    #[must_use]
    pub fn reopen_pending(&self) -> bool {
        self.reopen_pending
    }

    pub fn record(&mut self, bytes: u64) {
        self.written = self.written.saturating_add(bytes);
    }

    /// Replaces the running count with a size observed on disk.
    pub fn observe_size(&mut self, size: u64) {
        self.written = size;
    }

    #[must_use]
    pub fn should_rotate(&self) -> bool {
        self.written >= self.policy.max_file_size
    }

    /// Retires the live file and opens a fresh one in `file`.
    ///
    /// On error the sink keeps whatever handle it had, the counter is left
    /// as is, and the next write past the threshold tries again. A retry
    /// after a failed reopen does not shift the history a second time.
    pub fn rotate(&mut self, file: &mut FileSink) -> Result<(), RotationError> {
        self.state = RotationState::Rotating;
        let result = self.rotate_live(file);
        self.state = RotationState::Active;

        if result.is_ok() {
            self.written = 0;
            self.rotations += 1;
            debug!(
                path = %file.path().display(),
                rotations = self.rotations,
                "rotated log file"
            );
        }
        result
    }

    fn rotate_live(&mut self, file: &mut FileSink) -> Result<(), RotationError> {
        if self.policy.max_generations == 0 {
            return file.truncate().map_err(|source| RotationError::Truncate {
                path: file.path().to_path_buf(),
                source,
            });
        }

        // A handle already back on the live path means the pending reopen
        // happened elsewhere and this is a fresh rotation.
        if self.reopen_pending && file.is_current().unwrap_or(false) {
            self.reopen_pending = false;
        }
        if !self.reopen_pending {
            self.shift_generations()?;
            self.reopen_pending = true;
        }

        let path = self.policy.live_path();
        let fresh = open_log_file(&path, OpenMode::Append)
            .map_err(|source| RotationError::Reopen { path, source })?;
        file.replace_file(fresh);
        self.reopen_pending = false;
        Ok(())
    }

    /// Moves generation `i - 1` to `i` for `i = max..=1`, oldest first.
    ///
    /// Whatever sat in the oldest retained slot is deleted.
    pub fn shift_generations(&self) -> Result<(), RotationError> {
        for generation in (1..=self.policy.max_generations).rev() {
            let from = self.policy.path_for(generation - 1);
            if !exists(&from) {
                continue;
            }

            let to = self.policy.path_for(generation);
            if exists(&to) {
                fs::remove_file(&to).map_err(|source| RotationError::Remove {
                    path: to.clone(),
                    source,
                })?;
            }

            fs::rename(&from, &to).map_err(|source| RotationError::Rename { from, to, source })?;
        }
        Ok(())
    }
}

fn exists(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        // Let the following remove/rename surface the real error.
        Err(_) => true,
    }
}
