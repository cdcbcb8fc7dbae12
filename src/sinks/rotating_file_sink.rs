use std::io;
use std::path::Path;

use tracing::warn;

use crate::log::{
    log_event::LogEvent,
    log_sink::{LogSink, SinkContext},
};
use crate::rotation::{RotationController, RotationPolicy};
use crate::sinks::file_sink::FileSink;

/// A [`FileSink`] that rotates itself once the live file reaches its budget.
///
/// After each line the byte count is checked against
/// [`RotationPolicy::max_file_size`]; crossing it shifts the generations on
/// disk and swaps a fresh handle into the inner sink. Rotation failures are
/// reported and logging continues on the handle that is still valid.
///
/// With [`follow_external_rotation`](Self::follow_external_rotation) enabled
/// the sink also tracks rotations done by other processes writing the same
/// files: before each line it reopens the live path if its handle no longer
/// points at it, and it takes the live size from the file itself rather than
/// from its own count.
#[derive(Debug)]
pub struct RotatingFileSink {
    file: FileSink,
    controller: RotationController,
    follow_external: bool,
}

impl RotatingFileSink {
    /// Opens generation 0 of `policy` according to its open mode.
    pub fn open(policy: RotationPolicy) -> io::Result<Self> {
        let file = FileSink::open(policy.live_path(), policy.open_mode)?;
        let initial = file.file_size()?;
        Ok(Self {
            file,
            controller: RotationController::new(policy, initial),
            follow_external: false,
        })
    }

    #[must_use]
    pub fn follow_external_rotation(mut self, follow: bool) -> Self {
        self.follow_external = follow;
        self
    }

    #[must_use]
    pub fn controller(&self) -> &RotationController {
        &self.controller
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn catch_up_with_disk(&mut self) -> io::Result<()> {
        if !self.file.is_current()? {
            self.file.reopen()?;
        }
        self.controller.observe_size(self.file.file_size()?);
        Ok(())
    }
}

impl LogSink for RotatingFileSink {
    fn write_event(&mut self, event: &LogEvent<'_>, _ctx: &mut SinkContext<'_>) -> io::Result<()> {
        if self.follow_external {
            if let Err(err) = self.catch_up_with_disk() {
                warn!(path = %self.file.path().display(), %err, "cannot follow shared log file");
            }
        }

        let written = self.file.write_line(event)?;
        if self.follow_external {
            match self.file.file_size() {
                Ok(size) => self.controller.observe_size(size),
                Err(_) => self.controller.record(written),
            }
        } else {
            self.controller.record(written);
        }

        if self.controller.should_rotate() {
            if let Err(err) = self.controller.rotate(&mut self.file) {
                warn!(%err, "log rotation failed, continuing on current file");
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn generation(&self) -> Option<u32> {
        Some(0)
    }
}
