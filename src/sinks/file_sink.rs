use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::log::{
    log_event::LogEvent,
    log_sink::{LogSink, SinkContext},
};
use crate::rotation::OpenMode;
use crate::sinks::format::{TimeStyle, format_line};

/// Appends full-timestamp lines to a file.
///
/// The file is opened in append mode and each line goes out in a single
/// unbuffered write, so processes sharing the file never split each other's
/// lines and nothing is lost if the process dies.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
    buf: String,
}

impl FileSink {
    /// Opens (creating if needed) the file at `path`.
    pub fn open(path: impl Into<PathBuf>, mode: OpenMode) -> io::Result<Self> {
        let path = path.into();
        let file = open_log_file(&path, mode)?;
        Ok(Self {
            path,
            file,
            buf: String::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file behind the handle.
    pub fn file_size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Writes one rendered line and returns the number of bytes written.
    pub fn write_line(&mut self, event: &LogEvent<'_>) -> io::Result<u64> {
        self.buf.clear();
        format_line(&mut self.buf, event, TimeStyle::DateTime);
        self.file.write_all(self.buf.as_bytes())?;
        Ok(self.buf.len() as u64)
    }

    /// Swaps in a new handle, closing the previous one.
    pub fn replace_file(&mut self, file: File) {
        self.file = file;
    }

    /// Opens the configured path again and swaps the new handle in.
    pub fn reopen(&mut self) -> io::Result<()> {
        let file = open_log_file(&self.path, OpenMode::Append)?;
        self.replace_file(file);
        Ok(())
    }

    /// Discards the file's contents, keeping the handle.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.file.set_len(0)
    }

    /// Whether the handle still refers to the file currently at `path`.
    ///
    /// Another process renaming the file away makes this `false`.
    #[cfg(unix)]
    pub fn is_current(&self) -> io::Result<bool> {
        use std::os::unix::fs::MetadataExt;

        let held = self.file.metadata()?;
        match std::fs::metadata(&self.path) {
            Ok(on_disk) => Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[cfg(not(unix))]
    pub fn is_current(&self) -> io::Result<bool> {
        Ok(self.path.exists())
    }
}

impl LogSink for FileSink {
    fn write_event(&mut self, event: &LogEvent<'_>, _ctx: &mut SinkContext<'_>) -> io::Result<()> {
        self.write_line(event).map(|_| ())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Opens a log file for appending, emptying it first for [`OpenMode::Truncate`].
pub(crate) fn open_log_file(path: &Path, mode: OpenMode) -> io::Result<File> {
    if mode == OpenMode::Truncate {
        File::create(path)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
