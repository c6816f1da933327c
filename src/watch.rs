//! Text watching.
//!
//! Hands back the contents of an external text source whenever they change
//! to something non-blank. [`FileWatcher`] gets change notifications for a
//! file from `notify`'s polling backend; [`TextWatcher`] filters out blank
//! and unchanged text. Whoever receives new text decides what to do with
//! it; the CLI tokenizes it and starts a new session.

use crate::error::ToneError;
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Validate a user-supplied interval in seconds.
///
/// # Errors
/// [`ToneError::ConfigurationOutOfRange`] for zero, negative, NaN or values
/// too large for a [`Duration`].
pub fn poll_interval(secs: f64) -> Result<Duration, ToneError> {
    let out_of_range = || ToneError::ConfigurationOutOfRange {
        field: "interval",
        value: secs.to_string(),
        range: "> 0".to_string(),
    };
    if secs.is_nan() || secs <= 0.0 {
        return Err(out_of_range());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| out_of_range())
}

/// Somewhere note text can be read from.
pub trait TextSource {
    fn read(&mut self) -> Result<String, ToneError>;
}

/// Reads a whole file on every poll. A missing file reads as empty text.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileSource {
    fn read(&mut self) -> Result<String, ToneError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct TextWatcher<S: TextSource> {
    source: S,
    last_seen: String,
}

impl<S: TextSource> TextWatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_seen: String::new(),
        }
    }

    /// Returns the source text if it changed since the last poll and is not blank.
    ///
    /// Blank text is not remembered, so going blank and back to the previous
    /// text does not count as a change.
    pub fn poll(&mut self) -> Result<Option<String>, ToneError> {
        let current = self.source.read()?;
        if current.trim().is_empty() || current == self.last_seen {
            return Ok(None);
        }
        self.last_seen.clone_from(&current);
        Ok(Some(current))
    }
}

/// Watches one file and yields its text each time it changes.
///
/// The file's directory is scanned every `interval`; a missing file reads as
/// blank, so the file may be created after watching starts.
pub struct FileWatcher {
    // Dropping the watcher stops its polling thread.
    _watcher: PollWatcher,
    changes: flume::Receiver<()>,
    text: TextWatcher<FileSource>,
}

impl FileWatcher {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Result<Self, ToneError> {
        let path = path.into();
        let name: OsString = path.file_name().map(OsString::from).ok_or_else(|| {
            ToneError::Watch(notify::Error::generic("watched path has no file name"))
        })?;

        let (tx, changes) = flume::unbounded();
        // Read whatever is already there on the first call.
        let _ = tx.send(());

        let mut watcher = PollWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())) {
                        debug!(kind = ?event.kind, "watched file changed");
                        let _ = tx.send(());
                    }
                }
                Err(error) => warn!(%error, "file watch error"),
            },
            Config::default()
                .with_poll_interval(interval)
                .with_compare_contents(true),
        )?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            changes,
            text: TextWatcher::new(FileSource::new(path)),
        })
    }

    /// Wait up to `timeout` for the file to change, then return its text if
    /// it is new and not blank.
    pub fn next_text(&mut self, timeout: Duration) -> Result<Option<String>, ToneError> {
        match self.changes.recv_timeout(timeout) {
            Ok(()) => {
                // One read covers every change queued so far.
                while self.changes.try_recv().is_ok() {}
                self.text.poll()
            }
            Err(flume::RecvTimeoutError::Timeout) => Ok(None),
            Err(flume::RecvTimeoutError::Disconnected) => Err(ToneError::Watch(
                notify::Error::generic("file watcher stopped"),
            )),
        }
    }
}
