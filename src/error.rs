//! # Error Types
//!
//! All errors surfaced by the tonetext library.
//!
//! ## Error Types
//! - `InvalidStartRequest` - `start` called with an empty sequence or while a session runs
//! - `Device` - a sound device call failed
//! - `ConfigurationOutOfRange` - a playback setting outside its documented bound
//! - `InvalidPitchSet` - a notation table entry with no pitches or an out-of-range pitch
//! - `ConfigFile` - the YAML config file could not be parsed
//! - `Io` - reading a config file or watched text file failed
//! - `Watch` - the file change watcher could not be set up or stopped
//!
//! Unrecognized tokens are not errors: the scheduler reports them as
//! [`StatusEvent::TokenIgnored`](crate::StatusEvent::TokenIgnored) and keeps playing.
//!
//! ## Usage
//! ```rust
//! use tonetext::{PlaybackConfig, ToneError};
//!
//! let mut config = PlaybackConfig::default();
//! match config.set_hold_secs(3.0) {
//!     Err(ToneError::ConfigurationOutOfRange { field, .. }) => assert_eq!(field, "hold"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToneError {
    /// Start was refused; the scheduler state is unchanged.
    ///
    /// # Example
    /// ```
    /// # use tonetext::{StartRejection, ToneError};
    /// let err = ToneError::InvalidStartRequest(StartRejection::AlreadyRunning);
    /// assert_eq!(err.to_string(), "Invalid start request: a playback session is already running");
    /// ```
    #[error("Invalid start request: {0}")]
    InvalidStartRequest(StartRejection),

    /// The sound device reported a failure.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A configuration value outside its bound.
    ///
    /// # Example
    /// ```
    /// # use tonetext::ToneError;
    /// let err = ToneError::ConfigurationOutOfRange {
    ///     field: "velocity",
    ///     value: "200".to_string(),
    ///     range: "0..=127".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Configuration out of range: velocity = 200 (allowed 0..=127)");
    /// ```
    #[error("Configuration out of range: {field} = {value} (allowed {range})")]
    ConfigurationOutOfRange {
        field: &'static str,
        value: String,
        range: String,
    },

    /// A notation table entry that cannot be played.
    #[error("Invalid pitch set for '{symbol}': {message}")]
    InvalidPitchSet { symbol: String, message: String },

    /// The YAML config file is malformed.
    #[error("Invalid config file: {0}")]
    ConfigFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Why a `start` request was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    #[error("the sequence is empty")]
    EmptySequence,
    #[error("a playback session is already running")]
    AlreadyRunning,
}

/// Failure reported by a [`SoundDevice`](crate::SoundDevice).
///
/// Cloneable so it can be carried both in the session outcome and in the
/// `PlaybackFailed` status event.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Device error: {message}")]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
