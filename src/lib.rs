//! # tonetext
//!
//! Plays whitespace-separated note and chord symbols through a MIDI-style
//! sound device.
//!
//! ```text
//! "q w 1 3 5" --tokenize--> [q, w, 1, 3, 5] --Scheduler--> note-on/note-off --> SoundDevice
//!                                                 |
//!                                                 +--> StatusEvent --> StatusSink
//! ```
//!
//! ## Example
//! ```rust
//! use tonetext::{NotationTable, PlaybackConfig, RecordingDevice, Scheduler, SessionOutcome};
//!
//! let (scheduler, _events) = Scheduler::with_channel(NotationTable::standard(), RecordingDevice::new());
//! let config = PlaybackConfig::default().with_hold_secs(0.1)?.with_gap_secs(0.0)?;
//!
//! scheduler.play_text("1 3 5", &config)?;
//! assert_eq!(scheduler.wait(), Some(SessionOutcome::Completed));
//! # Ok::<(), tonetext::ToneError>(())
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod lexer;
pub mod notation;
pub mod playback;
pub mod watch;

pub use config::{PlaybackConfig, RawConfig};
pub use device::{CommandLog, ConsoleDevice, DeviceCommand, RecordingDevice, SoundDevice};
pub use error::*;
pub use lexer::{tokenize, Sequence, Token};
pub use notation::{NotationTable, PitchSet, SymbolKind};
pub use playback::{NullSink, Scheduler, SchedulerState, SessionOutcome, StatusEvent, StatusSink};
pub use watch::{poll_interval, FileSource, FileWatcher, TextSource, TextWatcher};
