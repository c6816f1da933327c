//! # Playback Module
//!
//! Plays a tokenized [`Sequence`](crate::Sequence) through a
//! [`SoundDevice`](crate::SoundDevice), one token at a time.
//!
//! ## Sub-modules
//! - `types` - StatusEvent, SessionOutcome, SchedulerState, StatusSink
//! - `engine` - the Scheduler and its background session loop
//!
//! ## State Machine
//! ```text
//! Idle --start--> Running --+--> Completed --+
//!  ^                        +--> Cancelled --+--> Idle
//!  |                        +--> Failed -----+
//!  +-----------------------------------------+
//! ```
//! `start` is refused while a session runs or when the sequence is empty.
//! `cancel` is a no-op unless a session runs.
//!
//! ## Timing
//! For each token: note-on every pitch, sleep `hold`, note-off every pitch
//! (same order), then sleep `gap` unless it was the last token.
//!
//! Cancellation is checked at token boundaries and during gap waits. A
//! token that is already sounding finishes its hold and gets its note-offs;
//! the next token never starts.
//!
//! ## Example
//! ```rust
//! use tonetext::{tokenize, NotationTable, PlaybackConfig, RecordingDevice, Scheduler, StatusEvent};
//!
//! let (scheduler, events) = Scheduler::with_channel(NotationTable::standard(), RecordingDevice::new());
//! let config = PlaybackConfig::default().with_hold_secs(0.1)?;
//!
//! scheduler.start(&tokenize("q x"), &config)?;
//! scheduler.wait();
//!
//! let events: Vec<StatusEvent> = events.try_iter().collect();
//! assert_eq!(events[0], StatusEvent::PlaybackStarted { total: 2 });
//! assert_eq!(events[2], StatusEvent::TokenIgnored { token: "x".to_string(), index: 1 });
//! assert_eq!(events[3], StatusEvent::PlaybackCompleted);
//! # Ok::<(), tonetext::ToneError>(())
//! ```
//!
//! ## Related Modules
//! - `notation` - resolves tokens to pitch sets
//! - `config` - hold, gap, velocity
//! - `device` - the port the engine drives

mod engine;
mod types;


pub use engine::Scheduler;
pub use types::{NullSink, SchedulerState, SessionOutcome, StatusEvent, StatusSink};
