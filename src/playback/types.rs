//! Playback status and outcome types
//!
//! Everything the scheduler reports to the outside world.

use crate::error::DeviceError;
use serde::Serialize;
use std::fmt;

/// Notification sent to the status sink during a session.
///
/// Events of one session arrive in loop order, always opened by
/// `PlaybackStarted` and closed by exactly one of `PlaybackCompleted`,
/// `PlaybackCancelled` or `PlaybackFailed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum StatusEvent {
    PlaybackStarted {
        total: usize,
    },
    /// Sent just before the token's note-ons. `index` is 0-based; the
    /// 1-based position shown to users is [`StatusEvent::position`].
    TokenPlaying {
        token: String,
        index: usize,
        total: usize,
    },
    /// The token is not in the notation table; nothing was sent to the device.
    TokenIgnored {
        token: String,
        index: usize,
    },
    PlaybackCompleted,
    /// `stopped_at` is the index of the first token that did not play.
    PlaybackCancelled {
        stopped_at: usize,
    },
    PlaybackFailed {
        error: DeviceError,
    },
}

impl StatusEvent {
    /// True for the event that closes a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusEvent::PlaybackCompleted
                | StatusEvent::PlaybackCancelled { .. }
                | StatusEvent::PlaybackFailed { .. }
        )
    }

    /// 1-based place of the sounding token within the sequence, as in
    /// "3 of 8". `None` for events not tied to a sounding token.
    pub fn position(&self) -> Option<usize> {
        match self {
            StatusEvent::TokenPlaying { index, .. } => Some(index + 1),
            _ => None,
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::PlaybackStarted { total } => write!(f, "playing {} tokens...", total),
            StatusEvent::TokenPlaying { token, total, .. } => {
                let position = self.position().unwrap_or_default();
                write!(f, "playing '{}' ({}/{})", token, position, total)
            }
            StatusEvent::TokenIgnored { token, .. } => {
                write!(f, "ignoring unknown symbol '{}'", token)
            }
            StatusEvent::PlaybackCompleted => write!(f, "playback complete"),
            StatusEvent::PlaybackCancelled { stopped_at } => {
                write!(f, "stopped before token {}", stopped_at + 1)
            }
            StatusEvent::PlaybackFailed { error } => write!(f, "playback failed: {}", error),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SessionOutcome {
    Completed,
    Cancelled { stopped_at: usize },
    Failed { error: DeviceError },
}

impl SessionOutcome {
    pub(crate) fn to_event(&self) -> StatusEvent {
        match self {
            SessionOutcome::Completed => StatusEvent::PlaybackCompleted,
            SessionOutcome::Cancelled { stopped_at } => StatusEvent::PlaybackCancelled {
                stopped_at: *stopped_at,
            },
            SessionOutcome::Failed { error } => StatusEvent::PlaybackFailed {
                error: error.clone(),
            },
        }
    }
}

/// Observable scheduler state.
///
/// Terminal states are not observable here: a finished session returns the
/// scheduler to `Idle` and leaves its [`SessionOutcome`] behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

/// One-way consumer of status events.
///
/// Called from the playback thread. Implementations that need events on a
/// particular thread should forward them there themselves.
pub trait StatusSink: Send {
    fn notify(&mut self, event: StatusEvent);
}

impl StatusSink for flume::Sender<StatusEvent> {
    fn notify(&mut self, event: StatusEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn notify(&mut self, _event: StatusEvent) {}
}
