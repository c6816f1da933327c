//! Playback scheduler
//!
//! Runs one session at a time on a background thread: resolves each token,
//! sends note-on/note-off pairs to the device and reports progress to the
//! status sink.

use super::types::{SchedulerState, SessionOutcome, StatusEvent, StatusSink};
use crate::config::{PlaybackConfig, INSTRUMENT_RANGE};
use crate::device::SoundDevice;
use crate::error::{DeviceError, StartRejection, ToneError};
use crate::lexer::{tokenize, Sequence};
use crate::notation::{NotationTable, PitchSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest stretch a gap wait sleeps before looking at the cancel flag again.
const CANCEL_POLL: Duration = Duration::from_millis(10);

type SharedDevice = Arc<Mutex<Box<dyn SoundDevice>>>;
type SharedSink = Arc<Mutex<Box<dyn StatusSink>>>;

/// State shared between the scheduler and its playback thread.
#[derive(Default)]
struct Shared {
    running: AtomicBool,
    last_outcome: Mutex<Option<SessionOutcome>>,
}

/// Foreground handle on the active (or most recent) session.
struct SessionHandle {
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<SessionOutcome>>,
}

/// Sequential note/chord player.
///
/// # Example
/// ```rust
/// use tonetext::{tokenize, NotationTable, PlaybackConfig, RecordingDevice, Scheduler, SessionOutcome};
///
/// let device = RecordingDevice::new();
/// let log = device.log();
/// let (scheduler, events) = Scheduler::with_channel(NotationTable::standard(), device);
///
/// let config = PlaybackConfig::default().with_hold_secs(0.1)?.with_gap_secs(0.0)?;
/// scheduler.start(&tokenize("1 q"), &config)?;
///
/// assert_eq!(scheduler.wait(), Some(SessionOutcome::Completed));
/// assert_eq!(log.commands().len(), 8); // 1 + 3 note-ons, 1 + 3 note-offs
/// assert!(events.try_iter().last().unwrap().is_terminal());
/// # Ok::<(), tonetext::ToneError>(())
/// ```
pub struct Scheduler {
    table: Arc<NotationTable>,
    device: SharedDevice,
    sink: SharedSink,
    shared: Arc<Shared>,
    session: Mutex<Option<SessionHandle>>,
}

impl Scheduler {
    pub fn new<D, S>(table: NotationTable, device: D, sink: S) -> Self
    where
        D: SoundDevice + 'static,
        S: StatusSink + 'static,
    {
        let device: Box<dyn SoundDevice> = Box::new(device);
        let sink: Box<dyn StatusSink> = Box::new(sink);
        Self {
            table: Arc::new(table),
            device: Arc::new(Mutex::new(device)),
            sink: Arc::new(Mutex::new(sink)),
            shared: Arc::new(Shared::default()),
            session: Mutex::new(None),
        }
    }

    /// Scheduler whose status events go to an unbounded channel.
    pub fn with_channel<D>(table: NotationTable, device: D) -> (Self, flume::Receiver<StatusEvent>)
    where
        D: SoundDevice + 'static,
    {
        let (tx, rx) = flume::unbounded();
        (Self::new(table, device, tx), rx)
    }

    pub fn state(&self) -> SchedulerState {
        if self.shared.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Outcome of the most recently finished session.
    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.shared
            .last_outcome
            .lock()
            .ok()
            .and_then(|outcome| outcome.clone())
    }

    /// Begin playing `sequence` in the background.
    ///
    /// `config` is copied; changing it afterwards does not affect this session.
    ///
    /// # Errors
    /// [`ToneError::InvalidStartRequest`] if the sequence is empty or a session
    /// is already running. The running session is left untouched.
    pub fn start(&self, sequence: &Sequence, config: &PlaybackConfig) -> Result<(), ToneError> {
        if sequence.is_empty() {
            return Err(ToneError::InvalidStartRequest(StartRejection::EmptySequence));
        }

        // Held until the new handle is stored, so `cancel` never sees a stale one.
        let mut slot = self.lock_session();
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ToneError::InvalidStartRequest(StartRejection::AlreadyRunning));
        }
        let claim = RunningClaim::new(&self.shared.running);

        let cancel = Arc::new(AtomicBool::new(false));
        let session = Session {
            table: Arc::clone(&self.table),
            device: Arc::clone(&self.device),
            sink: Arc::clone(&self.sink),
            shared: Arc::clone(&self.shared),
            cancel: Arc::clone(&cancel),
            sequence: sequence.clone(),
            config: *config,
        };

        let thread = thread::Builder::new()
            .name("tonetext-playback".to_string())
            .spawn(move || session.run())?;
        claim.hand_over();

        let previous = slot
            .replace(SessionHandle {
                cancel,
                thread: Some(thread),
            })
            .and_then(|handle| handle.thread);
        drop(slot);

        // The previous thread has already released `running`; reap it.
        if let Some(previous) = previous {
            reap(previous);
        }
        Ok(())
    }

    /// Tokenize `text` and start playing it.
    pub fn play_text(&self, text: &str, config: &PlaybackConfig) -> Result<(), ToneError> {
        self.start(&tokenize(text), config)
    }

    /// Ask the running session to stop at the next token boundary.
    ///
    /// No-op when idle; repeated calls have no further effect.
    pub fn cancel(&self) {
        if self.state() != SchedulerState::Running {
            return;
        }
        if let Some(handle) = self.lock_session().as_ref() {
            if !handle.cancel.swap(true, Ordering::AcqRel) {
                debug!("cancellation requested");
            }
        }
    }

    /// Block until the current session (if any) finishes, then return the
    /// outcome of the most recent session.
    pub fn wait(&self) -> Option<SessionOutcome> {
        let thread = self
            .lock_session()
            .as_mut()
            .and_then(|handle| handle.thread.take());
        if let Some(thread) = thread {
            reap(thread);
        }
        self.last_outcome()
    }

    /// Change the device timbre. Independent of any running session.
    pub fn set_instrument(&self, program: u8) -> Result<(), ToneError> {
        if !INSTRUMENT_RANGE.contains(&program) {
            return Err(ToneError::ConfigurationOutOfRange {
                field: "instrument",
                value: program.to_string(),
                range: format!("{}..={}", INSTRUMENT_RANGE.start(), INSTRUMENT_RANGE.end()),
            });
        }
        let mut device = lock_device(&self.device)?;
        device.set_instrument(program)?;
        debug!(program, "instrument changed");
        Ok(())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<SessionHandle>> {
        // The slot holds no invariants a panic could break.
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel();
        self.wait();
    }
}

/// Clears `running` when dropped, unless a playback thread took it over.
struct RunningClaim<'a> {
    running: Option<&'a AtomicBool>,
}

impl<'a> RunningClaim<'a> {
    fn new(running: &'a AtomicBool) -> Self {
        Self {
            running: Some(running),
        }
    }

    fn hand_over(mut self) {
        self.running = None;
    }
}

impl Drop for RunningClaim<'_> {
    fn drop(&mut self) {
        if let Some(running) = self.running {
            running.store(false, Ordering::Release);
        }
    }
}

/// Join a finished playback thread.
///
/// A sink may call back into the scheduler from the playback thread itself;
/// that thread cannot join itself, so its handle is only dropped.
fn reap(handle: JoinHandle<SessionOutcome>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        warn!("playback thread terminated abnormally");
    }
}

fn lock_device(device: &SharedDevice) -> Result<MutexGuard<'_, Box<dyn SoundDevice>>, DeviceError> {
    device
        .lock()
        .map_err(|_| DeviceError::new("sound device lock poisoned"))
}

/// Everything one playback thread owns.
struct Session {
    table: Arc<NotationTable>,
    device: SharedDevice,
    sink: SharedSink,
    shared: Arc<Shared>,
    cancel: Arc<AtomicBool>,
    sequence: Sequence,
    config: PlaybackConfig,
}

impl Session {
    fn run(self) -> SessionOutcome {
        let total = self.sequence.len();
        info!(total, "playback started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.notify(StatusEvent::PlaybackStarted { total });
            self.play()
        }))
        .unwrap_or_else(|_| {
            warn!("playback thread panicked");
            SessionOutcome::Failed {
                error: DeviceError::new("playback thread panicked"),
            }
        });

        self.finish(&outcome);
        outcome
    }

    fn play(&self) -> SessionOutcome {
        let total = self.sequence.len();

        for token in &self.sequence {
            if self.cancelled() {
                return SessionOutcome::Cancelled {
                    stopped_at: token.index,
                };
            }

            match self.table.resolve(token.as_str()) {
                Some(pitches) => {
                    debug!(token = token.as_str(), index = token.index, "playing token");
                    self.notify(StatusEvent::TokenPlaying {
                        token: token.text.clone(),
                        index: token.index,
                        total,
                    });
                    if let Err(error) = self.sound(pitches) {
                        warn!(%error, index = token.index, "device failure, aborting playback");
                        return SessionOutcome::Failed { error };
                    }
                }
                None => {
                    warn!(token = token.as_str(), index = token.index, "ignoring unrecognized token");
                    self.notify(StatusEvent::TokenIgnored {
                        token: token.text.clone(),
                        index: token.index,
                    });
                }
            }

            if token.index + 1 < total {
                self.pause(self.config.gap());
            }
        }

        if self.cancelled() {
            SessionOutcome::Cancelled { stopped_at: total }
        } else {
            SessionOutcome::Completed
        }
    }

    /// Note-on every pitch, hold, then note-off in the same order.
    fn sound(&self, set: &PitchSet) -> Result<(), DeviceError> {
        let velocity = self.config.velocity();
        let pitches = set.pitches();

        for (i, &pitch) in pitches.iter().enumerate() {
            if let Err(error) = self.device_call(|d| d.note_on(pitch, velocity)) {
                self.release(&pitches[..i]);
                return Err(error);
            }
        }

        // The hold is not interrupted: a sounding token always gets its note-offs.
        thread::sleep(self.config.hold());

        for (i, &pitch) in pitches.iter().enumerate() {
            if let Err(error) = self.device_call(|d| d.note_off(pitch, velocity)) {
                self.release(&pitches[i + 1..]);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Best-effort note-off for pitches left sounding by a failed call.
    fn release(&self, pitches: &[u8]) {
        if !self.config.release_on_failure() || pitches.is_empty() {
            return;
        }
        let velocity = self.config.velocity();
        for &pitch in pitches {
            if let Err(error) = self.device_call(|d| d.note_off(pitch, velocity)) {
                warn!(%error, pitch, "could not release note");
            }
        }
    }

    fn device_call<F>(&self, call: F) -> Result<(), DeviceError>
    where
        F: FnOnce(&mut dyn SoundDevice) -> Result<(), DeviceError>,
    {
        let mut device = lock_device(&self.device)?;
        call(&mut **device)
    }

    /// Sleep for `duration`, waking early if the session is cancelled.
    fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(CANCEL_POLL));
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn notify(&self, event: StatusEvent) {
        self.lock_sink().notify(event);
    }

    fn lock_sink(&self) -> MutexGuard<'_, Box<dyn StatusSink>> {
        // A sink that panicked once still gets later events.
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the outcome, free the session slot and emit the terminal event.
    ///
    /// Done under the sink lock so that the next session's `PlaybackStarted`
    /// cannot overtake this session's terminal event.
    fn finish(&self, outcome: &SessionOutcome) {
        let mut sink = self.lock_sink();
        *self
            .shared
            .last_outcome
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(outcome.clone());
        self.shared.running.store(false, Ordering::Release);
        info!(?outcome, "playback finished");

        let event = outcome.to_event();
        if panic::catch_unwind(AssertUnwindSafe(|| sink.notify(event))).is_err() {
            warn!("status sink panicked on the terminal event");
        }
    }
}
