//! # Sound Device Port
//!
//! The scheduler talks to sound hardware only through [`SoundDevice`]. Any
//! MIDI output, synth or test double can sit behind it.
//!
//! ## Implementations
//! - [`RecordingDevice`] - keeps every command in memory (dry runs, tests)
//! - [`ConsoleDevice`] - prints one line per command with a timestamp
//!
//! All three port operations may fail. The scheduler never retries them.

use crate::error::DeviceError;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Discrete note-on/note-off device.
pub trait SoundDevice: Send {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError>;
    fn note_off(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError>;
    /// Select the timbre used by subsequent note-ons (General MIDI program number).
    fn set_instrument(&mut self, program: u8) -> Result<(), DeviceError>;
}

impl<D: SoundDevice + ?Sized> SoundDevice for Box<D> {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        (**self).note_on(pitch, velocity)
    }

    fn note_off(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        (**self).note_off(pitch, velocity)
    }

    fn set_instrument(&mut self, program: u8) -> Result<(), DeviceError> {
        (**self).set_instrument(program)
    }
}

/// One call made on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum DeviceCommand {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
    SetInstrument { program: u8 },
}

/// Shared, cloneable view of everything a [`RecordingDevice`] received.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<(Instant, DeviceCommand)>>>);

impl CommandLog {
    fn push(&self, command: DeviceCommand) {
        if let Ok(mut log) = self.0.lock() {
            log.push((Instant::now(), command));
        }
    }

    /// Commands in arrival order.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.0
            .lock()
            .map(|log| log.iter().map(|(_, c)| *c).collect())
            .unwrap_or_default()
    }

    /// Commands with the instant each was received.
    pub fn timed_commands(&self) -> Vec<(Instant, DeviceCommand)> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.0.lock() {
            log.clear();
        }
    }
}

/// In-memory device that never fails.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    log: CommandLog,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the command log that stays valid after the device is moved
    /// into a scheduler.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl SoundDevice for RecordingDevice {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        self.log.push(DeviceCommand::NoteOn { pitch, velocity });
        Ok(())
    }

    fn note_off(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        self.log.push(DeviceCommand::NoteOff { pitch, velocity });
        Ok(())
    }

    fn set_instrument(&mut self, program: u8) -> Result<(), DeviceError> {
        self.log.push(DeviceCommand::SetInstrument { program });
        Ok(())
    }
}

/// Writes each command as a text line, e.g. `[  0.512s] note-off 64 vel 80`.
pub struct ConsoleDevice<W: Write + Send> {
    out: W,
    started: Instant,
}

impl<W: Write + Send> ConsoleDevice<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: Instant::now(),
        }
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) -> Result<(), DeviceError> {
        let elapsed = self.started.elapsed().as_secs_f64();
        writeln!(self.out, "[{:>8.3}s] {}", elapsed, line)
            .and_then(|_| self.out.flush())
            .map_err(|e| DeviceError::new(format!("console write failed: {}", e)))
    }
}

impl<W: Write + Send> SoundDevice for ConsoleDevice<W> {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        self.emit(format_args!("note-on  {:>3} vel {}", pitch, velocity))
    }

    fn note_off(&mut self, pitch: u8, velocity: u8) -> Result<(), DeviceError> {
        self.emit(format_args!("note-off {:>3} vel {}", pitch, velocity))
    }

    fn set_instrument(&mut self, program: u8) -> Result<(), DeviceError> {
        self.emit(format_args!("program  {:>3}", program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_recording_device_keeps_order() {
        let mut device = RecordingDevice::new();
        let log = device.log();
        device.set_instrument(40).unwrap();
        device.note_on(60, 80).unwrap();
        device.note_off(60, 80).unwrap();

        assert_eq!(
            log.commands(),
            vec![
                DeviceCommand::SetInstrument { program: 40 },
                DeviceCommand::NoteOn { pitch: 60, velocity: 80 },
                DeviceCommand::NoteOff { pitch: 60, velocity: 80 },
            ]
        );

        log.clear();
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_boxed_device_forwards() {
        let recorder = RecordingDevice::new();
        let log = recorder.log();
        let mut boxed: Box<dyn SoundDevice> = Box::new(recorder);
        boxed.note_on(64, 100).unwrap();
        assert_eq!(log.commands(), vec![DeviceCommand::NoteOn { pitch: 64, velocity: 100 }]);
    }

    #[test]
    fn test_console_device_lines() {
        let mut device = ConsoleDevice::new(Vec::new());
        device.note_on(60, 80).unwrap();
        device.note_off(60, 80).unwrap();
        device.set_instrument(5).unwrap();

        let text = String::from_utf8(device.out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("note-on   60 vel 80"));
        assert!(lines[1].ends_with("note-off  60 vel 80"));
        assert!(lines[2].ends_with("program    5"));
    }

    #[test]
    fn test_command_yaml_shape() {
        let yaml = serde_yaml::to_string(&DeviceCommand::NoteOn { pitch: 60, velocity: 80 }).unwrap();
        assert!(yaml.contains("command: note-on"));
        assert!(yaml.contains("pitch: 60"));
    }
}
