//! Integration tests for tonetext
//!
//! Tests the full pipeline from note text to device commands and status events.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tonetext::{
    tokenize, DeviceCommand, NotationTable, PlaybackConfig, RecordingDevice, Scheduler,
    SessionOutcome, StartRejection, StatusEvent, ToneError,
};

fn on(pitch: u8) -> DeviceCommand {
    DeviceCommand::NoteOn { pitch, velocity: 80 }
}

fn off(pitch: u8) -> DeviceCommand {
    DeviceCommand::NoteOff { pitch, velocity: 80 }
}

#[test]
fn test_two_chords_end_to_end() {
    let device = RecordingDevice::new();
    let log = device.log();
    let (scheduler, events) = Scheduler::with_channel(NotationTable::standard(), device);
    let config = PlaybackConfig::default()
        .with_hold_secs(0.2)
        .and_then(|c| c.with_gap_secs(0.1))
        .unwrap();

    scheduler.play_text("q w", &config).unwrap();
    assert_eq!(scheduler.wait(), Some(SessionOutcome::Completed));

    // C major, then D minor
    assert_eq!(
        log.commands(),
        vec![
            on(60), on(64), on(67),
            off(60), off(64), off(67),
            on(62), on(65), on(69),
            off(62), off(65), off(69),
        ]
    );

    let timed = log.timed_commands();
    assert!(timed[3].0 - timed[2].0 >= Duration::from_millis(200));
    assert!(timed[6].0 - timed[5].0 >= Duration::from_millis(100));
    assert!(timed[9].0 - timed[8].0 >= Duration::from_millis(200));

    let seen: Vec<StatusEvent> = events.try_iter().collect();
    assert_eq!(
        seen,
        vec![
            StatusEvent::PlaybackStarted { total: 2 },
            StatusEvent::TokenPlaying { token: "q".to_string(), index: 0, total: 2 },
            StatusEvent::TokenPlaying { token: "w".to_string(), index: 1, total: 2 },
            StatusEvent::PlaybackCompleted,
        ]
    );
}

#[test]
fn test_every_symbol_plays_its_pitch_set() {
    let table = NotationTable::standard();
    let text: Vec<&str> = table.entries().iter().map(|(symbol, _)| *symbol).collect();
    let expected: usize = table.entries().iter().map(|(_, set)| set.len()).sum();

    let device = RecordingDevice::new();
    let log = device.log();
    let (scheduler, _events) = Scheduler::with_channel(NotationTable::standard(), device);
    let config = PlaybackConfig::default()
        .with_hold_secs(0.1)
        .and_then(|c| c.with_gap_secs(0.0))
        .unwrap();

    scheduler.play_text(&text.join(" "), &config).unwrap();
    assert_eq!(scheduler.wait(), Some(SessionOutcome::Completed));

    let commands = log.commands();
    let ons: Vec<u8> = commands
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::NoteOn { pitch, .. } => Some(*pitch),
            _ => None,
        })
        .collect();
    let offs: Vec<u8> = commands
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::NoteOff { pitch, .. } => Some(*pitch),
            _ => None,
        })
        .collect();
    assert_eq!(ons.len(), expected);
    assert_eq!(offs, ons);
}

#[test]
fn test_tokenize_and_resolve() {
    assert_eq!(tokenize("1 3 5").texts(), vec!["1", "3", "5"]);
    assert_eq!(tokenize("q").texts(), vec!["q"]);
    assert!(tokenize("").is_empty());
    assert!(tokenize(" \t\n").is_empty());

    let table = NotationTable::standard();
    assert_eq!(table.resolve("1").unwrap().pitches(), &[60]);
    assert_eq!(table.resolve("q").unwrap().pitches(), &[60, 64, 67]);
    assert_eq!(table.resolve("i").unwrap().len(), 4);
}

#[test]
fn test_blank_text_rejected() {
    let (scheduler, _events) =
        Scheduler::with_channel(NotationTable::standard(), RecordingDevice::new());
    let err = scheduler
        .play_text("   ", &PlaybackConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ToneError::InvalidStartRequest(StartRejection::EmptySequence)
    ));
    assert_eq!(scheduler.last_outcome(), None);
}

#[test]
fn test_yaml_config_drives_playback() {
    let config = PlaybackConfig::from_yaml("hold: 0.1\ngap: 0\nvelocity: 100\n").unwrap();
    let device = RecordingDevice::new();
    let log = device.log();
    let (scheduler, _events) = Scheduler::with_channel(NotationTable::standard(), device);

    scheduler.play_text("5", &config).unwrap();
    scheduler.wait();

    assert_eq!(
        log.commands(),
        vec![
            DeviceCommand::NoteOn { pitch: 67, velocity: 100 },
            DeviceCommand::NoteOff { pitch: 67, velocity: 100 },
        ]
    );
}

#[test]
fn test_status_events_serialize() {
    let event = StatusEvent::TokenPlaying {
        token: "q".to_string(),
        index: 0,
        total: 2,
    };
    let yaml = serde_yaml::to_string(&event).unwrap();
    assert!(yaml.contains("event: token-playing"));
    assert_eq!(event.to_string(), "playing 'q' (1/2)");
}
