//! # Playback Configuration
//!
//! Hold/gap timing, velocity and instrument for a playback session.
//!
//! ## Bounds
//! | setting      | range          | default |
//! |--------------|----------------|---------|
//! | `hold`       | 0.1 - 1.5 s    | 0.5 s   |
//! | `gap`        | 0.0 - 0.5 s    | 0.1 s   |
//! | `velocity`   | 0 - 127        | 80      |
//! | `instrument` | 0 - 127        | 0       |
//!
//! Values are checked when they are assigned, so a [`PlaybackConfig`] is
//! always within bounds and the scheduler never re-validates it.
//!
//! ## Config File
//! ```yaml
//! hold: 0.3
//! gap: 0.05
//! velocity: 96
//! instrument: 40
//! release-on-failure: true
//! ```
//! Every key is optional; missing keys keep their defaults.

use crate::error::ToneError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

pub const HOLD_RANGE: RangeInclusive<f64> = 0.1..=1.5;
pub const GAP_RANGE: RangeInclusive<f64> = 0.0..=0.5;
pub const VELOCITY_RANGE: RangeInclusive<u8> = 0..=127;
pub const INSTRUMENT_RANGE: RangeInclusive<u8> = 0..=127;

/// Validated playback settings.
///
/// The scheduler copies this at `start`; edits made afterwards only affect
/// the next session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlaybackConfig {
    hold: Duration,
    gap: Duration,
    velocity: u8,
    instrument: u8,
    release_on_failure: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(500),
            gap: Duration::from_millis(100),
            velocity: 80,
            instrument: 0,
            release_on_failure: true,
        }
    }
}

fn out_of_range<T: std::fmt::Display>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> ToneError {
    ToneError::ConfigurationOutOfRange {
        field,
        value: value.to_string(),
        range: format!("{}..={}", range.start(), range.end()),
    }
}

fn check_secs(field: &'static str, secs: f64, range: &RangeInclusive<f64>) -> Result<Duration, ToneError> {
    // NaN fails `contains` as well
    if !range.contains(&secs) {
        return Err(out_of_range(field, secs, range));
    }
    Ok(Duration::from_micros((secs * 1_000_000.0).round() as u64))
}

impl PlaybackConfig {
    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub fn gap(&self) -> Duration {
        self.gap
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn instrument(&self) -> u8 {
        self.instrument
    }

    /// Send note-offs for the in-flight token when a device error aborts a session.
    pub fn release_on_failure(&self) -> bool {
        self.release_on_failure
    }

    pub fn set_hold_secs(&mut self, secs: f64) -> Result<(), ToneError> {
        self.hold = check_secs("hold", secs, &HOLD_RANGE)?;
        Ok(())
    }

    pub fn set_gap_secs(&mut self, secs: f64) -> Result<(), ToneError> {
        self.gap = check_secs("gap", secs, &GAP_RANGE)?;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<(), ToneError> {
        if !VELOCITY_RANGE.contains(&velocity) {
            return Err(out_of_range("velocity", velocity, &VELOCITY_RANGE));
        }
        self.velocity = velocity;
        Ok(())
    }

    pub fn set_instrument(&mut self, instrument: u8) -> Result<(), ToneError> {
        if !INSTRUMENT_RANGE.contains(&instrument) {
            return Err(out_of_range("instrument", instrument, &INSTRUMENT_RANGE));
        }
        self.instrument = instrument;
        Ok(())
    }

    pub fn set_release_on_failure(&mut self, release: bool) {
        self.release_on_failure = release;
    }

    pub fn with_hold_secs(mut self, secs: f64) -> Result<Self, ToneError> {
        self.set_hold_secs(secs)?;
        Ok(self)
    }

    pub fn with_gap_secs(mut self, secs: f64) -> Result<Self, ToneError> {
        self.set_gap_secs(secs)?;
        Ok(self)
    }

    pub fn with_velocity(mut self, velocity: u8) -> Result<Self, ToneError> {
        self.set_velocity(velocity)?;
        Ok(self)
    }

    pub fn with_instrument(mut self, instrument: u8) -> Result<Self, ToneError> {
        self.set_instrument(instrument)?;
        Ok(self)
    }

    /// Apply the keys present in `raw` on top of this config.
    pub fn apply(&mut self, raw: &RawConfig) -> Result<(), ToneError> {
        if let Some(hold) = raw.hold {
            self.set_hold_secs(hold)?;
        }
        if let Some(gap) = raw.gap {
            self.set_gap_secs(gap)?;
        }
        if let Some(velocity) = raw.velocity {
            let velocity = u8::try_from(velocity)
                .map_err(|_| out_of_range("velocity", velocity, &(0..=127)))?;
            self.set_velocity(velocity)?;
        }
        if let Some(instrument) = raw.instrument {
            let instrument = u8::try_from(instrument)
                .map_err(|_| out_of_range("instrument", instrument, &(0..=127)))?;
            self.set_instrument(instrument)?;
        }
        if let Some(release) = raw.release_on_failure {
            self.release_on_failure = release;
        }
        Ok(())
    }

    /// Parse a YAML config document over the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ToneError> {
        let raw = RawConfig::from_yaml(content)?;
        let mut config = Self::default();
        config.apply(&raw)?;
        Ok(config)
    }

    /// Load a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Unvalidated settings as written in a config file or on the command line.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub hold: Option<f64>,
    pub gap: Option<f64>,
    pub velocity: Option<i64>,
    pub instrument: Option<i64>,
    pub release_on_failure: Option<bool>,
}

impl RawConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ToneError> {
        // an empty document deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ToneError::ConfigFile(e.to_string()))
    }
}
