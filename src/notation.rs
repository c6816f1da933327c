//! # Notation Table
//!
//! Maps single-character symbols to the pitches they sound.
//!
//! ## Standard Layout
//! ```text
//! Notes   1 2 3 4 5 6 7 8 9 0   -> C4 D4 E4 F4 G4 A4 B4 C5 D5 E5
//!         ! @ $ % ^             -> C#4 D#4 F#4 G#4 A#4
//! Chords  q w e r t y u         -> C Dm Em F G Am Bdim (root position)
//!         i o p                 -> Cmaj7 Dm7 G7
//! ```
//!
//! The digits follow a C major scale upwards from middle C; the shifted digits
//! are the black keys in between. Chord letters run along the top keyboard row
//! and build diatonic triads (and three tetrads) on the C major scale degrees.
//!
//! ## MIDI Note Reference
//! - C4 = 60, D4 = 62, E4 = 64, F4 = 65, G4 = 67, A4 = 69, B4 = 71, C5 = 72
//!
//! ## Related Modules
//! - `lexer` - produces the tokens looked up here
//! - `playback` - sounds the resolved pitch sets

use crate::error::ToneError;
use serde::Serialize;
use std::collections::HashMap;

/// Highest pitch accepted by the device boundary.
pub const MAX_PITCH: u8 = 127;

/// One or more pitches sounded together.
///
/// Pitches keep the order they were given in; the scheduler turns them on and
/// off in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PitchSet(Vec<u8>);

impl PitchSet {
    /// Build a pitch set, rejecting empty sets and pitches above [`MAX_PITCH`].
    pub fn new(pitches: Vec<u8>) -> Result<Self, String> {
        if pitches.is_empty() {
            return Err("pitch set has no pitches".to_string());
        }
        if let Some(p) = pitches.iter().find(|p| **p > MAX_PITCH) {
            return Err(format!("pitch {} is above {}", p, MAX_PITCH));
        }
        Ok(Self(pitches))
    }

    pub fn pitches(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a set built through `new`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_chord(&self) -> bool {
        self.0.len() > 1
    }
}

/// Whether a symbol plays a single note or a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Note,
    Chord,
}

/// Immutable symbol -> pitch set lookup.
#[derive(Debug, Clone)]
pub struct NotationTable {
    entries: HashMap<String, PitchSet>,
}

impl NotationTable {
    /// Build a custom table.
    ///
    /// # Errors
    /// Returns [`ToneError::InvalidPitchSet`] when an entry has no pitches or
    /// a pitch above 127.
    pub fn new<I, S>(entries: I) -> Result<Self, ToneError>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (symbol, pitches) in entries {
            let symbol = symbol.into();
            let set = PitchSet::new(pitches).map_err(|message| ToneError::InvalidPitchSet {
                symbol: symbol.clone(),
                message,
            })?;
            map.insert(symbol, set);
        }
        Ok(Self { entries: map })
    }

    /// The keyboard layout described in the module docs.
    pub fn standard() -> Self {
        let notes: [(&str, u8); 15] = [
            ("1", 60),
            ("2", 62),
            ("3", 64),
            ("4", 65),
            ("5", 67),
            ("6", 69),
            ("7", 71),
            ("8", 72),
            ("9", 74),
            ("0", 76),
            ("!", 61),
            ("@", 63),
            ("$", 66),
            ("%", 68),
            ("^", 70),
        ];
        let chords: [(&str, &[u8]); 10] = [
            ("q", &[60, 64, 67]),
            ("w", &[62, 65, 69]),
            ("e", &[64, 67, 71]),
            ("r", &[65, 69, 72]),
            ("t", &[67, 71, 74]),
            ("y", &[69, 72, 76]),
            ("u", &[71, 74, 77]),
            ("i", &[60, 64, 67, 71]),
            ("o", &[62, 65, 69, 72]),
            ("p", &[67, 71, 74, 77]),
        ];

        let mut entries = HashMap::with_capacity(notes.len() + chords.len());
        for (symbol, pitch) in notes {
            entries.insert(symbol.to_string(), PitchSet(vec![pitch]));
        }
        for (symbol, pitches) in chords {
            entries.insert(symbol.to_string(), PitchSet(pitches.to_vec()));
        }
        Self { entries }
    }

    /// Look up a token. Matching is on the whole token, so `"12"` is unknown
    /// even though `"1"` and `"2"` are not.
    pub fn resolve(&self, token: &str) -> Option<&PitchSet> {
        self.entries.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn kind(&self, token: &str) -> Option<SymbolKind> {
        self.resolve(token).map(|set| {
            if set.is_chord() {
                SymbolKind::Chord
            } else {
                SymbolKind::Note
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, notes first, each group ordered by lowest pitch.
    pub fn entries(&self) -> Vec<(&str, &PitchSet)> {
        let mut list: Vec<_> = self
            .entries
            .iter()
            .map(|(symbol, set)| (symbol.as_str(), set))
            .collect();
        list.sort_by(|a, b| {
            (a.1.is_chord(), a.1.pitches(), a.0).cmp(&(b.1.is_chord(), b.1.pitches(), b.0))
        });
        list
    }
}

impl Default for NotationTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_digits() {
        let table = NotationTable::standard();
        let scale: Vec<u8> = "1234567890"
            .chars()
            .map(|c| table.resolve(&c.to_string()).unwrap().pitches()[0])
            .collect();
        // C4 D4 E4 F4 G4 A4 B4 C5 D5 E5
        assert_eq!(scale, vec![60, 62, 64, 65, 67, 69, 71, 72, 74, 76]);
    }

    #[test]
    fn test_black_keys() {
        let table = NotationTable::standard();
        assert_eq!(table.resolve("!").unwrap().pitches(), &[61]);
        assert_eq!(table.resolve("@").unwrap().pitches(), &[63]);
        assert_eq!(table.resolve("$").unwrap().pitches(), &[66]);
        assert_eq!(table.resolve("%").unwrap().pitches(), &[68]);
        assert_eq!(table.resolve("^").unwrap().pitches(), &[70]);
        // shifted 3 and 7 would be E# and B#, which the layout leaves out
        assert!(table.resolve("#").is_none());
        assert!(table.resolve("&").is_none());
    }

    #[test]
    fn test_chords() {
        let table = NotationTable::standard();
        assert_eq!(table.resolve("q").unwrap().pitches(), &[60, 64, 67]); // C
        assert_eq!(table.resolve("y").unwrap().pitches(), &[69, 72, 76]); // Am
        assert_eq!(table.resolve("u").unwrap().pitches(), &[71, 74, 77]); // Bdim
        assert_eq!(table.resolve("i").unwrap().pitches(), &[60, 64, 67, 71]);
        assert_eq!(table.resolve("p").unwrap().pitches(), &[67, 71, 74, 77]); // G7
    }

    #[test]
    fn test_resolution_sizes() {
        let table = NotationTable::standard();
        assert_eq!(table.resolve("1").unwrap().len(), 1);
        assert_eq!(table.resolve("q").unwrap().len(), 3);
        assert_eq!(table.resolve("i").unwrap().len(), 4);
        assert_eq!(table.len(), 25);
    }

    #[test]
    fn test_unknown_tokens() {
        let table = NotationTable::standard();
        assert!(table.resolve("x").is_none());
        assert!(table.resolve("Q").is_none());
        assert!(table.resolve("12").is_none());
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_kind() {
        let table = NotationTable::standard();
        assert_eq!(table.kind("5"), Some(SymbolKind::Note));
        assert_eq!(table.kind("o"), Some(SymbolKind::Chord));
        assert_eq!(table.kind("z"), None);
    }

    #[test]
    fn test_custom_table_validation() {
        let table = NotationTable::new([("a", vec![57]), ("A", vec![57, 61, 64])]).unwrap();
        assert!(table.resolve("A").unwrap().is_chord());

        let err = NotationTable::new([("x", vec![])]).unwrap_err();
        assert!(matches!(err, ToneError::InvalidPitchSet { ref symbol, .. } if symbol == "x"));

        let err = NotationTable::new([("y", vec![60, 128])]).unwrap_err();
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn test_entries_listing_order() {
        let table = NotationTable::standard();
        let symbols: Vec<&str> = table.entries().iter().map(|(s, _)| *s).collect();
        assert_eq!(symbols[0], "1");
        assert_eq!(symbols[1], "!");
        assert_eq!(symbols[14], "0");
        // chords start with C major then Cmaj7 (same root, longer set sorts after)
        assert_eq!(&symbols[15..17], &["q", "i"]);
    }
}
