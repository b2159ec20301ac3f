//! MARC record leader parsing and manipulation.
//!
//! The MARC leader is a 24-character fixed-length field at the start of every
//! MARC record. It contains metadata describing the record's structure,
//! content type, and encoding.
//!
//! # Structure
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Type of record (a = language material, c = music, etc.)
//! - Position 7: Bibliographic level (m = monograph, s = serial, etc.)
//! - Position 8: Type of control
//! - Position 9: Character coding scheme (space = MARC-8, a = UTF-8)
//! - Position 10: Indicator count (always 2)
//! - Position 11: Subfield code count (always 2)
//! - Positions 12-16: Base address of data (5 digits)
//! - Position 17: Encoding level
//! - Position 18: Descriptive cataloging form
//! - Position 19: Multipart resource record level
//! - Positions 20-23: Entry map (fixed "4500")
//!
//! The leader is stored as the raw 24 characters it arrived with. Real-world
//! files — binary streams with stale length bytes, XML and JSON records with
//! all-blank leaders — routinely carry non-numeric data in the numeric
//! positions, and a decoded leader must survive to the renderer verbatim.
//! The typed accessors therefore return `Option` for the numeric positions
//! and plain `char` for the rest; the length positions are only ever
//! rewritten by the encode path, via [`Leader::with_lengths`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Length of a MARC leader in characters (and bytes, on the binary wire).
pub const LEADER_LEN: usize = 24;

/// MARC leader - the 24-character header of every MARC record.
///
/// Always holds exactly 24 characters; construction pads short input with
/// trailing spaces and truncates long input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leader {
    chars: String,
}

impl Leader {
    /// Creates a leader from arbitrary text, padded or truncated to exactly
    /// 24 characters.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut chars: String = text.chars().take(LEADER_LEN).collect();
        let count = chars.chars().count();
        for _ in count..LEADER_LEN {
            chars.push(' ');
        }
        Leader { chars }
    }

    /// Creates a leader from the first 24 bytes of a binary record.
    ///
    /// Returns `None` if fewer than 24 bytes are available. Invalid UTF-8
    /// degrades to replacement characters rather than failing; the binary
    /// wire carries ASCII here in practice.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < LEADER_LEN {
            return None;
        }
        Some(Self::from_text(&String::from_utf8_lossy(
            &bytes[..LEADER_LEN],
        )))
    }

    /// Creates the all-space leader substituted when a source record carries
    /// no leader at all.
    #[must_use]
    pub fn synthetic() -> Self {
        Leader {
            chars: " ".repeat(LEADER_LEN),
        }
    }

    /// The raw 24 characters.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    /// The leader as 24 bytes for the binary wire.
    ///
    /// Non-ASCII characters (possible after decoding hostile XML or JSON)
    /// are replaced with spaces so the fixed-width layout holds.
    #[must_use]
    pub fn to_wire_bytes(&self) -> [u8; LEADER_LEN] {
        let mut out = [b' '; LEADER_LEN];
        for (slot, ch) in out.iter_mut().zip(self.chars.chars()) {
            if ch.is_ascii() {
                *slot = ch as u8;
            }
        }
        out
    }

    /// Record length (positions 0-4), if those positions hold ASCII digits.
    #[must_use]
    pub fn record_length(&self) -> Option<usize> {
        parse_digit_run(&self.chars, 0, 5)
    }

    /// Record status (position 5).
    #[must_use]
    pub fn record_status(&self) -> char {
        self.char_at(5)
    }

    /// Type of record (position 6).
    #[must_use]
    pub fn record_type(&self) -> char {
        self.char_at(6)
    }

    /// Bibliographic level (position 7).
    #[must_use]
    pub fn bibliographic_level(&self) -> char {
        self.char_at(7)
    }

    /// Type of control (position 8).
    #[must_use]
    pub fn type_of_control(&self) -> char {
        self.char_at(8)
    }

    /// Character coding scheme (position 9).
    #[must_use]
    pub fn character_coding(&self) -> char {
        self.char_at(9)
    }

    /// Whether position 9 declares UTF-8 ('a'). Anything else is treated as
    /// MARC-8 on the binary decode path.
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.character_coding() == 'a'
    }

    /// Indicator count (position 10, '2' in conforming records).
    #[must_use]
    pub fn indicator_count(&self) -> char {
        self.char_at(10)
    }

    /// Subfield code count (position 11, '2' in conforming records).
    #[must_use]
    pub fn subfield_code_count(&self) -> char {
        self.char_at(11)
    }

    /// Base address of data (positions 12-16), if those positions hold ASCII
    /// digits.
    #[must_use]
    pub fn base_address(&self) -> Option<usize> {
        parse_digit_run(&self.chars, 12, 5)
    }

    /// Encoding level (position 17).
    #[must_use]
    pub fn encoding_level(&self) -> char {
        self.char_at(17)
    }

    /// Descriptive cataloging form (position 18).
    #[must_use]
    pub fn cataloging_form(&self) -> char {
        self.char_at(18)
    }

    /// Multipart resource record level (position 19).
    #[must_use]
    pub fn multipart_level(&self) -> char {
        self.char_at(19)
    }

    /// Entry map (positions 20-23, "4500" in conforming records).
    #[must_use]
    pub fn entry_map(&self) -> &str {
        let start = self
            .chars
            .char_indices()
            .nth(20)
            .map_or(self.chars.len(), |(i, _)| i);
        &self.chars[start..]
    }

    /// Returns a copy with the record-length and base-address positions
    /// rewritten as 5-digit zero-padded numbers.
    ///
    /// Values above 99999 are clamped; the binary writer rejects such
    /// records before calling this.
    #[must_use]
    pub fn with_lengths(&self, record_length: usize, base_address: usize) -> Self {
        let mut chars: Vec<char> = self.chars.chars().collect();
        splice_five_digits(&mut chars, 0, record_length);
        splice_five_digits(&mut chars, 12, base_address);
        Leader {
            chars: chars.into_iter().collect(),
        }
    }

    /// Returns a copy with the character coding scheme (position 9) replaced.
    #[must_use]
    pub fn with_character_coding(&self, coding: char) -> Self {
        let mut chars: Vec<char> = self.chars.chars().collect();
        chars[9] = coding;
        Leader {
            chars: chars.into_iter().collect(),
        }
    }

    fn char_at(&self, index: usize) -> char {
        // Construction guarantees 24 chars, so the fallback is unreachable.
        self.chars.chars().nth(index).unwrap_or(' ')
    }
}

impl Default for Leader {
    /// A minimal well-formed leader for records built in memory: new
    /// monograph, UTF-8, zeroed lengths, "4500" entry map.
    fn default() -> Self {
        Leader::from_text("00000nam a2200000 i 4500")
    }
}

impl fmt::Display for Leader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chars)
    }
}

impl Serialize for Leader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.chars)
    }
}

impl<'de> Deserialize<'de> for Leader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Leader::from_text(&text))
    }
}

/// Parses `count` characters starting at char position `start` as a decimal
/// number. Returns `None` unless every character is an ASCII digit.
fn parse_digit_run(chars: &str, start: usize, count: usize) -> Option<usize> {
    let mut value = 0usize;
    let mut seen = 0usize;
    for ch in chars.chars().skip(start).take(count) {
        let digit = ch.to_digit(10)?;
        value = value * 10 + digit as usize;
        seen += 1;
    }
    if seen == count {
        Some(value)
    } else {
        None
    }
}

/// Writes `value` as 5 zero-padded digits into `chars` at `start`.
fn splice_five_digits(chars: &mut [char], start: usize, value: usize) {
    let clamped = value.min(99_999);
    let formatted = format!("{clamped:05}");
    for (offset, digit) in formatted.chars().enumerate() {
        chars[start + offset] = digit;
    }
}
