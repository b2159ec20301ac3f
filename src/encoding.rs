//! Character encoding support for legacy MARC records.
//!
//! MARC binary records declare their character coding in leader position 9:
//! 'a' means UTF-8, anything else (a space in conforming records) means
//! MARC-8 — the pre-Unicode MARC encoding built on ISO 2022 escape sequences
//! that switch between working character sets.
//!
//! Decoding is where this matters: the binary codec consults
//! [`Marc8Handling`] for non-UTF-8 records. Encoding never produces MARC-8;
//! every encoder in this crate emits UTF-8 and stamps the leader
//! accordingly.
//!
//! The transliterator covers the Basic Latin (G0 default) and ANSEL
//! Extended Latin (G1 default) sets plus the small custom subscript,
//! superscript, and Greek-symbol sets. ANSEL places combining marks before
//! their base character; the decoder reorders them after the base and
//! NFC-normalizes the result so `0xE2 'e'` comes out as `é`.
//! Bytes in unsupported sets (East Asian multibyte among them) degrade to
//! U+FFFD rather than failing the record.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// How the binary decoder treats field data in MARC-8 records.
///
/// This is the one configuration knob in the crate; it is passed explicitly
/// (no environment, no global state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Marc8Handling {
    /// Transliterate MARC-8 to UTF-8 (escape-sequence state machine,
    /// combining-mark reordering, NFC). Unmapped bytes become U+FFFD.
    #[default]
    Transliterate,
    /// Pass the raw bytes through `from_utf8_lossy` with no MARC-8
    /// interpretation. Diacritics will be mangled; nothing is invented.
    Lossy,
}

/// Decodes one field's bytes according to the record's declared coding.
pub(crate) fn decode_field_bytes(bytes: &[u8], utf8: bool, handling: Marc8Handling) -> String {
    if utf8 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    match handling {
        Marc8Handling::Transliterate => marc8_to_unicode(bytes),
        Marc8Handling::Lossy => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Working character sets a MARC-8 stream can designate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    /// ASCII (G0 default).
    BasicLatin,
    /// ANSEL Extended Latin (G1 default).
    Ansel,
    /// Custom subscript set (ESC b).
    Subscript,
    /// Custom superscript set (ESC p).
    Superscript,
    /// Custom Greek-symbol set (ESC g).
    GreekSymbols,
    /// East Asian multibyte set (ESC $ 1); 3-byte groups, not carried.
    Eacc,
    /// A designated set this crate does not carry; bytes become U+FFFD.
    Unmapped,
}

impl Charset {
    /// Maps an ISO 2022 final byte from ESC ( / ESC ) to a character set.
    fn from_final_byte(byte: u8) -> Charset {
        match byte {
            b'B' => Charset::BasicLatin,
            b'E' => Charset::Ansel,
            // Hebrew, Arabic, Cyrillic, Greek designations exist on the
            // wire but are outside this crate's scope.
            _ => Charset::Unmapped,
        }
    }
}

/// Transliterates MARC-8 bytes to a Unicode string.
///
/// Never fails: unknown escape sequences are skipped, unmapped bytes become
/// U+FFFD, and a truncated escape at end of input contributes one U+FFFD.
#[must_use]
pub fn marc8_to_unicode(bytes: &[u8]) -> String {
    let mut g0 = Charset::BasicLatin;
    let mut g1 = Charset::Ansel;
    let mut result = String::new();
    let mut pending_marks: Vec<char> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1B {
            let Some(&selector) = bytes.get(i + 1) else {
                result.push('\u{FFFD}');
                break;
            };
            match selector {
                // ESC ( F - designate G0
                0x28 => {
                    let Some(&final_byte) = bytes.get(i + 2) else {
                        result.push('\u{FFFD}');
                        break;
                    };
                    g0 = Charset::from_final_byte(final_byte);
                    i += 3;
                }
                // ESC ) F - designate G1
                0x29 => {
                    let Some(&final_byte) = bytes.get(i + 2) else {
                        result.push('\u{FFFD}');
                        break;
                    };
                    g1 = Charset::from_final_byte(final_byte);
                    i += 3;
                }
                // ESC $ ... - designate a multibyte set
                0x24 => {
                    let Some(&modifier) = bytes.get(i + 2) else {
                        result.push('\u{FFFD}');
                        break;
                    };
                    if modifier == 0x31 {
                        g0 = Charset::Eacc;
                        i += 3;
                    } else if i + 3 < bytes.len() {
                        g0 = Charset::Unmapped;
                        i += 4;
                    } else {
                        i += 3;
                    }
                }
                // ESC s - reset G0 to ASCII
                0x73 => {
                    g0 = Charset::BasicLatin;
                    i += 2;
                }
                // ESC g / ESC b / ESC p - custom locking sets
                0x67 => {
                    g0 = Charset::GreekSymbols;
                    i += 2;
                }
                0x62 => {
                    g0 = Charset::Subscript;
                    i += 2;
                }
                0x70 => {
                    g0 = Charset::Superscript;
                    i += 2;
                }
                _ => {
                    // Unknown escape: skip selector and move on.
                    i += 2;
                }
            }
            continue;
        }

        let byte = bytes[i];

        // Control bytes carry no text; keep line breaks only.
        if byte < 0x20 || byte == 0x7F {
            if byte == 0x0A || byte == 0x0D {
                result.push(byte as char);
            }
            i += 1;
            continue;
        }

        let charset = if byte >= 0xA0 { g1 } else { g0 };

        if charset == Charset::Eacc {
            // Three-byte groups; the East Asian tables are not carried.
            let group = bytes.len().min(i + 3) - i;
            result.push('\u{FFFD}');
            i += group;
            continue;
        }

        match lookup(charset, byte) {
            Some((ch, true)) => pending_marks.push(ch),
            Some((ch, false)) => {
                // MARC-8 puts marks before the base; Unicode wants them
                // after it.
                result.push(ch);
                result.extend(pending_marks.drain(..));
            }
            None => result.push('\u{FFFD}'),
        }
        i += 1;
    }

    // Marks with no base character left to attach to.
    result.extend(pending_marks);

    result.nfc().collect()
}

/// Looks up a single byte in the given working set.
///
/// Returns the Unicode character and whether it is a combining mark.
fn lookup(charset: Charset, byte: u8) -> Option<(char, bool)> {
    match charset {
        Charset::BasicLatin => {
            if (0x20..=0x7E).contains(&byte) {
                Some((byte as char, false))
            } else {
                None
            }
        }
        Charset::Ansel => ANSEL.get(&byte).copied(),
        Charset::Subscript => subscript_char(byte).map(|ch| (ch, false)),
        Charset::Superscript => superscript_char(byte).map(|ch| (ch, false)),
        Charset::GreekSymbols => greek_symbol_char(byte).map(|ch| (ch, false)),
        Charset::Eacc | Charset::Unmapped => None,
    }
}

fn subscript_char(byte: u8) -> Option<char> {
    match byte {
        b'0'..=b'9' => char::from_u32(0x2080 + u32::from(byte - b'0')),
        b'+' => Some('\u{208A}'),
        b'-' => Some('\u{208B}'),
        b'(' => Some('\u{208D}'),
        b')' => Some('\u{208E}'),
        _ => None,
    }
}

fn superscript_char(byte: u8) -> Option<char> {
    match byte {
        b'0' => Some('\u{2070}'),
        b'1' => Some('\u{00B9}'),
        b'2' => Some('\u{00B2}'),
        b'3' => Some('\u{00B3}'),
        b'4'..=b'9' => char::from_u32(0x2070 + u32::from(byte - b'0')),
        b'+' => Some('\u{207A}'),
        b'-' => Some('\u{207B}'),
        b'(' => Some('\u{207D}'),
        b')' => Some('\u{207E}'),
        _ => None,
    }
}

fn greek_symbol_char(byte: u8) -> Option<char> {
    match byte {
        b'a' => Some('\u{03B1}'),
        b'b' => Some('\u{03B2}'),
        b'c' => Some('\u{03B3}'),
        _ => None,
    }
}

lazy_static! {
    /// ANSEL Extended Latin (the G1 default): spacing characters in
    /// 0xA1-0xC8, combining marks in 0xE0-0xFE.
    static ref ANSEL: HashMap<u8, (char, bool)> = {
        let mut m = HashMap::new();
        let spacing: &[(u8, char)] = &[
            (0xA1, '\u{0141}'), // L with stroke
            (0xA2, '\u{00D8}'), // O with stroke
            (0xA3, '\u{0110}'), // D with stroke
            (0xA4, '\u{00DE}'), // Thorn
            (0xA5, '\u{00C6}'), // AE
            (0xA6, '\u{0152}'), // OE
            (0xA7, '\u{02B9}'), // prime / soft sign
            (0xA8, '\u{00B7}'), // middle dot
            (0xA9, '\u{266D}'), // music flat
            (0xAA, '\u{00AE}'), // registered
            (0xAB, '\u{00B1}'), // plus-minus
            (0xAC, '\u{01A0}'), // O with horn
            (0xAD, '\u{01AF}'), // U with horn
            (0xAE, '\u{02BC}'), // alif
            (0xB0, '\u{02BB}'), // ayn
            (0xB1, '\u{0142}'), // l with stroke
            (0xB2, '\u{00F8}'), // o with stroke
            (0xB3, '\u{0111}'), // d with stroke
            (0xB4, '\u{00FE}'), // thorn
            (0xB5, '\u{00E6}'), // ae
            (0xB6, '\u{0153}'), // oe
            (0xB7, '\u{02BA}'), // double prime / hard sign
            (0xB8, '\u{0131}'), // dotless i
            (0xB9, '\u{00A3}'), // pound sign
            (0xBA, '\u{00F0}'), // eth
            (0xBC, '\u{01A1}'), // o with horn
            (0xBD, '\u{01B0}'), // u with horn
            (0xC0, '\u{00B0}'), // degree
            (0xC1, '\u{2113}'), // script l
            (0xC2, '\u{2117}'), // sound recording copyright
            (0xC3, '\u{00A9}'), // copyright
            (0xC4, '\u{266F}'), // music sharp
            (0xC5, '\u{00BF}'), // inverted question mark
            (0xC6, '\u{00A1}'), // inverted exclamation mark
            (0xC7, '\u{00DF}'), // sharp s
            (0xC8, '\u{20AC}'), // euro
        ];
        let combining: &[(u8, char)] = &[
            (0xE0, '\u{0309}'), // hook above
            (0xE1, '\u{0300}'), // grave
            (0xE2, '\u{0301}'), // acute
            (0xE3, '\u{0302}'), // circumflex
            (0xE4, '\u{0303}'), // tilde
            (0xE5, '\u{0304}'), // macron
            (0xE6, '\u{0306}'), // breve
            (0xE7, '\u{0307}'), // dot above
            (0xE8, '\u{0308}'), // diaeresis
            (0xE9, '\u{030C}'), // caron
            (0xEA, '\u{030A}'), // ring above
            (0xEB, '\u{FE20}'), // ligature, left half
            (0xEC, '\u{FE21}'), // ligature, right half
            (0xED, '\u{0315}'), // high comma, off center
            (0xEE, '\u{030B}'), // double acute
            (0xEF, '\u{0310}'), // candrabindu
            (0xF0, '\u{0327}'), // cedilla
            (0xF1, '\u{0328}'), // right hook (ogonek)
            (0xF2, '\u{0323}'), // dot below
            (0xF3, '\u{0324}'), // double dot below
            (0xF4, '\u{0325}'), // ring below
            (0xF5, '\u{0333}'), // double underscore
            (0xF6, '\u{0332}'), // underscore
            (0xF7, '\u{0326}'), // left hook (comma below)
            (0xF8, '\u{031C}'), // right cedilla
            (0xF9, '\u{032E}'), // upadhmaniya (breve below)
            (0xFA, '\u{FE22}'), // double tilde, left half
            (0xFB, '\u{FE23}'), // double tilde, right half
            (0xFE, '\u{0313}'), // high comma, centered
        ];
        for &(byte, ch) in spacing {
            m.insert(byte, (ch, false));
        }
        for &(byte, ch) in combining {
            m.insert(byte, (ch, true));
        }
        m
    };
}
