//! Format detection and format-agnostic decode/encode entry points.
//!
//! MARC records travel in four wire forms: ISO 2709 binary, MARCXML,
//! MARC-in-JSON, and the line-oriented mnemonic text form. This module
//! identifies which one a byte buffer holds and dispatches to the matching
//! codec, so hosts can hand over raw file contents plus a best-guess
//! filename and get records back.
//!
//! Detection is content-first: byte sniffing always beats the filename
//! hint, because files are frequently mis-extensioned. The hint only
//! rescues inputs whose content matches nothing.
//!
//! # Examples
//!
//! ```
//! use marcview::formats::{detect_and_decode, FormatKind};
//!
//! let input = br#"{"leader":"01041cam a2200289 a 4500","fields":[{"001":"x"}]}"#;
//! let outcome = detect_and_decode(input, Some("export.json"));
//! assert_eq!(outcome.format, Some(FormatKind::Json));
//! assert_eq!(outcome.records.len(), 1);
//! assert!(outcome.errors.is_empty());
//! ```

use std::path::Path;

use memchr::memmem;

use crate::encoding::Marc8Handling;
use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::reader::MarcReader;
use crate::record::Record;
use crate::writer::MarcWriter;
use crate::{marcjson, marcxml, mnemonic};

/// How far into the input the XML sniffer looks for a `record` or
/// `collection` element.
const XML_SNIFF_WINDOW: usize = 512;

// ============================================================================
// Format kinds
// ============================================================================

/// The four supported MARC wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// ISO 2709 binary MARC format (`.mrc`, `.marc`)
    Binary,
    /// MARCXML (`.xml`, `.marcxml`)
    Xml,
    /// MARC-in-JSON (`.json`)
    Json,
    /// Line-oriented mnemonic text (`.mrk`)
    Mnemonic,
}

impl FormatKind {
    /// Detect a format from a file extension alone.
    ///
    /// Returns `None` for unrecognized or ambiguous extensions (`.txt`,
    /// `.dat`, `.001` and similar say nothing about the wire format).
    ///
    /// # Example
    ///
    /// ```
    /// use marcview::formats::FormatKind;
    ///
    /// assert_eq!(FormatKind::from_extension("mrc"), Some(FormatKind::Binary));
    /// assert_eq!(FormatKind::from_extension("txt"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mrc" | "marc" => Some(Self::Binary),
            "xml" | "marcxml" => Some(Self::Xml),
            "json" => Some(Self::Json),
            "mrk" => Some(Self::Mnemonic),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "mrc",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Mnemonic => "mrk",
        }
    }

    /// Get the human-readable name for this format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "ISO 2709 binary",
            Self::Xml => "MARCXML",
            Self::Json => "MARC-in-JSON",
            Self::Mnemonic => "mnemonic text",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Identify which wire format a byte buffer holds.
///
/// Decision order, first match wins:
///
/// 1. After trimming leading whitespace (and a UTF-8 byte order mark),
///    the input begins with `{` or `[` → [`FormatKind::Json`].
/// 2. It begins with `<?xml`, or with `<` and a `record` / `collection`
///    element opens within the first 512 bytes → [`FormatKind::Xml`].
/// 3. Its first line starts with `=LDR` or `=` plus three digits →
///    [`FormatKind::Mnemonic`].
/// 4. The raw (untrimmed) first 24 bytes form a plausible ISO 2709
///    leader → [`FormatKind::Binary`].
/// 5. Otherwise the filename hint's extension decides, when it maps to a
///    format at all.
///
/// The hint never overrides a content match; it only rescues inputs whose
/// content matched nothing.
///
/// # Errors
///
/// Returns [`DecodeError::UnrecognizedFormat`] when neither content nor
/// hint identifies a format. This is terminal for the whole input, since
/// no codec can be chosen.
pub fn detect(input: &[u8], filename_hint: Option<&str>) -> DecodeResult<FormatKind> {
    if let Some(kind) = detect_by_content(input) {
        return Ok(kind);
    }
    if let Some(kind) = filename_hint.and_then(detect_by_hint) {
        return Ok(kind);
    }
    Err(DecodeError::UnrecognizedFormat)
}

fn detect_by_content(input: &[u8]) -> Option<FormatKind> {
    let text = trim_text_prefix(input);

    match text.first() {
        Some(b'{' | b'[') => return Some(FormatKind::Json),
        Some(b'<') => {
            if looks_like_marcxml(text) {
                return Some(FormatKind::Xml);
            }
        }
        _ => {}
    }

    if looks_like_mnemonic_line(text) {
        return Some(FormatKind::Mnemonic);
    }

    // Binary sniffing works on the raw bytes: a leading whitespace byte
    // would itself disqualify a real ISO 2709 leader.
    if looks_like_binary_leader(input) {
        return Some(FormatKind::Binary);
    }

    None
}

fn detect_by_hint(hint: &str) -> Option<FormatKind> {
    let ext = Path::new(hint).extension()?.to_str()?;
    FormatKind::from_extension(ext)
}

/// Drop a UTF-8 byte order mark and leading ASCII whitespace for the
/// text-format sniffers.
fn trim_text_prefix(input: &[u8]) -> &[u8] {
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    &input[start..]
}

fn looks_like_marcxml(text: &[u8]) -> bool {
    if text.starts_with(b"<?xml") {
        return true;
    }
    let window = &text[..text.len().min(XML_SNIFF_WINDOW)];
    // Accept both plain and prefix-namespaced element names.
    [
        b"<record".as_slice(),
        b"<collection".as_slice(),
        b":record".as_slice(),
        b":collection".as_slice(),
    ]
    .iter()
    .any(|needle| memmem::find(window, needle).is_some())
}

fn looks_like_mnemonic_line(text: &[u8]) -> bool {
    if text.starts_with(b"=LDR") {
        return true;
    }
    matches!(
        text,
        [b'=', a, b, c, ..] if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit()
    )
}

fn looks_like_binary_leader(input: &[u8]) -> bool {
    if input.len() < 24 {
        return false;
    }
    input[0..5].iter().all(u8::is_ascii_digit)
        && input[12..17].iter().all(u8::is_ascii_digit)
        && &input[20..24] == b"4500"
}

// ============================================================================
// Detect-and-decode facade
// ============================================================================

/// The result of [`detect_and_decode`]: which format was chosen, the
/// records that decoded, and the errors for those that did not.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// The detected format, or `None` when detection itself failed.
    pub format: Option<FormatKind>,
    /// Successfully decoded records, in input order.
    pub records: Vec<Record>,
    /// Per-record (or per-line) failures, plus the single terminal error
    /// when no format could be detected.
    pub errors: Vec<DecodeError>,
}

/// Detect the format of `input` and decode every record in it.
///
/// This is the primary entry point for hosts: it never fails as a whole.
/// An undetectable format yields an outcome with no records and a single
/// [`DecodeError::UnrecognizedFormat`]; per-record failures inside a
/// recognized format are collected next to the records that did decode,
/// so callers can display "N of M records parsed".
#[must_use]
pub fn detect_and_decode(input: &[u8], filename_hint: Option<&str>) -> DecodeOutcome {
    detect_and_decode_with_options(input, filename_hint, Marc8Handling::default())
}

/// [`detect_and_decode`] with explicit MARC-8 handling for legacy binary
/// input. The other three formats are Unicode-native and ignore the
/// option.
#[must_use]
pub fn detect_and_decode_with_options(
    input: &[u8],
    filename_hint: Option<&str>,
    marc8: Marc8Handling,
) -> DecodeOutcome {
    let format = match detect(input, filename_hint) {
        Ok(format) => format,
        Err(e) => {
            return DecodeOutcome {
                format: None,
                records: Vec::new(),
                errors: vec![e],
            };
        }
    };

    let mut outcome = DecodeOutcome {
        format: Some(format),
        records: Vec::new(),
        errors: Vec::new(),
    };

    match format {
        FormatKind::Binary => {
            for result in MarcReader::new(input).with_marc8_handling(marc8) {
                match result {
                    Ok(record) => outcome.records.push(record),
                    Err(e) => outcome.errors.push(e),
                }
            }
        }
        FormatKind::Xml => match std::str::from_utf8(input) {
            Ok(text) => match marcxml::marcxml_to_records(text) {
                Ok(records) => outcome.records = records,
                Err(e) => outcome.errors.push(e),
            },
            Err(e) => outcome
                .errors
                .push(DecodeError::MalformedXml(format!("input is not valid UTF-8: {e}"))),
        },
        FormatKind::Json => match std::str::from_utf8(input) {
            Ok(text) => {
                let (records, errors) = marcjson::marcjson_to_records(text);
                outcome.records = records;
                outcome.errors = errors;
            }
            Err(e) => outcome.errors.push(DecodeError::MalformedJsonField {
                path: "$".to_string(),
                detail: format!("input is not valid UTF-8: {e}"),
            }),
        },
        FormatKind::Mnemonic => {
            // Hand-typed text; decode what survives lossy conversion.
            let text = String::from_utf8_lossy(input);
            let (records, errors) = mnemonic::mnemonic_to_records(&text);
            outcome.records = records;
            outcome.errors = errors;
        }
    }

    outcome
}

// ============================================================================
// Encode dispatch
// ============================================================================

/// Encode records into the requested wire format.
///
/// # Errors
///
/// Returns the codec's [`crate::EncodeError`] when a record cannot be
/// represented in the chosen format.
pub fn encode(records: &[Record], format: FormatKind) -> EncodeResult<Vec<u8>> {
    match format {
        FormatKind::Binary => {
            let mut writer = MarcWriter::new(Vec::new());
            writer.write_batch(records)?;
            writer.finish()
        }
        FormatKind::Xml => Ok(marcxml::records_to_marcxml(records)?.into_bytes()),
        FormatKind::Json => Ok(marcjson::records_to_marcjson(records)?.into_bytes()),
        FormatKind::Mnemonic => Ok(mnemonic::records_to_mnemonic(records)?.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::record::Field;

    fn sample_record() -> Record {
        Record::builder(Leader::default())
            .control_field_str("001", "92005291")
            .field(
                Field::builder("245".to_string(), '1', '0')
                    .subfield_str('a', "Detected title")
                    .build(),
            )
            .build()
    }

    fn binary_bytes() -> Vec<u8> {
        encode(&[sample_record()], FormatKind::Binary).unwrap()
    }

    #[test]
    fn from_extension_maps_known_suffixes() {
        assert_eq!(FormatKind::from_extension("mrc"), Some(FormatKind::Binary));
        assert_eq!(FormatKind::from_extension("MARC"), Some(FormatKind::Binary));
        assert_eq!(FormatKind::from_extension("xml"), Some(FormatKind::Xml));
        assert_eq!(FormatKind::from_extension("marcxml"), Some(FormatKind::Xml));
        assert_eq!(FormatKind::from_extension("json"), Some(FormatKind::Json));
        assert_eq!(FormatKind::from_extension("mrk"), Some(FormatKind::Mnemonic));
        assert_eq!(FormatKind::from_extension("txt"), None);
        assert_eq!(FormatKind::from_extension("dat"), None);
    }

    #[test]
    fn display_uses_format_name() {
        assert_eq!(format!("{}", FormatKind::Binary), "ISO 2709 binary");
        assert_eq!(format!("{}", FormatKind::Json), "MARC-in-JSON");
    }

    #[test]
    fn detect_json_by_leading_brace_or_bracket() {
        assert_eq!(detect(b"{\"leader\":\"x\"}", None).unwrap(), FormatKind::Json);
        assert_eq!(detect(b"  \n\t[{}]", None).unwrap(), FormatKind::Json);
    }

    #[test]
    fn detect_xml_by_declaration_and_by_element() {
        assert_eq!(
            detect(b"<?xml version=\"1.0\"?><record/>", None).unwrap(),
            FormatKind::Xml
        );
        assert_eq!(detect(b"<record><leader>x</leader></record>", None).unwrap(), FormatKind::Xml);
        assert_eq!(
            detect(b"<marc:collection xmlns:marc=\"x\"><marc:record/></marc:collection>", None)
                .unwrap(),
            FormatKind::Xml
        );
    }

    #[test]
    fn markup_without_record_element_is_not_xml() {
        let err = detect(b"<html><body>hello</body></html>", None).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn detect_mnemonic_by_first_line() {
        assert_eq!(detect(b"=LDR  01041cam a2200289 a 4500", None).unwrap(), FormatKind::Mnemonic);
        assert_eq!(detect(b"=245  10$aTitle", None).unwrap(), FormatKind::Mnemonic);
    }

    #[test]
    fn detect_binary_by_leader_shape() {
        let bytes = binary_bytes();
        assert_eq!(detect(&bytes, None).unwrap(), FormatKind::Binary);
    }

    #[test]
    fn not_marc_at_all_is_unrecognized() {
        let outcome = detect_and_decode(b"not marc at all", None);
        assert_eq!(outcome.format, None);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], DecodeError::UnrecognizedFormat));
    }

    #[test]
    fn hint_rescues_only_unmatched_content() {
        // Content matches nothing; the extension decides.
        assert_eq!(
            detect(b"no sniffable structure", Some("records.mrk")).unwrap(),
            FormatKind::Mnemonic
        );
        // Content match wins over a contradicting extension.
        assert_eq!(
            detect(b"{\"leader\":\"x\"}", Some("records.mrc")).unwrap(),
            FormatKind::Json
        );
        // Ambiguous extensions rescue nothing.
        assert!(detect(b"no sniffable structure", Some("records.txt")).is_err());
    }

    #[test]
    fn detection_is_deterministic() {
        let inputs: [&[u8]; 3] = [b"{}", b"=LDR  x", b"plain"];
        for input in inputs {
            let first = detect(input, Some("f.marcxml")).ok();
            for _ in 0..3 {
                assert_eq!(detect(input, Some("f.marcxml")).ok(), first);
            }
        }
    }

    #[test]
    fn bom_prefixed_xml_is_detected() {
        let mut input = b"\xEF\xBB\xBF".to_vec();
        input.extend_from_slice(b"<?xml version=\"1.0\"?><record/>");
        assert_eq!(detect(&input, None).unwrap(), FormatKind::Xml);
    }

    #[test]
    fn decode_roundtrip_through_every_format() {
        let records = [sample_record()];
        for format in [
            FormatKind::Binary,
            FormatKind::Xml,
            FormatKind::Json,
            FormatKind::Mnemonic,
        ] {
            let bytes = encode(&records, format).unwrap();
            let outcome = detect_and_decode(&bytes, None);
            assert_eq!(outcome.format, Some(format), "detection failed for {format}");
            assert!(outcome.errors.is_empty(), "decode errors for {format}");
            assert_eq!(outcome.records.len(), 1, "record count for {format}");

            let decoded = &outcome.records[0];
            assert_eq!(decoded.get_control_field("001"), Some("92005291"));
            let field = decoded.get_field("245").unwrap();
            assert_eq!(field.get_subfield('a'), Some("Detected title"));
        }
    }

    #[test]
    fn empty_input_with_binary_hint_decodes_to_nothing() {
        let outcome = detect_and_decode(b"", Some("empty.mrc"));
        assert_eq!(outcome.format, Some(FormatKind::Binary));
        assert!(outcome.records.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn invalid_utf8_xml_input_reports_malformed_xml() {
        let outcome = detect_and_decode(b"\xFF\xFE<record/>", Some("f.xml"));
        // The stray bytes break both content sniffing and UTF-8 decoding.
        match outcome.format {
            Some(FormatKind::Xml) => {
                assert!(matches!(outcome.errors[0], DecodeError::MalformedXml(_)));
            }
            other => panic!("expected XML via hint, got {other:?}"),
        }
    }
}
