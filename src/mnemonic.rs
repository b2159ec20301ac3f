//! Mnemonic (text breaker) serialization and deserialization of MARC records.
//!
//! The mnemonic form is the line-oriented, human-typed rendering of MARC
//! used by cataloging editors: one field per line, records separated by
//! blank lines.
//!
//! ```text
//! =LDR  01041cam a2200289 a 4500
//! =001  92005291
//! =245  10$aTitle :$bsubtitle.
//! =650  \0$aSubject heading.
//! ```
//!
//! A data field line carries the tag, two spaces, the two indicator
//! characters, then `$<code><text>` segments. A literal backslash in an
//! indicator position means "blank" and is normalized to a space on
//! decode; the encoder writes blanks back out as backslashes, so trailing
//! whitespace never carries meaning. Control field lines (tags below
//! "010") keep everything after the two spaces verbatim, dollar signs
//! included.
//!
//! Decoding is fault-isolating per line: an unrecognizable line is
//! reported with its 1-based line number and skipped, and the rest of the
//! record still decodes. A record block with no `=LDR` line gets a
//! synthetic all-space leader, flagged via [`LeaderSource::Synthetic`].
//!
//! Subfield values containing `$` or a newline cannot survive a round
//! trip through this format; they encode literally and re-split on
//! decode. That is inherent to the text form, not a defect to guard.
//!
//! # Examples
//!
//! ```
//! use marcview::mnemonic;
//!
//! let input = "=LDR  01041cam a2200289 a 4500\n=245  10$aTitle$bSubtitle\n";
//! let (records, errors) = mnemonic::mnemonic_to_records(input);
//! assert_eq!(records.len(), 1);
//! assert!(errors.is_empty());
//! ```

use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::leader::Leader;
use crate::record::{is_control_tag, validate_encodable, Field, LeaderSource, Record};

lazy_static! {
    /// `=TAG  rest`: an equals sign, a 3-character tag, exactly two
    /// spaces, then the field body (possibly empty).
    static ref FIELD_LINE: Regex = Regex::new(r"^=([0-9A-Za-z]{3})  (.*)$").unwrap();
}

// ---------------------------------------------------------------------------
// Deserialization: mnemonic text → Record
// ---------------------------------------------------------------------------

/// Parse mnemonic text into records.
///
/// A record is a maximal run of non-blank lines; blank lines separate
/// records and leading blank lines are skipped. Returns the decoded
/// records together with one error per rejected line, so a caller can
/// report "N of M lines parsed" style diagnostics.
#[must_use]
pub fn mnemonic_to_records(input: &str) -> (Vec<Record>, Vec<DecodeError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut current: Option<Record> = None;

    for (i, raw_line) in input.lines().enumerate() {
        let line_number = i + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if line.trim().is_empty() {
            if let Some(record) = current.take() {
                records.push(record);
            }
            continue;
        }

        match parse_line(line, line_number) {
            Ok(parsed) => {
                let record = current.get_or_insert_with(|| {
                    let mut record = Record::new(Leader::synthetic());
                    record.set_leader_source(LeaderSource::Synthetic);
                    record
                });
                match parsed {
                    Line::Leader(leader) => {
                        // A later =LDR line wins over an earlier one.
                        record.leader = leader;
                        record.set_leader_source(LeaderSource::Supplied);
                    }
                    Line::Control(tag, value) => record.add_control_field(tag, value),
                    Line::Data(field) => record.add_field(field),
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }

    (records, errors)
}

enum Line {
    Leader(Leader),
    Control(String, String),
    Data(Field),
}

fn parse_line(line: &str, line_number: usize) -> DecodeResult<Line> {
    let captures = FIELD_LINE
        .captures(line)
        .ok_or_else(|| line_error(line_number, "expected \"=TAG  \" followed by field content"))?;
    let tag = &captures[1];
    let body = captures.get(2).map_or("", |m| m.as_str());

    if tag == "LDR" {
        // Short or long payloads are padded/truncated to 24 characters.
        return Ok(Line::Leader(Leader::from_text(body)));
    }

    if is_control_tag(tag) {
        return Ok(Line::Control(tag.to_string(), body.to_string()));
    }

    parse_data_line(tag, body, line_number)
}

/// Parse the body of a data field line: two indicator characters, then
/// zero or more `$<code><text>` segments.
fn parse_data_line(tag: &str, body: &str, line_number: usize) -> DecodeResult<Line> {
    let mut chars = body.chars();
    let ind1 = chars
        .next()
        .ok_or_else(|| line_error(line_number, "data field is missing its indicators"))?;
    let ind2 = chars
        .next()
        .ok_or_else(|| line_error(line_number, "data field has only one indicator character"))?;

    let mut field = Field::new(
        tag.to_string(),
        normalize_indicator(ind1),
        normalize_indicator(ind2),
    );

    let rest = chars.as_str();
    if rest.is_empty() {
        return Ok(Line::Data(field));
    }
    let Some(subfield_text) = rest.strip_prefix('$') else {
        return Err(line_error(
            line_number,
            "expected \"$\" or end of line after the indicators",
        ));
    };

    for segment in subfield_text.split('$') {
        let mut segment_chars = segment.chars();
        let code = segment_chars
            .next()
            .ok_or_else(|| line_error(line_number, "empty subfield segment"))?;
        field.add_subfield(code, segment_chars.as_str().to_string());
    }

    Ok(Line::Data(field))
}

/// `\` is the conventional spelling of a blank indicator in typed text.
fn normalize_indicator(ch: char) -> char {
    if ch == '\\' {
        ' '
    } else {
        ch
    }
}

fn line_error(line: usize, detail: &str) -> DecodeError {
    DecodeError::UnrecognizedMnemonicLine {
        line,
        detail: detail.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Serialization: Record → mnemonic text
// ---------------------------------------------------------------------------

/// Convert records to mnemonic text, one blank line between records.
///
/// Blank indicators are written as backslashes so the text survives
/// editors that trim trailing whitespace.
///
/// # Errors
///
/// Returns [`crate::EncodeError::InvalidTagOrCode`] when a tag,
/// indicator, or subfield code falls outside the encodable shape.
pub fn records_to_mnemonic(records: &[Record]) -> EncodeResult<String> {
    let mut output = String::new();

    for (i, record) in records.iter().enumerate() {
        validate_encodable(record)?;
        if i > 0 {
            output.push('\n');
        }

        writeln!(output, "=LDR  {}", record.leader).ok();
        for cf in record.control_fields() {
            writeln!(output, "={}  {}", cf.tag, cf.value).ok();
        }
        for field in record.fields() {
            write!(
                output,
                "={}  {}{}",
                field.tag,
                escape_indicator(field.indicator1),
                escape_indicator(field.indicator2)
            )
            .ok();
            for sf in field.subfields() {
                write!(output, "${}{}", sf.code, sf.value).ok();
            }
            output.push('\n');
        }
    }

    Ok(output)
}

fn escape_indicator(ch: char) -> char {
    if ch == ' ' {
        '\\'
    } else {
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_record() {
        let input = "\
=LDR  01041cam a2200289 a 4500
=001  92005291
=245  10$aTitle :$bsubtitle.
=650  \\0$aSubject heading.
";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.leader.as_str(), "01041cam a2200289 a 4500");
        assert_eq!(record.leader_source(), LeaderSource::Supplied);
        assert_eq!(record.get_control_field("001"), Some("92005291"));

        let title = record.get_field("245").unwrap();
        assert_eq!(title.indicator1, '1');
        assert_eq!(title.indicator2, '0');
        assert_eq!(title.get_subfield('a'), Some("Title :"));
        assert_eq!(title.get_subfield('b'), Some("subtitle."));

        let subject = record.get_field("650").unwrap();
        assert_eq!(subject.indicator1, ' ');
        assert_eq!(subject.indicator2, '0');
    }

    #[test]
    fn blank_line_separates_records() {
        let input = "=245  10$aTitle$bSubtitle\n\n=245  \\\\$aOther\n";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 2);

        let second = records[1].get_field("245").unwrap();
        assert_eq!(second.indicator1, ' ');
        assert_eq!(second.indicator2, ' ');
        assert_eq!(second.get_subfield('a'), Some("Other"));
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let input = "\n\n=LDR  01041cam a2200289 a 4500\n=001  x\n";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn crlf_input_is_accepted() {
        let input = "=LDR  01041cam a2200289 a 4500\r\n=001  92005291\r\n";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(records[0].get_control_field("001"), Some("92005291"));
    }

    #[test]
    fn control_field_keeps_dollar_signs_verbatim() {
        let input = "=008  210101s2021$weird$text\n";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(
            records[0].get_control_field("008"),
            Some("210101s2021$weird$text")
        );
    }

    #[test]
    fn unrecognized_line_is_skipped_with_error() {
        let input = "\
=LDR  01041cam a2200289 a 4500
this is not a field line
=245  10$aStill here
";
        let (records, errors) = mnemonic_to_records(input);
        assert_eq!(records.len(), 1);
        assert!(records[0].get_field("245").is_some());

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DecodeError::UnrecognizedMnemonicLine { line, .. } => assert_eq!(*line, 2),
            other => panic!("expected UnrecognizedMnemonicLine, got {other:?}"),
        }
    }

    #[test]
    fn single_space_after_tag_is_rejected() {
        let (records, errors) = mnemonic_to_records("=245 10$aOnly one space\n");
        assert!(records.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn missing_ldr_yields_synthetic_leader() {
        let (records, errors) = mnemonic_to_records("=245  10$aNo leader here\n");
        assert!(errors.is_empty());
        assert_eq!(records[0].leader_source(), LeaderSource::Synthetic);
        assert_eq!(records[0].leader.as_str(), " ".repeat(24));
    }

    #[test]
    fn later_ldr_line_overwrites_earlier() {
        let input = "=LDR  00000nam a2200000 a 4500\n=LDR  01041cam a2200289 a 4500\n";
        let (records, errors) = mnemonic_to_records(input);
        assert!(errors.is_empty());
        assert_eq!(records[0].leader.as_str(), "01041cam a2200289 a 4500");
    }

    #[test]
    fn short_ldr_payload_is_padded() {
        let (records, errors) = mnemonic_to_records("=LDR  0104\n");
        assert!(errors.is_empty());
        assert_eq!(records[0].leader.as_str().len(), 24);
        assert!(records[0].leader.as_str().starts_with("0104"));
    }

    #[test]
    fn data_field_without_subfields_is_accepted() {
        let (records, errors) = mnemonic_to_records("=245  10\n");
        assert!(errors.is_empty());
        let field = records[0].get_field("245").unwrap();
        assert_eq!(field.subfields().count(), 0);
    }

    #[test]
    fn empty_subfield_segment_fails_the_line() {
        let (records, errors) = mnemonic_to_records("=245  10$aX$$bY\n");
        assert!(records.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("empty subfield"));
    }

    #[test]
    fn text_after_indicators_must_start_with_dollar() {
        let (records, errors) = mnemonic_to_records("=245  10junk$aX\n");
        assert!(records.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn encode_writes_blank_indicators_as_backslashes() {
        let record = Record::builder(Leader::from_text("01041cam a2200289 a 4500"))
            .control_field_str("001", "92005291")
            .field(
                Field::builder("500".to_string(), ' ', ' ')
                    .subfield_str('a', "General note")
                    .build(),
            )
            .build();

        let text = records_to_mnemonic(std::slice::from_ref(&record)).unwrap();
        assert!(text.contains("=LDR  01041cam a2200289 a 4500\n"));
        assert!(text.contains("=001  92005291\n"));
        assert!(text.contains("=500  \\\\$aGeneral note\n"));
    }

    #[test]
    fn encode_separates_records_with_blank_line() {
        let one = Record::builder(Leader::default())
            .control_field_str("001", "first")
            .build();
        let two = Record::builder(Leader::default())
            .control_field_str("001", "second")
            .build();

        let text = records_to_mnemonic(&[one, two]).unwrap();
        assert!(text.contains("=001  first\n\n=LDR"));

        let (restored, errors) = mnemonic_to_records(&text);
        assert!(errors.is_empty());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1].get_control_field("001"), Some("second"));
    }

    #[test]
    fn roundtrip_preserves_order_and_indicators() {
        let record = Record::builder(Leader::from_text("01041cam a2200289 a 4500"))
            .control_field_str("001", "92005291")
            .field(
                Field::builder("245".to_string(), '1', '0')
                    .subfield_str('a', "Title :")
                    .subfield_str('b', "subtitle.")
                    .build(),
            )
            .field(
                Field::builder("650".to_string(), ' ', '0')
                    .subfield_str('a', "First subject")
                    .build(),
            )
            .field(
                Field::builder("650".to_string(), ' ', '0')
                    .subfield_str('a', "Second subject")
                    .build(),
            )
            .build();

        let text = records_to_mnemonic(std::slice::from_ref(&record)).unwrap();
        let (restored, errors) = mnemonic_to_records(&text);
        assert!(errors.is_empty());
        assert_eq!(restored.len(), 1);

        assert_eq!(restored[0].leader.as_str(), record.leader.as_str());
        assert_eq!(restored[0].control_fields(), record.control_fields());
        assert_eq!(restored[0].fields(), record.fields());
    }
}
