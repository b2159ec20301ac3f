//! Reading MARC records from ISO 2709 binary data.
//!
//! This module provides [`MarcReader`] for decoding binary MARC records from
//! a byte slice. Framing uses the record terminator (0x1D) as ground truth:
//! each terminated chunk is one record attempt, so a corrupt record costs
//! only itself — the reader reports it and resumes at the next chunk. The
//! declared leader length is compared against the chunk but never trusted
//! for framing; a disagreement marks the record
//! [`LeaderSource::StaleLengths`] instead of failing it.
//!
//! # Examples
//!
//! ```
//! use marcview::MarcReader;
//!
//! # fn demo(input: &[u8]) {
//! for outcome in MarcReader::new(input) {
//!     match outcome {
//!         Ok(record) => println!("{:?}", record.control_number()),
//!         Err(err) => eprintln!("skipped one record: {err}"),
//!     }
//! }
//! # }
//! ```

use crate::encoding::{decode_field_bytes, Marc8Handling};
use crate::error::{DecodeError, DecodeResult};
use crate::leader::{Leader, LEADER_LEN};
use crate::record::{is_control_tag, Field, LeaderSource, Record, Subfield};
use memchr::memchr;

/// Field terminator byte in ISO 2709 records.
pub const FIELD_TERMINATOR: u8 = 0x1E;
/// Subfield delimiter byte in ISO 2709 records.
pub const SUBFIELD_DELIMITER: u8 = 0x1F;
/// Record terminator byte in ISO 2709 records.
pub const RECORD_TERMINATOR: u8 = 0x1D;

/// Length of one directory entry: 3-digit tag, 4-digit field length,
/// 5-digit field start.
pub const DIRECTORY_ENTRY_LEN: usize = 12;

/// Reader for ISO 2709 binary MARC data.
///
/// Iterating yields `Result<Record, DecodeError>`: an `Err` consumes exactly
/// one record's worth of input, so callers can keep going to collect the
/// survivors.
#[derive(Debug)]
pub struct MarcReader<'a> {
    input: &'a [u8],
    pos: usize,
    marc8: Marc8Handling,
    records_read: usize,
}

impl<'a> MarcReader<'a> {
    /// Create a new reader over a byte slice.
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        MarcReader {
            input,
            pos: 0,
            marc8: Marc8Handling::default(),
            records_read: 0,
        }
    }

    /// Set how MARC-8 records (leader position 9 not 'a') are decoded.
    #[must_use]
    pub fn with_marc8_handling(mut self, handling: Marc8Handling) -> Self {
        self.marc8 = handling;
        self
    }

    /// Number of records successfully decoded so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Current absolute position in the input.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at end of input (trailing ASCII whitespace after
    /// the last record terminator is accepted). On `Err`, the input cursor
    /// has already advanced past the failed record, so the call can be
    /// repeated for the remaining records.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedBinaryField`] with the absolute byte
    /// offset of the record (or field) that failed.
    pub fn read_record(&mut self) -> DecodeResult<Option<Record>> {
        if self.remaining_is_blank() {
            self.pos = self.input.len();
            return Ok(None);
        }

        let record_start = self.pos;
        let Some(terminator) = memchr(RECORD_TERMINATOR, &self.input[self.pos..]) else {
            // No terminator: nothing after this point can be framed.
            self.pos = self.input.len();
            return Err(DecodeError::MalformedBinaryField {
                offset: record_start,
                detail: "truncated record: no record terminator before end of input".to_string(),
            });
        };
        let chunk = &self.input[self.pos..=self.pos + terminator];
        self.pos += terminator + 1;

        let record = parse_record(chunk, record_start, self.marc8)?;
        self.records_read += 1;
        Ok(Some(record))
    }

    fn remaining_is_blank(&self) -> bool {
        self.input[self.pos..]
            .iter()
            .all(|b| b.is_ascii_whitespace())
    }
}

impl Iterator for MarcReader<'_> {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Parses one record chunk (leader through record terminator, inclusive).
///
/// `record_start` is the chunk's absolute offset, used for error reporting.
fn parse_record(chunk: &[u8], record_start: usize, marc8: Marc8Handling) -> DecodeResult<Record> {
    let malformed = |offset: usize, detail: String| DecodeError::MalformedBinaryField {
        offset,
        detail,
    };

    if chunk.len() < LEADER_LEN + 1 {
        return Err(malformed(
            record_start,
            format!("record is {} bytes, shorter than a leader", chunk.len()),
        ));
    }

    // Leader is stored as received; framing below never trusts it.
    let leader = Leader::from_bytes(chunk).ok_or_else(|| {
        malformed(record_start, "leader shorter than 24 bytes".to_string())
    })?;
    let utf8 = leader.is_utf8();
    let declared_length = leader.record_length();

    // Everything before the record terminator.
    let content = &chunk[..chunk.len() - 1];

    let dir_end = memchr(FIELD_TERMINATOR, &content[LEADER_LEN..])
        .map(|rel| LEADER_LEN + rel)
        .ok_or_else(|| {
            malformed(
                record_start,
                "no field terminator after the directory".to_string(),
            )
        })?;
    let directory = &content[LEADER_LEN..dir_end];
    if directory.len() % DIRECTORY_ENTRY_LEN != 0 {
        return Err(malformed(
            record_start + LEADER_LEN,
            format!(
                "directory length {} is not a multiple of {DIRECTORY_ENTRY_LEN}",
                directory.len()
            ),
        ));
    }
    let data = &content[dir_end + 1..];

    let mut record = Record::new(leader);
    for (index, entry) in directory.chunks_exact(DIRECTORY_ENTRY_LEN).enumerate() {
        let entry_offset = record_start + LEADER_LEN + index * DIRECTORY_ENTRY_LEN;
        let (tag, length, start) = parse_directory_entry(entry, entry_offset)?;

        let end = start.checked_add(length).filter(|&e| e <= data.len());
        let Some(end) = end else {
            return Err(malformed(
                entry_offset,
                format!("directory entry for tag {tag} points outside the record"),
            ));
        };
        let field_bytes = &data[start..end];
        let field_offset = record_start + LEADER_LEN + directory.len() + 1 + start;

        if field_bytes.last() != Some(&FIELD_TERMINATOR) {
            return Err(malformed(
                field_offset,
                format!("field {tag} is not terminated"),
            ));
        }
        let field_content = &field_bytes[..field_bytes.len() - 1];

        // Control-range tags normally carry raw text, but a stray subfield
        // delimiter re-tags the field as a data field.
        if is_control_tag(&tag) && !field_content.contains(&SUBFIELD_DELIMITER) {
            record.add_control_field(tag, decode_field_bytes(field_content, utf8, marc8));
        } else {
            let field = parse_data_field(tag, field_content, field_offset, utf8, marc8)?;
            record.add_field(field);
        }
    }

    if declared_length != Some(chunk.len()) {
        record.set_leader_source(LeaderSource::StaleLengths);
    }
    Ok(record)
}

/// Parses a 12-byte directory entry into (tag, field length, field start).
fn parse_directory_entry(
    entry: &[u8],
    entry_offset: usize,
) -> DecodeResult<(String, usize, usize)> {
    let tag_bytes = &entry[0..3];
    if !tag_bytes.iter().all(u8::is_ascii_graphic) {
        return Err(DecodeError::MalformedBinaryField {
            offset: entry_offset,
            detail: "directory tag is not printable ASCII".to_string(),
        });
    }
    let tag = String::from_utf8_lossy(tag_bytes).into_owned();

    let length = parse_ascii_digits(&entry[3..7]).ok_or_else(|| {
        DecodeError::MalformedBinaryField {
            offset: entry_offset + 3,
            detail: format!("field length for tag {tag} is not numeric"),
        }
    })?;
    let start = parse_ascii_digits(&entry[7..12]).ok_or_else(|| {
        DecodeError::MalformedBinaryField {
            offset: entry_offset + 7,
            detail: format!("field start for tag {tag} is not numeric"),
        }
    })?;
    Ok((tag, length, start))
}

/// Parses a data field's bytes: indicators, then 0x1F-delimited subfields.
fn parse_data_field(
    tag: String,
    content: &[u8],
    field_offset: usize,
    utf8: bool,
    marc8: Marc8Handling,
) -> DecodeResult<Field> {
    let mut segments = content.split(|&b| b == SUBFIELD_DELIMITER);

    // The segment before the first delimiter holds the two indicators.
    let indicator_bytes = segments.next().unwrap_or_default();
    let indicators = decode_field_bytes(indicator_bytes, utf8, marc8);
    let mut chars = indicators.chars();
    let (ind1, ind2) = match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => (a, b),
        _ => {
            return Err(DecodeError::MalformedBinaryField {
                offset: field_offset,
                detail: format!(
                    "field {tag} has {} indicator characters, expected 2",
                    indicators.chars().count()
                ),
            });
        }
    };

    let mut field = Field::new(tag, ind1, ind2);
    for segment in segments {
        let text = decode_field_bytes(segment, utf8, marc8);
        let mut chars = text.chars();
        let Some(code) = chars.next() else {
            return Err(DecodeError::MalformedBinaryField {
                offset: field_offset,
                detail: format!("field {} has a subfield with no code", field.tag),
            });
        };
        field.subfields.push(Subfield {
            code,
            value: chars.collect(),
        });
    }
    Ok(field)
}

/// Parses a run of ASCII digits as a decimal number.
fn parse_ascii_digits(bytes: &[u8]) -> Option<usize> {
    bytes.iter().try_fold(0usize, |acc, &b| {
        if b.is_ascii_digit() {
            Some(acc * 10 + usize::from(b - b'0'))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assembles one well-formed binary record from (tag, field content)
    /// pairs. Field content excludes the trailing field terminator.
    fn assemble(coding: char, fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut directory = Vec::new();
        let mut data = Vec::new();
        for (tag, content) in fields {
            let start = data.len();
            data.extend_from_slice(content);
            data.push(FIELD_TERMINATOR);
            directory.extend_from_slice(
                format!("{tag}{:04}{start:05}", content.len() + 1).as_bytes(),
            );
        }
        directory.push(FIELD_TERMINATOR);

        let base = LEADER_LEN + directory.len();
        let total = base + data.len() + 1;
        let leader = format!("{total:05}nam {coding}22{base:05} i 4500");
        assert_eq!(leader.len(), 24);

        let mut out = leader.into_bytes();
        out.extend_from_slice(&directory);
        out.extend_from_slice(&data);
        out.push(RECORD_TERMINATOR);
        out
    }

    fn title_field() -> Vec<u8> {
        let mut content = b"10".to_vec();
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"aTitle");
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"bSubtitle");
        content
    }

    #[test]
    fn decodes_control_and_data_fields() {
        let input = assemble(
            'a',
            &[
                ("001", b"ocm12345678".to_vec()),
                ("245", title_field()),
            ],
        );
        let mut reader = MarcReader::new(&input);
        let record = reader.read_record().unwrap().unwrap();

        assert_eq!(record.control_number(), Some("ocm12345678"));
        let field = record.get_field("245").unwrap();
        assert_eq!(field.indicator1, '1');
        assert_eq!(field.indicator2, '0');
        let values: Vec<(char, &str)> = field
            .subfields()
            .map(|sf| (sf.code, sf.value.as_str()))
            .collect();
        assert_eq!(values, vec![('a', "Title"), ('b', "Subtitle")]);
        assert_eq!(record.leader_source(), LeaderSource::Supplied);

        assert!(reader.read_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 1);
    }

    #[test]
    fn space_indicators_survive() {
        let mut content = b"  ".to_vec();
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"aSubject");
        let input = assemble('a', &[("650", content)]);

        let record = MarcReader::new(&input).read_record().unwrap().unwrap();
        let field = record.get_field("650").unwrap();
        assert_eq!(field.indicator1, ' ');
        assert_eq!(field.indicator2, ' ');
    }

    #[test]
    fn stale_leader_length_is_flagged_not_fatal() {
        let mut input = assemble('a', &[("001", b"x".to_vec())]);
        // Corrupt the declared record length without touching the layout.
        input[..5].copy_from_slice(b"99999");

        let record = MarcReader::new(&input).read_record().unwrap().unwrap();
        assert_eq!(record.leader_source(), LeaderSource::StaleLengths);
        assert_eq!(record.leader.record_length(), Some(99_999));
        assert_eq!(record.get_control_field("001"), Some("x"));
    }

    #[test]
    fn control_range_tag_with_subfields_is_retagged() {
        let mut content = b"0 ".to_vec();
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"avalue");
        let input = assemble('a', &[("009", content)]);

        let record = MarcReader::new(&input).read_record().unwrap().unwrap();
        assert!(record.control_fields().is_empty());
        let field = record.get_field("009").unwrap();
        assert_eq!(field.get_subfield('a'), Some("value"));
    }

    #[test]
    fn corrupt_record_among_three_costs_only_itself() {
        let good = assemble('a', &[("001", b"first".to_vec())]);
        let mut middle = assemble('a', &[("001", b"second".to_vec())]);
        // Destroy the middle record's directory: a length digit goes bad.
        middle[LEADER_LEN + 3] = b'X';
        let tail = assemble('a', &[("001", b"third".to_vec())]);

        let mut input = good.clone();
        input.extend_from_slice(&middle);
        input.extend_from_slice(&tail);

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for outcome in MarcReader::new(&input) {
            match outcome {
                Ok(r) => records.push(r),
                Err(e) => errors.push(e),
            }
        }
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].control_number(), Some("first"));
        assert_eq!(records[1].control_number(), Some("third"));
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DecodeError::MalformedBinaryField { offset, .. } => {
                assert_eq!(*offset, good.len() + LEADER_LEN + 3);
            }
            other => panic!("expected MalformedBinaryField, got {other:?}"),
        }
    }

    #[test]
    fn trailing_whitespace_is_accepted() {
        let mut input = assemble('a', &[("001", b"x".to_vec())]);
        input.extend_from_slice(b"\n\n  ");
        let mut reader = MarcReader::new(&input);
        assert!(reader.read_record().unwrap().is_some());
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn unterminated_tail_is_one_error() {
        let mut input = assemble('a', &[("001", b"x".to_vec())]);
        let tail_offset = input.len();
        input.extend_from_slice(b"00099nam a2200000 i 4500leftover");

        let mut reader = MarcReader::new(&input);
        assert!(reader.read_record().unwrap().is_some());
        match reader.read_record() {
            Err(DecodeError::MalformedBinaryField { offset, .. }) => {
                assert_eq!(offset, tail_offset);
            }
            other => panic!("expected a truncation error, got {other:?}"),
        }
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn empty_input_yields_no_records() {
        let mut reader = MarcReader::new(b"");
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn single_indicator_fails_the_record() {
        let mut content = b"1".to_vec();
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"aTitle");
        let input = assemble('a', &[("245", content)]);

        let err = MarcReader::new(&input).read_record().unwrap_err();
        assert!(err.to_string().contains("indicator"));
    }

    #[test]
    fn marc8_title_is_transliterated_by_default() {
        // Leader coding ' ' marks the record MARC-8; 0xE2 is the ANSEL
        // combining acute, which precedes its base 'e'.
        let mut content = b"10".to_vec();
        content.push(SUBFIELD_DELIMITER);
        content.extend_from_slice(b"aCaf\xE2e");
        let input = assemble(' ', &[("245", content)]);

        let record = MarcReader::new(&input).read_record().unwrap().unwrap();
        assert_eq!(record.title(), Some("Caf\u{e9}"));

        let record = MarcReader::new(&input)
            .with_marc8_handling(Marc8Handling::Lossy)
            .read_record()
            .unwrap()
            .unwrap();
        assert!(record.title().unwrap().contains('\u{FFFD}'));
    }

    #[test]
    fn directory_not_multiple_of_twelve() {
        let mut input = assemble('a', &[("001", b"x".to_vec())]);
        // Insert one stray byte into the directory region.
        input.insert(LEADER_LEN, b'0');
        let err = MarcReader::new(&input).read_record().unwrap_err();
        assert!(err.to_string().contains("directory"));
    }

    #[test]
    fn entry_pointing_outside_record_fails() {
        let mut input = assemble('a', &[("001", b"x".to_vec())]);
        // Rewrite the entry's start offset to point past the data area.
        input[LEADER_LEN + 7..LEADER_LEN + 12].copy_from_slice(b"99999");
        let err = MarcReader::new(&input).read_record().unwrap_err();
        assert!(err.to_string().contains("outside"));
    }
}
