//! Writing MARC records to ISO 2709 binary format.
//!
//! This module provides [`MarcWriter`] for serializing [`Record`] instances
//! to the binary transmission format, targeting any destination implementing
//! [`std::io::Write`].
//!
//! The writer recomputes the structural portions of the leader on every
//! write: record length, base address of data, and the character coding
//! position (always stamped `'a'`, since field content is written as UTF-8).
//! The rest of the stored leader passes through untouched, so cataloging
//! metadata like record status and bibliographic level survives a
//! decode/encode cycle.
//!
//! # Examples
//!
//! ```no_run
//! use marcview::{MarcWriter, Record, Field, Leader};
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut record = Record::new(Leader::default());
//! record.add_control_field_str("001", "ocm12345678");
//!
//! let mut field = Field::new("245".to_string(), '1', '0');
//! field.add_subfield_str('a', "Example title");
//! record.add_field(field);
//!
//! let file = File::create("output.mrc")?;
//! let mut writer = MarcWriter::new(file);
//! writer.write_record(&record)?;
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;

use crate::error::{EncodeError, EncodeResult};
use crate::leader::LEADER_LEN;
use crate::reader::{FIELD_TERMINATOR, RECORD_TERMINATOR, SUBFIELD_DELIMITER};
use crate::record::{validate_encodable, Record};

/// Largest value the four-digit directory length column can carry.
const MAX_FIELD_LEN: usize = 9999;

/// Largest value the five-digit leader record-length column can carry.
const MAX_RECORD_LEN: usize = 99999;

/// A writer for serializing MARC records to ISO 2709 binary format.
///
/// `MarcWriter` wraps any type implementing [`std::io::Write`] and emits
/// one framed record per [`write_record`](MarcWriter::write_record) call:
/// leader, directory, field terminator, field data, record terminator.
///
/// Call [`finish`](MarcWriter::finish) when done to flush the underlying
/// writer and get it back. Dropping the writer without finishing leaves
/// whatever the destination buffered unflushed.
#[derive(Debug)]
pub struct MarcWriter<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> MarcWriter<W> {
    /// Creates a new MARC writer wrapping the given destination.
    pub fn new(writer: W) -> Self {
        MarcWriter {
            writer,
            records_written: 0,
        }
    }

    /// Serializes a single record and writes it to the destination.
    ///
    /// The record's stored leader is used as a template: its record length,
    /// base address, and character coding are replaced with recomputed
    /// values, and everything else is copied through as-is.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvalidTagOrCode`] when a tag, indicator, or
    /// subfield code falls outside the writable ASCII range, or when field
    /// content contains one of the ISO 2709 framing bytes.
    /// Returns [`EncodeError::FieldTooLong`] or [`EncodeError::RecordTooLong`]
    /// when the directory or leader length columns cannot represent the
    /// encoded sizes, and [`EncodeError::Io`] when the destination fails.
    pub fn write_record(&mut self, record: &Record) -> EncodeResult<()> {
        let encoded = encode_record(record)?;
        self.writer.write_all(&encoded)?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes every record in the slice, stopping at the first failure.
    pub fn write_batch(&mut self, records: &[Record]) -> EncodeResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Returns the number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes the destination and returns it.
    ///
    /// Consumes the writer; nothing can be written after this.
    pub fn finish(mut self) -> EncodeResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Serializes one record to a standalone ISO 2709 byte vector.
///
/// This is the building block behind [`MarcWriter`] and the batch encoding
/// entry points; records encoded separately can be concatenated freely
/// because each carries its own record terminator.
pub(crate) fn encode_record(record: &Record) -> EncodeResult<Vec<u8>> {
    validate_encodable(record)?;

    // Field content chunks in output order: control fields, then data
    // fields, each preserving document order.
    let mut chunks: Vec<(&str, Vec<u8>)> = Vec::with_capacity(record.field_count());

    for control in record.control_fields() {
        check_wire_safe(&control.tag, control.value.as_bytes())?;
        let mut chunk = Vec::with_capacity(control.value.len() + 1);
        chunk.extend_from_slice(control.value.as_bytes());
        chunk.push(FIELD_TERMINATOR);
        chunks.push((&control.tag, chunk));
    }

    for field in record.fields() {
        let mut chunk = Vec::new();
        push_char(&mut chunk, field.indicator1);
        push_char(&mut chunk, field.indicator2);
        for subfield in field.subfields() {
            check_wire_safe(&field.tag, subfield.value.as_bytes())?;
            chunk.push(SUBFIELD_DELIMITER);
            push_char(&mut chunk, subfield.code);
            chunk.extend_from_slice(subfield.value.as_bytes());
        }
        chunk.push(FIELD_TERMINATOR);
        chunks.push((&field.tag, chunk));
    }

    // Directory entries carry a four-digit length and five-digit start.
    let mut directory = Vec::with_capacity(chunks.len() * 12);
    let mut start = 0usize;
    for (tag, chunk) in &chunks {
        if chunk.len() > MAX_FIELD_LEN {
            return Err(EncodeError::FieldTooLong {
                tag: (*tag).to_string(),
                length: chunk.len(),
            });
        }
        directory.extend_from_slice(format!("{tag}{:04}{start:05}", chunk.len()).as_bytes());
        start += chunk.len();
    }

    let base_address = LEADER_LEN + directory.len() + 1;
    let data_len: usize = chunks.iter().map(|(_, chunk)| chunk.len()).sum();
    let record_length = base_address + data_len + 1;
    if record_length > MAX_RECORD_LEN {
        return Err(EncodeError::RecordTooLong {
            length: record_length,
        });
    }

    let leader = record
        .leader
        .with_lengths(record_length, base_address)
        .with_character_coding('a');

    let mut out = Vec::with_capacity(record_length);
    out.extend_from_slice(&leader.to_wire_bytes());
    out.extend_from_slice(&directory);
    out.push(FIELD_TERMINATOR);
    for (_, chunk) in &chunks {
        out.extend_from_slice(chunk);
    }
    out.push(RECORD_TERMINATOR);
    Ok(out)
}

/// Rejects field content that would corrupt ISO 2709 framing.
fn check_wire_safe(tag: &str, value: &[u8]) -> EncodeResult<()> {
    for &byte in value {
        if byte == RECORD_TERMINATOR || byte == FIELD_TERMINATOR || byte == SUBFIELD_DELIMITER {
            return Err(EncodeError::InvalidTagOrCode {
                detail: format!(
                    "field {tag} content contains reserved framing byte 0x{byte:02X}"
                ),
            });
        }
    }
    Ok(())
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}
