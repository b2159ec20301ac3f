//! Error types for MARC decoding and encoding.
//!
//! This module provides the [`DecodeError`] and [`EncodeError`] types returned
//! by the codecs and the [`formats`](crate::formats) facade.

use thiserror::Error;

/// Error type for MARC decoding operations.
///
/// Except for [`DecodeError::UnrecognizedFormat`] and
/// [`DecodeError::MalformedXml`], every variant is scoped to a single record
/// or line of the input: the codecs collect these alongside successfully
/// decoded records rather than aborting the batch. Each variant carries
/// enough position information (byte offset, JSON path, or line number) for
/// a host to display "N of M records parsed" diagnostics.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The input matched none of the four supported wire formats.
    ///
    /// Fatal for the whole input: no codec can be selected.
    #[error("Unrecognized format: input is not MARC binary, MARCXML, MARC-in-JSON, or mnemonic text")]
    UnrecognizedFormat,

    /// A binary (ISO 2709) record could not be decoded.
    ///
    /// `offset` is the absolute byte offset of the failed record (or field)
    /// within the input. Only the record containing the offset is lost;
    /// decoding resumes after its record terminator.
    #[error("Malformed binary field at byte offset {offset}: {detail}")]
    MalformedBinaryField {
        /// Absolute byte offset within the input where decoding failed.
        offset: usize,
        /// Human-readable description of the failure.
        detail: String,
    },

    /// A MARCXML document could not be parsed.
    ///
    /// XML has no per-record recovery boundary, so this fails the whole
    /// document.
    #[error("Malformed MARCXML document: {0}")]
    MalformedXml(String),

    /// A MARC-in-JSON value violated the expected shape.
    ///
    /// `path` locates the offending value (`$` is the document root, e.g.
    /// `$[2].fields[5].245`). A violation inside one record of a top-level
    /// array fails only that record.
    #[error("Malformed MARC-in-JSON value at {path}: {detail}")]
    MalformedJsonField {
        /// JSONPath-style location of the offending value.
        path: String,
        /// Human-readable description of the shape violation.
        detail: String,
    },

    /// A line of mnemonic text matched no recognized pattern.
    ///
    /// `line` is 1-based over the whole input. Only the line is lost; the
    /// codec continues with the next one.
    #[error("Unrecognized mnemonic line {line}: {detail}")]
    UnrecognizedMnemonicLine {
        /// 1-based line number within the input.
        line: usize,
        /// Human-readable description of why the line was rejected.
        detail: String,
    },
}

/// Error type for MARC encoding operations.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// A record contains a tag, indicator, or subfield code that cannot be
    /// represented on the wire.
    #[error("Invalid tag or code: {detail}")]
    InvalidTagOrCode {
        /// Human-readable description of the offending component.
        detail: String,
    },

    /// A record's binary encoding exceeds the 5-digit ISO 2709 length field.
    #[error("Record too long for ISO 2709: {length} bytes exceeds the 99999-byte limit")]
    RecordTooLong {
        /// The computed record length in bytes.
        length: usize,
    },

    /// A field's binary encoding exceeds the 4-digit ISO 2709 directory
    /// length field.
    #[error("Field {tag} too long for ISO 2709: {length} bytes exceeds the 9999-byte limit")]
    FieldTooLong {
        /// Tag of the oversized field.
        tag: String,
        /// The computed field length in bytes.
        length: usize,
    },

    /// Serialization to a text format (MARCXML or MARC-in-JSON) failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error from the underlying destination.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`DecodeError`].
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Convenience type alias for [`std::result::Result`] with [`EncodeError`].
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
