//! MARC bibliographic record structures and operations.
//!
//! This module provides the core record types shared by all four codecs:
//! - [`Record`] — Main bibliographic record structure
//! - [`ControlField`] — Control fields (tags 001-009, raw values)
//! - [`Field`] — Variable data fields (010+)
//! - [`Subfield`] — Named data elements within fields
//!
//! Control fields and data fields are stored in plain vectors, preserving
//! the order in which they were decoded or added — including repeated tags.
//! Field and subfield order is semantically significant in MARC and must
//! survive every decode → encode round trip.
//!
//! # Examples
//!
//! Create a record with the builder API:
//!
//! ```
//! use marcview::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::default())
//!     .control_field_str("001", "12345")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Title")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.title(), Some("Title"));
//! ```

use crate::error::{EncodeError, EncodeResult};
use crate::leader::{Leader, LEADER_LEN};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Returns true if `tag` falls in the control-field range ("001"-"009").
///
/// Control fields carry a raw value with no indicators or subfields. The
/// binary codec re-tags a control-range field as a data field when its wire
/// data contains subfield delimiters, so membership here is a default, not
/// a guarantee.
#[must_use]
pub fn is_control_tag(tag: &str) -> bool {
    tag.len() == 3 && tag.bytes().all(|b| b.is_ascii_digit()) && tag < "010"
}

/// How a decoded record obtained its leader.
///
/// The leader is stored as received and never corrected during decode; this
/// marker carries what the decoder observed so the renderer (or a host) can
/// surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaderSource {
    /// The input carried a leader, stored verbatim.
    #[default]
    Supplied,
    /// The input carried a leader whose declared record length disagreed
    /// with the bytes actually occupied by the record.
    StaleLengths,
    /// The input had no leader; an all-space one was substituted.
    Synthetic,
}

// ============================================================================
// Record
// ============================================================================

/// A MARC bibliographic record.
///
/// Owns its leader, control fields, and data fields. Decoders populate a
/// record field-by-field and hand it to the caller; after that it is treated
/// as immutable — encoders and the renderer only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// The 24-character leader, as received or as built.
    pub leader: Leader,
    control_fields: Vec<ControlField>,
    fields: Vec<Field>,
    #[serde(skip, default)]
    leader_source: LeaderSource,
}

/// A control field (tags 001-009): a raw value with no indicators and no
/// subfields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    /// Three-digit tag in the range "001"-"009".
    pub tag: String,
    /// Raw field value.
    pub value: String,
}

/// A variable data field (tags 010 and higher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Three-character tag.
    pub tag: String,
    /// First indicator. A space is a valid, meaningful value.
    pub indicator1: char,
    /// Second indicator. A space is a valid, meaningful value.
    pub indicator2: char,
    /// Subfields in document order. Never sorted, never deduplicated.
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a data field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// One-character subfield code.
    pub code: char,
    /// Subfield value.
    pub value: String,
}

/// A tag-matched field, control or data, yielded by [`Record::find_fields`].
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    /// A matching control field.
    Control(&'a ControlField),
    /// A matching data field.
    Data(&'a Field),
}

impl<'a> FieldRef<'a> {
    /// The matched field's tag.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        match self {
            FieldRef::Control(cf) => &cf.tag,
            FieldRef::Data(f) => &f.tag,
        }
    }
}

impl Record {
    /// Create a new, empty record with the given leader.
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: Vec::new(),
            fields: Vec::new(),
            leader_source: LeaderSource::Supplied,
        }
    }

    /// Create a builder for constructing records fluently.
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// How this record obtained its leader (see [`LeaderSource`]).
    #[must_use]
    pub fn leader_source(&self) -> LeaderSource {
        self.leader_source
    }

    pub(crate) fn set_leader_source(&mut self, source: LeaderSource) {
        self.leader_source = source;
    }

    /// Append a control field.
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.control_fields.push(ControlField { tag, value });
    }

    /// Append a control field using string slices.
    pub fn add_control_field_str(&mut self, tag: &str, value: &str) {
        self.add_control_field(tag.to_string(), value.to_string());
    }

    /// Get the first control field value with the given tag.
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|cf| cf.tag == tag)
            .map(|cf| cf.value.as_str())
    }

    /// All control fields in document order.
    #[must_use]
    pub fn control_fields(&self) -> &[ControlField] {
        &self.control_fields
    }

    /// Append a data field.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// All data fields in document order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Get the first data field with the given tag.
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Iterate over data fields with a specific tag, in document order.
    ///
    /// The iterator is lazy and restartable: each call walks the current
    /// field sequence afresh.
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// Iterate over every field — control or data — with the given tag.
    ///
    /// Control matches come first, then data matches, each group in
    /// document order (the order the renderer and encoders use).
    pub fn find_fields<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = FieldRef<'a>> + 'a {
        self.control_fields
            .iter()
            .filter(move |cf| cf.tag == tag)
            .map(FieldRef::Control)
            .chain(
                self.fields
                    .iter()
                    .filter(move |f| f.tag == tag)
                    .map(FieldRef::Data),
            )
    }

    /// Total number of fields, control and data.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.control_fields.len() + self.fields.len()
    }

    /// Returns a copy whose leader record-length and base-address positions
    /// are recalculated from the current field contents, per the ISO 2709
    /// layout.
    ///
    /// Encoders call this; decoders never do — a decoded leader is stored
    /// as received even when its lengths are stale.
    #[must_use]
    pub fn with_leader_recomputed(&self) -> Record {
        let mut data_length = 0usize;
        for cf in &self.control_fields {
            // value + field terminator
            data_length += cf.value.len() + 1;
        }
        for field in &self.fields {
            let mut field_length =
                field.indicator1.len_utf8() + field.indicator2.len_utf8();
            for sf in &field.subfields {
                // delimiter + code + value
                field_length += 1 + sf.code.len_utf8() + sf.value.len();
            }
            data_length += field_length + 1;
        }
        let base_address = LEADER_LEN + 12 * self.field_count() + 1;
        let record_length = base_address + data_length + 1;

        let mut copy = self.clone();
        copy.leader = self.leader.with_lengths(record_length, base_address);
        copy
    }

    // ------------------------------------------------------------------
    // Convenience accessors
    // ------------------------------------------------------------------

    /// The record's control number (first 001 value), if present.
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.get_control_field("001")
    }

    /// The record's title proper (first 245 $a), if present.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get_field("245").and_then(|f| f.get_subfield('a'))
    }
}

/// Checks the record's tags, indicators, and subfield codes against what the
/// wire formats can represent. Every encoder runs this before emitting.
pub(crate) fn validate_encodable(record: &Record) -> EncodeResult<()> {
    let check_tag = |tag: &str| -> EncodeResult<()> {
        if tag.chars().count() == 3 && tag.chars().all(|c| c.is_ascii_graphic()) {
            Ok(())
        } else {
            Err(EncodeError::InvalidTagOrCode {
                detail: format!("tag {tag:?} is not 3 printable ASCII characters"),
            })
        }
    };

    for cf in record.control_fields() {
        check_tag(&cf.tag)?;
    }
    for field in record.fields() {
        check_tag(&field.tag)?;
        for (name, ind) in [("indicator1", field.indicator1), ("indicator2", field.indicator2)] {
            if !(ind == ' ' || ind.is_ascii_graphic()) {
                return Err(EncodeError::InvalidTagOrCode {
                    detail: format!("{name} {ind:?} in field {} is not printable ASCII", field.tag),
                });
            }
        }
        for sf in field.subfields() {
            if !sf.code.is_ascii_graphic() {
                return Err(EncodeError::InvalidTagOrCode {
                    detail: format!(
                        "subfield code {:?} in field {} is not printable ASCII",
                        sf.code, field.tag
                    ),
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for constructing [`Record`]s fluently.
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field to the record being built.
    #[must_use]
    pub fn control_field(mut self, tag: String, value: String) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    /// Add a control field using string slices.
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field_str(tag, value);
        self
    }

    /// Add a data field to the record being built.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record.
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

/// Builder for constructing [`Field`]s fluently.
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield to the field being built.
    #[must_use]
    pub fn subfield(mut self, code: char, value: String) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Add a subfield using a string slice.
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield_str(code, value);
        self
    }

    /// Build the field.
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}

// ============================================================================
// Field and Subfield
// ============================================================================

impl ControlField {
    /// Create a new control field.
    #[must_use]
    pub fn new(tag: String, value: String) -> Self {
        ControlField { tag, value }
    }
}

impl Field {
    /// Create a new data field with no subfields.
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for constructing fields fluently.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcview::Field;
    ///
    /// let field = Field::builder("245".to_string(), '1', '0')
    ///     .subfield_str('a', "The Great Gatsby")
    ///     .subfield_str('c', "F. Scott Fitzgerald")
    ///     .build();
    /// assert_eq!(field.get_subfield('c'), Some("F. Scott Fitzgerald"));
    /// ```
    #[must_use]
    pub fn builder(tag: String, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Append a subfield.
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// Append a subfield using a string slice.
    pub fn add_subfield_str(&mut self, code: char, value: &str) {
        self.add_subfield(code, value.to_string());
    }

    /// Get the first value for a subfield code.
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Iterate over all subfields in document order.
    pub fn subfields(&self) -> impl Iterator<Item = &Subfield> {
        self.subfields.iter()
    }

    /// Iterate over the values of subfields with a specific code.
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// All subfield values concatenated with spaces, for display.
    #[must_use]
    pub fn value(&self) -> String {
        self.subfields
            .iter()
            .map(|sf| sf.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Subfield {
    /// Create a new subfield.
    #[must_use]
    pub fn new(code: char, value: String) -> Self {
        Subfield { code, value }
    }
}
