//! MARCXML serialization and deserialization of MARC records.
//!
//! This module provides conversion between MARC records and standard MARCXML format,
//! as defined by the Library of Congress (<https://www.loc.gov/standards/marcxml/>).
//!
//! The output conforms to LOC's MARCXML schema: `tag`, `ind1`, `ind2`, and `code`
//! are serialized as XML **attributes**, and the root element carries the
//! `xmlns="http://www.loc.gov/MARC21/slim"` namespace declaration.
//!
//! For deserialization, both default-namespace (`<record xmlns="...">`) and
//! prefix-namespace (`<marc:record xmlns:marc="...">`) forms are accepted, as
//! well as plain unnamespaced markup. A `<record>` missing its `<leader>` is
//! tolerated: it gets a synthetic all-space leader, flagged via
//! [`LeaderSource::Synthetic`] so display layers can tell it apart from
//! cataloged data. Malformed markup fails the whole document, since XML has
//! no per-record recovery boundary.
//!
//! # Examples
//!
//! ```
//! use marcview::{Record, Field, Leader, marcxml};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut record = Record::new(Leader::default());
//! let mut field = Field::new("245".to_string(), '1', '0');
//! field.add_subfield_str('a', "Title");
//! record.add_field(field);
//!
//! let xml = marcxml::records_to_marcxml(std::slice::from_ref(&record))?;
//! let restored = marcxml::marcxml_to_records(&xml)?;
//! assert_eq!(restored.len(), 1);
//! # Ok(())
//! # }
//! ```

use quick_xml::de::from_str as xml_from_str;
use quick_xml::se::to_string as xml_to_string;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::leader::Leader;
use crate::record::{validate_encodable, Field, LeaderSource, Record};

/// The MARCXML namespace URI.
const MARCXML_NS: &str = "http://www.loc.gov/MARC21/slim";

fn default_indicator() -> String {
    " ".to_string()
}

/// MARCXML record representation for serialization.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "record")]
pub struct MarcxmlRecord {
    /// MARC leader string; absent in some hand-built feeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    /// Control fields (tags 001-009)
    #[serde(default)]
    pub controlfield: Vec<MarcxmlControlField>,
    /// Data fields (tags 010+)
    #[serde(default)]
    pub datafield: Vec<MarcxmlDataField>,
}

/// MARCXML control field representation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarcxmlControlField {
    /// Field tag as an XML attribute (e.g., "001", "008")
    #[serde(rename = "@tag")]
    pub tag: String,
    /// Control field value (text content)
    #[serde(rename = "$value", default)]
    pub value: String,
}

/// MARCXML data field representation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarcxmlDataField {
    /// Field tag as an XML attribute (e.g., "245", "650")
    #[serde(rename = "@tag")]
    pub tag: String,
    /// First indicator as an XML attribute; missing means blank.
    #[serde(rename = "@ind1", default = "default_indicator")]
    pub ind1: String,
    /// Second indicator as an XML attribute; missing means blank.
    #[serde(rename = "@ind2", default = "default_indicator")]
    pub ind2: String,
    /// Subfields
    #[serde(default)]
    pub subfield: Vec<MarcxmlSubfield>,
}

/// MARCXML subfield representation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarcxmlSubfield {
    /// Subfield code as an XML attribute (e.g., "a", "b", "c")
    #[serde(rename = "@code")]
    pub code: String,
    /// Subfield value (text content)
    #[serde(rename = "$value", default)]
    pub value: String,
}

/// MARCXML collection wrapper for multiple records.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "collection")]
pub struct MarcxmlCollection {
    /// Records in the collection
    #[serde(default, rename = "record")]
    pub records: Vec<MarcxmlRecord>,
}

// ---------------------------------------------------------------------------
// Namespace stripping
// ---------------------------------------------------------------------------

/// Strip XML namespace prefixes and declarations from MARCXML input.
///
/// Handles both `marc:record` → `record` (prefixed namespace) and
/// `xmlns="..."` / `xmlns:marc="..."` (namespace declarations).
fn strip_marcxml_ns(xml: &str) -> String {
    use regex::Regex;

    // Strip xmlns declarations (both default and prefixed)
    let re_xmlns = Regex::new(r#"\s+xmlns(?::\w+)?="[^"]*""#).unwrap();
    let stripped = re_xmlns.replace_all(xml, "");

    // Strip namespace prefixes on element names: <marc:record> → <record>,
    // </marc:record> → </record>
    let re_prefix = Regex::new(r"<(/?)(\w+):").unwrap();
    re_prefix.replace_all(&stripped, "<$1").to_string()
}

// ---------------------------------------------------------------------------
// Deserialization: MARCXML → Record
// ---------------------------------------------------------------------------

/// Convert a MARCXML string to a sequence of MARC records.
///
/// Accepts a `<collection>` of `<record>` elements or a single bare
/// `<record>`, in any of these forms:
/// - `<record xmlns="http://www.loc.gov/MARC21/slim">` (default namespace)
/// - `<marc:record xmlns:marc="...">` (prefixed namespace)
/// - `<record>` (no namespace)
///
/// # Errors
///
/// Returns [`DecodeError::MalformedXml`] when the markup cannot be parsed.
/// The failure covers the whole document: unlike the binary and mnemonic
/// codecs there is no record boundary to resynchronize on.
pub fn marcxml_to_records(xml: &str) -> DecodeResult<Vec<Record>> {
    let cleaned = strip_marcxml_ns(xml);

    if cleaned.contains("<collection") {
        let collection: MarcxmlCollection = xml_from_str(&cleaned)
            .map_err(|e| DecodeError::MalformedXml(format!("unparsable collection: {e}")))?;
        Ok(collection.records.into_iter().map(from_xml_record).collect())
    } else {
        let xml_record: MarcxmlRecord = xml_from_str(&cleaned)
            .map_err(|e| DecodeError::MalformedXml(format!("unparsable record: {e}")))?;
        Ok(vec![from_xml_record(xml_record)])
    }
}

/// Convert a deserialized `MarcxmlRecord` into a `Record`.
///
/// Infallible by design: indicator and code attributes degrade to a space
/// when empty, and multi-character attribute values keep their first
/// character, matching how permissive MARCXML consumers behave in practice.
fn from_xml_record(xml_record: MarcxmlRecord) -> Record {
    let (leader, source) = match xml_record.leader {
        Some(text) => (Leader::from_text(&text), LeaderSource::Supplied),
        None => (Leader::synthetic(), LeaderSource::Synthetic),
    };

    let mut record = Record::new(leader);
    record.set_leader_source(source);

    for cf in xml_record.controlfield {
        record.add_control_field(cf.tag, cf.value);
    }

    for df in xml_record.datafield {
        let ind1 = df.ind1.chars().next().unwrap_or(' ');
        let ind2 = df.ind2.chars().next().unwrap_or(' ');

        let mut field = Field::new(df.tag, ind1, ind2);
        for sf in df.subfield {
            let code = sf.code.chars().next().unwrap_or(' ');
            field.add_subfield(code, sf.value);
        }
        record.add_field(field);
    }

    record
}

// ---------------------------------------------------------------------------
// Serialization: Record → MARCXML
// ---------------------------------------------------------------------------

/// Convert a single MARC record to a standard MARCXML string.
///
/// The output includes an XML declaration and the
/// `xmlns="http://www.loc.gov/MARC21/slim"` namespace on the root `<record>`
/// element. All `tag`, `ind1`, `ind2`, and `code` values are serialized as
/// XML attributes, conforming to the LOC MARCXML schema; `&`, `<`, and `>`
/// in content are escaped by the serializer.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidTagOrCode`] when a tag, indicator, or
/// subfield code falls outside the encodable shape, or
/// [`EncodeError::Serialization`] when serialization itself fails.
pub fn record_to_marcxml(record: &Record) -> EncodeResult<String> {
    validate_encodable(record)?;

    let body = xml_to_string(&to_xml_record(record))
        .map_err(|e| EncodeError::Serialization(format!("failed to serialize record: {e}")))?;
    let body = body.replacen("<record>", &format!("<record xmlns=\"{MARCXML_NS}\">"), 1);

    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
}

/// Convert a sequence of MARC records to a MARCXML `<collection>` string.
///
/// The collection wrapper is emitted even for zero or one records, so the
/// output shape does not depend on batch size.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidTagOrCode`] for unencodable field shapes
/// and [`EncodeError::Serialization`] when serialization fails.
pub fn records_to_marcxml(records: &[Record]) -> EncodeResult<String> {
    for record in records {
        validate_encodable(record)?;
    }

    let collection = MarcxmlCollection {
        records: records.iter().map(to_xml_record).collect(),
    };

    let body = xml_to_string(&collection)
        .map_err(|e| EncodeError::Serialization(format!("failed to serialize collection: {e}")))?;
    // An empty batch serializes as a self-closing element.
    let body = body
        .replacen(
            "<collection>",
            &format!("<collection xmlns=\"{MARCXML_NS}\">"),
            1,
        )
        .replacen(
            "<collection/>",
            &format!("<collection xmlns=\"{MARCXML_NS}\"/>"),
            1,
        );

    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
}

/// Internal helper: build the serializable form of one record.
fn to_xml_record(record: &Record) -> MarcxmlRecord {
    let controlfield = record
        .control_fields()
        .iter()
        .map(|cf| MarcxmlControlField {
            tag: cf.tag.clone(),
            value: cf.value.clone(),
        })
        .collect();

    let datafield = record
        .fields()
        .iter()
        .map(|field| MarcxmlDataField {
            tag: field.tag.clone(),
            ind1: field.indicator1.to_string(),
            ind2: field.indicator2.to_string(),
            subfield: field
                .subfields()
                .map(|sf| MarcxmlSubfield {
                    code: sf.code.to_string(),
                    value: sf.value.clone(),
                })
                .collect(),
        })
        .collect();

    MarcxmlRecord {
        leader: Some(record.leader.to_string()),
        controlfield,
        datafield,
    }
}
