//! MARC-in-JSON serialization and deserialization of MARC records.
//!
//! Implements the MARC-in-JSON interchange shape used by library APIs:
//!
//! - A record is an object with a `"leader"` string and a `"fields"` array.
//! - Each entry in `"fields"` is a single-key object whose key is the tag.
//! - A string value makes the field a control field; an object value with
//!   `"ind1"`, `"ind2"`, and `"subfields"` keys makes it a data field.
//! - `"subfields"` is an array of single-key objects (code → value), in
//!   document order.
//!
//! The top-level value may be one record object or an array of record
//! objects. Inside an array, a malformed record fails alone: its error is
//! reported with a JSONPath-style location and the surrounding records
//! still decode. Only unparsable JSON text fails the whole document, since
//! without a syntax tree there is no record boundary to fall back on.
//!
//! # Examples
//!
//! ```
//! use marcview::marcjson;
//!
//! let input = r#"{"leader":"01041cam a2200289 a 4500","fields":[
//!     {"001":"92005291"},
//!     {"245":{"ind1":"1","ind2":"0","subfields":[{"a":"Title"}]}}
//! ]}"#;
//! let (records, errors) = marcjson::marcjson_to_records(input);
//! assert_eq!(records.len(), 1);
//! assert!(errors.is_empty());
//! ```

use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::leader::Leader;
use crate::record::{validate_encodable, Field, LeaderSource, Record};

// ---------------------------------------------------------------------------
// Deserialization: MARC-in-JSON → Record
// ---------------------------------------------------------------------------

/// Parse MARC-in-JSON text into records.
///
/// Returns the successfully decoded records together with the errors for
/// any that failed, so a caller can report "N of M records parsed". A
/// syntax error or a top-level value that is neither object nor array
/// yields zero records and a single error located at `$`.
#[must_use]
pub fn marcjson_to_records(input: &str) -> (Vec<Record>, Vec<DecodeError>) {
    let value: Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(e) => {
            return (
                Vec::new(),
                vec![DecodeError::MalformedJsonField {
                    path: "$".to_string(),
                    detail: format!("unparsable JSON: {e}"),
                }],
            );
        }
    };

    let mut records = Vec::new();
    let mut errors = Vec::new();

    match value {
        Value::Object(_) => match record_from_value(&value, "$") {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        },
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                match record_from_value(item, &format!("$[{i}]")) {
                    Ok(record) => records.push(record),
                    Err(e) => errors.push(e),
                }
            }
        }
        _ => errors.push(DecodeError::MalformedJsonField {
            path: "$".to_string(),
            detail: "top-level value must be a record object or an array of records".to_string(),
        }),
    }

    (records, errors)
}

/// Decode one record object.
fn record_from_value(value: &Value, path: &str) -> DecodeResult<Record> {
    let obj = value.as_object().ok_or_else(|| shape_error(path, "record must be an object"))?;

    let (leader, source) = match obj.get("leader") {
        Some(Value::String(text)) => (Leader::from_text(text), LeaderSource::Supplied),
        Some(_) => return Err(shape_error(&format!("{path}.leader"), "leader must be a string")),
        None => (Leader::synthetic(), LeaderSource::Synthetic),
    };

    let mut record = Record::new(leader);
    record.set_leader_source(source);

    match obj.get("fields") {
        Some(Value::Array(fields)) => {
            for (i, field) in fields.iter().enumerate() {
                add_field_from_value(&mut record, field, &format!("{path}.fields[{i}]"))?;
            }
        }
        Some(_) => {
            return Err(shape_error(&format!("{path}.fields"), "fields must be an array"));
        }
        None => {}
    }

    Ok(record)
}

/// Decode one entry of the `"fields"` array into the record.
fn add_field_from_value(record: &mut Record, value: &Value, path: &str) -> DecodeResult<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| shape_error(path, "field must be a single-key object"))?;
    if obj.len() != 1 {
        return Err(shape_error(
            path,
            &format!("field must have exactly one key, found {}", obj.len()),
        ));
    }

    // Single-key object; the key is the tag.
    let (tag, body) = obj
        .iter()
        .next()
        .ok_or_else(|| shape_error(path, "field must have exactly one key"))?;
    if tag.len() != 3 {
        return Err(shape_error(
            &format!("{path}.{tag}"),
            "tag must be exactly 3 characters",
        ));
    }

    match body {
        Value::String(text) => {
            record.add_control_field(tag.clone(), text.clone());
            Ok(())
        }
        Value::Object(field_obj) => {
            let field = data_field_from_object(tag, field_obj, &format!("{path}.{tag}"))?;
            record.add_field(field);
            Ok(())
        }
        _ => Err(shape_error(
            &format!("{path}.{tag}"),
            "field value must be a string or an object",
        )),
    }
}

/// Decode a data field body: `{"ind1": ".", "ind2": ".", "subfields": [...]}`.
fn data_field_from_object(tag: &str, obj: &Map<String, Value>, path: &str) -> DecodeResult<Field> {
    let ind1 = indicator_from_object(obj, "ind1", path)?;
    let ind2 = indicator_from_object(obj, "ind2", path)?;

    let subfields = obj
        .get("subfields")
        .ok_or_else(|| shape_error(path, "data field is missing \"subfields\""))?
        .as_array()
        .ok_or_else(|| shape_error(&format!("{path}.subfields"), "subfields must be an array"))?;

    let mut field = Field::new(tag.to_string(), ind1, ind2);
    for (j, sf) in subfields.iter().enumerate() {
        let sf_path = format!("{path}.subfields[{j}]");
        let sf_obj = sf
            .as_object()
            .ok_or_else(|| shape_error(&sf_path, "subfield must be a single-key object"))?;
        if sf_obj.len() != 1 {
            return Err(shape_error(
                &sf_path,
                &format!("subfield must have exactly one key, found {}", sf_obj.len()),
            ));
        }
        let (code, sf_value) = sf_obj
            .iter()
            .next()
            .ok_or_else(|| shape_error(&sf_path, "subfield must have exactly one key"))?;
        let code = code
            .chars()
            .next()
            .ok_or_else(|| shape_error(&sf_path, "subfield code must not be empty"))?;
        let text = sf_value
            .as_str()
            .ok_or_else(|| shape_error(&sf_path, "subfield value must be a string"))?;
        field.add_subfield(code, text.to_string());
    }

    Ok(field)
}

/// Read an indicator key. Must be present and a string; an empty string
/// degrades to a blank indicator rather than failing, since several
/// producers emit `""` for blank.
fn indicator_from_object(obj: &Map<String, Value>, key: &str, path: &str) -> DecodeResult<char> {
    let value = obj
        .get(key)
        .ok_or_else(|| shape_error(path, &format!("data field is missing \"{key}\"")))?;
    let text = value
        .as_str()
        .ok_or_else(|| shape_error(&format!("{path}.{key}"), "indicator must be a string"))?;
    Ok(text.chars().next().unwrap_or(' '))
}

fn shape_error(path: &str, detail: &str) -> DecodeError {
    DecodeError::MalformedJsonField {
        path: path.to_string(),
        detail: detail.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Serialization: Record → MARC-in-JSON
// ---------------------------------------------------------------------------

/// Convert one MARC record to its MARC-in-JSON object.
///
/// Control fields and data fields are emitted into the `"fields"` array in
/// document order (control fields first), each wrapped in a single-key
/// object, mirroring the decode shape exactly so round-trips preserve
/// field and subfield order.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidTagOrCode`] when a tag, indicator, or
/// subfield code falls outside the encodable shape.
pub fn record_to_marcjson(record: &Record) -> EncodeResult<Value> {
    validate_encodable(record)?;

    let mut fields = Vec::with_capacity(record.field_count());

    for cf in record.control_fields() {
        let mut wrapper = Map::new();
        wrapper.insert(cf.tag.clone(), Value::String(cf.value.clone()));
        fields.push(Value::Object(wrapper));
    }

    for field in record.fields() {
        let subfields: Vec<Value> = field
            .subfields()
            .map(|sf| {
                let mut wrapper = Map::new();
                wrapper.insert(sf.code.to_string(), Value::String(sf.value.clone()));
                Value::Object(wrapper)
            })
            .collect();

        let mut body = Map::new();
        body.insert("ind1".to_string(), Value::String(field.indicator1.to_string()));
        body.insert("ind2".to_string(), Value::String(field.indicator2.to_string()));
        body.insert("subfields".to_string(), Value::Array(subfields));

        let mut wrapper = Map::new();
        wrapper.insert(field.tag.clone(), Value::Object(body));
        fields.push(Value::Object(wrapper));
    }

    let mut root = Map::new();
    root.insert("leader".to_string(), Value::String(record.leader.to_string()));
    root.insert("fields".to_string(), Value::Array(fields));
    Ok(Value::Object(root))
}

/// Convert records to MARC-in-JSON text.
///
/// A single record is emitted as one object; any other count is emitted
/// as a top-level array, matching the two accepted decode shapes.
///
/// # Errors
///
/// Returns [`EncodeError::InvalidTagOrCode`] for unencodable field shapes.
pub fn records_to_marcjson(records: &[Record]) -> EncodeResult<String> {
    let value = if records.len() == 1 {
        record_to_marcjson(&records[0])?
    } else {
        Value::Array(
            records
                .iter()
                .map(record_to_marcjson)
                .collect::<EncodeResult<Vec<Value>>>()?,
        )
    };

    serde_json::to_string(&value).map_err(|e| EncodeError::Serialization(format!("{e}")))
}
