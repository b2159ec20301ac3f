//! Common test helpers and utilities shared across the test suite.

use marcview::{Field, Leader, Record};

/// Creates a realistic bibliographic record covering control fields,
/// repeated tags, blank indicators, and multi-subfield fields.
pub fn create_realistic_record() -> Record {
    Record::builder(Leader::from_text("01041cam a2200289 a 4500"))
        .control_field_str("001", "92005291")
        .control_field_str("008", "920219s1990    mau           001 0 eng  ")
        .field(
            Field::builder("100".to_string(), '1', ' ')
                .subfield_str('a', "Fitzgerald, F. Scott,")
                .subfield_str('d', "1896-1940.")
                .build(),
        )
        .field(
            Field::builder("245".to_string(), '1', '4')
                .subfield_str('a', "The great Gatsby /")
                .subfield_str('c', "F. Scott Fitzgerald.")
                .build(),
        )
        .field(
            Field::builder("260".to_string(), ' ', ' ')
                .subfield_str('a', "New York :")
                .subfield_str('b', "Scribner,")
                .subfield_str('c', "1925.")
                .build(),
        )
        .field(
            Field::builder("650".to_string(), ' ', '0')
                .subfield_str('a', "Rich people")
                .subfield_str('v', "Fiction.")
                .build(),
        )
        .field(
            Field::builder("650".to_string(), ' ', '0')
                .subfield_str('a', "Long Island (N.Y.)")
                .subfield_str('v', "Fiction.")
                .build(),
        )
        .build()
}

/// Creates a minimal record with a single title field.
#[allow(dead_code)]
pub fn create_minimal_record() -> Record {
    Record::builder(Leader::from_text("00000nam a2200000 a 4500"))
        .control_field_str("001", "minimal01")
        .field(
            Field::builder("245".to_string(), '0', '0')
                .subfield_str('a', "A minimal record")
                .build(),
        )
        .build()
}

/// Asserts that two records carry the same field content.
///
/// The leader is deliberately not compared: its length and base-address
/// bytes are recomputed by every binary encode, so only field content is
/// a meaningful round-trip invariant.
#[allow(dead_code)]
pub fn assert_same_content(left: &Record, right: &Record) {
    assert_eq!(left.control_fields(), right.control_fields());
    assert_eq!(left.fields(), right.fields());
}
