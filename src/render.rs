//! Human-readable text rendering of MARC records.
//!
//! The renderer produces the diagnostic display form used by catalog
//! viewers: one line per field, leader first.
//!
//! ```text
//! LDR   01041cam a2200289 a 4500
//! 001   92005291
//! 245 10 $aTitle : $bsubtitle.
//! 650  0 $aSubject heading.
//! ```
//!
//! Rendering never fails. Missing pieces degrade to visible placeholders
//! (a record decoded without any leader shows `LDR   (none)`), because
//! the output exists to show a human what was parsed, not to be decoded
//! back.

use std::fmt::Write;

use crate::record::{LeaderSource, Record};

/// Width of the separator line between records in [`render_all`].
const SEPARATOR_WIDTH: usize = 40;

/// Render one record as a text block, one line per field.
///
/// The leader is rendered first as `LDR   <24 characters>`, or
/// `LDR   (none)` when the decode synthesized it. Control fields render
/// as `TAG   value`; data fields as `TAG II $avalue $bvalue` with both
/// indicator characters printed as-is (blanks stay blanks).
#[must_use]
pub fn render(record: &Record) -> String {
    let mut output = String::new();

    if record.leader_source() == LeaderSource::Synthetic {
        output.push_str("LDR   (none)\n");
    } else {
        writeln!(output, "LDR   {}", record.leader).ok();
    }

    for cf in record.control_fields() {
        writeln!(output, "{}   {}", cf.tag, cf.value).ok();
    }

    for field in record.fields() {
        write!(output, "{} {}{}", field.tag, field.indicator1, field.indicator2).ok();
        for sf in field.subfields() {
            write!(output, " ${}{}", sf.code, sf.value).ok();
        }
        output.push('\n');
    }

    output
}

/// Render several records, separated by a divider line.
#[must_use]
pub fn render_all(records: &[Record]) -> String {
    let mut output = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writeln!(output, "{}", "=".repeat(SEPARATOR_WIDTH)).ok();
        }
        output.push_str(&render(record));
    }
    output
}
