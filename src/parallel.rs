//! Parallel rendering and encoding using Rayon.
//!
//! Decoding a stream is inherently sequential (each record's boundary
//! depends on consuming the previous one), but once records exist they
//! are immutable and independent, so rendering and per-record encoding
//! fan out cleanly across Rayon's work-stealing pool. Output order always
//! matches input order.
//!
//! # Examples
//!
//! ```
//! use marcview::{parallel, Leader, Record};
//!
//! let records: Vec<Record> = (0..4)
//!     .map(|i| {
//!         Record::builder(Leader::default())
//!             .control_field_str("001", &format!("{i:08}"))
//!             .build()
//!     })
//!     .collect();
//!
//! let blocks = parallel::par_render(&records);
//! assert_eq!(blocks.len(), 4);
//! assert!(blocks[2].contains("00000002"));
//! ```

use crate::error::EncodeResult;
use crate::record::Record;
use crate::render::render;
use crate::writer::encode_record;

/// Render every record in parallel, preserving input order.
#[must_use]
pub fn par_render(records: &[Record]) -> Vec<String> {
    use rayon::prelude::*;

    records.par_iter().map(render).collect()
}

/// Encode records to ISO 2709 binary in parallel, preserving input order.
///
/// Each record is framed independently (every ISO 2709 record carries its
/// own terminator), so the per-record buffers concatenate into the same
/// byte stream a sequential writer would produce.
///
/// # Errors
///
/// Returns the first [`crate::EncodeError`] in input order if any record
/// cannot be encoded; nothing is returned for a partially encodable batch.
pub fn par_encode_binary(records: &[Record]) -> EncodeResult<Vec<u8>> {
    use rayon::prelude::*;

    let chunks: Vec<EncodeResult<Vec<u8>>> = records.par_iter().map(encode_record).collect();

    let mut output = Vec::new();
    for chunk in chunks {
        output.extend_from_slice(&chunk?);
    }
    Ok(output)
}
