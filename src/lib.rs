#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # marcview: MARC record decoding and display
//!
//! A Rust library for decoding, encoding, and rendering MARC bibliographic
//! records across the four wire formats in active use: ISO 2709 binary,
//! MARCXML, MARC-in-JSON, and the line-oriented mnemonic text form.
//!
//! ## Quick Start
//!
//! ### Detecting and decoding arbitrary input
//!
//! ```
//! use marcview::{detect_and_decode, render, FormatKind};
//!
//! let input = b"=LDR  01041cam a2200289 a 4500\n=245  10$aTitle$bSubtitle\n";
//! let outcome = detect_and_decode(input, Some("export.mrk"));
//!
//! assert_eq!(outcome.format, Some(FormatKind::Mnemonic));
//! assert!(outcome.errors.is_empty());
//! assert!(render(&outcome.records[0]).contains("245 10 $aTitle $bSubtitle"));
//! ```
//!
//! ### Reading ISO 2709 binary records
//!
//! ```no_run
//! use marcview::MarcReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("records.mrc")?;
//! for outcome in MarcReader::new(&bytes) {
//!     match outcome {
//!         Ok(record) => println!("{:?}", record.title()),
//!         Err(e) => eprintln!("skipped one record: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Creating and writing records
//!
//! ```
//! use marcview::{Field, Leader, MarcWriter, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let record = Record::builder(Leader::default())
//!     .control_field_str("001", "12345")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Test Title")
//!             .build(),
//!     )
//!     .build();
//!
//! let mut writer = MarcWriter::new(Vec::new());
//! writer.write_record(&record)?;
//! let bytes = writer.finish()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`record`] — Core MARC record structures (`Record`, `Field`, `Subfield`)
//! - [`leader`] — MARC record leader (24-character header)
//! - [`reader`] — Decoding ISO 2709 binary streams
//! - [`writer`] — Encoding records to ISO 2709 binary
//! - [`marcxml`] — MARCXML serialization/deserialization
//! - [`marcjson`] — MARC-in-JSON serialization/deserialization
//! - [`mnemonic`] — Line-oriented mnemonic text form
//! - [`formats`] — Format detection and format-agnostic decode/encode
//! - [`render`] — Human-readable text rendering
//! - [`encoding`] — Character encoding support (MARC-8 and UTF-8)
//! - [`parallel`] — Rayon-based parallel rendering and encoding
//! - [`error`] — Error types and result aliases
//!
//! ## Format Support
//!
//! - **ISO 2709 Binary** — The standard MARC interchange format, with
//!   per-record fault isolation and MARC-8 transliteration
//! - **MARCXML** — The LOC XML schema, namespaced or not
//! - **MARC-in-JSON** — The JSON interchange shape used by library APIs
//! - **Mnemonic text** — The human-typed breaker form used by editors

pub mod encoding;
pub mod error;
pub mod formats;
pub mod leader;
pub mod marcjson;
pub mod marcxml;
pub mod mnemonic;
pub mod parallel;
pub mod reader;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod render;
pub mod writer;

pub use encoding::{marc8_to_unicode, Marc8Handling};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use formats::{
    detect, detect_and_decode, detect_and_decode_with_options, encode, DecodeOutcome, FormatKind,
};
pub use leader::{Leader, LEADER_LEN};
pub use parallel::{par_encode_binary, par_render};
pub use reader::MarcReader;
pub use record::{
    ControlField, Field, FieldBuilder, FieldRef, LeaderSource, Record, RecordBuilder, Subfield,
};
pub use render::{render, render_all};
pub use writer::MarcWriter;
