//! Convert a MARC file between wire formats.
//!
//! Detects the input format from content, decodes every record it can,
//! and re-encodes the survivors into the format named by the output
//! file's extension (`.mrc`/`.marc`, `.xml`/`.marcxml`, `.json`, `.mrk`).
//!
//! # Usage
//!
//! ```sh
//! cargo run --example format_convert -- <input_file> <output_file>
//! ```
//!
//! # Examples
//!
//! ```sh
//! cargo run --example format_convert -- records.mrc records.xml
//! cargo run --example format_convert -- export.json records.mrk
//! ```

use std::env;
use std::fs;
use std::path::Path;

use marcview::{detect_and_decode, encode, FormatKind};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <input_file> <output_file>", args[0]);
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  input_file   Path to a MARC file in any supported format");
        eprintln!("  output_file  Destination; its extension picks the target format");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];

    let target = Path::new(output_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(FormatKind::from_extension)
        .ok_or_else(|| {
            anyhow::anyhow!("Cannot infer a target format from '{output_path}' (use .mrc, .xml, .json, or .mrk)")
        })?;

    let bytes = fs::read(input_path)
        .map_err(|e| anyhow::anyhow!("Failed to read input file '{input_path}': {e}"))?;

    let outcome = detect_and_decode(&bytes, Some(input_path.as_str()));
    let Some(source) = outcome.format else {
        anyhow::bail!("'{input_path}' does not look like MARC in any supported format");
    };

    let total = outcome.records.len() + outcome.errors.len();
    eprintln!(
        "{input_path}: {source}, {} of {} records parsed",
        outcome.records.len(),
        total
    );
    for error in &outcome.errors {
        eprintln!("  {error}");
    }

    let encoded = encode(&outcome.records, target)
        .map_err(|e| anyhow::anyhow!("Failed to encode as {target}: {e}"))?;
    fs::write(output_path, encoded)
        .map_err(|e| anyhow::anyhow!("Failed to write '{output_path}': {e}"))?;

    eprintln!(
        "{output_path}: wrote {} records as {target}",
        outcome.records.len()
    );
    Ok(())
}
