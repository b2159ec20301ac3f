//! Detect the format of a MARC file and render its records as text.
//!
//! Reads the whole file, auto-detects which of the four wire formats it
//! holds (the filename extension is only consulted when the content
//! matches nothing), and prints every record in the human-readable
//! display form. Records that fail to
//! decode are reported to stderr without aborting the rest.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example render_file -- <input_file> [--lossy-marc8]
//! ```
//!
//! # Examples
//!
//! ```sh
//! cargo run --example render_file -- records.mrc
//! cargo run --example render_file -- export.xml
//! cargo run --example render_file -- legacy.mrc --lossy-marc8
//! ```

use std::env;
use std::fs;

use marcview::{detect_and_decode_with_options, render_all, Marc8Handling};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input_file> [--lossy-marc8]", args[0]);
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  input_file      Path to a MARC file in any supported format");
        eprintln!("  --lossy-marc8   Replace unmapped MARC-8 bytes instead of transliterating");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let marc8 = if args.iter().any(|a| a == "--lossy-marc8") {
        Marc8Handling::Lossy
    } else {
        Marc8Handling::Transliterate
    };

    let bytes = fs::read(input_path)
        .map_err(|e| anyhow::anyhow!("Failed to read input file '{input_path}': {e}"))?;

    let outcome = detect_and_decode_with_options(&bytes, Some(input_path.as_str()), marc8);

    let Some(format) = outcome.format else {
        anyhow::bail!("'{input_path}' does not look like MARC in any supported format");
    };

    let total = outcome.records.len() + outcome.errors.len();
    eprintln!(
        "{input_path}: {format}, {} of {} records parsed",
        outcome.records.len(),
        total
    );
    for error in &outcome.errors {
        eprintln!("  {error}");
    }

    print!("{}", render_all(&outcome.records));
    Ok(())
}
