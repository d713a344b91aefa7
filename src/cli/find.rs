//! `oedit find`: literal byte-pattern search over a file's virtual content.
//!
//! A thin demonstrator of spec §4.6's search primitive. The session here
//! has no edits applied — the needle is searched for in the file exactly
//! as it sits on disk — but the same [`core::search::find`] call sees
//! edits made earlier in the same session, which is what makes it useful
//! as a library primitive rather than a one-off grep.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::core::search::find;
use crate::core::session::Session;
use crate::util::hex::decode_hex;
use crate::OmegaError;

/// Options for the `oedit find` subcommand.
pub struct FindOptions {
    pub file: String,
    pub needle: String,
    pub hex: bool,
    pub start: i64,
    pub end: Option<i64>,
    pub json: bool,
}

#[derive(Serialize)]
struct FindReport {
    file: String,
    needle_bytes: usize,
    matches: Vec<i64>,
}

pub fn execute(opts: &FindOptions, writer: &mut dyn Write) -> Result<(), OmegaError> {
    let needle = if opts.hex {
        decode_hex(&opts.needle).map_err(OmegaError::Io)?
    } else {
        opts.needle.as_bytes().to_vec()
    };

    let session = Session::open(&opts.file)?;
    let end = opts.end.unwrap_or_else(|| session.computed_file_size());
    let matches = find(&session, &needle, opts.start, end)?;

    if opts.json {
        let report = FindReport {
            file: opts.file.clone(),
            needle_bytes: needle.len(),
            matches,
        };
        wprintln!(writer, "{}", serde_json::to_string_pretty(&report).unwrap())?;
    } else if matches.is_empty() {
        wprintln!(writer, "No matches for {:?} in {}", opts.needle, opts.file)?;
    } else {
        wprintln!(
            writer,
            "{} match(es) for {:?} in {}:",
            matches.len().to_string().green(),
            opts.needle,
            opts.file
        )?;
        for offset in &matches {
            wprintln!(writer, "  {}", offset)?;
        }
    }

    Ok(())
}
