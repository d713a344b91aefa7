//! `oedit view`: materialise a viewport window and render it as a hex dump.
//!
//! A thin demonstrator of spec §4.4's viewport API: opens a read-only
//! session, creates a single viewport with no callback, and prints its
//! cached bytes — either as a formatted hex dump (the default) or as raw
//! bytes suitable for piping into another tool (`--raw`).

use std::io::Write;

use crate::cli::wprintln;
use crate::core::session::Session;
use crate::util::hex::hex_dump;
use crate::OmegaError;

/// Options for the `oedit view` subcommand.
pub struct ViewOptions {
    pub file: String,
    pub offset: i64,
    pub length: i64,
    pub bit_offset: u8,
    pub raw: bool,
}

pub fn execute(opts: &ViewOptions, writer: &mut dyn Write) -> Result<(), OmegaError> {
    let mut session = Session::open(&opts.file)?;
    let author = session.create_author("oedit-view");
    let handle =
        session.create_viewport(&author, opts.offset, opts.length, opts.bit_offset, None, None)?;
    let viewport = session.viewport(handle)?;

    if opts.raw {
        writer
            .write_all(viewport.data())
            .map_err(|e| OmegaError::Io(e.to_string()))?;
    } else {
        wprintln!(
            writer,
            "Viewport of {} at offset {} ({} of {} requested bytes, bit_offset {}):",
            opts.file,
            opts.offset,
            viewport.length(),
            opts.length,
            opts.bit_offset,
        )?;
        wprintln!(writer)?;
        wprintln!(writer, "{}", hex_dump(viewport.data(), opts.offset as u64))?;
    }

    Ok(())
}
