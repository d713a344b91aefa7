//! `oedit apply`: replay a JSON edit script against a file and save it.
//!
//! The script is a JSON array of operations:
//!
//! ```json
//! [
//!   { "op": "insert", "offset": 0, "text": "prefix-" },
//!   { "op": "overwrite", "offset": 100, "hex": "21212121" },
//!   { "op": "delete", "offset": 200, "length": 4 }
//! ]
//! ```
//!
//! Insert/overwrite payloads are given as either `"text"` (UTF-8) or
//! `"hex"` (a compact hex string), never both. This is the demonstrator's
//! serialization of a [`Change`](omega_edit::core::Change) payload, not
//! part of the editing core itself (spec §1).

use std::fs;
use std::io::Write;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::cli::{create_progress_bar, wprintln};
use crate::core::save::save_to_path;
use crate::core::session::Session;
use crate::util::hex::decode_hex;
use crate::OmegaError;

/// Options for the `oedit apply` subcommand.
pub struct ApplyOptions {
    pub file: String,
    pub script: String,
    pub author: String,
    pub save: Option<String>,
    pub json: bool,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum EditOp {
    Insert {
        offset: i64,
        #[serde(flatten)]
        payload: Payload,
    },
    Overwrite {
        offset: i64,
        #[serde(flatten)]
        payload: Payload,
    },
    Delete {
        offset: i64,
        length: i64,
    },
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    hex: Option<String>,
}

impl Payload {
    fn bytes(&self) -> Result<Vec<u8>, OmegaError> {
        match (&self.text, &self.hex) {
            (Some(text), None) => Ok(text.as_bytes().to_vec()),
            (None, Some(hex)) => decode_hex(hex).map_err(OmegaError::Io),
            (None, None) => Err(OmegaError::Io(
                "edit op has neither \"text\" nor \"hex\" payload".to_string(),
            )),
            (Some(_), Some(_)) => Err(OmegaError::Io(
                "edit op has both \"text\" and \"hex\" payloads; pick one".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
struct AppliedChange {
    serial: i64,
    kind: char,
    offset: i64,
    length: i64,
}

#[derive(Serialize)]
struct ApplyReport {
    file: String,
    saved_to: String,
    changes: Vec<AppliedChange>,
    final_size: i64,
}

pub fn execute(opts: &ApplyOptions, writer: &mut dyn Write) -> Result<(), OmegaError> {
    let script_text = fs::read_to_string(&opts.script)
        .map_err(|e| OmegaError::Io(format!("cannot read {}: {e}", opts.script)))?;
    let ops: Vec<EditOp> = serde_json::from_str(&script_text)
        .map_err(|e| OmegaError::Io(format!("invalid edit script {}: {e}", opts.script)))?;

    let mut session = Session::open(&opts.file)?;
    let author = session.create_author(&opts.author);

    let pb = create_progress_bar(ops.len() as u64, "edits");
    let mut applied = Vec::with_capacity(ops.len());
    for op in ops {
        let change = match op {
            EditOp::Insert { offset, payload } => {
                session.insert(&author, offset, &payload.bytes()?)?
            }
            EditOp::Overwrite { offset, payload } => {
                session.overwrite(&author, offset, &payload.bytes()?)?
            }
            EditOp::Delete { offset, length } => session.delete(&author, offset, length)?,
        };
        applied.push(AppliedChange {
            serial: change.serial(),
            kind: change.kind().as_char(),
            offset: change.offset(),
            length: change.length(),
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    let save_path = opts.save.clone().unwrap_or_else(|| opts.file.clone());
    save_to_path(&session, &save_path)?;

    if opts.json {
        let report = ApplyReport {
            file: opts.file.clone(),
            saved_to: save_path,
            final_size: session.computed_file_size(),
            changes: applied,
        };
        wprintln!(writer, "{}", serde_json::to_string_pretty(&report).unwrap())?;
    } else {
        wprintln!(
            writer,
            "Applied {} change(s) to {}",
            applied.len(),
            opts.file
        )?;
        for c in &applied {
            wprintln!(
                writer,
                "  [{}] {} @ {} ({} bytes)",
                c.serial,
                c.kind,
                c.offset,
                c.length
            )?;
        }
        wprintln!(
            writer,
            "Saved {} ({} bytes)",
            save_path.green(),
            session.computed_file_size()
        )?;
    }

    Ok(())
}
