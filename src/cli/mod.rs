//! CLI subcommand implementations for the `oedit` binary.
//!
//! `oedit` is a thin external collaborator exercising the editing core's
//! public API (spec §1: "the C-shaped public API wrapping... is not part
//! of the core"). CLI argument parsing uses clap derive macros, with the
//! top-level [`app::Cli`] struct and [`app::Commands`] enum defined in
//! [`app`] and shared between `main.rs` and `build.rs` (for man page
//! generation) via `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct
//! holding the parsed arguments and a `pub fn execute(opts, writer) ->
//! Result<(), OmegaError>` entry point. The `writer: &mut dyn Write`
//! parameter allows output to be captured in tests or redirected to a file
//! via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `oedit apply` | [`apply`] | Apply a JSON edit script to a file and save the result |
//! | `oedit view` | [`view`] | Render a viewport window as a hex dump |
//! | `oedit find` | [`find`] | Search a file for a literal byte pattern |
//!
//! # Common patterns
//!
//! - **`--json`** — `apply` and `find` support structured JSON output via
//!   `#[derive(Serialize)]` structs and `serde_json`.
//! - **`--color`** (global) — Control colored terminal output (`auto`,
//!   `always`, `never`).
//! - **`--output` / `-o`** (global) — Redirect textual output to a file
//!   instead of stdout.

pub mod app;
pub mod apply;
pub mod find;
pub mod view;

/// Write a line to the given writer, converting io::Error to OmegaError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::OmegaError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::OmegaError::Io(e.to_string()))
    };
}

/// Write (without newline) to the given writer, converting io::Error to OmegaError.
macro_rules! wprint {
    ($w:expr, $($arg:tt)*) => {
        write!($w, $($arg)*).map_err(|e| $crate::OmegaError::Io(e.to_string()))
    };
}

pub(crate) use wprint;
pub(crate) use wprintln;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a styled progress bar for iterating over edit operations.
pub(crate) fn create_progress_bar(count: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
                unit
            ))
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
