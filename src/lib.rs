//! Non-destructive byte-stream editing.
//!
//! `omega-edit` (library name `omega_edit`) provides a session-based model
//! for editing arbitrarily large byte streams backed by a file on disk,
//! without ever mutating that file. A caller opens a [`Session`] over an
//! input file (or none, for an in-memory-only document), applies
//! `insert`/`overwrite`/`delete` changes at byte offsets, observes the
//! logical result through scrollable [`Viewport`]s, and [`core::save`]s the
//! edited stream to a new file once satisfied.
//!
//! # CLI Reference
//!
//! Install the `oedit` binary to drive sessions from the command line.
//!
//! ```text
//! cargo install omega-edit
//! ```
//!
//! ## Subcommands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`oedit apply`](cli::app::Commands::Apply) | Apply a JSON edit script to a file and save the result |
//! | [`oedit view`](cli::app::Commands::View) | Render a viewport window as a hex dump |
//! | [`oedit find`](cli::app::Commands::Find) | Search a file for a literal byte pattern |
//!
//! ## Global options
//!
//! All subcommands accept `--color <auto|always|never>` and `--output <file>`.
//! Most also accept `--json` for machine-readable output.
//!
//! See the [`cli`] module for full details.
//!
//! # Library API
//!
//! Add `omega-edit` as a dependency to use the editing core directly:
//!
//! ```toml
//! [dependencies]
//! omega-edit = "0.1"
//! ```
//!
//! ## Quick example
//!
//! ```no_run
//! use omega_edit::core::session::Session;
//!
//! let mut session = Session::open("input.bin").unwrap();
//! let alice = session.create_author("alice");
//! session.insert(&alice, 0, b"prefix-").unwrap();
//! session.overwrite(&alice, 100, b"!!!").unwrap();
//! session.delete(&alice, 200, 4).unwrap();
//!
//! let out = std::fs::File::create("output.bin").unwrap();
//! omega_edit::core::save::save(&session, out).unwrap();
//! ```
//!
//! ## Key entry points
//!
//! | Type / Function | Purpose |
//! |-----------------|---------|
//! | [`Session`](core::session::Session) | Open a session, apply edits, manage viewports |
//! | [`Viewport`](core::viewport::Viewport) | A cached, callback-driven window over the virtual file |
//! | [`ChangeLog`](core::change::ChangeLog) | Applied/undone change history |
//! | [`SegmentList`](core::segment::SegmentList) | The model projecting the virtual file |
//! | [`save`](core::save::save) | Materialise the virtual file to a writer |
//! | [`find`](core::search::find) | Literal byte-pattern search over the virtual file |
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`core::session`] | Session lifecycle, edit operations, viewport management |
//! | [`core::segment`] | Segment list model: locate, split, insert, delete, overwrite, read |
//! | [`core::change`] | Change log, undo/redo stack |
//! | [`core::viewport`] | Sliding-window cache with change notification |
//! | [`core::author`] | Named actors attributed on every change |
//! | [`core::backing`] | Positional reads over the backing input file |
//! | [`core::save`] | Streaming materialisation to an output sink |
//! | [`core::search`] | Literal needle search |
//! | [`util::bitshift`] | Sub-byte buffer bit-shifting for viewports |
//! | [`util::fs`] | Temp-file, basename/extension, and path helpers |

pub mod cli;
pub mod core;
pub mod util;

use thiserror::Error;

/// Errors returned by `omega_edit` operations.
///
/// All variants are recoverable in the sense that a session which returns
/// one is left in its pre-call state (spec §7), with the sole exception of
/// [`OmegaError::Fatal`], which signals a broken segment-list invariant the
/// implementation cannot recover from.
#[derive(Error, Debug)]
pub enum OmegaError {
    /// Offset outside `[0, virtual_size]`, or stricter per-operation bound.
    #[error("invalid offset")]
    InvalidOffset,

    /// Negative length, zero where not allowed, or more bytes than remain
    /// for a delete.
    #[error("invalid length")]
    InvalidLength,

    /// Search needle longer than half the session's
    /// [`viewport_max_capacity`](core::session::Session::viewport_max_capacity)
    /// (default derived from [`core::constants::DEFAULT_VIEWPORT_MAX_CAPACITY`]).
    #[error("needle exceeds length limit")]
    NeedleTooLong,

    /// A backing file read or output sink write failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Undo with an empty applied list, or redo with an empty undone stack.
    #[error("no such change")]
    NoSuchChange,

    /// Requested viewport capacity exceeds the session's configured maximum.
    #[error("viewport capacity exceeds session maximum")]
    CapacityExceeded,

    /// A callback attempted to edit the session it was invoked from.
    ///
    /// Not part of the spec's literal error list; the source only
    /// documents the hazard (spec §9, "Callback invocation inside a
    /// mutation"). Rust can enforce it cheaply with a re-entrancy guard
    /// instead of leaving it as a documented footgun.
    #[error("session is already mid-mutation; reentrant edits are not allowed")]
    Reentrant,

    /// A segment-list invariant was violated. Spec §7 calls for the
    /// implementation to abort with a diagnostic; callers that reach this
    /// variant should treat the session as unusable.
    #[error("internal invariant violated: {0}")]
    Fatal(String),
}

impl From<std::io::Error> for OmegaError {
    fn from(e: std::io::Error) -> Self {
        OmegaError::Io(e.to_string())
    }
}
