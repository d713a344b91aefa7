//! Tunable defaults shared across the session, viewport, and search APIs.
//!
//! Mirrors `omega_edit/include/config.h` in the original implementation:
//! a default viewport capacity and a needle-length limit derived from it.

/// Default maximum number of bytes a viewport may cache, unless a session
/// overrides it at creation time.
pub const DEFAULT_VIEWPORT_MAX_CAPACITY: i64 = 1024 * 1024;

/// Upper bound on search needle length, half of the viewport max capacity.
pub const NEEDLE_LENGTH_LIMIT: i64 = DEFAULT_VIEWPORT_MAX_CAPACITY / 2;

/// Chunk size used for buffered I/O during save and streaming search.
pub const IO_CHUNK_SIZE: usize = 8 * 1024;
