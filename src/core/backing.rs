//! The session's read-only view of its backing input file.
//!
//! Segment reads need positional ("pread-style") access so the seek
//! pointer is never shared across calls — spec §5. [`ByteSource`] is the
//! narrow interface the segment list reads through; [`FileBacking`] is the
//! concrete implementation over a real file, optionally windowed to a
//! sub-range (spec §9's `window_offset`/`window_length`).

use std::fmt;
use std::fs::File;
use std::io;

#[cfg(not(unix))]
use std::io::{Read, Seek, SeekFrom};
#[cfg(not(unix))]
use std::sync::Mutex;

/// A read-only, randomly-addressable byte source.
pub trait ByteSource: fmt::Debug {
    /// Read `buf.len()` bytes starting at `offset` bytes into the source.
    fn read_exact_at(&self, offset: i64, buf: &mut [u8]) -> io::Result<()>;

    /// Total number of bytes available from this source.
    fn len(&self) -> i64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backing store with no input file (a session created without one).
#[derive(Debug, Default)]
pub struct EmptyBacking;

impl ByteSource for EmptyBacking {
    fn read_exact_at(&self, _offset: i64, buf: &mut [u8]) -> io::Result<()> {
        if buf.is_empty() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "backing file is empty",
            ))
        }
    }

    fn len(&self) -> i64 {
        0
    }
}

/// Backing store over an open file, optionally windowed to `[window_offset,
/// window_offset + window_length)` of the underlying file.
pub struct FileBacking {
    #[cfg(unix)]
    file: File,
    #[cfg(not(unix))]
    file: Mutex<File>,
    window_offset: i64,
    window_length: i64,
}

impl fmt::Debug for FileBacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBacking")
            .field("window_offset", &self.window_offset)
            .field("window_length", &self.window_length)
            .finish()
    }
}

impl FileBacking {
    /// Wrap `file` (whose full size is `file_len`) as a backing store.
    ///
    /// `window_offset`/`window_length` of `(0, 0)` means "the whole file",
    /// per spec §9's resolution of the open question on session windowing.
    pub fn new(file: File, file_len: i64, window_offset: i64, window_length: i64) -> Self {
        let (window_offset, window_length) = if window_offset == 0 && window_length == 0 {
            (0, file_len)
        } else {
            (window_offset, window_length.min(file_len - window_offset))
        };

        #[cfg(unix)]
        {
            FileBacking {
                file,
                window_offset,
                window_length,
            }
        }
        #[cfg(not(unix))]
        {
            FileBacking {
                file: Mutex::new(file),
                window_offset,
                window_length,
            }
        }
    }
}

impl ByteSource for FileBacking {
    fn read_exact_at(&self, offset: i64, buf: &mut [u8]) -> io::Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let absolute = self.window_offset + offset;

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(buf, absolute as u64)
        }
        #[cfg(not(unix))]
        {
            let mut file = self.file.lock().expect("backing file mutex poisoned");
            file.seek(SeekFrom::Start(absolute as u64))?;
            file.read_exact(buf)
        }
    }

    fn len(&self) -> i64 {
        self.window_length
    }
}
