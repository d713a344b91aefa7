//! Materialising the virtual file to an output sink — spec §4.5.
//!
//! Walks the session's segment list in order, writing each segment's bytes
//! in 8 KiB chunks (spec §4.5's recommendation, sized after the original
//! implementation's `omega_util_write_segment_to_file`). Save never
//! mutates session state.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::constants::IO_CHUNK_SIZE;
use crate::core::session::Session;
use crate::OmegaError;

/// Stream the session's virtual file to `sink`.
pub fn save<W: Write>(session: &Session, sink: W) -> Result<(), OmegaError> {
    let mut writer = BufWriter::new(sink);
    let size = session.computed_file_size();
    let mut offset = 0i64;
    let mut buf = vec![0u8; IO_CHUNK_SIZE];

    while offset < size {
        let chunk = IO_CHUNK_SIZE.min((size - offset) as usize);
        session.read(offset, &mut buf[..chunk])?;
        writer.write_all(&buf[..chunk])?;
        offset += chunk as i64;
    }
    writer.flush()?;
    Ok(())
}

/// Save to a file path, guarding against the output path being the same
/// file the session was opened from: writes to a temp file in the same
/// directory and renames it into place atomically once the walk completes.
///
/// Spec §4.5 notes the original implementation does not enforce this and
/// leaves it to implementers; see DESIGN.md.
pub fn save_to_path(session: &Session, out_path: impl AsRef<Path>) -> Result<(), OmegaError> {
    let out_path = out_path.as_ref();
    let same_as_input = session
        .file_path()
        .and_then(|input| same_file(input, out_path).ok())
        .unwrap_or(false);

    if !same_as_input {
        let file = File::create(out_path)?;
        return save(session, file);
    }

    let dir = out_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    save(session, &mut tmp)?;
    tmp.persist(out_path).map_err(|e| OmegaError::Io(e.to_string()))?;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    let meta_a = fs::metadata(a)?;
    let meta_b = match fs::metadata(b) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
    }
    #[cfg(not(unix))]
    {
        Ok(a.canonicalize().ok() == b.canonicalize().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn file_with(data: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(data).unwrap();
        f
    }

    #[test]
    fn round_trip_no_edits_is_byte_exact() {
        let f = file_with(b"the quick brown fox");
        let session = Session::open(f.path()).unwrap();
        let mut out = Vec::new();
        save(&session, &mut out).unwrap();
        assert_eq!(out, b"the quick brown fox");
    }

    #[test]
    fn save_after_edits_matches_virtual_file() {
        let f = file_with(b"0123456789");
        let mut session = Session::open(f.path()).unwrap();
        let author = session.create_author("alice");
        session.insert(&author, 5, b"xxx").unwrap();
        let mut out = Vec::new();
        save(&session, &mut out).unwrap();
        assert_eq!(out, b"01234xxx56789");
    }

    #[test]
    fn save_spanning_multiple_chunks() {
        let data = vec![b'a'; IO_CHUNK_SIZE * 3 + 17];
        let f = file_with(&data);
        let session = Session::open(f.path()).unwrap();
        let mut out = Vec::new();
        save(&session, &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn empty_segment_list_saves_empty_output() {
        let f = file_with(b"0123456789");
        let mut session = Session::open(f.path()).unwrap();
        let author = session.create_author("alice");
        session.delete(&author, 0, 10).unwrap();
        let mut out = Vec::new();
        save(&session, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn save_to_same_path_as_input_does_not_truncate_before_reading() {
        let f = file_with(b"0123456789");
        let path = f.path().to_path_buf();
        let session = Session::open(&path).unwrap();
        save_to_path(&session, &path).unwrap();
        let result = fs::read(&path).unwrap();
        assert_eq!(result, b"0123456789");
    }

    #[test]
    fn save_to_different_path_writes_directly() {
        let f = file_with(b"0123456789");
        let session = Session::open(f.path()).unwrap();
        let out = NamedTempFile::new().unwrap();
        save_to_path(&session, out.path()).unwrap();
        assert_eq!(fs::read(out.path()).unwrap(), b"0123456789");
    }
}
