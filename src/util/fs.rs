//! Filesystem path helpers, out of scope for the editing core itself
//! (spec §1) but needed by `oedit` for same-path save safety and by tests
//! for scratch files.
//!
//! Ported from the `omega_util_*` functions in the original
//! implementation's `utility.c` — `dirname`, `basename`, `file_extension`,
//! `available_filename`, and `touch` — using [`std::path::Path`] instead of
//! the original's `cwk_path` helpers, and [`tempfile`] instead of a
//! hand-rolled `mkstemp`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::OmegaError;

/// The directory component of `path`, or `.` if it has none.
pub fn dirname(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The final path component, with `suffix` stripped if present — mirrors
/// `omega_util_basename(path, suffix, ...)`.
pub fn basename(path: &Path, suffix: Option<&str>) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_string();
    match suffix {
        Some(suffix) if name.ends_with(suffix) && suffix.len() < name.len() => {
            Some(name[..name.len() - suffix.len()].to_string())
        }
        _ => Some(name),
    }
}

/// The file extension, including the leading dot (`".ibd"`), or `None` if
/// the path has none — mirrors `omega_util_file_extension`.
pub fn file_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    Some(format!(".{ext}"))
}

/// Whether a path already exists — mirrors `omega_util_file_exists`.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// The first of `path`, `path-1<ext>`, `path-2<ext>`, … that does not
/// already exist — mirrors `omega_util_available_filename`.
pub fn available_filename(path: &Path) -> Option<PathBuf> {
    if !file_exists(path) {
        return Some(path.to_path_buf());
    }
    let dir = dirname(path);
    let extension = file_extension(path).unwrap_or_default();
    let stem = basename(path, Some(&extension))?;
    for i in 1..=99 {
        let candidate = dir.join(format!("{stem}-{i}{extension}"));
        if !file_exists(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Create `path` if it does not exist (when `create` is true), or update
/// its modified time if it does — mirrors `omega_util_touch`. Unlike the
/// source, a missing file with `create = false` is not an error; it is a
/// no-op, matching the source's own early-return for that case.
pub fn touch(path: &Path, create: bool) -> Result<(), OmegaError> {
    if !create && !file_exists(path) {
        return Ok(());
    }
    let file = OpenOptions::new().write(true).create(create).open(path)?;
    let now = std::time::SystemTime::now();
    file.set_modified(now)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirname_of_nested_path() {
        assert_eq!(dirname(Path::new("/a/b/c.txt")), PathBuf::from("/a/b"));
    }

    #[test]
    fn dirname_of_bare_filename_is_dot() {
        assert_eq!(dirname(Path::new("c.txt")), PathBuf::from("."));
    }

    #[test]
    fn basename_strips_suffix() {
        assert_eq!(
            basename(Path::new("/a/table.ibd"), Some(".ibd")),
            Some("table".to_string())
        );
    }

    #[test]
    fn basename_without_suffix_keeps_extension() {
        assert_eq!(
            basename(Path::new("/a/table.ibd"), None),
            Some("table.ibd".to_string())
        );
    }

    #[test]
    fn file_extension_includes_dot() {
        assert_eq!(file_extension(Path::new("a.ibd")), Some(".ibd".to_string()));
        assert_eq!(file_extension(Path::new("a")), None);
    }

    #[test]
    fn available_filename_returns_input_when_free() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        assert_eq!(available_filename(&path), Some(path));
    }

    #[test]
    fn available_filename_increments_on_collision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"x").unwrap();
        let next = available_filename(&path).unwrap();
        assert_eq!(next, dir.path().join("out-1.bin"));
    }

    #[test]
    fn touch_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.bin");
        assert!(!file_exists(&path));
        touch(&path, true).unwrap();
        assert!(file_exists(&path));
    }

    #[test]
    fn touch_without_create_on_missing_file_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.bin");
        touch(&path, false).unwrap();
        assert!(!file_exists(&path));
    }
}
