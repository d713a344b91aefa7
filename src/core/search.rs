//! Literal byte-pattern search over a session's virtual file — spec §4.6.

use crate::core::constants::IO_CHUNK_SIZE;
use crate::core::session::Session;
use crate::OmegaError;

/// Find all non-overlapping occurrences of `needle` in the virtual file
/// within `[start_offset, end_offset)`, in ascending order.
///
/// Streams a sliding buffer from the segment list rather than materialising
/// the whole virtual file (spec §4.6), reading in windows of
/// `needle.len() + IO_CHUNK_SIZE` bytes with enough carry-over to catch
/// matches that straddle a window boundary.
pub fn find(
    session: &Session,
    needle: &[u8],
    start_offset: i64,
    end_offset: i64,
) -> Result<Vec<i64>, OmegaError> {
    if needle.len() as i64 > session.viewport_max_capacity() / 2 {
        return Err(OmegaError::NeedleTooLong);
    }
    let size = session.computed_file_size();
    let start = start_offset.max(0);
    let end = end_offset.min(size);
    if needle.is_empty() || start >= end {
        return Ok(Vec::new());
    }

    let needle_len = needle.len() as i64;
    let window_capacity = (needle_len + IO_CHUNK_SIZE as i64) as usize;
    let mut buf = vec![0u8; window_capacity];

    let mut matches = Vec::new();
    let mut window_start = start;
    // bytes at the front of `buf` carried over from the previous window so
    // a match straddling the boundary is not missed.
    let mut carry_len = 0usize;

    while window_start < end {
        let want = window_capacity - carry_len;
        let available = (end - window_start) as usize;
        let to_read = want.min(available);
        if to_read == 0 {
            break;
        }
        session.read(window_start, &mut buf[carry_len..carry_len + to_read])?;
        let filled = carry_len + to_read;

        let mut i = 0usize;
        while i + needle.len() <= filled {
            if &buf[i..i + needle.len()] == needle {
                let match_offset = window_start - carry_len as i64 + i as i64;
                matches.push(match_offset);
                i += needle.len();
            } else {
                i += 1;
            }
        }

        window_start += to_read as i64;
        // Keep the tail that might still participate in a match starting
        // before the next read, i.e. the last `needle_len - 1` bytes not
        // already consumed by a match ending at `i`.
        let keep = filled.saturating_sub(i).min((needle_len - 1).max(0) as usize);
        if keep > 0 {
            buf.copy_within(i..i + keep, 0);
        }
        carry_len = keep;
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Session;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn session_with(data: &[u8]) -> (NamedTempFile, Session) {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(data).unwrap();
        let session = Session::open(f.path()).unwrap();
        (f, session)
    }

    #[test]
    fn finds_single_occurrence() {
        let (_f, session) = session_with(b"hello world");
        let hits = find(&session, b"world", 0, 11).unwrap();
        assert_eq!(hits, vec![6]);
    }

    #[test]
    fn finds_non_overlapping_occurrences_in_order() {
        let (_f, session) = session_with(b"aaaa");
        let hits = find(&session, b"aa", 0, 4).unwrap();
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn respects_start_and_end_bounds() {
        let (_f, session) = session_with(b"abcabcabc");
        let hits = find(&session, b"abc", 3, 6).unwrap();
        assert_eq!(hits, vec![3]);
    }

    #[test]
    fn no_match_returns_empty() {
        let (_f, session) = session_with(b"0123456789");
        let hits = find(&session, b"zzz", 0, 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn matches_spanning_window_boundary() {
        // The first sliding window holds exactly `needle.len() + IO_CHUNK_SIZE`
        // bytes; placing the needle 3 bytes before that boundary splits it
        // across two reads and exercises the carry-over logic.
        let needle: &[u8] = b"NEEDLE";
        let prefix_len = IO_CHUNK_SIZE + needle.len() - 3;
        let mut data = vec![b'x'; prefix_len];
        data.extend_from_slice(needle);
        data.extend(vec![b'y'; 50]);
        let (_f, session) = session_with(&data);
        let hits = find(&session, needle, 0, data.len() as i64).unwrap();
        assert_eq!(hits, vec![prefix_len as i64]);
    }

    #[test]
    fn needle_over_limit_is_rejected() {
        let (_f, session) = session_with(b"0123456789");
        let limit = session.viewport_max_capacity() / 2;
        let needle = vec![0u8; (limit + 1) as usize];
        assert!(matches!(
            find(&session, &needle, 0, 10),
            Err(OmegaError::NeedleTooLong)
        ));
    }

    #[test]
    fn needle_limit_follows_session_viewport_max_capacity_override() {
        use crate::core::session::SessionOptions;

        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"0123456789").unwrap();
        let session = Session::open_with(
            f.path(),
            SessionOptions {
                viewport_max_capacity: 8,
                ..SessionOptions::default()
            },
        )
        .unwrap();

        // Half of the overridden capacity (4) is still fine...
        assert!(find(&session, &[0u8; 4], 0, 10).is_ok());
        // ...but one byte over it is rejected, even though the default
        // session-wide limit would have allowed it.
        assert!(matches!(
            find(&session, &[0u8; 5], 0, 10),
            Err(OmegaError::NeedleTooLong)
        ));
    }

    #[test]
    fn search_sees_edits() {
        let (_f, mut session) = session_with(b"0123456789");
        let author = session.create_author("alice");
        session.insert(&author, 5, b"NEEDLE").unwrap();
        let hits = find(&session, b"NEEDLE", 0, session.computed_file_size()).unwrap();
        assert_eq!(hits, vec![5]);
    }
}
