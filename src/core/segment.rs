//! The segment list: the model projecting the virtual edited file.
//!
//! See spec §4.2. A [`SegmentList`] is an ordered sequence of [`Segment`]s;
//! each either reads from the backing file or from the payload of an
//! INSERT/OVERWRITE change. `computed_offset` is never stored per segment
//! — it is recovered by prefix sum over the list (spec §9: "implementations
//! may use a flat ordered vector (simple, O(N) shift on edit)"), which is
//! the structure this crate picks; see DESIGN.md for why.

use std::io;

use crate::core::backing::ByteSource;
use crate::core::change::Change;
use crate::OmegaError;

/// Where a segment's bytes come from.
#[derive(Debug, Clone)]
enum SegmentSource {
    File { file_offset: i64 },
    Change { change: Change, inner_offset: i64 },
}

/// One contiguous range of the virtual file.
#[derive(Debug, Clone)]
pub struct Segment {
    source: SegmentSource,
    length: i64,
}

impl Segment {
    pub fn file(file_offset: i64, length: i64) -> Self {
        Segment {
            source: SegmentSource::File { file_offset },
            length,
        }
    }

    pub fn change(change: Change, inner_offset: i64, length: i64) -> Self {
        Segment {
            source: SegmentSource::Change {
                change,
                inner_offset,
            },
            length,
        }
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn is_change(&self) -> bool {
        matches!(self.source, SegmentSource::Change { .. })
    }

    /// Split this segment at `left_len` bytes from its start, returning the
    /// `(left, right)` pair with the source's inner offset recomputed for
    /// the right half — spec §4.2 "Split".
    fn split(&self, left_len: i64) -> (Segment, Segment) {
        debug_assert!(left_len > 0 && left_len < self.length);
        let right_len = self.length - left_len;
        match &self.source {
            SegmentSource::File { file_offset } => (
                Segment::file(*file_offset, left_len),
                Segment::file(*file_offset + left_len, right_len),
            ),
            SegmentSource::Change {
                change,
                inner_offset,
            } => (
                Segment::change(change.clone(), *inner_offset, left_len),
                Segment::change(change.clone(), *inner_offset + left_len, right_len),
            ),
        }
    }

    /// Drop the first `n` bytes of this segment, returning the remainder.
    fn advance(&self, n: i64) -> Segment {
        debug_assert!(n > 0 && n < self.length);
        match &self.source {
            SegmentSource::File { file_offset } => {
                Segment::file(*file_offset + n, self.length - n)
            }
            SegmentSource::Change {
                change,
                inner_offset,
            } => Segment::change(change.clone(), *inner_offset + n, self.length - n),
        }
    }

    /// Copy `buf.len()` bytes starting `seg_offset` bytes into this segment.
    fn read_into(
        &self,
        backing: &dyn ByteSource,
        seg_offset: i64,
        buf: &mut [u8],
    ) -> io::Result<()> {
        match &self.source {
            SegmentSource::File { file_offset } => {
                backing.read_exact_at(file_offset + seg_offset, buf)
            }
            SegmentSource::Change {
                change,
                inner_offset,
            } => {
                let start = (inner_offset + seg_offset) as usize;
                buf.copy_from_slice(&change.bytes()[start..start + buf.len()]);
                Ok(())
            }
        }
    }
}

struct Locate {
    index: usize,
    seg_start: i64,
}

/// The ordered sequence of segments that together project the virtual file.
#[derive(Debug, Default, Clone)]
pub struct SegmentList {
    segments: Vec<Segment>,
}

impl SegmentList {
    /// A segment list with a single file segment covering `[0, length)`.
    pub fn from_file(length: i64) -> Self {
        if length <= 0 {
            SegmentList {
                segments: Vec::new(),
            }
        } else {
            SegmentList {
                segments: vec![Segment::file(0, length)],
            }
        }
    }

    pub fn size(&self) -> i64 {
        self.segments.iter().map(Segment::length).sum()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Find the segment containing `offset`. If `offset` equals the total
    /// size, the locate point is just past the last segment. On a segment
    /// boundary, the locate point favors the segment starting there (the
    /// "gap" before it) per spec §4.2's insertion tie-break.
    fn locate(&self, offset: i64) -> Locate {
        let mut acc = 0i64;
        for (index, seg) in self.segments.iter().enumerate() {
            if offset < acc + seg.length {
                return Locate {
                    index,
                    seg_start: acc,
                };
            }
            acc += seg.length;
        }
        Locate {
            index: self.segments.len(),
            seg_start: acc,
        }
    }

    /// Ensure a segment boundary exists exactly at `offset`, splitting the
    /// segment located there if necessary. Returns the index of the
    /// segment that now starts at `offset`.
    fn split_boundary(&mut self, loc: Locate, offset: i64) -> usize {
        if loc.index >= self.segments.len() || offset == loc.seg_start {
            return loc.index;
        }
        let left_len = offset - loc.seg_start;
        let (left, right) = self.segments[loc.index].split(left_len);
        self.segments.splice(loc.index..=loc.index, [left, right]);
        loc.index + 1
    }

    /// Insert `change`'s payload (the whole thing) as a new change segment
    /// at `offset` — spec §4.2 "INSERT".
    pub fn insert(&mut self, offset: i64, change: Change) -> Result<(), OmegaError> {
        let size = self.size();
        if !(0..=size).contains(&offset) {
            return Err(OmegaError::InvalidOffset);
        }
        let length = change.length();
        if length <= 0 {
            return Err(OmegaError::InvalidLength);
        }

        let loc = self.locate(offset);
        let insert_at = self.split_boundary(loc, offset);
        self.segments
            .insert(insert_at, Segment::change(change, 0, length));
        Ok(())
    }

    /// Remove `length` bytes starting at `offset`, truncating to the
    /// remaining size if `offset + length` runs past it — spec §3 ("deleting
    /// past the end is truncated to the current size") reconciled with
    /// §4.2's stricter "is an error" wording; see DESIGN.md. Returns the
    /// number of bytes actually removed.
    pub fn delete(&mut self, offset: i64, length: i64) -> Result<i64, OmegaError> {
        let size = self.size();
        if offset < 0 || offset >= size {
            return Err(OmegaError::InvalidOffset);
        }
        if length <= 0 {
            return Err(OmegaError::InvalidLength);
        }
        let length = length.min(size - offset);

        let loc = self.locate(offset);
        let mut index = self.split_boundary(loc, offset);
        let mut remaining = length;
        while remaining > 0 {
            let seg_len = self.segments[index].length;
            if seg_len <= remaining {
                remaining -= seg_len;
                self.segments.remove(index);
            } else {
                self.segments[index] = self.segments[index].advance(remaining);
                remaining = 0;
            }
        }
        Ok(length)
    }

    /// Delete-then-insert at `offset`, degenerating to a pure insert when
    /// `offset` is at the end of the virtual file — spec §4.2 "OVERWRITE".
    pub fn overwrite(&mut self, offset: i64, change: Change) -> Result<(), OmegaError> {
        let size = self.size();
        if !(0..=size).contains(&offset) {
            return Err(OmegaError::InvalidOffset);
        }
        let length = change.length();
        if length <= 0 {
            return Err(OmegaError::InvalidLength);
        }
        if offset < size {
            let overlap = length.min(size - offset);
            self.delete(offset, overlap)?;
        }
        self.insert(offset, change)
    }

    /// Read `buf.len()` bytes starting at `offset` from the virtual file.
    pub fn read(
        &self,
        backing: &dyn ByteSource,
        offset: i64,
        buf: &mut [u8],
    ) -> Result<(), OmegaError> {
        if buf.is_empty() {
            return Ok(());
        }
        let size = self.size();
        if offset < 0 || offset + buf.len() as i64 > size {
            return Err(OmegaError::InvalidOffset);
        }

        let loc = self.locate(offset);
        let mut index = loc.index;
        let mut seg_start = loc.seg_start;
        let mut cursor = offset;
        let mut written = 0usize;

        while written < buf.len() {
            let seg = &self.segments[index];
            let seg_end = seg_start + seg.length;
            let avail = seg_end - cursor;
            let want = (buf.len() - written) as i64;
            let take = avail.min(want) as usize;

            seg.read_into(backing, cursor - seg_start, &mut buf[written..written + take])
                .map_err(|e| OmegaError::Io(e.to_string()))?;

            written += take;
            cursor += take as i64;
            seg_start = seg_end;
            index += 1;
        }
        Ok(())
    }

    /// Check the invariants from spec §3/§8: ordered, contiguous, positive
    /// lengths. Used by tests and by the reentrancy-free public API paths
    /// that want to assert the rebuild did not corrupt the list.
    #[cfg(test)]
    fn check_invariants(&self) {
        for seg in &self.segments {
            assert!(seg.length > 0, "segment length must be positive");
        }
    }
}
