//! Viewports: sliding, cached windows over a session's virtual file.
//!
//! See spec §4.4. A [`Viewport`] owns its cache buffer and fires `on_change`
//! synchronously whenever [`crate::core::session::Session`] decides the
//! window is affected by an edit, or whenever the caller explicitly
//! [`Viewport::materialize`]s it. The callback is taken out of the struct
//! for the duration of the call (`Option::take`) so it can observe the
//! viewport's other fields through a plain [`ViewportEvent`] without a
//! self-borrow conflict.

use std::any::Any;

use crate::core::author::Author;
use crate::core::backing::ByteSource;
use crate::core::change::{Change, ChangeKind};
use crate::core::segment::SegmentList;
use crate::util::bitshift::left_shift_buffer;
use crate::OmegaError;

/// A read-only snapshot handed to a viewport's `on_change` callback.
///
/// `change` is `None` for a user-initiated [`Viewport::materialize`] call
/// (spec §4.4: "fires `on_change` with a null change-ref"), `Some` when the
/// re-materialisation was driven by a session edit.
pub struct ViewportEvent<'a> {
    pub data: &'a [u8],
    pub length: i64,
    pub capacity: i64,
    pub offset: i64,
    pub bit_offset: u8,
    pub change: Option<&'a Change>,
    /// The change's serial as it should be observed: positive on forward
    /// apply or redo, negated on undo (spec §3/§5) — `None` alongside
    /// `change: None` for a user-initiated update.
    pub observed_serial: Option<i64>,
}

/// Boxed `FnMut` invoked synchronously on every materialisation.
pub type OnChange = Box<dyn FnMut(ViewportEvent<'_>)>;

/// A sliding window over a session's virtual file with a cached buffer.
pub struct Viewport {
    offset: i64,
    capacity: i64,
    bit_offset: u8,
    data: Vec<u8>,
    length: i64,
    on_change: Option<OnChange>,
    user_data: Option<Box<dyn Any>>,
    author: Author,
}

impl Viewport {
    pub(crate) fn new(
        author: Author,
        offset: i64,
        capacity: i64,
        bit_offset: u8,
        on_change: Option<OnChange>,
        user_data: Option<Box<dyn Any>>,
    ) -> Self {
        Viewport {
            offset,
            capacity,
            bit_offset,
            data: vec![0u8; capacity as usize],
            length: 0,
            on_change,
            user_data,
            author,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    /// Reposition/resize the window. Does not re-materialise; call
    /// [`Viewport::materialize`] afterwards, as `Session::update_viewport`
    /// does.
    pub(crate) fn set_window(&mut self, offset: i64, capacity: i64, bit_offset: u8) {
        self.offset = offset;
        self.bit_offset = bit_offset;
        if capacity != self.capacity {
            self.data = vec![0u8; capacity as usize];
        }
        self.capacity = capacity;
    }

    /// Re-read the window's bytes from the segment list, apply the bit
    /// shift if any, and fire `on_change` — spec §4.4 "update" and the
    /// notification algorithm's re-materialisation step.
    ///
    /// `change` is the triggering change when called from a session edit,
    /// or `None` for a direct, user-initiated update.
    pub(crate) fn materialize(
        &mut self,
        backing: &dyn ByteSource,
        segments: &SegmentList,
        change: Option<&Change>,
        observed_serial: Option<i64>,
        suppress_callback: bool,
    ) -> Result<(), OmegaError> {
        let virtual_size = segments.size();
        self.length = self.capacity.min((virtual_size - self.offset).max(0));

        for byte in self.data.iter_mut() {
            *byte = 0;
        }
        if self.length > 0 {
            segments.read(backing, self.offset, &mut self.data[..self.length as usize])?;
        }

        if self.bit_offset != 0 && self.length > 0 {
            left_shift_buffer(&mut self.data[..self.length as usize], self.bit_offset);
        }

        if !suppress_callback {
            if let Some(mut cb) = self.on_change.take() {
                cb(ViewportEvent {
                    data: &self.data[..self.length as usize],
                    length: self.length,
                    capacity: self.capacity,
                    offset: self.offset,
                    bit_offset: self.bit_offset,
                    change,
                    observed_serial,
                });
                self.on_change = Some(cb);
            }
        }
        Ok(())
    }

    /// Whether an edit at `change_offset` affecting `affected_length` bytes
    /// (the delete length for DELETE, the insert/overhang length otherwise)
    /// requires this viewport to re-materialise — spec §4.4's notification
    /// algorithm: overlap with `[offset, offset+capacity)`, or a shift into
    /// or out of the window from an insert at-or-before the offset or a
    /// delete before the window's end.
    pub(crate) fn affected_by(
        &self,
        kind: ChangeKind,
        change_offset: i64,
        affected_length: i64,
    ) -> bool {
        let window_end = self.offset + self.capacity;
        let overlaps = change_offset < window_end && change_offset + affected_length > self.offset;
        if overlaps {
            return true;
        }
        match kind {
            ChangeKind::Insert => change_offset <= self.offset,
            ChangeKind::Delete => change_offset < window_end,
            ChangeKind::Overwrite => false,
        }
    }
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("offset", &self.offset)
            .field("capacity", &self.capacity)
            .field("bit_offset", &self.bit_offset)
            .field("length", &self.length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::author::AuthorInner;
    use crate::core::backing::FileBacking;
    use crate::core::change::ChangeKind;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;
    use tempfile::NamedTempFile;

    fn backing(data: &[u8]) -> FileBacking {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(data).unwrap();
        FileBacking::new(f.reopen().unwrap(), data.len() as i64, 0, 0)
    }

    fn fill_pattern(len: usize) -> Vec<u8> {
        let alphabet: Vec<u8> = (b'0'..=b'9')
            .chain(b'A'..=b'Z')
            .chain(b'a'..=b'z')
            .collect();
        alphabet.iter().cycle().take(len).copied().collect()
    }

    #[test]
    fn materialize_reads_full_capacity_at_start() {
        let data = fill_pattern(1024);
        let back = backing(&data);
        let segments = SegmentList::from_file(1024);
        let mut vp = Viewport::new(AuthorInner::new("t"), 0, 20, 0, None, None);
        vp.materialize(&back, &segments, None, None, true).unwrap();
        assert_eq!(vp.length(), 20);
        assert_eq!(vp.data(), &data[..20]);
    }

    #[test]
    fn materialize_truncates_length_near_tail() {
        let data = fill_pattern(1024);
        let back = backing(&data);
        let segments = SegmentList::from_file(1024);
        let mut vp = Viewport::new(AuthorInner::new("t"), 1020, 20, 0, None, None);
        vp.materialize(&back, &segments, None, None, true).unwrap();
        assert_eq!(vp.length(), 4);
        assert_eq!(vp.data(), &data[1020..1024]);
    }

    #[test]
    fn callback_fires_on_materialize_unless_suppressed() {
        let data = fill_pattern(64);
        let back = backing(&data);
        let segments = SegmentList::from_file(64);
        let calls = Rc::new(RefCell::new(0));
        let calls2 = calls.clone();
        let mut vp = Viewport::new(
            AuthorInner::new("t"),
            0,
            8,
            0,
            Some(Box::new(move |_ev: ViewportEvent<'_>| {
                *calls2.borrow_mut() += 1;
            })),
            None,
        );
        vp.materialize(&back, &segments, None, None, false).unwrap();
        assert_eq!(*calls.borrow(), 1);
        vp.materialize(&back, &segments, None, None, true).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn bit_shift_scenario_five() {
        // spec §8 scenario 5: fill 1 KiB with the 62-char pattern, bit_offset
        // 7 then an external +1 left shift equals the fill advanced by one
        // byte.
        let data = fill_pattern(1024);
        let back = backing(&data);
        let segments = SegmentList::from_file(1024);

        let mut vp = Viewport::new(AuthorInner::new("t"), 0, 20, 0, None, None);
        vp.materialize(&back, &segments, None, None, true).unwrap();
        assert_eq!(vp.data(), &data[..20]);

        vp.set_window(0, 20, 7);
        vp.materialize(&back, &segments, None, None, true).unwrap();
        let mut shifted = vp.data().to_vec();
        left_shift_buffer(&mut shifted, 1);
        assert_eq!(&shifted[..19], &data[1..20]);
    }

    #[test]
    fn affected_by_detects_overlap_and_insert_shift() {
        let vp = Viewport::new(AuthorInner::new("t"), 10, 10, 0, None, None);
        // overlapping delete
        assert!(vp.affected_by(ChangeKind::Delete, 15, 2));
        // insert entirely before the window still shifts it
        assert!(vp.affected_by(ChangeKind::Insert, 0, 1));
        // insert entirely past the window's end, no effect
        assert!(!vp.affected_by(ChangeKind::Insert, 25, 1));
    }
}
