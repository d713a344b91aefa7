//! Sessions: the owner of a document's backing file, model, change log,
//! authors, and viewports.
//!
//! See spec §4.3. A [`Session`] is the only way to apply edits or create
//! viewports; everything else in [`crate::core`] is reached through it.

use std::any::Any;
use std::cell::Cell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::author::{Author, AuthorTable};
use crate::core::backing::{ByteSource, EmptyBacking, FileBacking};
use crate::core::change::{Change, ChangeKind, ChangeLog};
use crate::core::constants::DEFAULT_VIEWPORT_MAX_CAPACITY;
use crate::core::segment::SegmentList;
use crate::core::viewport::{OnChange as OnViewportChange, Viewport};
use crate::OmegaError;

/// A session-scoped handle to a live viewport, stable across `Vec` growth.
///
/// Viewports are kept in a slab (`Vec<Option<Viewport>>`) rather than
/// returned by reference, so a [`Viewport`] never needs a back-pointer to
/// its [`Session`] (spec §9, "Cyclic ownership" — the handle-plus-table
/// form of the two suggested resolutions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportHandle(usize);

/// A read-only snapshot handed to a session's `on_change` callback, mirroring
/// [`crate::core::viewport::ViewportEvent`] but without a cached data buffer
/// (the session itself has no single window to report).
pub struct SessionEvent<'a> {
    pub change: Option<&'a Change>,
    pub observed_serial: Option<i64>,
}

/// Boxed `FnMut` invoked once per edit, after every affected viewport's own
/// callback has run (spec §5's ordering guarantee).
pub type OnSessionChange = Box<dyn FnMut(SessionEvent<'_>)>;

/// Construction-time options for [`Session::open_with`] / [`Session::in_memory_with`].
///
/// Mirrors the parameter list of spec §4.3's `create`: everything but the
/// file handle itself.
pub struct SessionOptions {
    pub on_change: Option<OnSessionChange>,
    pub user_data: Option<Box<dyn Any>>,
    pub viewport_max_capacity: i64,
    /// Sub-range of the input file treated as the session's universe.
    /// `(0, 0)` means the whole file (spec §9's resolution of the session
    /// windowing open question).
    pub window_offset: i64,
    pub window_length: i64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            on_change: None,
            user_data: None,
            viewport_max_capacity: DEFAULT_VIEWPORT_MAX_CAPACITY,
            window_offset: 0,
            window_length: 0,
        }
    }
}

/// An editing session over a backing input file, or none at all.
pub struct Session {
    backing: Box<dyn ByteSource>,
    /// The segment list reflecting only the backing file, untouched by any
    /// change. Undo replays onto a clone of this (see [`Session::undo`]) —
    /// the only way to reconstruct the pre-delete content of a DELETE
    /// change, since spec §3 leaves its `bytes` field empty.
    base_segments: SegmentList,
    segments: SegmentList,
    changes: ChangeLog,
    authors: AuthorTable,
    viewports: Vec<Option<Viewport>>,
    viewport_callbacks_paused: bool,
    viewport_max_capacity: i64,
    file_path: Option<PathBuf>,
    on_change: Option<OnSessionChange>,
    user_data: Option<Box<dyn Any>>,
    /// Reentrancy guard: set for the duration of any mutating call so a
    /// callback cannot re-enter with its own edit (spec §9, "Callback
    /// invocation inside a mutation").
    mutating: Cell<bool>,
}

impl Session {
    /// Open a session over the file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OmegaError> {
        Self::open_with(path, SessionOptions::default())
    }

    /// Open a session over the file at `path`.
    pub fn open_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self, OmegaError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len() as i64;
        let backing = FileBacking::new(file, file_len, options.window_offset, options.window_length);
        let base_segments = SegmentList::from_file(backing.len());
        Ok(Session {
            backing: Box::new(backing),
            segments: base_segments.clone(),
            base_segments,
            changes: ChangeLog::new(),
            authors: AuthorTable::new(),
            viewports: Vec::new(),
            viewport_callbacks_paused: false,
            viewport_max_capacity: options.viewport_max_capacity,
            file_path: Some(path.to_path_buf()),
            on_change: options.on_change,
            user_data: options.user_data,
            mutating: Cell::new(false),
        })
    }

    /// A session with no backing file; all content comes from inserts.
    pub fn in_memory() -> Self {
        Self::in_memory_with(SessionOptions::default())
    }

    pub fn in_memory_with(options: SessionOptions) -> Self {
        Session {
            backing: Box::new(EmptyBacking),
            base_segments: SegmentList::from_file(0),
            segments: SegmentList::from_file(0),
            changes: ChangeLog::new(),
            authors: AuthorTable::new(),
            viewports: Vec::new(),
            viewport_callbacks_paused: false,
            viewport_max_capacity: options.viewport_max_capacity,
            file_path: None,
            on_change: options.on_change,
            user_data: options.user_data,
            mutating: Cell::new(false),
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn user_data(&self) -> Option<&dyn Any> {
        self.user_data.as_deref()
    }

    /// The largest viewport capacity this session will allow (spec §4.3,
    /// configurable via [`SessionOptions::viewport_max_capacity`]). Also
    /// bounds literal search needles: see [`crate::core::search::find`].
    pub fn viewport_max_capacity(&self) -> i64 {
        self.viewport_max_capacity
    }

    pub fn create_author(&mut self, name: &str) -> Author {
        self.authors.get_or_create(name)
    }

    pub fn author(&self, name: &str) -> Option<Author> {
        self.authors.get(name)
    }

    pub fn computed_file_size(&self) -> i64 {
        self.segments.size()
    }

    pub fn num_changes(&self) -> usize {
        self.changes.num_changes()
    }

    pub fn num_undone_changes(&self) -> usize {
        self.changes.num_undone_changes()
    }

    pub fn last_change(&self) -> Option<&Change> {
        self.changes.last_change()
    }

    pub fn last_undo(&self) -> Option<&Change> {
        self.changes.last_undo()
    }

    pub fn visit_changes_forward<F: FnMut(&Change) -> bool>(&self, visitor: F) {
        self.changes.visit(true, visitor);
    }

    pub fn visit_changes_reverse<F: FnMut(&Change) -> bool>(&self, visitor: F) {
        self.changes.visit(false, visitor);
    }

    /// Read `buf.len()` bytes of the virtual file starting at `offset`.
    pub fn read(&self, offset: i64, buf: &mut [u8]) -> Result<(), OmegaError> {
        self.segments.read(self.backing.as_ref(), offset, buf)
    }

    fn begin_mutation(&self) -> Result<(), OmegaError> {
        if self.mutating.replace(true) {
            return Err(OmegaError::Reentrant);
        }
        Ok(())
    }

    fn end_mutation(&self) {
        self.mutating.set(false);
    }

    fn apply_forward(&mut self, change: &Change) -> Result<i64, OmegaError> {
        match change.kind() {
            ChangeKind::Insert => {
                self.segments.insert(change.offset(), change.clone())?;
                Ok(change.length())
            }
            ChangeKind::Overwrite => {
                self.segments.overwrite(change.offset(), change.clone())?;
                Ok(change.length())
            }
            ChangeKind::Delete => self.segments.delete(change.offset(), change.length()),
        }
    }

    /// Insert `bytes` at `offset`, attributed to `author` — spec §4.2 INSERT.
    pub fn insert(&mut self, author: &Author, offset: i64, bytes: &[u8]) -> Result<Change, OmegaError> {
        self.begin_mutation()?;
        let result = self.insert_inner(author, offset, bytes);
        self.end_mutation();
        result
    }

    fn insert_inner(&mut self, author: &Author, offset: i64, bytes: &[u8]) -> Result<Change, OmegaError> {
        let size = self.segments.size();
        if !(0..=size).contains(&offset) {
            return Err(OmegaError::InvalidOffset);
        }
        if bytes.is_empty() {
            return Err(OmegaError::InvalidLength);
        }
        let change = self.changes.apply(
            ChangeKind::Insert,
            offset,
            bytes.len() as i64,
            Arc::from(bytes),
            author.clone(),
        );
        let affected = self
            .apply_forward(&change)
            .map_err(|e| OmegaError::Fatal(format!("insert failed after validation: {e}")))?;
        author.record_change();
        self.notify(ChangeKind::Insert, offset, affected, Some(&change), Some(change.serial()));
        Ok(change)
    }

    /// Overwrite `bytes.len()` bytes starting at `offset` — spec §4.2
    /// OVERWRITE. Extends the virtual file if `offset + bytes.len()` runs
    /// past the current size.
    pub fn overwrite(&mut self, author: &Author, offset: i64, bytes: &[u8]) -> Result<Change, OmegaError> {
        self.begin_mutation()?;
        let result = self.overwrite_inner(author, offset, bytes);
        self.end_mutation();
        result
    }

    fn overwrite_inner(&mut self, author: &Author, offset: i64, bytes: &[u8]) -> Result<Change, OmegaError> {
        let size = self.segments.size();
        if !(0..=size).contains(&offset) {
            return Err(OmegaError::InvalidOffset);
        }
        if bytes.is_empty() {
            return Err(OmegaError::InvalidLength);
        }
        let change = self.changes.apply(
            ChangeKind::Overwrite,
            offset,
            bytes.len() as i64,
            Arc::from(bytes),
            author.clone(),
        );
        let affected = self
            .apply_forward(&change)
            .map_err(|e| OmegaError::Fatal(format!("overwrite failed after validation: {e}")))?;
        author.record_change();
        self.notify(ChangeKind::Overwrite, offset, affected, Some(&change), Some(change.serial()));
        Ok(change)
    }

    /// Delete `length` bytes starting at `offset` — spec §4.2 DELETE.
    /// Truncated to the remaining size if `offset + length` runs past it
    /// (spec §3; see DESIGN.md for the reconciliation with §4.2's stricter
    /// wording).
    pub fn delete(&mut self, author: &Author, offset: i64, length: i64) -> Result<Change, OmegaError> {
        self.begin_mutation()?;
        let result = self.delete_inner(author, offset, length);
        self.end_mutation();
        result
    }

    fn delete_inner(&mut self, author: &Author, offset: i64, length: i64) -> Result<Change, OmegaError> {
        let size = self.segments.size();
        if offset < 0 || offset >= size {
            return Err(OmegaError::InvalidOffset);
        }
        if length <= 0 {
            return Err(OmegaError::InvalidLength);
        }
        let truncated_length = length.min(size - offset);
        let change = self.changes.apply(
            ChangeKind::Delete,
            offset,
            truncated_length,
            Arc::from(&[][..]),
            author.clone(),
        );
        let affected = self
            .apply_forward(&change)
            .map_err(|e| OmegaError::Fatal(format!("delete failed after validation: {e}")))?;
        author.record_change();
        self.notify(ChangeKind::Delete, offset, affected, Some(&change), Some(change.serial()));
        Ok(change)
    }

    /// Undo the last applied change — spec §4.1/§4.3.
    ///
    /// Reconstructs the pre-change segment list by replaying the remaining
    /// applied changes onto a clone of [`Session::base_segments`], since a
    /// DELETE change carries no payload to invert directly.
    pub fn undo(&mut self) -> Result<Change, OmegaError> {
        self.begin_mutation()?;
        let result = (|| {
            let undone = self.changes.undo_last()?;
            self.rebuild_segments()?;
            let observed = -undone.serial();
            self.notify(undone.kind(), undone.offset(), undone.length(), Some(&undone), Some(observed));
            Ok(undone)
        })();
        self.end_mutation();
        result
    }

    /// Redo the most recently undone change, reusing its original serial —
    /// spec §4.1/§4.3.
    pub fn redo(&mut self) -> Result<Change, OmegaError> {
        self.begin_mutation()?;
        let result = (|| {
            let change = self.changes.redo_last()?;
            let affected = self
                .apply_forward(&change)
                .map_err(|e| OmegaError::Fatal(format!("redo failed to reapply change: {e}")))?;
            self.notify(change.kind(), change.offset(), affected, Some(&change), Some(change.serial()));
            Ok(change)
        })();
        self.end_mutation();
        result
    }

    fn rebuild_segments(&mut self) -> Result<(), OmegaError> {
        let mut rebuilt = self.base_segments.clone();
        let mut failure = None;
        self.changes.visit(true, |change| match change.kind() {
            ChangeKind::Insert => match rebuilt.insert(change.offset(), change.clone()) {
                Ok(()) => true,
                Err(e) => {
                    failure = Some(e);
                    false
                }
            },
            ChangeKind::Overwrite => match rebuilt.overwrite(change.offset(), change.clone()) {
                Ok(()) => true,
                Err(e) => {
                    failure = Some(e);
                    false
                }
            },
            ChangeKind::Delete => match rebuilt.delete(change.offset(), change.length()) {
                Ok(_) => true,
                Err(e) => {
                    failure = Some(e);
                    false
                }
            },
        });
        if let Some(e) = failure {
            return Err(OmegaError::Fatal(format!("segment list replay diverged: {e}")));
        }
        self.segments = rebuilt;
        Ok(())
    }

    pub fn pause_viewport_callbacks(&mut self) {
        self.viewport_callbacks_paused = true;
    }

    pub fn resume_viewport_callbacks(&mut self) {
        self.viewport_callbacks_paused = false;
    }

    pub fn viewport_callbacks_paused(&self) -> bool {
        self.viewport_callbacks_paused
    }

    /// Create a viewport at `offset` with the given `capacity` and
    /// `bit_offset`, materialising it immediately (without firing its
    /// callback, matching `update`'s "null change-ref" semantics for the
    /// initial fill) — spec §4.4 `create`.
    pub fn create_viewport(
        &mut self,
        author: &Author,
        offset: i64,
        capacity: i64,
        bit_offset: u8,
        on_change: Option<OnViewportChange>,
        user_data: Option<Box<dyn Any>>,
    ) -> Result<ViewportHandle, OmegaError> {
        if capacity > self.viewport_max_capacity || capacity <= 0 {
            return Err(OmegaError::CapacityExceeded);
        }
        if offset < 0 {
            return Err(OmegaError::InvalidOffset);
        }
        let mut viewport = Viewport::new(author.clone(), offset, capacity, bit_offset & 0x7, on_change, user_data);
        viewport.materialize(self.backing.as_ref(), &self.segments, None, None, true)?;

        let handle = match self.viewports.iter().position(Option::is_none) {
            Some(index) => {
                self.viewports[index] = Some(viewport);
                index
            }
            None => {
                self.viewports.push(Some(viewport));
                self.viewports.len() - 1
            }
        };
        Ok(ViewportHandle(handle))
    }

    pub fn viewport(&self, handle: ViewportHandle) -> Result<&Viewport, OmegaError> {
        self.viewports
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(OmegaError::InvalidOffset)
    }

    /// Re-point and/or resize a viewport, re-materialising it and firing
    /// its callback with a null change-ref — spec §4.4 `update`.
    pub fn update_viewport(
        &mut self,
        handle: ViewportHandle,
        new_offset: i64,
        new_capacity: i64,
        new_bit_offset: u8,
    ) -> Result<(), OmegaError> {
        if new_capacity > self.viewport_max_capacity || new_capacity <= 0 {
            return Err(OmegaError::CapacityExceeded);
        }
        let viewport = self
            .viewports
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(OmegaError::InvalidOffset)?;
        viewport.set_window(new_offset, new_capacity, new_bit_offset & 0x7);
        viewport.materialize(self.backing.as_ref(), &self.segments, None, None, false)
    }

    /// Remove a viewport from the session, freeing its slot — spec §4.4
    /// `destroy`.
    pub fn destroy_viewport(&mut self, handle: ViewportHandle) -> Result<(), OmegaError> {
        let slot = self
            .viewports
            .get_mut(handle.0)
            .ok_or(OmegaError::InvalidOffset)?;
        if slot.take().is_none() {
            return Err(OmegaError::InvalidOffset);
        }
        Ok(())
    }

    /// Re-materialise and notify every viewport affected by an edit, then
    /// fire the session-level callback — spec §4.4's notification algorithm
    /// and §5's ordering guarantee (viewports before the session callback).
    fn notify(
        &mut self,
        kind: ChangeKind,
        change_offset: i64,
        affected_length: i64,
        change: Option<&Change>,
        observed_serial: Option<i64>,
    ) {
        let backing = self.backing.as_ref();
        let segments = &self.segments;
        let paused = self.viewport_callbacks_paused;
        for slot in self.viewports.iter_mut() {
            if let Some(viewport) = slot {
                if viewport.affected_by(kind, change_offset, affected_length) {
                    // A read failure here indicates the backing file shrank or
                    // became unreadable out from under an open session; this
                    // is outside what validation can catch ahead of time.
                    let _ = viewport.materialize(backing, segments, change, observed_serial, paused);
                }
            }
        }
        if let Some(cb) = self.on_change.as_mut() {
            cb(SessionEvent {
                change,
                observed_serial,
            });
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("file_path", &self.file_path)
            .field("computed_file_size", &self.segments.size())
            .field("num_changes", &self.changes.num_changes())
            .field("num_undone_changes", &self.changes.num_undone_changes())
            .field("num_viewports", &self.viewports.iter().filter(|v| v.is_some()).count())
            .finish()
    }
}
