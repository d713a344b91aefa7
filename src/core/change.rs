//! The change log: an append-only record of edits, and the undo/redo stack.
//!
//! See spec §4.1. A [`Change`] is immutable once created; [`ChangeLog`]
//! owns the applied list and the undone stack and is the only thing that
//! mutates either.

use std::sync::Arc;

use crate::core::author::Author;
use crate::OmegaError;

/// The kind of edit a [`Change`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Overwrite,
    Delete,
}

impl ChangeKind {
    /// Single-character tag, matching `get_change_kind_as_char` in the
    /// original implementation ('I', 'O', 'D').
    pub fn as_char(self) -> char {
        match self {
            ChangeKind::Insert => 'I',
            ChangeKind::Overwrite => 'O',
            ChangeKind::Delete => 'D',
        }
    }
}

/// An immutable record of one edit applied to a session.
///
/// `bytes` is `Arc<[u8]>` so that change segments in the model can hold a
/// cheap clone of the payload without copying it, and so undone changes
/// (kept on the undo stack, not freed) keep the payload alive for as long
/// as any segment might still reference it.
#[derive(Debug, Clone)]
pub struct Change {
    serial: i64,
    kind: ChangeKind,
    offset: i64,
    length: i64,
    bytes: Arc<[u8]>,
    author: Author,
}

impl Change {
    pub(crate) fn new(
        serial: i64,
        kind: ChangeKind,
        offset: i64,
        length: i64,
        bytes: Arc<[u8]>,
        author: Author,
    ) -> Self {
        Change {
            serial,
            kind,
            offset,
            length,
            bytes,
            author,
        }
    }

    pub fn serial(&self) -> i64 {
        self.serial
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Offset in the virtual file at the moment this change was applied.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Payload length for INSERT/OVERWRITE; number of bytes removed for DELETE.
    pub fn length(&self) -> i64 {
        self.length
    }

    /// The change's payload. Empty for DELETE.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn author(&self) -> &Author {
        &self.author
    }
}

/// Ordered record of applied changes plus the undo stack, per spec §4.1.
#[derive(Debug, Default)]
pub struct ChangeLog {
    applied: Vec<Change>,
    undone: Vec<Change>,
    next_serial: i64,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog {
            applied: Vec::new(),
            undone: Vec::new(),
            next_serial: 1,
        }
    }

    /// Assign the next serial, build the change, append it, and clear the
    /// redo stack (a new edit invalidates prior redo history).
    pub fn apply(
        &mut self,
        kind: ChangeKind,
        offset: i64,
        length: i64,
        bytes: Arc<[u8]>,
        author: Author,
    ) -> Change {
        let serial = self.next_serial;
        self.next_serial += 1;
        let change = Change::new(serial, kind, offset, length, bytes, author);
        self.undone.clear();
        self.applied.push(change.clone());
        change
    }

    /// Pop the last applied change onto the undone stack.
    pub fn undo_last(&mut self) -> Result<Change, OmegaError> {
        self.applied.pop().inspect(|c| self.undone.push(c.clone())).ok_or(OmegaError::NoSuchChange)
    }

    /// Pop from the undone stack and re-apply with its original serial.
    pub fn redo_last(&mut self) -> Result<Change, OmegaError> {
        let change = self.undone.pop().ok_or(OmegaError::NoSuchChange)?;
        self.applied.push(change.clone());
        Ok(change)
    }

    pub fn num_changes(&self) -> usize {
        self.applied.len()
    }

    pub fn num_undone_changes(&self) -> usize {
        self.undone.len()
    }

    pub fn last_change(&self) -> Option<&Change> {
        self.applied.last()
    }

    pub fn last_undo(&self) -> Option<&Change> {
        self.undone.last()
    }

    /// Visit applied changes in order, forward or reverse, stopping early
    /// when `visitor` returns `false`.
    pub fn visit<F: FnMut(&Change) -> bool>(&self, forward: bool, mut visitor: F) {
        if forward {
            for change in self.applied.iter() {
                if !visitor(change) {
                    break;
                }
            }
        } else {
            for change in self.applied.iter().rev() {
                if !visitor(change) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::author::AuthorInner;

    fn author() -> Author {
        AuthorInner::new("tester")
    }

    #[test]
    fn serials_increase_monotonically() {
        let mut log = ChangeLog::new();
        let c1 = log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"a"[..]), author());
        let c2 = log.apply(ChangeKind::Insert, 1, 1, Arc::from(&b"b"[..]), author());
        assert_eq!(c1.serial(), 1);
        assert_eq!(c2.serial(), 2);
    }

    #[test]
    fn redo_reuses_serial() {
        let mut log = ChangeLog::new();
        log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"a"[..]), author());
        let undone = log.undo_last().unwrap();
        assert_eq!(undone.serial(), 1);
        let redone = log.redo_last().unwrap();
        assert_eq!(redone.serial(), 1);
        assert_eq!(log.num_changes(), 1);
        assert_eq!(log.num_undone_changes(), 0);
    }

    #[test]
    fn apply_after_undo_clears_redo_stack() {
        let mut log = ChangeLog::new();
        log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"a"[..]), author());
        log.undo_last().unwrap();
        assert_eq!(log.num_undone_changes(), 1);
        log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"b"[..]), author());
        assert_eq!(log.num_undone_changes(), 0);
    }

    #[test]
    fn undo_redo_on_empty_log_fails() {
        let mut log = ChangeLog::new();
        assert!(log.undo_last().is_err());
        assert!(log.redo_last().is_err());
    }

    #[test]
    fn visit_forward_and_reverse() {
        let mut log = ChangeLog::new();
        log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"a"[..]), author());
        log.apply(ChangeKind::Insert, 1, 1, Arc::from(&b"b"[..]), author());
        log.apply(ChangeKind::Insert, 2, 1, Arc::from(&b"c"[..]), author());

        let mut forward = Vec::new();
        log.visit(true, |c| {
            forward.push(c.serial());
            true
        });
        assert_eq!(forward, vec![1, 2, 3]);

        let mut reverse = Vec::new();
        log.visit(false, |c| {
            reverse.push(c.serial());
            true
        });
        assert_eq!(reverse, vec![3, 2, 1]);
    }

    #[test]
    fn visit_stops_early() {
        let mut log = ChangeLog::new();
        log.apply(ChangeKind::Insert, 0, 1, Arc::from(&b"a"[..]), author());
        log.apply(ChangeKind::Insert, 1, 1, Arc::from(&b"b"[..]), author());

        let mut seen = Vec::new();
        log.visit(true, |c| {
            seen.push(c.serial());
            false
        });
        assert_eq!(seen, vec![1]);
    }
}
