//! Authors: named actors attributed on every change a session records.
//!
//! An author is created by name, is immortal for the session's lifetime
//! (there is no `destroy_author` — it dies with the session), and exists
//! purely for attribution: every [`Change`](crate::core::change::Change)
//! carries a reference to the author that issued it, and a viewport records
//! which author it is attributed to for callback purposes.

use std::cell::Cell;
use std::sync::Arc;

/// A named actor that issues changes against a session.
#[derive(Debug)]
pub struct AuthorInner {
    name: String,
    changes_issued: Cell<u64>,
}

/// Cheaply-clonable handle to an [`AuthorInner`].
///
/// Cloned into every [`Change`](crate::core::change::Change) the author
/// issues and into every [`Viewport`](crate::core::viewport::Viewport) it
/// is attributed to, so attribution survives as long as the change or
/// viewport does without re-allocating the author's name.
pub type Author = Arc<AuthorInner>;

impl AuthorInner {
    pub(crate) fn new(name: impl Into<String>) -> Author {
        Arc::new(AuthorInner {
            name: name.into(),
            changes_issued: Cell::new(0),
        })
    }

    /// The author's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of changes this author has issued in the session's lifetime.
    ///
    /// Counts applies only; undo/redo do not change this tally, matching
    /// the source's attribution-only role for authors (they are not part
    /// of undo/redo bookkeeping).
    pub fn changes_issued(&self) -> u64 {
        self.changes_issued.get()
    }

    pub(crate) fn record_change(&self) {
        self.changes_issued.set(self.changes_issued.get() + 1);
    }
}

/// A session's table of authors, keyed by creation order.
///
/// A flat `Vec` rather than a `HashMap`: sessions typically have a handful
/// of authors (one interactive user, a handful of scripted ones in tests),
/// so linear lookup by name is simple and fast enough, and preserves
/// creation order for diagnostics.
#[derive(Debug, Default)]
pub struct AuthorTable {
    authors: Vec<Author>,
}

impl AuthorTable {
    pub fn new() -> Self {
        AuthorTable {
            authors: Vec::new(),
        }
    }

    /// Create (or return the existing) author with the given name.
    pub fn get_or_create(&mut self, name: &str) -> Author {
        if let Some(existing) = self.authors.iter().find(|a| a.name() == name) {
            return existing.clone();
        }
        let author = AuthorInner::new(name);
        self.authors.push(author.clone());
        author
    }

    /// Look up an existing author by name.
    pub fn get(&self, name: &str) -> Option<Author> {
        self.authors.iter().find(|a| a.name() == name).cloned()
    }

    /// Number of distinct authors this session has created.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}
