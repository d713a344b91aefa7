//! The editing core: sessions, the segment-list model, viewports, authors,
//! change history, saving, and searching.
//!
//! This module has no CLI or serialization concerns of its own — those live
//! in [`crate::cli`]. Everything here is built around [`session::Session`],
//! which owns a [`backing::ByteSource`], a [`segment::SegmentList`], a
//! [`change::ChangeLog`], an [`author::AuthorTable`], and a slab of
//! [`viewport::Viewport`]s.

pub mod author;
pub mod backing;
pub mod change;
pub mod constants;
pub mod save;
pub mod search;
pub mod segment;
pub mod session;
pub mod viewport;

pub use author::{Author, AuthorTable};
pub use change::{Change, ChangeKind};
pub use session::{Session, ViewportHandle};
pub use viewport::Viewport;
