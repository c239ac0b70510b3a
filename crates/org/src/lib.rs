//! `chapterhouse-org` — organization hierarchy entities.
//!
//! Chapters own branches; branches are the scope for local memberships and
//! branch-level role assignments. These are pure data with constructor
//! validation; uniqueness and referential integrity live in the org store.

pub mod branch;
pub mod chapter;

pub use branch::{Branch, BranchStatus, DEFAULT_MIN_MEMBERS};
pub use chapter::{Chapter, ChapterStatus};
