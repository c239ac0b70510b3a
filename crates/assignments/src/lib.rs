//! `chapterhouse-assignments` — the executive assignment aggregate.
//!
//! A time-bounded grant of a role to a user within a chapter or branch
//! scope. Revocation closes the window instead of deleting, so the
//! appointment history stays auditable.

pub mod assignment;
pub mod scope;

pub use assignment::{
    AmendNotes, Appoint, Appointed, AssignmentCommand, AssignmentEvent, ExecutiveAssignment,
    NotesAmended, Revoke, Revoked,
};
pub use scope::AssignmentScope;
