//! `chapterhouse-roles` — role catalog entities.
//!
//! A role is a named capability bundle with a scope type that constrains
//! how it may be assigned. The stable [`RoleCapability`] tag (not the
//! display name) is what the authorization engine matches on.

pub mod permissions;
pub mod role;

pub use permissions::{Action, PermissionSet};
pub use role::{Role, RoleCapability, RoleCategory, ScopeType};
