//! `chapterhouse-infra` — in-memory transactional ledgers and the
//! application service.
//!
//! Each ledger holds append-only event streams plus its uniqueness
//! indexes behind a single lock, so every mutation is one atomic
//! read-evaluate-write section. [`OrganizationService`] composes the
//! ledgers with the authorization engine into the external contract.

pub mod assignment_ledger;
pub mod membership_ledger;
pub mod org_store;
pub mod role_catalog;
pub mod service;
pub mod views;

#[cfg(test)]
mod integration_tests;

pub use assignment_ledger::AssignmentLedger;
pub use membership_ledger::MembershipLedger;
pub use org_store::OrgStore;
pub use role_catalog::RoleCatalog;
pub use service::OrganizationService;
pub use views::{AssignmentRecord, EffectiveRole, MembershipRecord};
